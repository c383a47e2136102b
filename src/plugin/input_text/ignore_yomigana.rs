//! 読み仮名除去プラグイン
//!
//! 漢字の直後に括弧書きで続く読み仮名を取り除きます。
//! 例えば「徳島（とくしま）に行(い)く」は「徳島に行く」に
//! 書き換えられます。

use crate::dictionary::character::CategoryType;
use crate::errors::Result;
use crate::input::InputTextBuilder;

/// 読み仮名除去プラグイン。
pub struct IgnoreYomiganaPlugin {
    left_brackets: Vec<char>,
    right_brackets: Vec<char>,
    max_yomigana_length: usize,
}

impl Default for IgnoreYomiganaPlugin {
    fn default() -> Self {
        Self::new(vec!['(', '（'], vec![')', '）'], 4)
    }
}

impl IgnoreYomiganaPlugin {
    /// 括弧の集合と読み仮名の最大長からプラグインを構築します。
    pub fn new(
        left_brackets: Vec<char>,
        right_brackets: Vec<char>,
        max_yomigana_length: usize,
    ) -> Self {
        Self {
            left_brackets,
            right_brackets,
            max_yomigana_length,
        }
    }

    pub(crate) fn rewrite(&self, builder: &mut InputTextBuilder) -> Result<()> {
        let text: Vec<char> = builder.chars().to_vec();
        let n = text.len();

        let mut start_bracket: Option<usize> = None;
        let mut has_yomigana = false;
        let mut offset = 0usize;
        for i in 1..n {
            let c = text[i];
            if self.is_kanji(builder, text[i - 1]) && self.left_brackets.contains(&c) {
                start_bracket = Some(i);
                has_yomigana = false;
            } else if has_yomigana && self.right_brackets.contains(&c) {
                if let Some(bracket) = start_bracket {
                    let kanji = text[bracket - 1].to_string();
                    builder.replace(bracket - 1 - offset..i + 1 - offset, &kanji)?;
                    offset += i - bracket + 1;
                    start_bracket = None;
                    has_yomigana = false;
                }
            } else if let Some(bracket) = start_bracket {
                let is_kana = self.is_kana(builder, c);
                if is_kana && i - bracket <= self.max_yomigana_length {
                    has_yomigana = true;
                } else {
                    start_bracket = None;
                    has_yomigana = false;
                }
            }
        }
        Ok(())
    }

    fn is_kanji(&self, builder: &InputTextBuilder, c: char) -> bool {
        builder
            .char_category()
            .category_types(c)
            .contains(CategoryType::Kanji)
    }

    fn is_kana(&self, builder: &InputTextBuilder, c: char) -> bool {
        let types = builder.char_category().category_types(c);
        types.contains(CategoryType::Hiragana) || types.contains(CategoryType::Katakana)
    }
}
