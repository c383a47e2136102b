//! 標準の入力テキスト正規化プラグイン
//!
//! 各文字を小文字化し、Unicode NFKCで正規化します。
//! `rewrite.def`形式の定義により、正規化を行わない文字のリストと、
//! 正規化の前に適用する置換ペアを指定できます。

use unicode_normalization::UnicodeNormalization;

use crate::errors::{KabosuError, Result};
use crate::input::InputTextBuilder;

/// 標準の入力テキスト正規化プラグイン。
#[derive(Default)]
pub struct DefaultInputTextPlugin {
    ignore_normalize: Vec<String>,
    // ordered replacement pairs, applied before normalization
    replace_char_map: Vec<(Vec<char>, String)>,
}

impl DefaultInputTextPlugin {
    /// 定義なしでプラグインを構築します。
    ///
    /// すべての文字が小文字化とNFKC正規化の対象になります。
    pub fn new() -> Self {
        Self::default()
    }

    /// `rewrite.def`形式の定義からプラグインを構築します。
    ///
    /// 1カラムの行は正規化を行わない文字、2カラムの行は置換ペアです。
    /// `#`で始まる行は無視されます。
    ///
    /// # エラー
    ///
    /// 置換元が重複している場合やカラム数が不正な場合にエラーを返します。
    pub fn from_rewrite_def(rewrite_def: &str) -> Result<Self> {
        let mut plugin = Self::default();
        for (i, line) in rewrite_def.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cols: Vec<_> = line.split_whitespace().collect();
            match cols.len() {
                1 => plugin.ignore_normalize.push(cols[0].to_string()),
                2 => {
                    let before: Vec<char> = cols[0].chars().collect();
                    if plugin
                        .replace_char_map
                        .iter()
                        .any(|(b, _)| *b == before)
                    {
                        return Err(KabosuError::invalid_format(
                            "rewriteDef",
                            format!("{} is already defined at line {}", cols[0], i + 1),
                        ));
                    }
                    plugin.replace_char_map.push((before, cols[1].to_string()));
                }
                _ => {
                    return Err(KabosuError::invalid_format(
                        "rewriteDef",
                        format!("invalid format at line {}", i + 1),
                    ));
                }
            }
        }
        Ok(plugin)
    }

    pub(crate) fn rewrite(&self, builder: &mut InputTextBuilder) -> Result<()> {
        let text: Vec<char> = builder.chars().to_vec();
        // The builder indices shift as replacements change the length;
        // offset carries the accumulated shift for the snapshot positions.
        let mut offset = 0isize;
        let mut next_offset = 0isize;

        let mut i = 0;
        while i < text.len() {
            offset += next_offset;
            next_offset = 0;

            // 1. replace chars without normalization
            if let Some((before, after)) = self
                .replace_char_map
                .iter()
                .find(|(before, _)| text[i..].starts_with(before))
            {
                let begin = (i as isize + offset) as usize;
                builder.replace(begin..begin + before.len(), after)?;
                next_offset += after.chars().count() as isize - before.len() as isize;
                i += before.len();
                continue;
            }

            // 2. lowercase, then normalize unless listed as ignored
            let c = text[i];
            let lower: String = c.to_lowercase().collect();
            let replacement = if self.ignore_normalize.contains(&lower) {
                lower
            } else {
                lower.nfkc().collect::<String>()
            };
            if replacement.chars().ne(std::iter::once(c)) {
                let begin = (i as isize + offset) as usize;
                builder.replace(begin..begin + 1, &replacement)?;
                next_offset += replacement.chars().count() as isize - 1;
            }
            i += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::character::CharacterCategory;

    fn rewrite(plugin: &DefaultInputTextPlugin, text: &str) -> String {
        let category = CharacterCategory::default();
        let mut builder = InputTextBuilder::new(text, &category);
        plugin.rewrite(&mut builder).unwrap();
        builder.text()
    }

    #[test]
    fn test_nfkc_normalization() {
        let plugin = DefaultInputTextPlugin::new();
        assert_eq!(rewrite(&plugin, "ＡＢＣ"), "abc");
        assert_eq!(rewrite(&plugin, "ｱｲｳ"), "アイウ");
        assert_eq!(rewrite(&plugin, "①"), "1");
    }

    #[test]
    fn test_lowercase() {
        let plugin = DefaultInputTextPlugin::new();
        assert_eq!(rewrite(&plugin, "ABCdef"), "abcdef");
        assert_eq!(rewrite(&plugin, "Ω"), "ω");
    }

    #[test]
    fn test_ignore_normalize() {
        // Ⅲ would expand to "iii" under lowercasing + NFKC; listing the
        // lowercased form ⅲ keeps it as a single character.
        let plugin = DefaultInputTextPlugin::from_rewrite_def("ⅲ").unwrap();
        assert_eq!(rewrite(&plugin, "Ⅲ"), "ⅲ");
        assert_eq!(rewrite(&plugin, "ⅲ"), "ⅲ");

        let plain = DefaultInputTextPlugin::new();
        assert_eq!(rewrite(&plain, "Ⅲ"), "iii");
    }

    #[test]
    fn test_replace_pairs() {
        let plugin = DefaultInputTextPlugin::from_rewrite_def("ｳﾞ ヴ").unwrap();
        assert_eq!(rewrite(&plugin, "ｳﾞｨｯﾄ"), "ヴィット");
    }

    #[test]
    fn test_duplicated_replace_source() {
        assert!(DefaultInputTextPlugin::from_rewrite_def("ｳﾞ ヴ\nｳﾞ ブ").is_err());
    }

    #[test]
    fn test_idempotence() {
        let plugin = DefaultInputTextPlugin::new();
        let once = rewrite(&plugin, "ＡＢＣｱｲｳ①Ω");
        let twice = rewrite(&plugin, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_offsets_through_shrinking_rewrite() {
        let category = CharacterCategory::default();
        let plugin = DefaultInputTextPlugin::from_rewrite_def("ｺﾞ ゴ").unwrap();
        let mut builder = InputTextBuilder::new("アｺﾞア", &category);
        plugin.rewrite(&mut builder).unwrap();
        let input = builder.build();
        assert_eq!(input.text(), "アゴア");
        // ゴ inherits the original position of ｺ.
        assert_eq!(input.original_index(3), 1);
        // ア after the collapsed pair maps back to its own position.
        assert_eq!(input.original_index(6), 3);
    }
}
