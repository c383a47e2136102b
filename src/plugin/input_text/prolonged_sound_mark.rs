//! 長音記号の畳み込みプラグイン
//!
//! 長音記号（ー）とそのUnicode異体字の連続を1文字に畳み込みます。

use crate::errors::Result;
use crate::input::InputTextBuilder;

/// デフォルトで長音記号として扱う文字。
///
/// 全角の長音記号、半角の長音記号、水平線・ハイフン・マイナス記号の
/// 見た目が近い文字を含みます。
pub const DEFAULT_PROLONGED_SOUND_MARKS: &[char] = &['ー', 'ｰ', '―', '‐', '−'];

/// 長音記号の畳み込みプラグイン。
pub struct ProlongedSoundMarkPlugin {
    marks: Vec<char>,
    replacement: String,
}

impl Default for ProlongedSoundMarkPlugin {
    fn default() -> Self {
        Self::new(DEFAULT_PROLONGED_SOUND_MARKS.to_vec(), "ー".to_string())
    }
}

impl ProlongedSoundMarkPlugin {
    /// 長音記号の集合と置換後の文字列からプラグインを構築します。
    pub fn new(marks: Vec<char>, replacement: String) -> Self {
        Self { marks, replacement }
    }

    pub(crate) fn rewrite(&self, builder: &mut InputTextBuilder) -> Result<()> {
        let text: Vec<char> = builder.chars().to_vec();
        let n = text.len();
        let replacement_len = self.replacement.chars().count();

        let mut offset = 0usize;
        let mut mark_start = n;
        let mut in_run = false;
        for i in 0..n {
            let is_mark = self.marks.contains(&text[i]);
            if !in_run && is_mark {
                in_run = true;
                mark_start = i;
            } else if in_run && !is_mark {
                if i - mark_start > 1 {
                    builder.replace(mark_start - offset..i - offset, &self.replacement)?;
                    offset += i - mark_start - replacement_len;
                }
                in_run = false;
            }
        }
        if in_run && n - mark_start > 1 {
            builder.replace(mark_start - offset..n - offset, &self.replacement)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::character::CharacterCategory;

    fn rewrite(text: &str) -> String {
        let category = CharacterCategory::default();
        let plugin = ProlongedSoundMarkPlugin::default();
        let mut builder = InputTextBuilder::new(text, &category);
        plugin.rewrite(&mut builder).unwrap();
        builder.text()
    }

    #[test]
    fn test_collapse_run() {
        assert_eq!(rewrite("ゴーール"), "ゴール");
        assert_eq!(rewrite("スーーパーーー"), "スーパー");
    }

    #[test]
    fn test_single_mark_unchanged() {
        assert_eq!(rewrite("ゴール"), "ゴール");
    }

    #[test]
    fn test_mixed_marks() {
        assert_eq!(rewrite("ウィーーｰ―ン"), "ウィーン");
    }

    #[test]
    fn test_trailing_run() {
        assert_eq!(rewrite("わーーー"), "わー");
    }

    #[test]
    fn test_offsets_after_collapse() {
        let category = CharacterCategory::default();
        let plugin = ProlongedSoundMarkPlugin::default();
        let mut builder = InputTextBuilder::new("ゴーーール", &category);
        plugin.rewrite(&mut builder).unwrap();
        let input = builder.build();
        assert_eq!(input.text(), "ゴール");
        assert_eq!(input.original_index(0), 0);
        assert_eq!(input.original_index(3), 1);
        // ル maps back to its original position after the collapsed run.
        assert_eq!(input.original_index(6), 4);
    }
}
