//! 正規表現に基づく未知語プラグイン
//!
//! オフセットに固定された正規表現マッチで未知語を生成します。
//! 同じ境界の単語が辞書に存在する場合や、前の未知語プラグインが
//! 生成済みの場合はノードを生成しません。

use regex::Regex;

use crate::common::WordMask;
use crate::dictionary::grammar::{Grammar, PartOfSpeech, WordParam};
use crate::dictionary::word_info::WordInfo;
use crate::errors::{KabosuError, Result};
use crate::input::InputText;
use crate::lattice::Node;

/// マッチ境界の扱い。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryMode {
    /// 文字カテゴリ連続区間の内側からのマッチを拒否します。
    #[default]
    Strict,
    /// 任意の位置からのマッチを許可します。
    Relaxed,
}

/// 正規表現に基づく未知語プラグイン。
pub struct RegexOovProvider {
    pattern: Regex,
    param: WordParam,
    pos_id: u16,
    // lookahead window in code points
    max_length: usize,
    boundaries: BoundaryMode,
}

impl RegexOovProvider {
    /// 正規表現と接続パラメータからプラグインを構築します。
    ///
    /// パターンは先頭固定でない場合`^`が前置されます。
    /// 品詞は文法に登録されます。
    ///
    /// # 引数
    ///
    /// * `regex` - マッチさせる正規表現
    /// * `param` - 生成ノードの接続パラメータ
    /// * `pos` - 生成ノードの品詞
    /// * `max_length` - 先読み窓の長さ（コードポイント単位）
    /// * `boundaries` - マッチ境界の扱い
    /// * `grammar` - 品詞を解決する文法
    ///
    /// # エラー
    ///
    /// 正規表現が不正な場合にエラーを返します。
    pub fn new(
        regex: &str,
        param: WordParam,
        pos: PartOfSpeech,
        max_length: usize,
        boundaries: BoundaryMode,
        grammar: &mut Grammar,
    ) -> Result<Self> {
        let anchored = if regex.starts_with('^') {
            regex.to_string()
        } else {
            format!("^{regex}")
        };
        let pattern = Regex::new(&anchored).map_err(|e| {
            KabosuError::invalid_argument("regex", format!("invalid pattern {anchored}: {e}"))
        })?;
        let pos_id = grammar.pos_id_or_insert(pos);
        Ok(Self {
            pattern,
            param,
            pos_id,
            max_length,
            boundaries,
        })
    }

    pub(crate) fn provide(
        &self,
        input: &InputText,
        offset: usize,
        other_words: WordMask,
        nodes: &mut Vec<Node>,
    ) -> Result<()> {
        if self.boundaries == BoundaryMode::Strict && offset > 0 {
            let current = input.char_category_continuous_length(offset);
            let previous = input.char_category_continuous_length(offset - 1);
            // inside a single character category run
            if current + 1 == previous {
                return Ok(());
            }
        }

        let window = input.code_points_offset_length(offset, self.max_length);
        let haystack = input.substring(offset, offset + window);
        let Some(found) = self.pattern.find(haystack) else {
            return Ok(());
        };
        debug_assert_eq!(found.start(), 0);

        let match_bytes = found.end();
        if match_bytes == 0 {
            return Ok(());
        }
        let match_code_points = input.code_point_count(offset, offset + match_bytes);
        if other_words.has_nth(match_code_points) {
            if match_code_points > WordMask::MAX_LENGTH {
                // The mask saturates; check the real boundaries instead.
                let end = offset + match_bytes;
                if nodes.iter().any(|node| node.end == end) {
                    return Ok(());
                }
            } else {
                return Ok(());
            }
        }

        let surface = found.as_str();
        let info = WordInfo::synthesized(
            surface,
            match_bytes as u16,
            self.pos_id,
            surface,
            surface,
            "",
        );
        nodes.push(Node::for_oov(self.param, info));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::character::CharacterCategory;
    use crate::input::InputTextBuilder;
    use crate::plugin::oov::OovProviderPlugin;

    fn plugin(regex: &str, boundaries: BoundaryMode) -> OovProviderPlugin {
        let pattern = if regex.starts_with('^') {
            regex.to_string()
        } else {
            format!("^{regex}")
        };
        OovProviderPlugin::Regex(RegexOovProvider {
            pattern: Regex::new(&pattern).unwrap(),
            param: WordParam::new(0, 0, 5000),
            pos_id: 0,
            max_length: 32,
            boundaries,
        })
    }

    fn char_category() -> CharacterCategory {
        CharacterCategory::from_reader(
            "0x0030..0x0039 NUMERIC\n0x0041..0x005A ALPHA\n0x0061..0x007A ALPHA".as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_match_from_offset() {
        let category = char_category();
        let input = InputTextBuilder::new("abc-012", &category).build();
        let p = plugin("[0-9a-z-]+", BoundaryMode::Relaxed);

        let mut nodes = vec![];
        p.provide(&input, 0, WordMask::default(), &mut nodes).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].begin, 0);
        assert_eq!(nodes[0].end, 7);
        assert_eq!(nodes[0].inline_word_info().unwrap().surface, "abc-012");
    }

    #[test]
    fn test_no_match() {
        let category = char_category();
        let input = InputTextBuilder::new("あいう", &category).build();
        let p = plugin("[0-9a-z-]+", BoundaryMode::Relaxed);

        let mut nodes = vec![];
        p.provide(&input, 0, WordMask::default(), &mut nodes).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_masked_length_rejected() {
        let category = char_category();
        let input = InputTextBuilder::new("abc", &category).build();
        let p = plugin("[a-z]+", BoundaryMode::Relaxed);

        let mut mask = WordMask::default();
        mask.add_nth(3);
        let mut nodes = vec![];
        p.provide(&input, 0, mask, &mut nodes).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_strict_boundaries() {
        let category = char_category();
        let input = InputTextBuilder::new("abc", &category).build();
        let p = plugin("[a-z]+", BoundaryMode::Strict);

        // Offset 1 is inside the ALPHA run.
        let mut nodes = vec![];
        p.provide(&input, 1, WordMask::default(), &mut nodes).unwrap();
        assert!(nodes.is_empty());

        let relaxed = plugin("[a-z]+", BoundaryMode::Relaxed);
        let mut nodes = vec![];
        relaxed
            .provide(&input, 1, WordMask::default(), &mut nodes)
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].begin, 1);
        assert_eq!(nodes[0].end, 3);
    }
}
