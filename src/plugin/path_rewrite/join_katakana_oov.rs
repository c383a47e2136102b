//! カタカナ連続区間の連結プラグイン
//!
//! 未知語または短いカタカナ形態素を含むカタカナ連続区間を
//! 1つの未知語形態素に連結します。

use crate::dictionary::character::CategoryType;
use crate::dictionary::grammar::{Grammar, PartOfSpeech};
use crate::dictionary::lexicon_set::LexiconSet;
use crate::errors::Result;
use crate::input::InputText;
use crate::lattice::{Lattice, Node};
use crate::plugin::path_rewrite::concatenate_oov;

/// カタカナ連続区間の連結プラグイン。
///
/// パス中の隣接するカタカナ形態素の最大連続区間のうち、
/// 少なくとも1つの未知語または`min_length`未満の形態素を含むものを
/// 1つの未知語ノードに畳み込みます。
pub struct JoinKatakanaOovPlugin {
    oov_pos_id: u16,
    min_length: usize,
}

impl JoinKatakanaOovPlugin {
    /// 連結後の品詞と最小長からプラグインを構築します。
    ///
    /// 品詞は文法に登録されます。
    ///
    /// # 引数
    ///
    /// * `pos` - 連結後の未知語ノードの品詞
    /// * `min_length` - 連結対象とみなす形態素長の下限（コードポイント単位）
    pub fn new(pos: PartOfSpeech, min_length: usize, grammar: &mut Grammar) -> Self {
        Self {
            oov_pos_id: grammar.pos_id_or_insert(pos),
            min_length,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_pos_id(oov_pos_id: u16, min_length: usize) -> Self {
        Self {
            oov_pos_id,
            min_length,
        }
    }

    pub(crate) fn rewrite(
        &self,
        input: &InputText,
        path: &mut Vec<Node>,
        lattice: &Lattice,
        lexicon: &LexiconSet,
    ) -> Result<()> {
        let mut i = 0;
        while i < path.len() {
            let node = &path[i];
            if !((node.is_oov || self.is_shorter(input, node)) && is_katakana_node(input, node)) {
                i += 1;
                continue;
            }

            let mut begin = i;
            while begin > 0 && is_katakana_node(input, &path[begin - 1]) {
                begin -= 1;
            }
            let mut end = i + 1;
            while end < path.len() && is_katakana_node(input, &path[end]) {
                end += 1;
            }
            // A merged span must not begin on a character that cannot begin
            // an OOV word.
            while begin != end && !can_oov_bow_node(input, &path[begin]) {
                begin += 1;
            }
            if end - begin > 1 {
                concatenate_oov(path, begin, end, self.oov_pos_id, lattice, lexicon)?;
                i = begin + 1;
            }
            i += 1;
        }
        Ok(())
    }

    fn is_shorter(&self, input: &InputText, node: &Node) -> bool {
        input.code_point_count(node.begin, node.end) < self.min_length
    }
}

fn is_katakana_node(input: &InputText, node: &Node) -> bool {
    input
        .char_category_types_range(node.begin, node.end)
        .contains(CategoryType::Katakana)
}

fn can_oov_bow_node(input: &InputText, node: &Node) -> bool {
    !input
        .char_category_types_at(node.begin)
        .contains(CategoryType::NoOovBow)
}
