//! パス書き換えプラグイン
//!
//! このモジュールは、Viterbi探索後の最良パスを書き換えるプラグインを
//! 提供します。プラグインはパスとともに探索済みのラティスを受け取り、
//! 既存ノードの再利用や置換ノードの合成を行います。再探索は行われません。

pub mod join_katakana_oov;
pub mod join_numeric;

use crate::dictionary::lexicon_set::LexiconSet;
use crate::errors::{KabosuError, Result};
use crate::input::InputText;
use crate::lattice::{Lattice, Node};

pub use crate::plugin::path_rewrite::join_katakana_oov::JoinKatakanaOovPlugin;
pub use crate::plugin::path_rewrite::join_numeric::JoinNumericPlugin;

/// パス書き換えプラグインの閉じたバリアント集合。
pub enum PathRewritePlugin {
    /// カタカナ連続区間の連結
    JoinKatakanaOov(JoinKatakanaOovPlugin),
    /// 数値連続区間の連結と正規化
    JoinNumeric(JoinNumericPlugin),
}

impl PathRewritePlugin {
    /// 最良パスをその場で書き換えます。
    ///
    /// # 引数
    ///
    /// * `input` - 入力テキスト
    /// * `path` - 書き換える最良パス
    /// * `lattice` - 探索済みのラティス
    /// * `lexicon` - 統合語彙
    pub fn rewrite(
        &self,
        input: &InputText,
        path: &mut Vec<Node>,
        lattice: &Lattice,
        lexicon: &LexiconSet,
    ) -> Result<()> {
        match self {
            Self::JoinKatakanaOov(p) => p.rewrite(input, path, lattice, lexicon),
            Self::JoinNumeric(p) => p.rewrite(input, path, lattice, lexicon),
        }
    }
}

/// パス中の連続するノード列を1つのノードに連結します。
///
/// 連結後のノードは先頭ノードの品詞を引き継ぎます。
/// `normalized_form`が`None`の場合、各ノードの正規化形が連結されます。
///
/// # 戻り値
///
/// パスから取り除かれたノード数
pub(crate) fn concatenate(
    path: &mut Vec<Node>,
    begin: usize,
    end: usize,
    lexicon: &LexiconSet,
    normalized_form: Option<String>,
) -> Result<usize> {
    if begin >= end {
        return Err(KabosuError::invalid_argument("begin", "begin >= end"));
    }
    let byte_begin = path[begin].begin;
    let byte_end = path[end - 1].end;
    let pos_id = path[begin].word_info(lexicon).pos_id;

    let mut surface = String::new();
    let mut normalized = String::new();
    let mut dictionary_form = String::new();
    let mut reading_form = String::new();
    for node in &path[begin..end] {
        let info = node.word_info(lexicon);
        surface.push_str(&info.surface);
        if normalized_form.is_none() {
            normalized.push_str(&info.normalized_form);
        }
        dictionary_form.push_str(&info.dictionary_form);
        reading_form.push_str(&info.reading_form);
    }

    let info = crate::dictionary::word_info::WordInfo::synthesized(
        surface,
        (byte_end - byte_begin) as u16,
        pos_id,
        normalized_form.unwrap_or(normalized),
        dictionary_form,
        reading_form,
    );
    let mut node = Node::synthesized(info);
    node.begin = byte_begin;
    node.end = byte_end;

    path.splice(begin..end, [node]);
    Ok(end - begin - 1)
}

/// パス中の連続するノード列を未知語ノードに連結します。
///
/// 同じ区間のノードがラティスに存在する場合、そのうち最小コストの
/// ノードを再利用します。存在しない場合は指定の品詞を持つ
/// 未知語ノードを合成します。
///
/// # 戻り値
///
/// パスから取り除かれたノード数
pub(crate) fn concatenate_oov(
    path: &mut Vec<Node>,
    begin: usize,
    end: usize,
    pos_id: u16,
    lattice: &Lattice,
    lexicon: &LexiconSet,
) -> Result<usize> {
    if begin >= end {
        return Err(KabosuError::invalid_argument("begin", "begin >= end"));
    }
    let byte_begin = path[begin].begin;
    let byte_end = path[end - 1].end;

    let node = match lattice.min_cost_node(byte_begin, byte_end) {
        Some(existing) => existing.clone(),
        None => {
            let mut surface = String::new();
            for node in &path[begin..end] {
                surface.push_str(&node.word_info(lexicon).surface);
            }
            let info = crate::dictionary::word_info::WordInfo::synthesized(
                surface.clone(),
                (byte_end - byte_begin) as u16,
                pos_id,
                surface.clone(),
                surface,
                "",
            );
            let mut node = Node::for_oov(crate::dictionary::grammar::WordParam::default(), info);
            node.begin = byte_begin;
            node.end = byte_end;
            node
        }
    };

    path.splice(begin..end, [node]);
    Ok(end - begin - 1)
}
