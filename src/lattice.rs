//! ラティス構造とViterbi探索
//!
//! このモジュールは、形態素解析のためのラティス構造を提供します。
//! ラティスは候補単語区間のノードからなる有向非巡回グラフで、
//! ノードの挿入時に最小コストの先行ノードを記録することで
//! Viterbi探索を実現します。
//!
//! ノードはラティス内のアリーナ（終端バイト位置ごとのバケット）に
//! 所有され、バックポインタは参照ではなくインデックスの組で表現されます。

use std::sync::LazyLock;

use crate::common::BOS_EOS_CONNECTION_ID;
use crate::dictionary::connector::{MatrixConnector, INHIBITED_CONNECTION};
use crate::dictionary::grammar::WordParam;
use crate::dictionary::lexicon_set::LexiconSet;
use crate::dictionary::word_id::WordId;
use crate::dictionary::word_info::WordInfo;
use crate::errors::{KabosuError, Result};

const MAX_COST: i32 = i32::MAX;

static UNDEFINED_WORD_INFO: LazyLock<WordInfo> =
    LazyLock::new(|| WordInfo::synthesized("(null)", 0, u16::MAX, "(null)", "(null)", "(null)"));

/// ラティス内のノード。
///
/// 1つの候補単語区間を表し、位置情報、接続ID、累積コスト、
/// 最小コストパスのバックポインタを保持します。
#[derive(Clone, Debug)]
pub struct Node {
    /// 開始バイト位置
    pub begin: usize,
    /// 終端バイト位置
    pub end: usize,
    /// 左文脈ID
    pub left_id: u16,
    /// 右文脈ID
    pub right_id: u16,
    /// 単語の生起コスト
    pub cost: i16,
    /// 単語ID
    pub word_id: WordId,
    /// BOSからこのノードまでの累積コスト
    pub total_cost: i32,
    /// 未知語プラグインが生成したノードかどうか
    pub is_oov: bool,
    // (end bucket, index in the bucket) of the best predecessor
    best_previous: Option<(usize, u32)>,
    is_connected_to_bos: bool,
    extra_word_info: Option<WordInfo>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            begin: 0,
            end: 0,
            left_id: 0,
            right_id: 0,
            cost: 0,
            word_id: WordId::UNDEFINED,
            total_cost: MAX_COST,
            is_oov: false,
            best_previous: None,
            is_connected_to_bos: false,
            extra_word_info: None,
        }
    }
}

impl Node {
    /// 辞書に登録された単語のノードを作成します。
    pub fn for_word(word_id: WordId, param: WordParam) -> Self {
        Self {
            left_id: param.left_id,
            right_id: param.right_id,
            cost: param.cost,
            word_id,
            ..Default::default()
        }
    }

    /// 未知語のノードを作成します。
    pub fn for_oov(param: WordParam, word_info: WordInfo) -> Self {
        Self {
            left_id: param.left_id,
            right_id: param.right_id,
            cost: param.cost,
            word_id: WordId::oov(),
            is_oov: true,
            extra_word_info: Some(word_info),
            ..Default::default()
        }
    }

    /// パス書き換えが合成したノードを作成します。
    ///
    /// 未知語フラグは付きません。
    pub fn synthesized(word_info: WordInfo) -> Self {
        Self {
            word_id: WordId::oov(),
            extra_word_info: Some(word_info),
            ..Default::default()
        }
    }

    /// ノードの単語情報を返します。
    ///
    /// 未知語や合成ノードはインラインの情報を、辞書語は辞書の情報を
    /// 返します。
    pub fn word_info<'a>(&'a self, lexicon: &'a LexiconSet) -> &'a WordInfo {
        if let Some(info) = self.extra_word_info.as_ref() {
            return info;
        }
        lexicon
            .word_info(self.word_id)
            .unwrap_or(&UNDEFINED_WORD_INFO)
    }

    /// インラインの単語情報を設定します。
    pub fn set_word_info(&mut self, word_info: WordInfo) {
        self.extra_word_info = Some(word_info);
    }

    /// インラインの単語情報を返します。
    ///
    /// 辞書語のノードは`None`を返します。
    #[inline(always)]
    pub fn inline_word_info(&self) -> Option<&WordInfo> {
        self.extra_word_info.as_ref()
    }

    /// このノードがBOSから到達可能かを返します。
    #[inline(always)]
    pub fn is_connected_to_bos(&self) -> bool {
        self.is_connected_to_bos
    }

    fn bos() -> Self {
        Self {
            left_id: u16::MAX,
            right_id: BOS_EOS_CONNECTION_ID,
            total_cost: 0,
            is_connected_to_bos: true,
            ..Default::default()
        }
    }
}

/// Viterbi探索のためのラティス。
///
/// `ends[e]`はバイト位置`e`で終わるノードのバケットです。
/// BOSは`ends[0]`に置かれ、EOSは最良パス抽出時に接続されます。
/// バケットは文をまたいで再利用され、メモリ割り当てを避けます。
#[derive(Default)]
pub struct Lattice {
    ends: Vec<Vec<Node>>,
    size: usize,
}

impl Lattice {
    /// 新しい空のラティスを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// ラティスをリセットし、`size`バイトのテキストの処理を準備します。
    pub fn reset(&mut self, size: usize) {
        for bucket in self.ends.iter_mut() {
            bucket.clear();
        }
        let cur_len = self.ends.len();
        if cur_len <= size {
            self.ends.reserve(size + 1 - cur_len);
            for _ in cur_len..=size {
                self.ends.push(Vec::with_capacity(16));
            }
        }
        self.size = size;
        self.ends[0].push(Node::bos());
    }

    /// 設定されたテキストのバイト長を返します。
    #[inline(always)]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// バイト位置`i`で終わるノードが存在するかを返します。
    #[inline(always)]
    pub fn has_previous_node(&self, i: usize) -> bool {
        self.ends.get(i).map(|b| !b.is_empty()).unwrap_or(false)
    }

    /// ノードをラティスに挿入します。
    ///
    /// 挿入時に最小コストの先行ノードが計算され、バックポインタとして
    /// 記録されます。`begin`で終わるノードはすべて挿入済みである
    /// 必要があります。
    ///
    /// # 引数
    ///
    /// * `begin` - 開始バイト位置
    /// * `end` - 終端バイト位置
    /// * `node` - 挿入するノード
    /// * `connector` - 接続コスト行列
    pub fn insert(&mut self, begin: usize, end: usize, mut node: Node, connector: &MatrixConnector) {
        debug_assert!(begin < end);
        debug_assert!(end <= self.size);
        node.begin = begin;
        node.end = end;
        self.connect(&mut node, connector);
        self.ends[end].push(node);
    }

    /// ノードを先行ノードに接続し、累積コストを計算します。
    ///
    /// 同点の場合は最初に挿入されたノードが選ばれます。
    fn connect(&self, node: &mut Node, connector: &MatrixConnector) {
        node.total_cost = MAX_COST;
        node.best_previous = None;
        for (i, left_node) in self.ends[node.begin].iter().enumerate() {
            if !left_node.is_connected_to_bos {
                continue;
            }
            let connect_cost = connector.cost(left_node.right_id, node.left_id);
            if connect_cost == INHIBITED_CONNECTION {
                continue;
            }
            let cost = left_node.total_cost + i32::from(connect_cost);
            if cost < node.total_cost {
                node.total_cost = cost;
                node.best_previous = Some((node.begin, i as u32));
            }
        }
        node.is_connected_to_bos = node.best_previous.is_some();
        node.total_cost = node.total_cost.saturating_add(i32::from(node.cost));
    }

    /// EOSを接続し、最良パスを返します。
    ///
    /// BOSとEOSはパスに含まれません。
    ///
    /// # エラー
    ///
    /// EOSがBOSから到達できない場合、内部整合性エラーを返します。
    /// 少なくとも1つの未知語プラグインが全位置を被覆していれば
    /// 発生しません。
    pub fn best_path(&self, connector: &MatrixConnector) -> Result<Vec<Node>> {
        let mut eos = Node {
            begin: self.size,
            end: self.size,
            left_id: BOS_EOS_CONNECTION_ID,
            right_id: u16::MAX,
            ..Default::default()
        };
        self.connect(&mut eos, connector);
        if !eos.is_connected_to_bos {
            return Err(KabosuError::invalid_state(
                "EOS is not connected to BOS",
                "the lattice is broken",
            ));
        }

        let mut path = vec![];
        let mut current = eos.best_previous;
        while let Some((bucket, index)) = current {
            if bucket == 0 {
                // ends[0] holds only the BOS sentinel.
                break;
            }
            let node = &self.ends[bucket][index as usize];
            path.push(node.clone());
            current = node.best_previous;
        }
        path.reverse();
        Ok(path)
    }

    /// 指定区間を持つノードのうち累積コストが最小のものを返します。
    ///
    /// 同点の場合は最初に挿入されたノードが選ばれます。
    pub fn min_cost_node(&self, begin: usize, end: usize) -> Option<&Node> {
        let mut min: Option<&Node> = None;
        for node in self.ends.get(end)?.iter() {
            if node.begin != begin || !node.is_connected_to_bos {
                continue;
            }
            if min.map(|m| node.total_cost < m.total_cost).unwrap_or(true) {
                min = Some(node);
            }
        }
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector() -> MatrixConnector {
        // 2x2 matrix: all connections cost 0 except (1, 1) = 10
        MatrixConnector::from_reader("2 2\n0 0 0\n0 1 0\n1 0 0\n1 1 10".as_bytes()).unwrap()
    }

    fn word_node(left_id: u16, right_id: u16, cost: i16) -> Node {
        Node::for_word(WordId::new(0, 0), WordParam::new(left_id, right_id, cost))
    }

    #[test]
    fn test_best_path_prefers_min_cost() {
        let connector = connector();
        let mut lattice = Lattice::new();
        lattice.reset(6);
        // Two segmentations of a six-byte input: [0,6) vs [0,3)+[3,6).
        lattice.insert(0, 3, word_node(0, 0, 1), &connector);
        lattice.insert(0, 6, word_node(0, 0, 5), &connector);
        lattice.insert(3, 6, word_node(0, 0, 3), &connector);

        let path = lattice.best_path(&connector).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].begin, 0);
        assert_eq!(path[0].end, 3);
        assert_eq!(path[0].total_cost, 1);
        assert_eq!(path[1].end, 6);
        assert_eq!(path[1].total_cost, 4);
    }

    #[test]
    fn test_connection_cost_changes_path() {
        let connector = connector();
        let mut lattice = Lattice::new();
        lattice.reset(6);
        // The split path pays the (1, 1) connection cost of 10.
        lattice.insert(0, 3, word_node(0, 1, 1), &connector);
        lattice.insert(0, 6, word_node(0, 0, 5), &connector);
        lattice.insert(3, 6, word_node(1, 0, 3), &connector);

        let path = lattice.best_path(&connector).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].total_cost, 5);
    }

    #[test]
    fn test_tie_break_keeps_first_inserted() {
        let connector = connector();
        let mut lattice = Lattice::new();
        lattice.reset(3);
        let mut first = word_node(0, 0, 1);
        first.word_id = WordId::new(0, 7);
        let mut second = word_node(0, 0, 1);
        second.word_id = WordId::new(0, 8);
        lattice.insert(0, 3, first, &connector);
        lattice.insert(0, 3, second, &connector);

        let path = lattice.best_path(&connector).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].word_id, WordId::new(0, 7));
    }

    #[test]
    fn test_unreachable_eos() {
        let connector = connector();
        let mut lattice = Lattice::new();
        lattice.reset(6);
        lattice.insert(0, 3, word_node(0, 0, 1), &connector);
        // Nothing reaches byte 6.
        assert!(lattice.best_path(&connector).is_err());
    }

    #[test]
    fn test_min_cost_node() {
        let connector = connector();
        let mut lattice = Lattice::new();
        lattice.reset(3);
        lattice.insert(0, 3, word_node(0, 0, 4), &connector);
        lattice.insert(0, 3, word_node(0, 0, 2), &connector);
        lattice.insert(0, 3, word_node(0, 0, 2), &connector);

        let min = lattice.min_cost_node(0, 3).unwrap();
        assert_eq!(min.total_cost, 2);
        assert!(lattice.min_cost_node(1, 3).is_none());
    }

    #[test]
    fn test_reset_reuses_buckets() {
        let connector = connector();
        let mut lattice = Lattice::new();
        lattice.reset(6);
        lattice.insert(0, 6, word_node(0, 0, 1), &connector);
        assert!(lattice.has_previous_node(6));

        lattice.reset(3);
        assert!(lattice.has_previous_node(0));
        assert!(!lattice.has_previous_node(3));
        assert!(!lattice.has_previous_node(6));
    }
}
