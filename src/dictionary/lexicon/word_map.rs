//! 表層形から単語IDへのマッピング
//!
//! このモジュールは、ダブル配列トライとポスティングリストを組み合わせて、
//! 同じ表層形を持つ複数の単語を扱えるマップを提供します。

use std::collections::BTreeMap;

use rkyv::{Archive, Deserialize, Serialize};
use yada::builder::DoubleArrayBuilder;
use yada::DoubleArray;

use crate::errors::{KabosuError, Result};

/// 表層形から単語IDへのマップ。
///
/// トライは表層形からポスティングリストのオフセットを引き、
/// ポスティングリストが同一表層形の単語ID群を保持します。
#[derive(Archive, Serialize, Deserialize, Clone)]
pub struct WordMap {
    trie: Vec<u8>,
    postings: Postings,
}

impl WordMap {
    /// 表層形のイテレータから新しいインスタンスを作成します。
    ///
    /// i番目の表層形には単語ID `i` が割り当てられます。
    pub fn new<I, W>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let mut b = WordMapBuilder::new();
        for (i, w) in words.into_iter().enumerate() {
            b.add_record(w.as_ref().to_string(), u32::try_from(i)?);
        }
        b.build()
    }

    /// 入力バイト列の接頭辞に一致するすべての単語を返します。
    ///
    /// # 引数
    ///
    /// * `input` - 検索対象のバイト列
    ///
    /// # 戻り値
    ///
    /// `(単語ID, 一致したバイト長)`のベクタ
    pub fn common_prefix_search(&self, input: &[u8]) -> Vec<(u32, usize)> {
        if self.trie.is_empty() {
            return vec![];
        }
        let da = DoubleArray::new(self.trie.as_slice());
        let mut results = vec![];
        for (offset, length) in da.common_prefix_search(input) {
            for word_id in self.postings.ids(offset as usize) {
                results.push((word_id, length));
            }
        }
        results
    }
}

/// 単語マップを構築するビルダー。
#[derive(Default)]
pub struct WordMapBuilder {
    map: BTreeMap<String, Vec<u32>>,
}

impl WordMapBuilder {
    /// 新しいインスタンスを作成します。
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// 表層形と単語IDの組を追加します。
    #[inline(always)]
    pub fn add_record(&mut self, word: String, id: u32) {
        self.map.entry(word).or_default().push(id);
    }

    /// マップを構築します。
    ///
    /// # エラー
    ///
    /// トライの構築に失敗した場合にエラーを返します。
    pub fn build(self) -> Result<WordMap> {
        let mut keyset = Vec::with_capacity(self.map.len());
        let mut builder = PostingsBuilder::new();
        // BTreeMap iteration provides the byte-sorted key order the
        // double-array builder requires.
        for (word, ids) in &self.map {
            let offset = builder.push(ids)?;
            keyset.push((word.as_bytes(), offset));
        }
        let trie = if keyset.is_empty() {
            Vec::new()
        } else {
            DoubleArrayBuilder::build(&keyset).ok_or_else(|| {
                KabosuError::invalid_argument("words", "Failed to build a double-array trie")
            })?
        };
        Ok(WordMap {
            trie,
            postings: builder.build(),
        })
    }
}

/// 同一表層形の単語ID群を保持するポスティングリスト。
///
/// 各リストは`[長さ, ID...]`の形でフラットな配列に格納されます。
#[derive(Archive, Serialize, Deserialize, Clone, Default)]
pub struct Postings {
    data: Vec<u32>,
}

impl Postings {
    /// 指定オフセットの単語ID群を返すイテレータを取得します。
    #[inline(always)]
    pub fn ids(&self, offset: usize) -> impl Iterator<Item = u32> + '_ {
        let len = self.data[offset] as usize;
        self.data[offset + 1..offset + 1 + len].iter().copied()
    }
}

/// ポスティングリストを構築するビルダー。
#[derive(Default)]
pub struct PostingsBuilder {
    data: Vec<u32>,
}

impl PostingsBuilder {
    /// 新しいインスタンスを作成します。
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// 単語ID群を追加し、オフセットを返します。
    ///
    /// # エラー
    ///
    /// オフセットがトライに格納できる範囲を超えた場合にエラーを返します。
    pub fn push(&mut self, ids: &[u32]) -> Result<u32> {
        let offset = self.data.len();
        // The double array stores values in 31 bits.
        let offset = u32::try_from(offset)
            .ok()
            .filter(|&v| v < 1 << 31)
            .ok_or_else(|| {
                KabosuError::invalid_argument("ids", "Too many words to index")
            })?;
        self.data.push(u32::try_from(ids.len())?);
        self.data.extend_from_slice(ids);
        Ok(offset)
    }

    /// ポスティングリストを構築します。
    pub fn build(self) -> Postings {
        Postings { data: self.data }
    }
}
