//! 形態素の結果コンテナ
//!
//! このモジュールは、トークン化の結果として得られる形態素のリストと、
//! その軽量ビューを提供します。形態素のオフセットは元テキストの
//! 文字位置に解決されます。

use std::sync::Arc;

use crate::dictionary::grammar::{PartOfSpeech, WordParam};
use crate::dictionary::word_id::WordId;
use crate::dictionary::word_info::WordInfo;
use crate::dictionary::Dictionary;
use crate::errors::{KabosuError, Result};
use crate::input::InputText;
use crate::lattice::Node;
use crate::tokenizer::Mode;

/// 1文のトークン化結果。
///
/// 入力テキストと辞書への共有参照、および最良パスのノード列を
/// 保持します。
pub struct MorphemeList {
    input: Arc<InputText>,
    dict: Arc<Dictionary>,
    path: Vec<Node>,
    allow_empty_morpheme: bool,
}

impl MorphemeList {
    pub(crate) fn new(
        input: Arc<InputText>,
        dict: Arc<Dictionary>,
        path: Vec<Node>,
        allow_empty_morpheme: bool,
    ) -> Self {
        Self {
            input,
            dict,
            path,
            allow_empty_morpheme,
        }
    }

    /// 形態素数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// 結果が空かどうかを返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// `index`番目の形態素を返します。
    ///
    /// # パニック
    ///
    /// `index`が範囲外の場合パニックします。
    #[inline(always)]
    pub fn get(&self, index: usize) -> Morpheme<'_> {
        assert!(index < self.path.len());
        Morpheme { list: self, index }
    }

    /// 形態素のイテレータを返します。
    pub fn iter(&self) -> impl Iterator<Item = Morpheme<'_>> + '_ {
        (0..self.len()).map(move |index| Morpheme { list: self, index })
    }

    /// 入力の元テキストを返します。
    #[inline(always)]
    pub fn original_text(&self) -> &str {
        self.input.original_text()
    }

    fn begin_char(&self, index: usize) -> usize {
        let node = &self.path[index];
        let begin = self.input.original_index(node.begin);
        let end = self.input.original_index(node.end);
        if !self.allow_empty_morpheme && begin == end {
            // Degenerate spans collapse onto the end boundary.
            return end;
        }
        begin
    }

    fn end_char(&self, index: usize) -> usize {
        self.input.original_index(self.path[index].end)
    }

    fn word_info(&self, index: usize) -> &WordInfo {
        self.path[index].word_info(self.dict.lexicon())
    }

    fn split(&self, mode: Mode, index: usize) -> Result<MorphemeList> {
        let node = &self.path[index];
        let info = node.word_info(self.dict.lexicon());
        let word_ids = match mode {
            Mode::A => info.a_unit_split.clone(),
            Mode::B => info.b_unit_split.clone(),
            Mode::C => vec![],
        };
        if word_ids.len() < 2 {
            return Ok(MorphemeList::new(
                Arc::clone(&self.input),
                Arc::clone(&self.dict),
                vec![node.clone()],
                self.allow_empty_morpheme,
            ));
        }

        let mut nodes = Vec::with_capacity(word_ids.len());
        let mut offset = node.begin;
        for packed in word_ids {
            let word_id = WordId::from_packed(packed);
            let length = self
                .dict
                .lexicon()
                .word_info(word_id)
                .map(|info| usize::from(info.head_word_length))
                .ok_or_else(|| {
                    KabosuError::invalid_state(
                        "a split table refers to a missing word",
                        format!("{word_id:?}"),
                    )
                })?;
            let mut sub = Node::for_word(word_id, WordParam::default());
            sub.begin = offset;
            offset += length;
            sub.end = offset;
            nodes.push(sub);
        }
        Ok(MorphemeList::new(
            Arc::clone(&self.input),
            Arc::clone(&self.dict),
            nodes,
            self.allow_empty_morpheme,
        ))
    }
}

/// 1つの形態素への軽量ビュー。
///
/// 実際のデータは[`MorphemeList`]が保持しており、このビューはリストが
/// 生存している間のみ有効です。
pub struct Morpheme<'a> {
    list: &'a MorphemeList,
    index: usize,
}

impl<'a> Morpheme<'a> {
    /// 元テキストでの開始位置（文字単位）を返します。
    #[inline(always)]
    pub fn begin(&self) -> usize {
        self.list.begin_char(self.index)
    }

    /// 元テキストでの終了位置（文字単位）を返します。
    #[inline(always)]
    pub fn end(&self) -> usize {
        self.list.end_char(self.index)
    }

    /// 元テキストでの表層形を返します。
    pub fn surface(&self) -> &'a str {
        self.list
            .input
            .original_substring(self.begin(), self.end())
    }

    /// 品詞タグを返します。
    ///
    /// # 戻り値
    ///
    /// 品詞テーブルに存在しないIDを持つ場合は`None`
    pub fn part_of_speech(&self) -> Option<&'a PartOfSpeech> {
        self.list
            .dict
            .grammar()
            .pos_string(self.part_of_speech_id())
    }

    /// 品詞IDを返します。
    #[inline(always)]
    pub fn part_of_speech_id(&self) -> u16 {
        self.list.word_info(self.index).pos_id
    }

    /// 辞書形を返します。
    #[inline(always)]
    pub fn dictionary_form(&self) -> &'a str {
        &self.list.word_info(self.index).dictionary_form
    }

    /// 正規化形を返します。
    #[inline(always)]
    pub fn normalized_form(&self) -> &'a str {
        &self.list.word_info(self.index).normalized_form
    }

    /// 読みを返します。
    #[inline(always)]
    pub fn reading_form(&self) -> &'a str {
        &self.list.word_info(self.index).reading_form
    }

    /// 未知語かどうかを返します。
    #[inline(always)]
    pub fn is_oov(&self) -> bool {
        self.list.path[self.index].is_oov
    }

    /// 単語IDを返します。
    ///
    /// 未知語の場合、辞書IDの部分は予約値になります。
    #[inline(always)]
    pub fn word_id(&self) -> WordId {
        self.list.path[self.index].word_id
    }

    /// この形態素が由来する辞書のIDを返します。
    ///
    /// # 戻り値
    ///
    /// システム辞書は0、ユーザー辞書は1以上。未知語の場合は`None`
    pub fn dictionary_id(&self) -> Option<u8> {
        let id = self.word_id();
        if id.is_oov() {
            None
        } else {
            Some(id.dic)
        }
    }

    /// 同義語グループIDを返します。
    #[inline(always)]
    pub fn synonym_group_ids(&self) -> &'a [u32] {
        &self.list.word_info(self.index).synonym_group_ids
    }

    /// この形態素をさらに細かい分割単位に展開します。
    ///
    /// 分割テーブルを持たない形態素は、そのまま1要素のリストとして
    /// 返されます。
    pub fn split(&self, mode: Mode) -> Result<MorphemeList> {
        self.list.split(mode, self.index)
    }
}

impl std::fmt::Debug for Morpheme<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Morpheme")
            .field("surface", &self.surface())
            .field("begin", &self.begin())
            .field("end", &self.end())
            .field("pos_id", &self.part_of_speech_id())
            .field("is_oov", &self.is_oov())
            .finish()
    }
}
