//! 単語の付加情報
//!
//! グラフ計算には使用されない、形態素の表示・分割・正規化のための情報を
//! 保持します。

use rkyv::{Archive, Deserialize, Serialize};

/// 辞書形が自分自身であることを示す値。
pub const DICTIONARY_FORM_SELF: i32 = -1;

/// 1つの単語の付加情報。
///
/// 表層形、品詞ID、各種の語形、分割テーブル、同義語グループIDを保持します。
/// `a_unit_split`などの分割テーブルはパックされた単語ID
/// ([`crate::dictionary::WordId::to_packed`]) の配列です。
#[derive(Archive, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WordInfo {
    /// 表層形
    pub surface: String,
    /// 正規化後テキスト中での表層形のバイト長
    pub head_word_length: u16,
    /// 品詞ID
    pub pos_id: u16,
    /// 正規化形
    pub normalized_form: String,
    /// 辞書形の単語ID。自分自身の場合は[`DICTIONARY_FORM_SELF`]
    pub dictionary_form_word_id: i32,
    /// 辞書形
    pub dictionary_form: String,
    /// 読み
    pub reading_form: String,
    /// A単位分割テーブル
    pub a_unit_split: Vec<u32>,
    /// B単位分割テーブル
    pub b_unit_split: Vec<u32>,
    /// 語構成テーブル
    pub word_structure: Vec<u32>,
    /// 同義語グループID
    pub synonym_group_ids: Vec<u32>,
}

impl WordInfo {
    /// 辞書に格納されない形態素（未知語や連結ノード）の情報を作成します。
    ///
    /// # 引数
    ///
    /// * `surface` - 表層形
    /// * `head_word_length` - 正規化後テキスト中でのバイト長
    /// * `pos_id` - 品詞ID
    /// * `normalized_form` - 正規化形
    /// * `dictionary_form` - 辞書形
    /// * `reading_form` - 読み
    pub fn synthesized<S, N, D, R>(
        surface: S,
        head_word_length: u16,
        pos_id: u16,
        normalized_form: N,
        dictionary_form: D,
        reading_form: R,
    ) -> Self
    where
        S: Into<String>,
        N: Into<String>,
        D: Into<String>,
        R: Into<String>,
    {
        Self {
            surface: surface.into(),
            head_word_length,
            pos_id,
            normalized_form: normalized_form.into(),
            dictionary_form_word_id: DICTIONARY_FORM_SELF,
            dictionary_form: dictionary_form.into(),
            reading_form: reading_form.into(),
            a_unit_split: vec![],
            b_unit_split: vec![],
            word_structure: vec![],
            synonym_group_ids: vec![],
        }
    }
}
