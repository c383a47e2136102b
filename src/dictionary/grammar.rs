//! 文法情報
//!
//! このモジュールは、品詞テーブル、接続コスト行列、文字カテゴリ分類器を
//! まとめた文法情報を提供します。

use rkyv::{Archive, Deserialize, Serialize};

use crate::common::BOS_EOS_CONNECTION_ID;
use crate::dictionary::character::CharacterCategory;
use crate::dictionary::connector::MatrixConnector;

/// 6階層の品詞タグ。
#[derive(Archive, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[rkyv(derive(Debug))]
pub struct PartOfSpeech(pub [String; 6]);

impl PartOfSpeech {
    /// 文字列スライスから品詞タグを作成します。
    ///
    /// # 戻り値
    ///
    /// 6要素でない場合は`None`
    pub fn from_strs(parts: &[&str]) -> Option<Self> {
        if parts.len() != 6 {
            return None;
        }
        Some(Self([
            parts[0].to_string(),
            parts[1].to_string(),
            parts[2].to_string(),
            parts[3].to_string(),
            parts[4].to_string(),
            parts[5].to_string(),
        ]))
    }
}

/// ノードの接続パラメータ。
///
/// 左文脈ID、右文脈ID、生起コストの3つ組です。
#[derive(
    Default, Clone, Copy, Debug, PartialEq, Eq, Archive, Serialize, Deserialize,
)]
#[rkyv(derive(Debug))]
pub struct WordParam {
    /// 左文脈ID
    pub left_id: u16,
    /// 右文脈ID
    pub right_id: u16,
    /// 単語の生起コスト
    pub cost: i16,
}

impl WordParam {
    /// 新しいインスタンスを作成します。
    #[inline(always)]
    pub const fn new(left_id: u16, right_id: u16, cost: i16) -> Self {
        Self {
            left_id,
            right_id,
            cost,
        }
    }
}

/// システム辞書の文法情報。
///
/// 品詞テーブル、接続コスト行列、文字カテゴリ分類器を保持します。
/// 品詞IDはテーブル内のインデックスです。
#[derive(Archive, Serialize, Deserialize, Clone)]
pub struct Grammar {
    pos_list: Vec<PartOfSpeech>,
    connector: MatrixConnector,
    char_category: CharacterCategory,
}

impl Grammar {
    /// 新しいインスタンスを作成します。
    pub(crate) fn new(
        pos_list: Vec<PartOfSpeech>,
        connector: MatrixConnector,
        char_category: CharacterCategory,
    ) -> Self {
        Self {
            pos_list,
            connector,
            char_category,
        }
    }

    /// 品詞タグのIDを返します。
    ///
    /// 品詞IDの解決は辞書構築時とプラグイン設定時にのみ行われるため、
    /// 線形走査で十分です。
    ///
    /// # 戻り値
    ///
    /// テーブルに存在する場合はそのID、存在しない場合は`None`
    pub fn pos_id(&self, pos: &PartOfSpeech) -> Option<u16> {
        self.pos_list
            .iter()
            .position(|p| p == pos)
            .map(|i| i as u16)
    }

    /// IDに対応する品詞タグを返します。
    #[inline(always)]
    pub fn pos_string(&self, pos_id: u16) -> Option<&PartOfSpeech> {
        self.pos_list.get(usize::from(pos_id))
    }

    /// 品詞テーブルのサイズを返します。
    #[inline(always)]
    pub fn pos_size(&self) -> usize {
        self.pos_list.len()
    }

    /// 品詞タグを登録し、IDを返します。既存のタグは再利用されます。
    pub(crate) fn pos_id_or_insert(&mut self, pos: PartOfSpeech) -> u16 {
        match self.pos_id(&pos) {
            Some(id) => id,
            None => {
                self.pos_list.push(pos);
                (self.pos_list.len() - 1) as u16
            }
        }
    }

    /// 左側単語の右文脈IDと右側単語の左文脈IDの間の接続コストを返します。
    #[inline(always)]
    pub fn connect_cost(&self, right_id: u16, left_id: u16) -> i16 {
        self.connector.cost(right_id, left_id)
    }

    /// 接続コスト行列への参照を返します。
    #[inline(always)]
    pub fn connector(&self) -> &MatrixConnector {
        &self.connector
    }

    /// 文字カテゴリ分類器への参照を返します。
    #[inline(always)]
    pub fn char_category(&self) -> &CharacterCategory {
        &self.char_category
    }

    /// BOSノードの接続パラメータを返します。
    #[inline(always)]
    pub const fn bos_param(&self) -> WordParam {
        WordParam::new(u16::MAX, BOS_EOS_CONNECTION_ID, 0)
    }

    /// EOSノードの接続パラメータを返します。
    #[inline(always)]
    pub const fn eos_param(&self) -> WordParam {
        WordParam::new(BOS_EOS_CONNECTION_ID, u16::MAX, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(parts: [&str; 6]) -> PartOfSpeech {
        PartOfSpeech::from_strs(&parts).unwrap()
    }

    #[test]
    fn test_pos_id() {
        let connector = MatrixConnector::from_reader("1 1\n0 0 0".as_bytes()).unwrap();
        let mut grammar = Grammar::new(vec![], connector, CharacterCategory::default());
        let noun = pos(["名詞", "普通名詞", "一般", "*", "*", "*"]);
        let verb = pos(["動詞", "一般", "*", "*", "*", "*"]);
        assert_eq!(grammar.pos_id_or_insert(noun.clone()), 0);
        assert_eq!(grammar.pos_id_or_insert(verb.clone()), 1);
        assert_eq!(grammar.pos_id_or_insert(noun.clone()), 0);
        assert_eq!(grammar.pos_id(&verb), Some(1));
        assert_eq!(grammar.pos_string(1), Some(&verb));
        assert_eq!(grammar.pos_id(&pos(["形容詞", "*", "*", "*", "*", "*"])), None);
    }
}
