//! 単語識別子
//!
//! このモジュールは、複数の辞書にまたがって単語を一意に識別するための
//! 識別子を提供します。API境界では辞書IDと単語IDの2フィールド構造体として
//! 扱い、辞書内のストレージではu32にパックされた表現を使用します。

use rkyv::{Archive, Deserialize, Serialize};

/// パックされた単語IDの中で、辞書内部の単語IDが取り得る最大値。
pub const MAX_WORD_ID: u32 = 0x0fff_ffff;

/// 辞書IDが取り得る最大値。
///
/// `0xF`は辞書に格納されていない未知語のために予約されています。
pub const MAX_DIC_ID: u8 = 0xe;

/// 未知語を表す予約済み辞書ID。
pub const OOV_DIC_ID: u8 = 0xf;

/// 単語の識別子
///
/// `dic`は辞書の由来（システム辞書 = 0、ユーザー辞書 = 1..）を示し、
/// `word`はその辞書内での単語インデックスです。
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug, Eq, PartialEq, Clone, Copy))]
pub struct WordId {
    /// この単語を含む辞書のID
    pub dic: u8,

    /// 辞書内での単語ID
    pub word: u32,
}

impl Default for WordId {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl WordId {
    /// BOS/EOSノードなど、どの辞書にも対応しない識別子。
    pub const UNDEFINED: WordId = WordId {
        dic: OOV_DIC_ID,
        word: MAX_WORD_ID,
    };

    /// 新しいインスタンスを作成します。
    #[inline(always)]
    pub const fn new(dic: u8, word: u32) -> Self {
        Self { dic, word }
    }

    /// 未知語用の識別子を作成します。
    ///
    /// 未知語は辞書に格納されないため、単語IDの部分は意味を持ちません。
    #[inline(always)]
    pub const fn oov() -> Self {
        Self {
            dic: OOV_DIC_ID,
            word: 0,
        }
    }

    /// パックされたu32表現から復元します。
    #[inline(always)]
    pub const fn from_packed(packed: u32) -> Self {
        Self {
            dic: (packed >> 28) as u8,
            word: packed & MAX_WORD_ID,
        }
    }

    /// パックされたu32表現に変換します。
    #[inline(always)]
    pub const fn to_packed(self) -> u32 {
        ((self.dic as u32) << 28) | self.word
    }

    /// この識別子が未知語を指すかを判定します。
    #[inline(always)]
    pub const fn is_oov(&self) -> bool {
        self.dic == OOV_DIC_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_round_trip() {
        let id = WordId::new(3, 123_456);
        assert_eq!(WordId::from_packed(id.to_packed()), id);
    }

    #[test]
    fn test_oov_sentinel() {
        assert!(WordId::oov().is_oov());
        assert!(WordId::UNDEFINED.is_oov());
        assert!(!WordId::new(0, 0).is_oov());
    }
}
