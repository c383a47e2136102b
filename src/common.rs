//! 共通の型定義と定数

/// BOS/EOSノードが使用する接続ID。
pub const BOS_EOS_CONNECTION_ID: u16 = 0;

/// 1つの文として処理できる最大バイト長のデフォルト値。
///
/// 文分割器がこの長さまでに文境界を見つけられない場合、
/// この長さ自体が強制的な境界になります。
pub const DEFAULT_SENTENCE_LIMIT_BYTES: usize = 4096;

/// マージ可能なユーザー辞書の最大数。
///
/// 辞書IDは4ビットにパックされ、`0xF`は未知語用に予約されています。
pub const MAX_USER_DICTIONARIES: usize = 14;

/// ある位置で辞書語が存在する長さ（コードポイント単位）の集合。
///
/// 63ビットの集合で、同じ区間に重複した未知語候補を生成しないために
/// 使用されます。63以上の長さは最上位ビットに飽和します。
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordMask(u64);

impl WordMask {
    /// 表現できる最大の長さ。
    pub const MAX_LENGTH: usize = 63;

    /// 長さ`length`をこの集合に追加します。
    ///
    /// # 引数
    ///
    /// * `length` - 追加する長さ（コードポイント単位、1以上）
    #[inline(always)]
    pub fn add_nth(&mut self, length: usize) {
        self.0 |= Self::nth(length);
    }

    /// 長さ`length`だけが立ったビット集合を返します。
    #[inline(always)]
    pub fn nth(length: usize) -> u64 {
        debug_assert!(length > 0);
        let fixed = (length - 1).min(Self::MAX_LENGTH);
        1u64 << fixed
    }

    /// 長さ`length`がこの集合に含まれるかを判定します。
    #[inline(always)]
    pub const fn has_nth(&self, length: usize) -> bool {
        let fixed = if length - 1 < Self::MAX_LENGTH {
            length - 1
        } else {
            Self::MAX_LENGTH
        };
        self.0 & (1u64 << fixed) != 0
    }

    /// 集合が空かどうかを判定します。
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_mask() {
        let mut mask = WordMask::default();
        assert!(mask.is_empty());
        mask.add_nth(1);
        mask.add_nth(5);
        assert!(mask.has_nth(1));
        assert!(!mask.has_nth(2));
        assert!(mask.has_nth(5));
        assert!(!mask.is_empty());
    }

    #[test]
    fn test_word_mask_saturation() {
        let mut mask = WordMask::default();
        mask.add_nth(100);
        assert!(mask.has_nth(64));
        assert!(mask.has_nth(200));
        assert!(!mask.has_nth(62));
    }
}
