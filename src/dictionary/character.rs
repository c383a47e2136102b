//! 文字カテゴリ定義
//!
//! このモジュールは、`char.def`で定義される文字カテゴリの分類器を提供します。
//! 各文字（Unicodeコードポイント）は1つ以上のカテゴリに属し、
//! 未知語処理とパス書き換えプラグインがこの分類を参照します。

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::{KabosuError, Result};

/// 文字のカテゴリ。
///
/// 各カテゴリはビットフラグとして表現され、[`CategorySet`]に集約されます。
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
#[repr(u32)]
pub enum CategoryType {
    /// フォールバックカテゴリ。
    Default = 1,
    /// 空白文字。
    Space = 1 << 1,
    /// CJKV統合漢字。
    Kanji = 1 << 2,
    /// 記号。
    Symbol = 1 << 3,
    /// アラビア数字。
    Numeric = 1 << 4,
    /// ラテン文字。
    Alpha = 1 << 5,
    /// ひらがな。
    Hiragana = 1 << 6,
    /// カタカナ。
    Katakana = 1 << 7,
    /// 漢数字。
    KanjiNumeric = 1 << 8,
    /// ギリシャ文字。
    Greek = 1 << 9,
    /// キリル文字。
    Cyrillic = 1 << 10,
    /// ユーザー定義カテゴリ。
    User1 = 1 << 11,
    /// ユーザー定義カテゴリ。
    User2 = 1 << 12,
    /// ユーザー定義カテゴリ。
    User3 = 1 << 13,
    /// ユーザー定義カテゴリ。
    User4 = 1 << 14,
    /// 単語の先頭になれない文字。
    NoOovBow = 1 << 15,
}

impl CategoryType {
    const ALL: [CategoryType; 16] = [
        CategoryType::Default,
        CategoryType::Space,
        CategoryType::Kanji,
        CategoryType::Symbol,
        CategoryType::Numeric,
        CategoryType::Alpha,
        CategoryType::Hiragana,
        CategoryType::Katakana,
        CategoryType::KanjiNumeric,
        CategoryType::Greek,
        CategoryType::Cyrillic,
        CategoryType::User1,
        CategoryType::User2,
        CategoryType::User3,
        CategoryType::User4,
        CategoryType::NoOovBow,
    ];
}

impl FromStr for CategoryType {
    type Err = KabosuError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DEFAULT" => Ok(CategoryType::Default),
            "SPACE" => Ok(CategoryType::Space),
            "KANJI" => Ok(CategoryType::Kanji),
            "SYMBOL" => Ok(CategoryType::Symbol),
            "NUMERIC" => Ok(CategoryType::Numeric),
            "ALPHA" => Ok(CategoryType::Alpha),
            "HIRAGANA" => Ok(CategoryType::Hiragana),
            "KATAKANA" => Ok(CategoryType::Katakana),
            "KANJINUMERIC" => Ok(CategoryType::KanjiNumeric),
            "GREEK" => Ok(CategoryType::Greek),
            "CYRILLIC" => Ok(CategoryType::Cyrillic),
            "USER1" => Ok(CategoryType::User1),
            "USER2" => Ok(CategoryType::User2),
            "USER3" => Ok(CategoryType::User3),
            "USER4" => Ok(CategoryType::User4),
            "NOOOVBOW" => Ok(CategoryType::NoOovBow),
            _ => Err(KabosuError::invalid_format(
                "char.def",
                format!("{s} is an invalid category type"),
            )),
        }
    }
}

/// 文字カテゴリの集合。
///
/// [`CategoryType`]のビットフラグをu32にパックした集合です。
#[derive(
    Default, Clone, Copy, Eq, PartialEq, Hash, Archive, Serialize, Deserialize,
)]
#[rkyv(derive(Clone, Copy))]
pub struct CategorySet(u32);

impl CategorySet {
    /// DEFAULTカテゴリのみの集合。
    pub const DEFAULT: CategorySet = CategorySet(CategoryType::Default as u32);

    /// 空の集合を作成します。
    #[inline(always)]
    pub const fn new() -> Self {
        Self(0)
    }

    /// カテゴリを追加します。
    #[inline(always)]
    pub fn insert(&mut self, cate: CategoryType) {
        self.0 |= cate as u32;
    }

    /// カテゴリが含まれるかを判定します。
    #[inline(always)]
    pub const fn contains(&self, cate: CategoryType) -> bool {
        self.0 & cate as u32 != 0
    }

    /// 集合が空かどうかを判定します。
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// 2つの集合の積を返します。
    #[inline(always)]
    pub const fn intersection(&self, other: &Self) -> Self {
        Self(self.0 & other.0)
    }

    /// 2つの集合が共通のカテゴリを持つかを判定します。
    #[inline(always)]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.0 & other.0 != 0
    }

    /// 含まれるカテゴリを列挙するイテレータを返します。
    pub fn iter(&self) -> impl Iterator<Item = CategoryType> + '_ {
        CategoryType::ALL
            .iter()
            .copied()
            .filter(move |&c| self.contains(c))
    }
}

impl fmt::Debug for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<CategoryType> for CategorySet {
    fn from_iter<I: IntoIterator<Item = CategoryType>>(iter: I) -> Self {
        let mut set = Self::new();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

/// コードポイント範囲とカテゴリ集合の対応。
#[derive(Archive, Serialize, Deserialize, Clone, Debug)]
struct CategoryRange {
    low: u32,
    high: u32,
    categories: CategorySet,
}

/// 文字カテゴリの分類器。
///
/// `char.def`で定義されたコードポイント範囲のリストを保持します。
/// 後に定義された範囲が優先され、どの範囲にも一致しない文字は
/// DEFAULTカテゴリに分類されます。
#[derive(Archive, Serialize, Deserialize, Clone, Default)]
pub struct CharacterCategory {
    // The list is stored in reversed definition order so that a linear scan
    // finds the latest matching definition first.
    ranges: Vec<CategoryRange>,
}

impl CharacterCategory {
    /// 文字のカテゴリ集合を返します。
    ///
    /// # 引数
    ///
    /// * `c` - 分類する文字
    ///
    /// # 戻り値
    ///
    /// 文字が属するカテゴリの集合。どの範囲にも一致しない場合はDEFAULTのみの集合
    pub fn category_types(&self, c: char) -> CategorySet {
        let cp = u32::from(c);
        for range in &self.ranges {
            if range.low <= cp && cp <= range.high {
                return range.categories;
            }
        }
        CategorySet::DEFAULT
    }

    /// `char.def`形式のリーダーから分類器を構築します。
    ///
    /// フォーマットは以下の通りです。`0x`で始まらない行は無視されます。
    ///
    /// ```text
    /// 0x0020 SPACE              # 空白
    /// 0x0041..0x005A ALPHA      # ラテン文字
    /// 0x4E00 KANJINUMERIC KANJI # 漢数字かつ漢字
    /// ```
    ///
    /// # エラー
    ///
    /// 範囲指定やカテゴリ名が不正な場合にエラーを返します。
    pub fn from_reader<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut buf = String::new();
        rdr.read_to_string(&mut buf)?;

        let mut ranges = vec![];
        for (i, line) in buf.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cols: Vec<_> = line.split_whitespace().collect();
            if cols.len() < 2 {
                return Err(KabosuError::invalid_format(
                    "char.def",
                    format!("invalid format at line {}", i + 1),
                ));
            }
            if !cols[0].starts_with("0x") {
                continue;
            }
            let mut bounds = cols[0].split("..");
            let low = parse_code_point(bounds.next().unwrap(), i)?;
            let high = match bounds.next() {
                Some(h) => parse_code_point(h, i)?,
                None => low,
            };
            if low > high {
                return Err(KabosuError::invalid_format(
                    "char.def",
                    format!("invalid range at line {}", i + 1),
                ));
            }
            let mut categories = CategorySet::new();
            for col in &cols[1..] {
                if col.starts_with('#') {
                    break;
                }
                categories.insert(col.parse()?);
            }
            ranges.push(CategoryRange {
                low,
                high,
                categories,
            });
        }
        ranges.reverse();
        Ok(Self { ranges })
    }
}

fn parse_code_point(s: &str, line: usize) -> Result<u32> {
    s.strip_prefix("0x")
        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
        .ok_or_else(|| {
            KabosuError::invalid_format(
                "char.def",
                format!("invalid code point at line {}", line + 1),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAR_DEF: &str = "
#
# test definition
#
0x0030..0x0039 NUMERIC
0x0041..0x005A ALPHA
0x0061..0x007A ALPHA
0x3041..0x309F HIRAGANA
0x30A1..0x30FF KATAKANA
0x4E00..0x9FFF KANJI
0x4E00 KANJINUMERIC KANJI
0x4E8C KANJINUMERIC KANJI
";

    #[test]
    fn test_category_types() {
        let cate = CharacterCategory::from_reader(CHAR_DEF.as_bytes()).unwrap();
        assert!(cate.category_types('5').contains(CategoryType::Numeric));
        assert!(cate.category_types('a').contains(CategoryType::Alpha));
        assert!(cate.category_types('あ').contains(CategoryType::Hiragana));
        assert!(cate.category_types('ア').contains(CategoryType::Katakana));
        assert!(cate.category_types('漢').contains(CategoryType::Kanji));
        assert_eq!(cate.category_types('!'), CategorySet::DEFAULT);
    }

    #[test]
    fn test_later_definition_wins() {
        let cate = CharacterCategory::from_reader(CHAR_DEF.as_bytes()).unwrap();
        let set = cate.category_types('一');
        assert!(set.contains(CategoryType::KanjiNumeric));
        assert!(set.contains(CategoryType::Kanji));
        let set = cate.category_types('丁');
        assert!(!set.contains(CategoryType::KanjiNumeric));
        assert!(set.contains(CategoryType::Kanji));
    }

    #[test]
    fn test_invalid_range() {
        let result = CharacterCategory::from_reader("0x0039..0x0030 NUMERIC".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_category() {
        let result = CharacterCategory::from_reader("0x0030 NUMERICS".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_set_iter() {
        let mut set = CategorySet::new();
        set.insert(CategoryType::Kanji);
        set.insert(CategoryType::KanjiNumeric);
        let collected: Vec<_> = set.iter().collect();
        assert_eq!(
            collected,
            vec![CategoryType::Kanji, CategoryType::KanjiNumeric]
        );
    }
}
