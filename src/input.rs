//! 入力テキストの内部表現
//!
//! このモジュールは、書き換え前後のテキストとその対応関係を管理する
//! テキストモデルを提供します。入力テキストプラグインは
//! [`InputTextBuilder`]を通じてテキストを書き換え、
//! 確定後の[`InputText`]がトークン化のためのバイト単位のビューと、
//! 元テキストへのオフセット解決を提供します。
//!
//! ラティスに渡されるバイトオフセットは常にコードポイント境界に
//! 整列しています。

use std::ops::Range;
use std::sync::Arc;

use crate::dictionary::character::{CategorySet, CategoryType, CharacterCategory};
use crate::errors::{KabosuError, Result};

/// 書き換え前の元テキスト。
///
/// 文単位のスライス間で共有されます。
#[derive(Debug)]
pub(crate) struct OriginalText {
    text: String,
    // char index -> byte index, with a sentinel at the end
    char_to_byte: Vec<usize>,
}

impl OriginalText {
    fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            text: text.to_string(),
            char_to_byte,
        }
    }

    #[inline(always)]
    fn len_chars(&self) -> usize {
        self.char_to_byte.len() - 1
    }

    #[inline(always)]
    fn substring(&self, begin_char: usize, end_char: usize) -> &str {
        &self.text[self.char_to_byte[begin_char]..self.char_to_byte[end_char]]
    }
}

/// 書き換え可能な入力テキスト。
///
/// 入力テキストプラグインがテキストを書き換えるためのビルダーです。
/// すべてのインデックスはコードポイント（文字）単位です。
/// 書き換え後の各文字は、置換された区間の先頭文字の元テキスト位置を
/// 引き継ぎます。
pub struct InputTextBuilder<'a> {
    char_category: &'a CharacterCategory,
    original: Arc<OriginalText>,
    modified: Vec<char>,
    // per modified char: original char index, with a sentinel at the end
    offsets: Vec<usize>,
}

impl<'a> InputTextBuilder<'a> {
    /// 新しいビルダーを作成します。
    ///
    /// # 引数
    ///
    /// * `text` - 入力テキスト
    /// * `char_category` - 文字カテゴリ分類器
    pub fn new(text: &str, char_category: &'a CharacterCategory) -> Self {
        let original = Arc::new(OriginalText::new(text));
        let modified: Vec<char> = text.chars().collect();
        let mut offsets: Vec<usize> = (0..modified.len()).collect();
        offsets.push(original.len_chars());
        Self {
            char_category,
            original,
            modified,
            offsets,
        }
    }

    /// 元のテキストを返します。
    #[inline(always)]
    pub fn original_text(&self) -> &str {
        &self.original.text
    }

    /// 現在の書き換え後テキストの文字列を返します。
    pub fn text(&self) -> String {
        self.modified.iter().collect()
    }

    /// 現在の書き換え後テキストの文字配列を返します。
    #[inline(always)]
    pub fn chars(&self) -> &[char] {
        &self.modified
    }

    /// 文字カテゴリ分類器への参照を返します。
    #[inline(always)]
    pub fn char_category(&self) -> &CharacterCategory {
        self.char_category
    }

    /// 書き換え後テキストの区間を置換します。
    ///
    /// 新しい文字はすべて、置換された区間の先頭文字の元テキスト位置を
    /// 引き継ぎます。縮小する置換では末尾が境界に畳み込まれます。
    /// `range.end`がテキスト長を超える場合はテキスト長に切り詰められます。
    ///
    /// # 引数
    ///
    /// * `range` - 置換する文字区間
    /// * `text` - 置換後のテキスト
    ///
    /// # エラー
    ///
    /// `range`が逆転している場合や先頭がテキスト長を超える場合は
    /// 不正範囲エラーを返します。空の区間は挿入を意味するため
    /// エラーになります。挿入は空でない区間の置換として表現してください。
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<()> {
        let begin = range.start;
        let mut end = range.end;
        if begin > end {
            return Err(KabosuError::invalid_argument("range", "begin > end"));
        }
        if begin > self.modified.len() {
            return Err(KabosuError::invalid_argument("range", "begin > length"));
        }
        if begin == end {
            return Err(KabosuError::invalid_argument(
                "range",
                "the range is empty; frame an insertion as a replacement",
            ));
        }
        if end > self.modified.len() {
            end = self.modified.len();
        }

        let offset = self.offsets[begin];
        let new_chars: Vec<char> = text.chars().collect();
        let new_len = new_chars.len();
        self.modified.splice(begin..end, new_chars);
        self.offsets
            .splice(begin..end, std::iter::repeat(offset).take(new_len));
        Ok(())
    }

    /// ビルダーを確定し、不変の[`InputText`]を構築します。
    pub fn build(self) -> InputText {
        let modified: String = self.modified.iter().collect();
        let num_chars = self.modified.len();
        let len_bytes = modified.len();

        let mut byte_to_char = Vec::with_capacity(len_bytes + 1);
        let mut byte_to_orig = Vec::with_capacity(len_bytes + 1);
        for (i, c) in self.modified.iter().enumerate() {
            for _ in 0..c.len_utf8() {
                byte_to_char.push(i);
                byte_to_orig.push(self.offsets[i]);
            }
        }
        byte_to_char.push(num_chars);
        byte_to_orig.push(self.offsets[num_chars]);

        let char_categories: Vec<CategorySet> = self
            .modified
            .iter()
            .map(|&c| self.char_category.category_types(c))
            .collect();
        let char_continuities = compute_continuities(&self.modified, &char_categories);
        let can_bow = compute_can_bow(&char_categories);

        InputText {
            original: self.original,
            modified,
            byte_to_char,
            byte_to_orig,
            char_categories,
            char_continuities,
            can_bow,
        }
    }
}

/// カテゴリ連続長をバイト単位で計算します。
///
/// 各バイトには、そのバイトから始まる同一カテゴリ連続区間の残りバイト数が
/// 格納されます。
fn compute_continuities(chars: &[char], categories: &[CategorySet]) -> Vec<usize> {
    let mut continuities = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let mut continuous = categories[i];
        let mut next = i + 1;
        while next < chars.len() {
            let joint = continuous.intersection(&categories[next]);
            if joint.is_empty() {
                break;
            }
            continuous = joint;
            next += 1;
        }
        let length: usize = chars[i..next].iter().map(|c| c.len_utf8()).sum();
        for k in (1..=length).rev() {
            continuities.push(k);
        }
        i = next;
    }
    continuities
}

/// 各文字が単語の先頭になれるかを計算します。
///
/// ALPHA、GREEK、CYRILLICの文字は、直前の文字とカテゴリを共有する場合に
/// 単語の先頭になれません。
fn compute_can_bow(categories: &[CategorySet]) -> Vec<bool> {
    categories
        .iter()
        .enumerate()
        .map(|(i, types)| {
            if i == 0 {
                return true;
            }
            if types.contains(CategoryType::Alpha)
                || types.contains(CategoryType::Greek)
                || types.contains(CategoryType::Cyrillic)
            {
                return !types.intersects(&categories[i - 1]);
            }
            true
        })
        .collect()
}

/// 確定済みの入力テキスト。
///
/// 書き換え後テキストのUTF-8バイト列ビューと、元テキストへの
/// オフセット解決を提供します。トークン化の1回の呼び出しの間だけ
/// 生存します。
pub struct InputText {
    original: Arc<OriginalText>,
    modified: String,
    // per byte: modified char index, with a sentinel
    byte_to_char: Vec<usize>,
    // per byte: original char index, with a sentinel
    byte_to_orig: Vec<usize>,
    // per modified char
    char_categories: Vec<CategorySet>,
    // per byte: remaining bytes of the category run starting there
    char_continuities: Vec<usize>,
    // per modified char
    can_bow: Vec<bool>,
}

impl InputText {
    /// 元のテキストを返します。
    #[inline(always)]
    pub fn original_text(&self) -> &str {
        &self.original.text
    }

    /// 書き換え後のテキストを返します。
    #[inline(always)]
    pub fn text(&self) -> &str {
        &self.modified
    }

    /// 書き換え後テキストのUTF-8バイト列を返します。
    #[inline(always)]
    pub fn bytes(&self) -> &[u8] {
        self.modified.as_bytes()
    }

    /// 書き換え後テキストのバイト長を返します。
    #[inline(always)]
    pub fn len_bytes(&self) -> usize {
        self.modified.len()
    }

    /// 書き換え後テキストの部分文字列を返します。
    ///
    /// # 引数
    ///
    /// * `begin` - 開始バイト位置（コードポイント境界）
    /// * `end` - 終了バイト位置（コードポイント境界）
    #[inline(always)]
    pub fn substring(&self, begin: usize, end: usize) -> &str {
        &self.modified[begin..end]
    }

    /// バイト位置に対応する書き換え後テキストの文字位置を返します。
    #[inline(always)]
    pub fn modified_char_index(&self, index: usize) -> usize {
        self.byte_to_char[index]
    }

    /// バイト位置に対応する元テキストの文字位置を返します。
    #[inline(always)]
    pub fn original_index(&self, index: usize) -> usize {
        self.byte_to_orig[index]
    }

    /// 元テキストの文字区間の部分文字列を返します。
    #[inline(always)]
    pub fn original_substring(&self, begin_char: usize, end_char: usize) -> &str {
        self.original.substring(begin_char, end_char)
    }

    /// バイト位置の文字のカテゴリ集合を返します。
    #[inline(always)]
    pub fn char_category_types_at(&self, index: usize) -> CategorySet {
        self.char_categories[self.byte_to_char[index]]
    }

    /// バイト区間の全文字に共通するカテゴリ集合を返します。
    ///
    /// 区間がカテゴリ連続区間を超える場合は空集合を返します。
    pub fn char_category_types_range(&self, begin: usize, end: usize) -> CategorySet {
        if begin + self.char_category_continuous_length(begin) < end {
            return CategorySet::new();
        }
        let b = self.byte_to_char[begin];
        let e = self.byte_to_char[end];
        let mut continuous = self.char_categories[b];
        for i in b + 1..e {
            continuous = continuous.intersection(&self.char_categories[i]);
        }
        continuous
    }

    /// バイト位置から始まる同一カテゴリ連続区間のバイト長を返します。
    #[inline(always)]
    pub fn char_category_continuous_length(&self, index: usize) -> usize {
        self.char_continuities.get(index).copied().unwrap_or(0)
    }

    /// バイト位置から`code_points`文字分のバイト長を返します。
    ///
    /// テキスト終端を超える場合は終端までの長さを返します。
    pub fn code_points_offset_length(&self, index: usize, code_points: usize) -> usize {
        let target = self.byte_to_char[index] + code_points;
        let mut length = 0;
        for i in index..self.len_bytes() {
            if self.byte_to_char[i] >= target {
                return length;
            }
            length += 1;
        }
        length
    }

    /// バイト区間に含まれるコードポイント数を返します。
    #[inline(always)]
    pub fn code_point_count(&self, begin: usize, end: usize) -> usize {
        self.byte_to_char[end] - self.byte_to_char[begin]
    }

    /// バイト位置で単語が開始できるかを判定します。
    ///
    /// コードポイント境界でない位置では常に`false`です。
    #[inline(always)]
    pub fn can_bow(&self, index: usize) -> bool {
        self.is_char_alignment(index) && self.can_bow[self.byte_to_char[index]]
    }

    /// 文字境界を元テキスト側の境界に合わせて拡張します。
    ///
    /// `eos`の直前の文字と同じ元テキスト位置に畳み込まれている文字が
    /// 続く場合、それらをすべて含む位置まで境界を進めます。
    pub fn next_in_original(&self, eos: usize) -> usize {
        let n = self.len_bytes();
        if eos == 0 || eos >= n {
            return eos.min(n);
        }
        let origin = self.byte_to_orig[eos - 1];
        let mut j = eos;
        while j < n && self.byte_to_orig[j] == origin {
            j += 1;
            while j < n && !self.is_char_alignment(j) {
                j += 1;
            }
        }
        j
    }

    /// バイト区間を切り出した新しい入力テキストを作成します。
    ///
    /// 元テキストへの対応は保持され、バイト・文字テーブルは
    /// 切り出し区間を基準に再計算されます。文単位の処理に使用します。
    pub fn slice(&self, begin: usize, end: usize) -> InputText {
        debug_assert!(self.is_char_alignment(begin));
        debug_assert!(end >= self.len_bytes() || self.is_char_alignment(end));

        let char_begin = self.byte_to_char[begin];
        let char_end = self.byte_to_char[end];
        let modified = self.modified[begin..end].to_string();
        let chars: Vec<char> = modified.chars().collect();

        let byte_to_char = self.byte_to_char[begin..=end]
            .iter()
            .map(|&c| c - char_begin)
            .collect();
        let byte_to_orig = self.byte_to_orig[begin..=end].to_vec();
        let char_categories = self.char_categories[char_begin..char_end].to_vec();
        let char_continuities = compute_continuities(&chars, &char_categories);
        let mut can_bow = self.can_bow[char_begin..char_end].to_vec();
        // The head of a sentence can always begin a word.
        if let Some(first) = can_bow.first_mut() {
            *first = true;
        }

        InputText {
            original: Arc::clone(&self.original),
            modified,
            byte_to_char,
            byte_to_orig,
            char_categories,
            char_continuities,
            can_bow,
        }
    }

    #[inline(always)]
    fn is_char_alignment(&self, index: usize) -> bool {
        index >= self.len_bytes() || (self.bytes()[index] & 0xC0) != 0x80
    }
}
