//! 文境界検出
//!
//! このモジュールは、正規化済みテキストから文末位置を見つける
//! 規則ベースの検出器を提供します。句読点・括弧の対応・箇条書き・
//! 引用の連続などを考慮し、辞書語の内部で分割しないための
//! フック（[`NonBreakChecker`]）を受け付けます。

use std::sync::LazyLock;

use regex::Regex;

use crate::common::DEFAULT_SENTENCE_LIMIT_BYTES;

const PERIODS: &str = "。？！♪…?!";
const DOTS: &str = ".．";
const COMMAS: &str = ",，、";
const OPEN_PARENTHESIS: &str = "({｛[（「【『［≪〔“";
const CLOSE_PARENTHESIS: &str = ")}]）」｝】』］〕≫”";
const ALPHABET_OR_NUMBER: &str = "〇一二三四五六七八九十百千万億兆";

// The dot alternative is validated against its neighbors in code because
// the regex engine has no lookaround.
static SENTENCE_BREAKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[。？！♪…?!]|・{3,}|[.．]|(?:<br>|<BR>){2,}").expect("static pattern")
});

static TRAILING_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+\s+").expect("static pattern"));

fn is_period(c: char) -> bool {
    PERIODS.contains(c)
}

fn is_dot(c: char) -> bool {
    DOTS.contains(c)
}

fn is_comma(c: char) -> bool {
    COMMAS.contains(c)
}

fn is_alphabet_or_number(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || ('ａ'..='ｚ').contains(&c)
        || ('Ａ'..='Ｚ').contains(&c)
        || ('０'..='９').contains(&c)
        || ALPHABET_OR_NUMBER.contains(c)
}

/// 文末候補が辞書語の内部に落ちるかを判定するフック。
pub trait NonBreakChecker {
    /// `eos`（バイト位置）をまたぐ辞書語が存在するかを返します。
    fn has_non_break_word(&self, eos: usize) -> bool;
}

/// 規則ベースの文境界検出器。
///
/// 検出対象は1文の最大長（バイト単位）で制限され、制限内に境界が
/// 見つからない場合は制限自体が強制的な境界になります。
pub struct SentenceDetector {
    limit: usize,
}

impl Default for SentenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceDetector {
    /// デフォルトの最大長で検出器を作成します。
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_SENTENCE_LIMIT_BYTES,
        }
    }

    /// 最大長（バイト単位）を指定して検出器を作成します。
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: if limit > 0 {
                limit
            } else {
                DEFAULT_SENTENCE_LIMIT_BYTES
            },
        }
    }

    /// 最初の文の終端バイト位置を返します。
    ///
    /// 境界が見つからない場合、末尾の空白連続、それもなければ
    /// 最大長（コードポイント境界に切り下げ）を返します。
    ///
    /// # 引数
    ///
    /// * `input` - 正規化済みテキスト
    /// * `checker` - 辞書語の内部での分割を拒否するフック
    pub fn get_eos(&self, input: &str, checker: Option<&dyn NonBreakChecker>) -> usize {
        if input.is_empty() {
            return 0;
        }

        let s = if input.len() > self.limit {
            let mut end = self.limit;
            while end > 0 && !input.is_char_boundary(end) {
                end -= 1;
            }
            &input[..end]
        } else {
            input
        };

        for found in SENTENCE_BREAKER.find_iter(s) {
            let matched = found.as_str();
            if matched.chars().all(is_dot) && matched.chars().count() == 1 {
                // A bare dot breaks only outside digit and word contexts.
                let prev = s[..found.start()].chars().next_back();
                let next = s[found.end()..].chars().next();
                if prev.map(is_alphabet_or_number).unwrap_or(false) {
                    continue;
                }
                if next
                    .map(|c| is_alphabet_or_number(c) || is_comma(c))
                    .unwrap_or(false)
                {
                    continue;
                }
            }

            let mut eos = found.end();
            for c in s[eos..].chars() {
                if is_dot(c) || is_period(c) {
                    eos += c.len_utf8();
                } else {
                    break;
                }
            }

            if parenthesis_level(&s[..eos]) != 0 {
                continue;
            }
            if eos < s.len() {
                eos += prohibited_bos(&s[eos..]);
            }
            if is_itemize_header(&s[..eos]) {
                continue;
            }
            if eos < s.len() && is_continuous_phrase(s, eos) {
                continue;
            }
            if let Some(checker) = checker {
                if checker.has_non_break_word(eos) {
                    continue;
                }
            }
            return eos;
        }

        // No boundary within the limit; prefer breaking after spaces.
        if let Some(found) = TRAILING_SPACES.find(s) {
            return found.end();
        }
        s.len()
    }
}

/// 閉じられていない括弧の深さを返します。
fn parenthesis_level(s: &str) -> usize {
    let mut level = 0usize;
    for c in s.chars() {
        if OPEN_PARENTHESIS.contains(c) {
            level += 1;
        } else if CLOSE_PARENTHESIS.contains(c) {
            level = level.saturating_sub(1);
        }
    }
    level
}

/// 文頭に置けない文字の連続のバイト長を返します。
fn prohibited_bos(s: &str) -> usize {
    let mut length = 0;
    for c in s.chars() {
        if CLOSE_PARENTHESIS.contains(c) || is_comma(c) || is_period(c) {
            length += c.len_utf8();
        } else {
            break;
        }
    }
    length
}

/// 文全体が「1.」のような箇条書きの見出しかを判定します。
fn is_itemize_header(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(first), Some(second), None) => is_alphabet_or_number(first) && is_dot(second),
        _ => false,
    }
}

/// 境界の前後が引用や箇条書きの続きになっているかを判定します。
fn is_continuous_phrase(s: &str, eos: usize) -> bool {
    if let Some(prev) = s[..eos].chars().next_back() {
        if matches!(prev, '！' | '？' | '!' | '?') || CLOSE_PARENTHESIS.contains(prev) {
            let rest = &s[eos..];
            if rest.starts_with('と') || rest.starts_with('っ') || rest.starts_with("です") {
                return true;
            }
        }
    }

    let next = s[eos..].chars().next();
    if matches!(next, Some('と') | Some('や') | Some('の')) {
        let mut before = s[..eos].chars().rev();
        if let (Some(last), Some(second_last)) = (before.next(), before.next()) {
            return is_dot(last) && is_alphabet_or_number(second_last);
        }
    }
    false
}
