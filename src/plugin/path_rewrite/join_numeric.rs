//! 数値連続区間の連結プラグイン
//!
//! 数値形態素の連続区間を1つの形態素に連結します。正規化が有効な場合、
//! 連結後の正規化形は[`crate::numeric::NumericParser`]が生成する
//! 10進数文字列になります。正規化に失敗した区間は連結されず、
//! 元の形態素列がそのまま残ります。

use crate::dictionary::character::CategoryType;
use crate::dictionary::lexicon_set::LexiconSet;
use crate::errors::Result;
use crate::input::InputText;
use crate::lattice::{Lattice, Node};
use crate::numeric::NumericParser;
use crate::plugin::path_rewrite::concatenate;

/// 数値連続区間の種類。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum RunKind {
    Numeric,
    KanjiNumeric,
}

/// 数値連続区間の連結プラグイン。
///
/// NUMERICの連続区間は常に連結されます。KANJINUMERICの連続区間は
/// `join_kanji_numeric`が有効な場合にのみ連結され、NUMERICと
/// KANJINUMERICの混在区間は`join_all_numeric`が有効な場合にのみ
/// 連結されます。
pub struct JoinNumericPlugin {
    join_kanji_numeric: bool,
    join_all_numeric: bool,
    enable_normalize: bool,
}

impl JoinNumericPlugin {
    /// フラグを指定してプラグインを構築します。
    pub fn new(join_kanji_numeric: bool, join_all_numeric: bool, enable_normalize: bool) -> Self {
        Self {
            join_kanji_numeric,
            join_all_numeric,
            enable_normalize,
        }
    }

    pub(crate) fn rewrite(
        &self,
        input: &InputText,
        path: &mut Vec<Node>,
        lattice: &Lattice,
        lexicon: &LexiconSet,
    ) -> Result<()> {
        let _ = lattice;
        let mut begin_index: Option<usize> = None;
        let mut run_kind = RunKind::Numeric;
        let mut parser = NumericParser::new();

        let mut i = 0;
        while i < path.len() {
            let types = input.char_category_types_range(path[i].begin, path[i].end);
            let s = path[i].word_info(lexicon).normalized_form.clone();
            let is_delim = s == "." || s == ",";
            let is_kanji = types.contains(CategoryType::KanjiNumeric)
                && (self.join_kanji_numeric || self.join_all_numeric);
            let is_numeric = types.contains(CategoryType::Numeric);

            if is_numeric || is_kanji || is_delim {
                let kind = if is_kanji {
                    RunKind::KanjiNumeric
                } else if is_numeric {
                    RunKind::Numeric
                } else {
                    // separators continue the current run
                    run_kind
                };
                match begin_index {
                    None => {
                        parser.clear();
                        begin_index = Some(i);
                        run_kind = kind;
                    }
                    Some(b) => {
                        if kind != run_kind && !self.join_all_numeric && !is_delim {
                            // Close the run at the kind boundary.
                            if parser.done() {
                                let removed = self.concat(path, b, i, lexicon, &mut parser)?;
                                i -= removed;
                            }
                            parser.clear();
                            begin_index = Some(i);
                            run_kind = kind;
                        }
                    }
                }

                let mut failed = false;
                for c in s.chars() {
                    if !parser.append(c) {
                        failed = true;
                        break;
                    }
                }
                if failed {
                    if let Some(b) = begin_index {
                        if is_delim && b != i {
                            i = self.split(&s, path, b, i, lexicon)? + 1;
                        }
                    }
                    begin_index = None;
                }
            } else {
                if let Some(b) = begin_index.take() {
                    if parser.done() {
                        self.concat(path, b, i, lexicon, &mut parser)?;
                        i = b + 1;
                    }
                }
            }
            i += 1;
        }

        if let Some(b) = begin_index {
            if parser.done() {
                self.concat(path, b, path.len(), lexicon, &mut parser)?;
            }
        }
        Ok(())
    }

    /// 連結を実行します。
    ///
    /// 正規化が有効な場合、単一ノードでも正規化形が変わるなら
    /// 置き換えます。
    ///
    /// # 戻り値
    ///
    /// パスから取り除かれたノード数
    fn concat(
        &self,
        path: &mut Vec<Node>,
        begin: usize,
        end: usize,
        lexicon: &LexiconSet,
        parser: &mut NumericParser,
    ) -> Result<usize> {
        if begin >= end {
            return Ok(0);
        }
        if self.enable_normalize {
            let normalized = parser.normalized();
            if end - begin > 1 || normalized != path[begin].word_info(lexicon).normalized_form {
                return concatenate(path, begin, end, lexicon, Some(normalized));
            }
            Ok(0)
        } else {
            if end - begin > 1 {
                return concatenate(path, begin, end, lexicon, None);
            }
            Ok(0)
        }
    }

    /// 区切り文字の位置で区間を分割し、それぞれを連結します。
    ///
    /// # 戻り値
    ///
    /// 最後の区間の開始インデックス
    fn split(
        &self,
        delim: &str,
        path: &mut Vec<Node>,
        begin: usize,
        end: usize,
        lexicon: &LexiconSet,
    ) -> Result<usize> {
        let mut parser = NumericParser::new();
        let mut b = begin;
        let mut end = end;
        let mut i = begin;
        while i < end {
            let s = path[i].word_info(lexicon).normalized_form.clone();
            if s == delim {
                let _ = parser.done();
                if i > b {
                    self.concat(path, b, i, lexicon, &mut parser)?;
                    end -= i - b - 1;
                    i = b + 1;
                }
                b = i + 1;
                parser.clear();
            } else {
                for c in s.chars() {
                    let _ = parser.append(c);
                }
            }
            i += 1;
        }
        let _ = parser.done();
        if end > b {
            self.concat(path, b, end, lexicon, &mut parser)?;
        }
        Ok(b)
    }
}
