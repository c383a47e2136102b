//! トークン化処理のワーカー
//!
//! このモジュールは、トークン化の作業領域（ラティス）を所有する
//! ワーカーを提供します。作業領域は呼び出しをまたいで再利用され、
//! 不要なメモリ割り当てを避けます。ワーカーは共有されず、
//! 1つのトークナイザーから複数のワーカーを作って並行に使用できます。

use std::sync::Arc;

use crate::errors::Result;
use crate::input::InputText;
use crate::lattice::Lattice;
use crate::morpheme::MorphemeList;
use crate::sentence_detector::{NonBreakChecker, SentenceDetector};
use crate::tokenizer::{Mode, Tokenizer};

/// トークン化処理のワーカー。
///
/// # 例
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use kabosu::dictionary::SystemDictionaryBuilder;
/// use kabosu::tokenizer::{Mode, Tokenizer};
///
/// let dict = SystemDictionaryBuilder::from_readers(
///     "形態素,0,0,3,名詞,普通名詞,一般,*,*,*,ケイタイソ\n\
///      解析,0,0,3,名詞,普通名詞,サ変可能,*,*,*,カイセキ"
///         .as_bytes(),
///     "1 1\n0 0 0".as_bytes(),
///     "0x4E00..0x9FFF KANJI".as_bytes(),
/// )?;
/// let tokenizer = Tokenizer::new(dict);
/// let mut worker = tokenizer.new_worker();
/// let morphemes = worker.tokenize(Mode::C, "形態素解析")?;
/// for morpheme in morphemes.iter() {
///     println!("{}", morpheme.surface());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Worker<'a> {
    tokenizer: &'a Tokenizer,
    lattice: Lattice,
}

impl<'a> Worker<'a> {
    pub(crate) fn new(tokenizer: &'a Tokenizer) -> Self {
        Self {
            tokenizer,
            lattice: Lattice::new(),
        }
    }

    /// テキスト全体を1つの文としてトークン化します。
    ///
    /// # 引数
    ///
    /// * `mode` - 分割単位
    /// * `text` - 入力テキスト
    ///
    /// # エラー
    ///
    /// ラティスの整合性が壊れている場合にエラーを返します。
    pub fn tokenize(&mut self, mode: Mode, text: &str) -> Result<MorphemeList> {
        let input = Arc::new(self.tokenizer.build_input(text)?);
        self.tokenizer.tokenize_input(mode, input, &mut self.lattice)
    }

    /// テキストを文に分割し、文ごとにトークン化します。
    ///
    /// 文境界は正規化済みテキストの上で検出され、辞書語をまたぐ境界は
    /// 拒否されます。長い入力でもラティスのメモリ使用量は1文分に
    /// 抑えられます。
    ///
    /// # 引数
    ///
    /// * `mode` - 分割単位
    /// * `text` - 入力テキスト
    pub fn tokenize_sentences(&mut self, mode: Mode, text: &str) -> Result<Vec<MorphemeList>> {
        let input = Arc::new(self.tokenizer.build_input(text)?);
        let n = input.len_bytes();
        if n == 0 {
            return Ok(vec![]);
        }

        let detector = SentenceDetector::with_limit(self.tokenizer.sentence_limit_bytes());
        let mut results = vec![];
        let mut bos = 0;
        while bos < n {
            let checker = CrossingWordChecker {
                input: &input,
                tokenizer: self.tokenizer,
                bos,
            };
            let length = detector.get_eos(&input.text()[bos..], Some(&checker));
            if length == 0 {
                break;
            }
            let mut eos = bos + length;
            if eos < n {
                // Never cut between characters that collapsed onto the
                // same original position.
                eos = input.next_in_original(eos);
            }
            log::debug!("Detected a sentence: bytes {bos}..{eos}");
            let sentence = Arc::new(input.slice(bos, eos));
            results.push(
                self.tokenizer
                    .tokenize_input(mode, sentence, &mut self.lattice)?,
            );
            bos = eos;
        }
        Ok(results)
    }
}

/// 文境界候補が辞書語の内部に落ちないことを検証するチェッカー。
struct CrossingWordChecker<'a> {
    input: &'a InputText,
    tokenizer: &'a Tokenizer,
    bos: usize,
}

impl NonBreakChecker for CrossingWordChecker<'_> {
    fn has_non_break_word(&self, eos: usize) -> bool {
        let byte_eos = self.bos + eos;
        let bytes = self.input.bytes();
        let lexicon = self.tokenizer.dictionary().lexicon();
        // Words can be at most 64 bytes back from the boundary.
        let start = byte_eos.saturating_sub(64).max(self.bos);
        for i in start..byte_eos {
            for found in lexicon.lookup(bytes, i) {
                if found.end_byte > byte_eos {
                    return true;
                }
            }
        }
        false
    }
}
