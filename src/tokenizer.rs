//! トークナイザー
//!
//! このモジュールは、形態素解析の全段階を束ねるオーケストレータを
//! 提供します。1回のトークン化は以下の順に進みます:
//!
//! 1. 入力テキストプラグインによる書き換え（テキストモデルが出自を追跡）
//! 2. 各バイト位置での辞書引きと未知語生成によるラティス構築
//! 3. Viterbi探索による最小コストパスの決定
//! 4. パス書き換えプラグインによる調整
//! 5. 指定された分割単位へのパス展開と形態素リストの組み立て
//!
//! # 例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kabosu::dictionary::SystemDictionaryBuilder;
//! use kabosu::tokenizer::{Mode, Tokenizer};
//!
//! let dict = SystemDictionaryBuilder::from_readers(
//!     "京都,0,0,2,名詞,固有名詞,地名,一般,*,*,キョウト\n\
//!      東京,0,0,2,名詞,固有名詞,地名,一般,*,*,トウキョウ\n\
//!      東京都,0,0,3,名詞,固有名詞,地名,一般,*,*,トウキョウト"
//!         .as_bytes(),
//!     "1 1\n0 0 0".as_bytes(),
//!     "0x4E00..0x9FFF KANJI".as_bytes(),
//! )?;
//! let tokenizer = Tokenizer::new(dict);
//! let mut worker = tokenizer.new_worker();
//!
//! let morphemes = worker.tokenize(Mode::C, "東京都")?;
//! assert_eq!(morphemes.len(), 1);
//! assert_eq!(morphemes.get(0).surface(), "東京都");
//! # Ok(())
//! # }
//! ```

pub mod worker;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::common::{WordMask, DEFAULT_SENTENCE_LIMIT_BYTES};
use crate::config::{
    InputTextPluginConfig, OovProviderPluginConfig, PathRewritePluginConfig, TokenizerConfig,
};
use crate::dictionary::character::CategoryType;
use crate::dictionary::grammar::{PartOfSpeech, WordParam};
use crate::dictionary::word_id::WordId;
use crate::dictionary::Dictionary;
use crate::errors::{KabosuError, Result};
use crate::input::{InputText, InputTextBuilder};
use crate::lattice::{Lattice, Node};
use crate::morpheme::MorphemeList;
use crate::plugin::input_text::{
    DefaultInputTextPlugin, IgnoreYomiganaPlugin, InputTextPlugin, ProlongedSoundMarkPlugin,
};
use crate::plugin::oov::regex::BoundaryMode;
use crate::plugin::oov::{MecabOovProvider, OovProviderPlugin, RegexOovProvider, SimpleOovProvider};
use crate::plugin::path_rewrite::{JoinKatakanaOovPlugin, JoinNumericPlugin, PathRewritePlugin};
use crate::tokenizer::worker::Worker;

/// 分割単位。
///
/// ```text
/// A：選挙/管理/委員/会
/// B：選挙/管理/委員会
/// C：選挙管理委員会
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// 最も細かい分割単位
    A,
    /// 中間の分割単位
    B,
    /// 辞書の見出し語そのままの分割単位
    C,
}

impl FromStr for Mode {
    type Err = KabosuError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A" | "a" => Ok(Mode::A),
            "B" | "b" => Ok(Mode::B),
            "C" | "c" => Ok(Mode::C),
            _ => Err(KabosuError::invalid_argument(
                "mode",
                "Mode must be one of \"A\", \"B\", or \"C\" (in lower or upper case).",
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Mode::A => "A",
            Mode::B => "B",
            Mode::C => "C",
        };
        f.write_str(repr)
    }
}

/// 形態素解析を行うトークナイザー。
///
/// 辞書とプラグインパイプラインを保持します。トークナイザー自体は
/// 可変の共有状態を持たず、1つの辞書を複数のトークナイザーおよび
/// 複数のワーカーで共有できます。実際の解析は[`Worker`]が行います。
pub struct Tokenizer {
    dict: Arc<Dictionary>,
    input_text_plugins: Vec<InputTextPlugin>,
    oov_provider_plugins: Vec<OovProviderPlugin>,
    path_rewrite_plugins: Vec<PathRewritePlugin>,
    allow_empty_morpheme: bool,
    sentence_limit_bytes: usize,
}

impl Tokenizer {
    /// プラグインなしのトークナイザーを作成します。
    ///
    /// 全位置の被覆を保証するため、1文字のフォールバック未知語
    /// プラグインだけが組み込まれます。
    pub fn new(dict: Dictionary) -> Self {
        let fallback =
            OovProviderPlugin::Simple(SimpleOovProvider::with_pos_id(WordParam::new(0, 0, 10000), 0));
        Self {
            dict: Arc::new(dict),
            input_text_plugins: vec![],
            oov_provider_plugins: vec![fallback],
            path_rewrite_plugins: vec![],
            allow_empty_morpheme: true,
            sentence_limit_bytes: DEFAULT_SENTENCE_LIMIT_BYTES,
        }
    }

    /// 設定からトークナイザーを構築します。
    ///
    /// プラグインの検証はここで行われ、設定の誤り（品詞の要素数の
    /// 不正、範囲外の接続ID、不正な正規表現など）はトークン化の前に
    /// エラーとして報告されます。
    ///
    /// # 引数
    ///
    /// * `dict` - 使用する辞書。プラグインが必要とする品詞タグが登録されます
    /// * `config` - 宣言的なプラグイン設定
    pub fn from_config(mut dict: Dictionary, config: &TokenizerConfig) -> Result<Self> {
        let mut input_text_plugins = Vec::with_capacity(config.input_text_plugins.len());
        for plugin_config in &config.input_text_plugins {
            input_text_plugins.push(Self::setup_input_text_plugin(plugin_config)?);
        }

        let mut oov_provider_plugins = Vec::with_capacity(config.oov_provider_plugins.len());
        for plugin_config in &config.oov_provider_plugins {
            oov_provider_plugins.push(Self::setup_oov_plugin(plugin_config, &mut dict)?);
        }
        if oov_provider_plugins.is_empty() {
            // The full-coverage invariant needs at least one fallback.
            oov_provider_plugins.push(OovProviderPlugin::Simple(SimpleOovProvider::with_pos_id(
                WordParam::new(0, 0, 10000),
                0,
            )));
        }

        let mut path_rewrite_plugins = Vec::with_capacity(config.path_rewrite_plugins.len());
        for plugin_config in &config.path_rewrite_plugins {
            path_rewrite_plugins.push(Self::setup_path_rewrite_plugin(plugin_config, &mut dict)?);
        }

        log::debug!(
            "Set up a tokenizer: {} input text, {} OOV, {} path rewrite plugins",
            input_text_plugins.len(),
            oov_provider_plugins.len(),
            path_rewrite_plugins.len()
        );
        Ok(Self {
            dict: Arc::new(dict),
            input_text_plugins,
            oov_provider_plugins,
            path_rewrite_plugins,
            allow_empty_morpheme: config.allow_empty_morpheme,
            sentence_limit_bytes: config.sentence_limit_bytes,
        })
    }

    fn setup_input_text_plugin(config: &InputTextPluginConfig) -> Result<InputTextPlugin> {
        Ok(match config {
            InputTextPluginConfig::Default { rewrite_def } => match rewrite_def {
                Some(def) => {
                    InputTextPlugin::Default(DefaultInputTextPlugin::from_rewrite_def(def)?)
                }
                None => InputTextPlugin::Default(DefaultInputTextPlugin::new()),
            },
            InputTextPluginConfig::ProlongedSoundMark {
                prolonged_sound_marks,
                replacement_symbol,
            } => {
                let mut plugin = ProlongedSoundMarkPlugin::default();
                if let Some(marks) = prolonged_sound_marks {
                    let marks = marks
                        .iter()
                        .map(|s| single_char(s, "prolonged_sound_marks"))
                        .collect::<Result<Vec<_>>>()?;
                    let replacement = replacement_symbol.clone().unwrap_or_else(|| "ー".to_string());
                    plugin = ProlongedSoundMarkPlugin::new(marks, replacement);
                } else if let Some(replacement) = replacement_symbol {
                    plugin = ProlongedSoundMarkPlugin::new(
                        crate::plugin::input_text::prolonged_sound_mark::DEFAULT_PROLONGED_SOUND_MARKS
                            .to_vec(),
                        replacement.clone(),
                    );
                }
                InputTextPlugin::ProlongedSoundMark(plugin)
            }
            InputTextPluginConfig::IgnoreYomigana {
                left_brackets,
                right_brackets,
                max_yomigana_length,
            } => {
                let left = match left_brackets {
                    Some(brackets) => brackets
                        .iter()
                        .map(|s| single_char(s, "left_brackets"))
                        .collect::<Result<Vec<_>>>()?,
                    None => vec!['(', '（'],
                };
                let right = match right_brackets {
                    Some(brackets) => brackets
                        .iter()
                        .map(|s| single_char(s, "right_brackets"))
                        .collect::<Result<Vec<_>>>()?,
                    None => vec![')', '）'],
                };
                InputTextPlugin::IgnoreYomigana(IgnoreYomiganaPlugin::new(
                    left,
                    right,
                    *max_yomigana_length,
                ))
            }
        })
    }

    fn setup_oov_plugin(
        config: &OovProviderPluginConfig,
        dict: &mut Dictionary,
    ) -> Result<OovProviderPlugin> {
        Ok(match config {
            OovProviderPluginConfig::Mecab { char_def, unk_def } => OovProviderPlugin::Mecab(
                MecabOovProvider::from_definitions(char_def, unk_def, dict.grammar_mut())?,
            ),
            OovProviderPluginConfig::Regex {
                regex,
                left_id,
                right_id,
                cost,
                oov_pos,
                max_length,
                boundaries,
            } => {
                let boundaries = match boundaries.to_ascii_lowercase().as_str() {
                    "strict" => BoundaryMode::Strict,
                    "relaxed" => BoundaryMode::Relaxed,
                    other => {
                        return Err(KabosuError::invalid_argument(
                            "boundaries",
                            format!("allowed values are strict and relaxed, got {other}"),
                        ));
                    }
                };
                OovProviderPlugin::Regex(RegexOovProvider::new(
                    regex,
                    WordParam::new(*left_id, *right_id, *cost),
                    parse_pos(oov_pos)?,
                    *max_length,
                    boundaries,
                    dict.grammar_mut(),
                )?)
            }
            OovProviderPluginConfig::Simple {
                left_id,
                right_id,
                cost,
                oov_pos,
            } => OovProviderPlugin::Simple(SimpleOovProvider::new(
                WordParam::new(*left_id, *right_id, *cost),
                parse_pos(oov_pos)?,
                dict.grammar_mut(),
            )?),
        })
    }

    fn setup_path_rewrite_plugin(
        config: &PathRewritePluginConfig,
        dict: &mut Dictionary,
    ) -> Result<PathRewritePlugin> {
        Ok(match config {
            PathRewritePluginConfig::JoinKatakanaOov {
                oov_pos,
                min_length,
            } => PathRewritePlugin::JoinKatakanaOov(JoinKatakanaOovPlugin::new(
                parse_pos(oov_pos)?,
                *min_length,
                dict.grammar_mut(),
            )),
            PathRewritePluginConfig::JoinNumeric {
                join_kanji_numeric,
                join_all_numeric,
                enable_normalize,
            } => PathRewritePlugin::JoinNumeric(JoinNumericPlugin::new(
                *join_kanji_numeric,
                *join_all_numeric,
                *enable_normalize,
            )),
        })
    }

    /// 使用している辞書への参照を返します。
    #[inline(always)]
    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dict
    }

    /// 新しいワーカーを作成します。
    ///
    /// ワーカーはラティスなどの作業領域を所有し、呼び出しをまたいで
    /// 再利用します。複数のワーカーは並行に動作できます。
    pub fn new_worker(&self) -> Worker<'_> {
        Worker::new(self)
    }

    #[inline(always)]
    pub(crate) fn sentence_limit_bytes(&self) -> usize {
        self.sentence_limit_bytes
    }

    /// 入力テキストプラグインを適用し、テキストモデルを確定します。
    pub(crate) fn build_input(&self, text: &str) -> Result<InputText> {
        let mut builder = InputTextBuilder::new(text, self.dict.grammar().char_category());
        for plugin in &self.input_text_plugins {
            plugin.rewrite(&mut builder)?;
        }
        Ok(builder.build())
    }

    /// 1文をトークン化します。
    ///
    /// ラティスの構築、Viterbi探索、パス書き換え、分割単位への展開を
    /// 行います。
    pub(crate) fn tokenize_input(
        &self,
        mode: Mode,
        input: Arc<InputText>,
        lattice: &mut Lattice,
    ) -> Result<MorphemeList> {
        if input.len_bytes() == 0 {
            return Ok(MorphemeList::new(
                input,
                Arc::clone(&self.dict),
                vec![],
                self.allow_empty_morpheme,
            ));
        }

        self.build_lattice(&input, lattice)?;
        let mut path = lattice.best_path(self.dict.grammar().connector())?;
        log::trace!(
            "Found the best path: {} nodes over {} bytes",
            path.len(),
            input.len_bytes()
        );

        for plugin in &self.path_rewrite_plugins {
            plugin.rewrite(&input, &mut path, lattice, self.dict.lexicon())?;
        }

        let path = self.expand_path(mode, path)?;
        Ok(MorphemeList::new(
            input,
            Arc::clone(&self.dict),
            path,
            self.allow_empty_morpheme,
        ))
    }

    /// 辞書引きと未知語生成でラティスを構築します。
    fn build_lattice(&self, input: &InputText, lattice: &mut Lattice) -> Result<()> {
        let bytes = input.bytes();
        let connector = self.dict.grammar().connector();
        let lexicon = self.dict.lexicon();
        lattice.reset(bytes.len());

        let mut oov_nodes: Vec<Node> = vec![];
        for i in 0..bytes.len() {
            if !input.can_bow(i) || !lattice.has_previous_node(i) {
                continue;
            }

            let mut word_mask = WordMask::default();
            let mut has_words = false;
            for found in lexicon.lookup(bytes, i) {
                if found.end_byte > bytes.len() {
                    continue;
                }
                word_mask.add_nth(input.code_point_count(i, found.end_byte));
                lattice.insert(
                    i,
                    found.end_byte,
                    Node::for_word(found.word_id, found.param),
                    connector,
                );
                has_words = true;
            }

            oov_nodes.clear();
            if !input
                .char_category_types_at(i)
                .contains(CategoryType::NoOovBow)
            {
                for plugin in &self.oov_provider_plugins {
                    let start = oov_nodes.len();
                    plugin.provide(input, i, word_mask, &mut oov_nodes)?;
                    for node in &oov_nodes[start..] {
                        word_mask.add_nth(input.code_point_count(node.begin, node.end));
                        has_words = true;
                    }
                }
            }
            if !has_words {
                // The last provider doubles as the guaranteed fallback.
                if let Some(fallback) = self.oov_provider_plugins.last() {
                    let n = fallback.provide(input, i, word_mask, &mut oov_nodes)?;
                    if n > 0 {
                        has_words = true;
                    }
                }
            }
            for node in oov_nodes.drain(..) {
                let (begin, end) = (node.begin, node.end);
                lattice.insert(begin, end, node, connector);
            }

            if !has_words {
                return Err(KabosuError::invalid_state(
                    format!("there is no morpheme at {i}"),
                    "the OOV coverage is broken",
                ));
            }
        }
        Ok(())
    }

    /// 最良パスを指定された分割単位に展開します。
    fn expand_path(&self, mode: Mode, path: Vec<Node>) -> Result<Vec<Node>> {
        if mode == Mode::C {
            return Ok(path);
        }
        let lexicon = self.dict.lexicon();
        let mut new_path = Vec::with_capacity(path.len());
        for node in path {
            let word_ids = {
                let info = node.word_info(lexicon);
                match mode {
                    Mode::A => info.a_unit_split.clone(),
                    Mode::B => info.b_unit_split.clone(),
                    Mode::C => unreachable!(),
                }
            };
            if word_ids.len() < 2 {
                new_path.push(node);
                continue;
            }
            let mut offset = node.begin;
            for packed in word_ids {
                let word_id = WordId::from_packed(packed);
                let length = lexicon
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
                new_path.push(sub);
            }
        }
        Ok(new_path)
    }
}

fn parse_pos(pos: &[String]) -> Result<PartOfSpeech> {
    let parts: Vec<&str> = pos.iter().map(String::as_str).collect();
    PartOfSpeech::from_strs(&parts).ok_or_else(|| {
        KabosuError::invalid_argument(
            "oov_pos",
            format!("A POS must have six components: {:?}", pos.join(",")),
        )
    })
}

fn single_char(s: &str, arg: &'static str) -> Result<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(KabosuError::invalid_argument(
            arg,
            format!("{s} is not a single character"),
        )),
    }
}
