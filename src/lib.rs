//! # kabosu
//!
//! kabosuは、辞書駆動の日本語形態素解析器です。入力テキストから
//! 形態素の列（表層区間、品詞、正規化形・読み・辞書形）を、
//! 複数の分割単位で取り出します。
//!
//! ## 概要
//!
//! 解析はViterbiアルゴリズムに基づきます。正規化された入力テキストの
//! 各バイト位置で辞書を引いて候補ラティスを構築し、接続コスト行列に
//! よる最小コストパスを求め、パス書き換えプラグインで調整した後、
//! 要求された分割単位の形態素列に展開します。
//!
//! ## 主な機能
//!
//! - **多段分割**: 短単位（A）・中単位（B）・見出し語単位（C）の3つの粒度
//! - **テキスト正規化**: オフセットの出自を追跡する入力テキストプラグイン
//! - **未知語処理**: 文字カテゴリ・正規表現・フォールバックの未知語プラグイン
//! - **パス書き換え**: カタカナ連結・数値連結と数値正規化
//! - **文分割**: 辞書語をまたがない文境界の検出
//! - **辞書のマージ**: 1つのシステム辞書と複数のユーザー辞書
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kabosu::dictionary::SystemDictionaryBuilder;
//! use kabosu::{Mode, Tokenizer};
//!
//! let lexicon_csv = "京都,4,4,5,名詞,固有名詞,地名,一般,*,*,キョウト
//! 東京,5,5,4,名詞,固有名詞,地名,一般,*,*,トウキョウ
//! 東京都,5,5,9,名詞,固有名詞,地名,一般,*,*,トウキョウト,*,*,1/3,*,1/3,*
//! 都,4,4,5,名詞,普通名詞,一般,*,*,*,ト";
//! let matrix_def = "10 10\n0 4 -5\n0 5 -9";
//! let char_def = "0x4E00..0x9FFF KANJI";
//!
//! let dict = SystemDictionaryBuilder::from_readers(
//!     lexicon_csv.as_bytes(),
//!     matrix_def.as_bytes(),
//!     char_def.as_bytes(),
//! )?;
//!
//! let tokenizer = Tokenizer::new(dict);
//! let mut worker = tokenizer.new_worker();
//!
//! let morphemes = worker.tokenize(Mode::C, "東京都")?;
//! assert_eq!(morphemes.len(), 1);
//! assert_eq!(morphemes.get(0).surface(), "東京都");
//! assert_eq!(morphemes.get(0).reading_form(), "トウキョウト");
//!
//! let shorter = morphemes.get(0).split(Mode::A)?;
//! assert_eq!(shorter.len(), 2);
//! assert_eq!(shorter.get(0).surface(), "東京");
//! assert_eq!(shorter.get(1).surface(), "都");
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// 共通の型定義と定数
pub mod common;

/// トークナイザー設定
pub mod config;

/// 辞書データ構造とビルダー
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// 入力テキストの内部表現
pub mod input;

/// ラティス構造とViterbi探索
pub mod lattice;

/// 形態素の結果コンテナ
pub mod morpheme;

/// 数値表記の正規化
pub mod numeric;

/// プラグインパイプライン
pub mod plugin;

/// 文境界検出
pub mod sentence_detector;

/// トークナイザーの実装
pub mod tokenizer;

#[cfg(test)]
mod tests;

// Re-exports
pub use config::TokenizerConfig;
pub use dictionary::{Dictionary, SystemDictionaryBuilder, UserDictionary, UserDictionaryBuilder};
pub use errors::{KabosuError, Result};
pub use morpheme::{Morpheme, MorphemeList};
pub use tokenizer::{Mode, Tokenizer};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
