//! トークナイザー設定
//!
//! このモジュールは、プラグインパイプラインを宣言的に記述する
//! 設定モデルを提供します。プラグインは種類ごとのタグ付きバリアントで
//! 指定され、リストの順序がそのまま適用順になります。
//! 設定ファイルの探索やマージは行いません。JSON文字列の読み込みだけを
//! 提供し、ファイルの取得は呼び出し側の責務です。
//!
//! # 設定例
//!
//! ```json
//! {
//!   "oov_provider_plugins": [
//!     {"type": "mecab", "char_def": "DEFAULT 0 1 0", "unk_def": "DEFAULT,0,0,3000,補助記号,一般,*,*,*,*"},
//!     {"type": "simple", "left_id": 0, "right_id": 0, "cost": 30000,
//!      "oov_pos": ["補助記号", "一般", "*", "*", "*", "*"]}
//!   ],
//!   "path_rewrite_plugins": [
//!     {"type": "join_numeric", "enable_normalize": true}
//!   ]
//! }
//! ```

use serde::Deserialize;

use crate::common::DEFAULT_SENTENCE_LIMIT_BYTES;
use crate::errors::Result;

/// トークナイザーの設定。
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TokenizerConfig {
    /// 入力テキストプラグインのリスト（適用順）
    pub input_text_plugins: Vec<InputTextPluginConfig>,
    /// 未知語プラグインのリスト。各オフセットですべて実行され、
    /// 最後のプラグインがフォールバックを兼ねます
    pub oov_provider_plugins: Vec<OovProviderPluginConfig>,
    /// パス書き換えプラグインのリスト（適用順）
    pub path_rewrite_plugins: Vec<PathRewritePluginConfig>,
    /// 長さ0の形態素を許可するかどうか
    pub allow_empty_morpheme: bool,
    /// 1文の最大バイト長
    pub sentence_limit_bytes: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            input_text_plugins: vec![],
            oov_provider_plugins: vec![],
            path_rewrite_plugins: vec![],
            allow_empty_morpheme: true,
            sentence_limit_bytes: DEFAULT_SENTENCE_LIMIT_BYTES,
        }
    }
}

impl TokenizerConfig {
    /// JSON文字列から設定を読み込みます。
    ///
    /// # エラー
    ///
    /// JSONのパースに失敗した場合にエラーを返します。
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// 入力テキストプラグインの設定。
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputTextPluginConfig {
    /// 小文字化とNFKC正規化
    Default {
        /// `rewrite.def`形式の定義（インライン）
        #[serde(default)]
        rewrite_def: Option<String>,
    },
    /// 長音記号の畳み込み
    ProlongedSoundMark {
        /// 長音記号として扱う文字のリスト
        #[serde(default)]
        prolonged_sound_marks: Option<Vec<String>>,
        /// 置換後の文字列
        #[serde(default)]
        replacement_symbol: Option<String>,
    },
    /// 括弧書きの読み仮名の除去
    IgnoreYomigana {
        /// 開き括弧のリスト
        #[serde(default)]
        left_brackets: Option<Vec<String>>,
        /// 閉じ括弧のリスト
        #[serde(default)]
        right_brackets: Option<Vec<String>>,
        /// 読み仮名の最大長
        #[serde(default = "default_max_yomigana_length")]
        max_yomigana_length: usize,
    },
}

/// 未知語プラグインの設定。
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OovProviderPluginConfig {
    /// 文字カテゴリに基づく未知語生成
    Mecab {
        /// カテゴリ設定（`char.def`のカテゴリ行、インライン）
        char_def: String,
        /// 未知語定義（`unk.def`形式、インライン）
        unk_def: String,
    },
    /// 正規表現に基づく未知語生成
    Regex {
        /// マッチさせる正規表現
        regex: String,
        /// 左文脈ID
        left_id: u16,
        /// 右文脈ID
        right_id: u16,
        /// 生起コスト
        cost: i16,
        /// 生成ノードの品詞（6要素）
        oov_pos: Vec<String>,
        /// 先読み窓の長さ（コードポイント単位）
        #[serde(default = "default_regex_max_length")]
        max_length: usize,
        /// 境界の扱い（`strict`または`relaxed`）
        #[serde(default = "default_boundaries")]
        boundaries: String,
    },
    /// 1文字のフォールバック未知語生成
    Simple {
        /// 左文脈ID
        left_id: u16,
        /// 右文脈ID
        right_id: u16,
        /// 生起コスト
        cost: i16,
        /// 生成ノードの品詞（6要素）
        oov_pos: Vec<String>,
    },
}

/// パス書き換えプラグインの設定。
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathRewritePluginConfig {
    /// カタカナ連続区間の連結
    JoinKatakanaOov {
        /// 連結後の未知語ノードの品詞（6要素）
        oov_pos: Vec<String>,
        /// 連結対象とみなす形態素長の下限
        #[serde(default = "default_min_length")]
        min_length: usize,
    },
    /// 数値連続区間の連結と正規化
    JoinNumeric {
        /// 漢数字の連続を連結するかどうか
        #[serde(default)]
        join_kanji_numeric: bool,
        /// 算用数字と漢数字の混在も連結するかどうか
        #[serde(default)]
        join_all_numeric: bool,
        /// 連結結果の正規化形を10進数文字列にするかどうか
        #[serde(default = "default_true")]
        enable_normalize: bool,
    },
}

fn default_max_yomigana_length() -> usize {
    4
}

fn default_regex_max_length() -> usize {
    32
}

fn default_boundaries() -> String {
    "strict".to_string()
}

fn default_min_length() -> usize {
    1
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let json = r#"
        {
            "input_text_plugins": [
                {"type": "default"},
                {"type": "prolonged_sound_mark"},
                {"type": "ignore_yomigana", "left_brackets": ["("], "right_brackets": [")"]}
            ],
            "oov_provider_plugins": [
                {"type": "regex", "regex": "[0-9a-z-]+", "left_id": 0, "right_id": 0,
                 "cost": 5000, "oov_pos": ["名詞", "普通名詞", "一般", "*", "*", "*"],
                 "boundaries": "relaxed"},
                {"type": "simple", "left_id": 0, "right_id": 0, "cost": 30000,
                 "oov_pos": ["補助記号", "一般", "*", "*", "*", "*"]}
            ],
            "path_rewrite_plugins": [
                {"type": "join_katakana_oov", "oov_pos": ["名詞", "普通名詞", "一般", "*", "*", "*"], "min_length": 3},
                {"type": "join_numeric"}
            ],
            "allow_empty_morpheme": false
        }
        "#;
        let config = TokenizerConfig::from_json(json).unwrap();
        assert_eq!(config.input_text_plugins.len(), 3);
        assert_eq!(config.oov_provider_plugins.len(), 2);
        assert_eq!(config.path_rewrite_plugins.len(), 2);
        assert!(!config.allow_empty_morpheme);
        assert_eq!(config.sentence_limit_bytes, DEFAULT_SENTENCE_LIMIT_BYTES);

        match &config.path_rewrite_plugins[1] {
            PathRewritePluginConfig::JoinNumeric {
                join_kanji_numeric,
                join_all_numeric,
                enable_normalize,
            } => {
                assert!(!join_kanji_numeric);
                assert!(!join_all_numeric);
                assert!(enable_normalize);
            }
            _ => panic!("unexpected plugin"),
        }
    }

    #[test]
    fn test_empty_config() {
        let config = TokenizerConfig::from_json("{}").unwrap();
        assert!(config.input_text_plugins.is_empty());
        assert!(config.allow_empty_morpheme);
    }

    #[test]
    fn test_unknown_plugin_type() {
        let json = r#"{"oov_provider_plugins": [{"type": "reflection"}]}"#;
        assert!(TokenizerConfig::from_json(json).is_err());
    }
}
