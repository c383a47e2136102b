//! 未知語プラグイン
//!
//! このモジュールは、辞書に存在しない区間の候補ノードを生成する
//! プラグインを提供します。設定されたすべてのプラグインが各オフセットで
//! 実行され、生成されたノードの和集合がラティスに挿入されます。

pub mod mecab;
pub mod regex;
pub mod simple;

use crate::common::WordMask;
use crate::errors::Result;
use crate::input::InputText;
use crate::lattice::Node;

pub use crate::plugin::oov::mecab::MecabOovProvider;
pub use crate::plugin::oov::regex::RegexOovProvider;
pub use crate::plugin::oov::simple::SimpleOovProvider;

/// 未知語プラグインの閉じたバリアント集合。
pub enum OovProviderPlugin {
    /// 文字カテゴリに基づく未知語生成
    Mecab(MecabOovProvider),
    /// 正規表現に基づく未知語生成
    Regex(RegexOovProvider),
    /// 1文字のフォールバック未知語生成
    Simple(SimpleOovProvider),
}

impl OovProviderPlugin {
    /// `offset`から始まる未知語ノードを生成し、`nodes`に追加します。
    ///
    /// 生成された各ノードの`begin`/`end`は、ノードが保持する単語長から
    /// 呼び出し側で設定されます。プラグイン自身は設定しません。
    ///
    /// # 引数
    ///
    /// * `input` - 入力テキスト
    /// * `offset` - 生成開始のバイト位置
    /// * `other_words` - 辞書語が存在する長さ（コードポイント単位）の集合
    /// * `nodes` - このオフセットで生成済みのノード列。結果が追記されます
    ///
    /// # 戻り値
    ///
    /// 追加されたノード数
    pub fn provide(
        &self,
        input: &InputText,
        offset: usize,
        other_words: WordMask,
        nodes: &mut Vec<Node>,
    ) -> Result<usize> {
        let start = nodes.len();
        match self {
            Self::Mecab(p) => p.provide(input, offset, other_words, nodes)?,
            Self::Regex(p) => p.provide(input, offset, other_words, nodes)?,
            Self::Simple(p) => p.provide(input, offset, other_words, nodes)?,
        }
        // The framework, not the provider, places the nodes.
        for node in nodes[start..].iter_mut() {
            let length = node
                .inline_word_info()
                .map(|info| usize::from(info.head_word_length))
                .unwrap_or(0);
            node.begin = offset;
            node.end = offset + length;
        }
        Ok(nodes.len() - start)
    }
}
