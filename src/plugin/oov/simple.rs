//! 1文字フォールバック未知語プラグイン
//!
//! 辞書語も他の未知語候補も存在しない位置に、1コードポイントの
//! 未知語ノードを1つ生成します。全位置の被覆を保証する
//! フォールバックとして、プラグインリストの最後に置くのが通例です。

use crate::common::WordMask;
use crate::dictionary::grammar::{Grammar, PartOfSpeech, WordParam};
use crate::dictionary::word_info::WordInfo;
use crate::errors::{KabosuError, Result};
use crate::input::InputText;
use crate::lattice::Node;

/// 1文字フォールバック未知語プラグイン。
pub struct SimpleOovProvider {
    param: WordParam,
    pos_id: u16,
}

impl SimpleOovProvider {
    /// 接続パラメータと品詞からプラグインを構築します。
    ///
    /// 品詞は文法に登録されます。
    ///
    /// # エラー
    ///
    /// 接続IDが行列の範囲外の場合にエラーを返します。
    pub fn new(param: WordParam, pos: PartOfSpeech, grammar: &mut Grammar) -> Result<Self> {
        if usize::from(param.left_id) >= grammar.connector().num_left()
            || usize::from(param.right_id) >= grammar.connector().num_right()
        {
            return Err(KabosuError::invalid_argument(
                "oov",
                "The connection id of the OOV provider is out of range.",
            ));
        }
        let pos_id = grammar.pos_id_or_insert(pos);
        Ok(Self { param, pos_id })
    }

    pub(crate) fn with_pos_id(param: WordParam, pos_id: u16) -> Self {
        Self { param, pos_id }
    }

    pub(crate) fn provide(
        &self,
        input: &InputText,
        offset: usize,
        other_words: WordMask,
        nodes: &mut Vec<Node>,
    ) -> Result<()> {
        if !other_words.is_empty() {
            return Ok(());
        }
        let length = input.code_points_offset_length(offset, 1);
        if length == 0 {
            return Ok(());
        }
        let surface = input.substring(offset, offset + length);
        let info =
            WordInfo::synthesized(surface, length as u16, self.pos_id, surface, surface, "");
        nodes.push(Node::for_oov(self.param, info));
        Ok(())
    }
}
