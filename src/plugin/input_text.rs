//! 入力テキストプラグイン
//!
//! このモジュールは、辞書引きの前に入力テキストを書き換えるプラグインを
//! 提供します。プラグインは設定された順に適用され、
//! [`crate::input::InputTextBuilder`]を通じて置換を行います。
//! オフセットの追跡はテキストモデルが行います。

pub mod default;
pub mod ignore_yomigana;
pub mod prolonged_sound_mark;

use crate::errors::Result;
use crate::input::InputTextBuilder;

pub use crate::plugin::input_text::default::DefaultInputTextPlugin;
pub use crate::plugin::input_text::ignore_yomigana::IgnoreYomiganaPlugin;
pub use crate::plugin::input_text::prolonged_sound_mark::ProlongedSoundMarkPlugin;

/// 入力テキストプラグインの閉じたバリアント集合。
pub enum InputTextPlugin {
    /// 小文字化とUnicode NFKC正規化
    Default(DefaultInputTextPlugin),
    /// 長音記号の畳み込み
    ProlongedSoundMark(ProlongedSoundMarkPlugin),
    /// 括弧書きの読み仮名の除去
    IgnoreYomigana(IgnoreYomiganaPlugin),
}

impl InputTextPlugin {
    /// 入力テキストを書き換えます。
    pub fn rewrite(&self, builder: &mut InputTextBuilder) -> Result<()> {
        match self {
            Self::Default(p) => p.rewrite(builder),
            Self::ProlongedSoundMark(p) => p.rewrite(builder),
            Self::IgnoreYomigana(p) => p.rewrite(builder),
        }
    }
}
