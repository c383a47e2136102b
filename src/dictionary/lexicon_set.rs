//! 複数辞書の統合
//!
//! このモジュールは、1つのシステム辞書と複数のユーザー辞書を
//! 1つの語彙として扱うための統合レイヤを提供します。

use crate::common::MAX_USER_DICTIONARIES;
use crate::dictionary::grammar::WordParam;
use crate::dictionary::lexicon::{Lexicon, LexiconMatch};
use crate::dictionary::word_id::WordId;
use crate::dictionary::word_info::WordInfo;
use crate::errors::{KabosuError, Result};

/// システム辞書とユーザー辞書の統合語彙。
///
/// インデックス0がシステム辞書で、以降がユーザー辞書です。
/// 検索時はユーザー辞書が優先されます。
pub struct LexiconSet {
    lexicons: Vec<Lexicon>,
}

impl LexiconSet {
    /// システム辞書から新しいインスタンスを作成します。
    pub fn new(system: Lexicon) -> Self {
        Self {
            lexicons: vec![system],
        }
    }

    /// ユーザー辞書を追加します。
    ///
    /// 分割テーブル中のユーザー辞書参照は、割り当てられた辞書IDに
    /// 付け替えられます。
    ///
    /// # エラー
    ///
    /// ユーザー辞書の数が上限を超えた場合にエラーを返します。
    pub fn append(&mut self, mut user: Lexicon) -> Result<()> {
        if self.lexicons.len() > MAX_USER_DICTIONARIES {
            return Err(KabosuError::invalid_argument(
                "user",
                format!("The number of user dictionaries exceeds {MAX_USER_DICTIONARIES}"),
            ));
        }
        let dic_id = self.lexicons.len() as u8;
        user.rebase_references(dic_id);
        self.lexicons.push(user);
        Ok(())
    }

    /// `offset`から始まる接頭辞に一致するすべての単語を返します。
    ///
    /// ユーザー辞書、システム辞書の順に検索します。
    /// 結果は決定的で、副作用はありません。
    ///
    /// # 引数
    ///
    /// * `input` - 正規化済みテキストのバイト列
    /// * `offset` - 検索開始バイト位置
    pub fn lookup<'a>(
        &'a self,
        input: &'a [u8],
        offset: usize,
    ) -> impl Iterator<Item = LexiconMatch> + 'a {
        let user = self
            .lexicons
            .iter()
            .enumerate()
            .skip(1)
            .flat_map(move |(dic_id, lexicon)| {
                lexicon.common_prefix_search(input, offset, dic_id as u8)
            });
        user.chain(self.lexicons[0].common_prefix_search(input, offset, 0))
    }

    /// 単語の接続パラメータを返します。
    #[inline(always)]
    pub fn word_param(&self, id: WordId) -> WordParam {
        self.lexicons[usize::from(id.dic)].word_param(id.word)
    }

    /// 単語の付加情報を返します。
    ///
    /// # 戻り値
    ///
    /// IDが未知語を指す場合は`None`
    #[inline(always)]
    pub fn word_info(&self, id: WordId) -> Option<&WordInfo> {
        if id.is_oov() {
            return None;
        }
        self.lexicons
            .get(usize::from(id.dic))
            .map(|lexicon| lexicon.word_info(id.word))
    }

    /// 統合されている辞書数を返します。
    #[inline(always)]
    pub fn num_dictionaries(&self) -> usize {
        self.lexicons.len()
    }

    /// システム辞書への参照を返します。
    #[inline(always)]
    pub(crate) fn system(&self) -> &Lexicon {
        &self.lexicons[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon(words: &[(&str, i16)]) -> Lexicon {
        Lexicon::from_entries(
            words
                .iter()
                .map(|&(surface, cost)| {
                    (
                        surface.to_string(),
                        WordParam::new(0, 0, cost),
                        WordInfo::synthesized(
                            surface,
                            surface.len() as u16,
                            0,
                            surface,
                            surface,
                            "",
                        ),
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_user_lexicon_priority() {
        let mut set = LexiconSet::new(lexicon(&[("東京", 1), ("東京都", 2)]));
        set.append(lexicon(&[("東京", 10)])).unwrap();

        let input = "東京都".as_bytes();
        let results: Vec<_> = set.lookup(input, 0).collect();
        assert_eq!(results.len(), 3);
        // User dictionary results come first.
        assert_eq!(results[0].word_id, WordId::new(1, 0));
        assert_eq!(results[0].param.cost, 10);
        assert_eq!(results[1].word_id, WordId::new(0, 0));
        assert_eq!(results[2].word_id, WordId::new(0, 1));
    }

    #[test]
    fn test_word_info_oov() {
        let set = LexiconSet::new(lexicon(&[("東京", 1)]));
        assert!(set.word_info(WordId::oov()).is_none());
        assert_eq!(set.word_info(WordId::new(0, 0)).unwrap().surface, "東京");
    }
}
