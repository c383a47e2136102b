//! 辞書の語彙情報
//!
//! このモジュールは、1つの辞書に含まれる単語の表層形、接続パラメータ、
//! 付加情報を管理します。

mod word_map;

use rkyv::{Archive, Deserialize, Serialize};

use crate::dictionary::grammar::WordParam;
use crate::dictionary::lexicon::word_map::WordMap;
use crate::dictionary::word_id::WordId;
use crate::dictionary::word_info::WordInfo;
use crate::errors::Result;

/// 1つの辞書の語彙情報。
#[derive(Archive, Serialize, Deserialize, Clone)]
pub struct Lexicon {
    map: WordMap,
    params: Vec<WordParam>,
    infos: Vec<WordInfo>,
}

/// 語彙検索の結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexiconMatch {
    /// 一致した単語のID
    pub word_id: WordId,
    /// 単語の接続パラメータ
    pub param: WordParam,
    /// 一致区間の終端（検索開始位置からの相対バイト長ではなく絶対位置）
    pub end_byte: usize,
}

impl Lexicon {
    /// 新しいインスタンスを作成します。
    pub(crate) fn new(map: WordMap, params: Vec<WordParam>, infos: Vec<WordInfo>) -> Self {
        debug_assert_eq!(params.len(), infos.len());
        Self { map, params, infos }
    }

    /// `offset`から始まる接頭辞に一致するすべての単語を返します。
    ///
    /// # 引数
    ///
    /// * `input` - 正規化済みテキストのバイト列
    /// * `offset` - 検索開始バイト位置
    /// * `dic_id` - この辞書に割り当てられた辞書ID
    pub(crate) fn common_prefix_search(
        &self,
        input: &[u8],
        offset: usize,
        dic_id: u8,
    ) -> impl Iterator<Item = LexiconMatch> + '_ {
        self.map
            .common_prefix_search(&input[offset..])
            .into_iter()
            .map(move |(word_id, length)| LexiconMatch {
                word_id: WordId::new(dic_id, word_id),
                param: self.params[word_id as usize],
                end_byte: offset + length,
            })
    }

    /// 単語の接続パラメータを返します。
    #[inline(always)]
    pub fn word_param(&self, word: u32) -> WordParam {
        self.params[word as usize]
    }

    /// 単語の付加情報を返します。
    #[inline(always)]
    pub fn word_info(&self, word: u32) -> &WordInfo {
        &self.infos[word as usize]
    }

    /// 登録されている単語数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// 辞書が空かどうかを判定します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// すべての接続IDが行列の範囲内かを検証します。
    pub(crate) fn verify(&self, num_left: usize, num_right: usize) -> bool {
        self.params
            .iter()
            .all(|p| usize::from(p.left_id) < num_left && usize::from(p.right_id) < num_right)
    }

    /// 分割テーブル中のユーザー辞書参照を、割り当てられた辞書IDに
    /// 付け替えます。
    ///
    /// ビルダーはユーザー辞書内の参照を辞書ID 1でマークします。
    /// 実際のIDはマージ順で決まるため、この関数で付け替えます。
    pub(crate) fn rebase_references(&mut self, dic_id: u8) {
        for info in self.infos.iter_mut() {
            for table in [
                &mut info.a_unit_split,
                &mut info.b_unit_split,
                &mut info.word_structure,
            ] {
                for packed in table.iter_mut() {
                    let id = WordId::from_packed(*packed);
                    if id.dic != 0 {
                        *packed = WordId::new(dic_id, id.word).to_packed();
                    }
                }
            }
        }
    }

    /// エントリのベクタから新しいインスタンスを構築します。
    pub(crate) fn from_entries(entries: Vec<(String, WordParam, WordInfo)>) -> Result<Self> {
        let map = WordMap::new(entries.iter().map(|(surface, _, _)| surface))?;
        let params = entries.iter().map(|(_, param, _)| *param).collect();
        let infos = entries.into_iter().map(|(_, _, info)| info).collect();
        Ok(Self::new(map, params, infos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_info(surface: &str) -> WordInfo {
        WordInfo::synthesized(surface, surface.len() as u16, 0, surface, surface, "")
    }

    #[test]
    fn test_common_prefix_search() {
        let lexicon = Lexicon::from_entries(vec![
            (
                "東京".to_string(),
                WordParam::new(1, 2, 3),
                word_info("東京"),
            ),
            (
                "東京都".to_string(),
                WordParam::new(4, 5, 6),
                word_info("東京都"),
            ),
            (
                "京都".to_string(),
                WordParam::new(7, 8, 9),
                word_info("京都"),
            ),
        ])
        .unwrap();

        let input = "東京都".as_bytes();
        let mut matches: Vec<_> = lexicon.common_prefix_search(input, 0, 0).collect();
        matches.sort_by_key(|m| m.end_byte);
        assert_eq!(
            matches,
            vec![
                LexiconMatch {
                    word_id: WordId::new(0, 0),
                    param: WordParam::new(1, 2, 3),
                    end_byte: 6,
                },
                LexiconMatch {
                    word_id: WordId::new(0, 1),
                    param: WordParam::new(4, 5, 6),
                    end_byte: 9,
                },
            ]
        );

        let matches: Vec<_> = lexicon.common_prefix_search(input, 3, 2).collect();
        assert_eq!(
            matches,
            vec![LexiconMatch {
                word_id: WordId::new(2, 2),
                param: WordParam::new(7, 8, 9),
                end_byte: 9,
            }]
        );
    }

    #[test]
    fn test_rebase_references() {
        let mut info = word_info("京都");
        info.a_unit_split = vec![
            WordId::new(0, 5).to_packed(),
            WordId::new(1, 7).to_packed(),
        ];
        let mut lexicon = Lexicon::from_entries(vec![(
            "京都".to_string(),
            WordParam::default(),
            info,
        )])
        .unwrap();
        lexicon.rebase_references(3);
        let rebased = lexicon.word_info(0);
        assert_eq!(
            rebased.a_unit_split,
            vec![
                WordId::new(0, 5).to_packed(),
                WordId::new(3, 7).to_packed(),
            ]
        );
    }
}
