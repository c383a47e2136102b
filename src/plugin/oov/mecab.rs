//! 文字カテゴリに基づく未知語プラグイン
//!
//! MeCabと同じ方式で未知語を生成します。カテゴリごとの
//! `(invoke, group, length)`設定に従い、同一カテゴリ連続区間の全体、
//! および接頭辞長1..lengthのノードを生成します。

use std::str::FromStr;

use crate::common::WordMask;
use crate::dictionary::character::CategoryType;
use crate::dictionary::grammar::{Grammar, PartOfSpeech, WordParam};
use crate::dictionary::word_info::WordInfo;
use crate::errors::{KabosuError, Result};
use crate::input::InputText;
use crate::lattice::Node;

/// カテゴリごとの未知語生成の設定。
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryInfo {
    /// 辞書語が存在しても未知語を生成するかどうか
    pub is_invoke: bool,
    /// 連続区間全体を1つのノードとして生成するかどうか
    pub is_group: bool,
    /// 生成する接頭辞の最大長（コードポイント単位）
    pub length: usize,
}

/// 1つの未知語エントリの接続パラメータと品詞。
#[derive(Debug, Clone, Copy)]
struct Oov {
    param: WordParam,
    pos_id: u16,
}

/// 文字カテゴリに基づく未知語プラグイン。
pub struct MecabOovProvider {
    categories: Vec<(CategoryType, CategoryInfo)>,
    oov_list: Vec<(CategoryType, Vec<Oov>)>,
}

impl MecabOovProvider {
    /// カテゴリ設定と未知語定義のリーダーからプラグインを構築します。
    ///
    /// カテゴリ設定は`char.def`のカテゴリ行と同じ
    /// `CATEGORY invoke group length`形式で、未知語定義は
    /// `CATEGORY,左文脈ID,右文脈ID,コスト,品詞1..品詞6`のCSVです。
    /// 品詞は文法に登録されます。
    ///
    /// # エラー
    ///
    /// カテゴリ名の重複や未定義カテゴリへの未知語定義など、
    /// 設定の不整合があればエラーを返します。
    pub fn from_definitions(
        categories_def: &str,
        unk_def: &str,
        grammar: &mut Grammar,
    ) -> Result<Self> {
        let categories = Self::read_categories(categories_def)?;
        let oov_list = Self::read_oov(unk_def, &categories, grammar)?;
        log::debug!(
            "Set up a MeCab OOV provider: {} categories, {} entries",
            categories.len(),
            oov_list.iter().map(|(_, oovs)| oovs.len()).sum::<usize>()
        );
        Ok(Self {
            categories,
            oov_list,
        })
    }

    fn read_categories(categories_def: &str) -> Result<Vec<(CategoryType, CategoryInfo)>> {
        let mut categories: Vec<(CategoryType, CategoryInfo)> = vec![];
        for (i, line) in categories_def.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("0x") {
                continue;
            }
            let cols: Vec<_> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return Err(KabosuError::invalid_format(
                    "charDef",
                    format!("invalid format at line {}", i + 1),
                ));
            }
            let cate = CategoryType::from_str(cols[0])?;
            if categories.iter().any(|&(c, _)| c == cate) {
                return Err(KabosuError::invalid_format(
                    "charDef",
                    format!("{} is already defined at line {}", cols[0], i + 1),
                ));
            }
            let info = CategoryInfo {
                is_invoke: cols[1] != "0",
                is_group: cols[2] != "0",
                length: cols[3].parse()?,
            };
            categories.push((cate, info));
        }
        Ok(categories)
    }

    fn read_oov(
        unk_def: &str,
        categories: &[(CategoryType, CategoryInfo)],
        grammar: &mut Grammar,
    ) -> Result<Vec<(CategoryType, Vec<Oov>)>> {
        let mut oov_list: Vec<(CategoryType, Vec<Oov>)> = vec![];
        let records = crate::dictionary::builder::parse_csv_records(unk_def.as_bytes(), "unkDef")?;
        for cols in records {
            if cols.len() == 1 && cols[0].is_empty() {
                continue;
            }
            if cols.len() < 10 {
                return Err(KabosuError::invalid_format(
                    "unkDef",
                    format!("invalid format: {:?}", cols.join(",")),
                ));
            }
            let cate = CategoryType::from_str(&cols[0])?;
            if !categories.iter().any(|&(c, _)| c == cate) {
                return Err(KabosuError::invalid_format(
                    "unkDef",
                    format!("{} is undefined in the category settings", cols[0]),
                ));
            }
            let param = WordParam::new(cols[1].parse()?, cols[2].parse()?, cols[3].parse()?);
            let pos = PartOfSpeech::from_strs(
                &cols[4..10].iter().map(String::as_str).collect::<Vec<_>>(),
            )
            .expect("slice of six fields");
            let oov = Oov {
                param,
                pos_id: grammar.pos_id_or_insert(pos),
            };
            match oov_list.iter_mut().find(|(c, _)| *c == cate) {
                Some((_, oovs)) => oovs.push(oov),
                None => oov_list.push((cate, vec![oov])),
            }
        }
        Ok(oov_list)
    }

    /// テスト用に直接構成するコンストラクタ。
    #[cfg(test)]
    pub(crate) fn from_parts(
        categories: Vec<(CategoryType, CategoryInfo)>,
        oov_list: Vec<(CategoryType, Vec<(WordParam, u16)>)>,
    ) -> Self {
        Self {
            categories,
            oov_list: oov_list
                .into_iter()
                .map(|(c, oovs)| {
                    (
                        c,
                        oovs.into_iter()
                            .map(|(param, pos_id)| Oov { param, pos_id })
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    pub(crate) fn provide(
        &self,
        input: &InputText,
        offset: usize,
        other_words: WordMask,
        nodes: &mut Vec<Node>,
    ) -> Result<()> {
        let run_bytes = input.char_category_continuous_length(offset);
        if run_bytes == 0 {
            return Ok(());
        }

        for cate in input.char_category_types_at(offset).iter() {
            let Some(&(_, cinfo)) = self.categories.iter().find(|&&(c, _)| c == cate) else {
                continue;
            };
            let Some((_, oovs)) = self.oov_list.iter().find(|(c, _)| *c == cate) else {
                continue;
            };

            let mut max_bytes = run_bytes;
            if cinfo.is_group {
                // The whole-run node fires when no other candidate exists,
                // or unconditionally under invoke, duplicate spans included.
                if cinfo.is_invoke || other_words.is_empty() {
                    let surface = input.substring(offset, offset + run_bytes);
                    for oov in oovs {
                        nodes.push(Self::oov_node(surface, oov, run_bytes));
                    }
                }
                max_bytes -= 1;
            }
            if cinfo.is_invoke || other_words.is_empty() {
                for i in 1..=cinfo.length {
                    let sub_bytes = input.code_points_offset_length(offset, i);
                    if sub_bytes > max_bytes {
                        break;
                    }
                    let surface = input.substring(offset, offset + sub_bytes);
                    for oov in oovs {
                        nodes.push(Self::oov_node(surface, oov, sub_bytes));
                    }
                }
            }
        }
        Ok(())
    }

    fn oov_node(surface: &str, oov: &Oov, length: usize) -> Node {
        let info =
            WordInfo::synthesized(surface, length as u16, oov.pos_id, surface, surface, "");
        Node::for_oov(oov.param, info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::character::CharacterCategory;
    use crate::plugin::oov::OovProviderPlugin;
    use crate::dictionary::lexicon_set::LexiconSet;
    use crate::input::InputTextBuilder;

    // あいう is classified by the definitions below, えお falls back to
    // DEFAULT.
    fn input_text(char_def: &str) -> InputText {
        let category = CharacterCategory::from_reader(char_def.as_bytes()).unwrap();
        let builder = InputTextBuilder::new("あいうえお", &category);
        builder.build()
    }

    fn provider(cinfo: CategoryInfo, cate: CategoryType) -> OovProviderPlugin {
        OovProviderPlugin::Mecab(MecabOovProvider::from_parts(
            vec![(cate, cinfo)],
            vec![(
                cate,
                vec![(WordParam::new(0, 0, 100), 1)],
            )],
        ))
    }

    fn surfaces(nodes: &[Node], lexicon: &LexiconSet) -> Vec<(String, u16)> {
        nodes
            .iter()
            .map(|n| {
                let info = n.word_info(lexicon);
                (info.surface.clone(), info.head_word_length)
            })
            .collect()
    }

    fn empty_lexicon() -> LexiconSet {
        LexiconSet::new(crate::dictionary::lexicon::Lexicon::from_entries(vec![]).unwrap())
    }

    const KANJI_DEF: &str = "0x3041..0x3043 KANJI";

    fn run(provider: &OovProviderPlugin, input: &InputText, masked: bool) -> Vec<Node> {
        let mut mask = WordMask::default();
        if masked {
            // Pretend that three-code-point dictionary words exist.
            mask.add_nth(3);
            mask.add_nth(1);
        }
        let mut nodes = vec![];
        provider.provide(input, 0, mask, &mut nodes).unwrap();
        nodes
    }

    #[test]
    fn test_no_invoke_no_group_no_length() {
        let input = input_text(KANJI_DEF);
        let p = provider(
            CategoryInfo {
                is_invoke: false,
                is_group: false,
                length: 0,
            },
            CategoryType::Kanji,
        );
        assert_eq!(run(&p, &input, false).len(), 0);
        assert_eq!(run(&p, &input, true).len(), 0);
    }

    #[test]
    fn test_invoke_only() {
        let input = input_text(KANJI_DEF);
        let p = provider(
            CategoryInfo {
                is_invoke: true,
                is_group: false,
                length: 0,
            },
            CategoryType::Kanji,
        );
        assert_eq!(run(&p, &input, false).len(), 0);
        assert_eq!(run(&p, &input, true).len(), 0);
    }

    #[test]
    fn test_group_only() {
        let input = input_text(KANJI_DEF);
        let lexicon = empty_lexicon();
        let p = provider(
            CategoryInfo {
                is_invoke: false,
                is_group: true,
                length: 0,
            },
            CategoryType::Kanji,
        );
        let nodes = run(&p, &input, false);
        assert_eq!(surfaces(&nodes, &lexicon), vec![("あいう".to_string(), 9)]);
        assert_eq!(nodes[0].begin, 0);
        assert_eq!(nodes[0].end, 9);
        assert!(nodes[0].is_oov);

        assert_eq!(run(&p, &input, true).len(), 0);
    }

    #[test]
    fn test_invoke_and_group() {
        let input = input_text(KANJI_DEF);
        let p = provider(
            CategoryInfo {
                is_invoke: true,
                is_group: true,
                length: 0,
            },
            CategoryType::Kanji,
        );
        assert_eq!(run(&p, &input, false).len(), 1);
        // The invoke flag fires despite the mask, duplicate spans included.
        assert_eq!(run(&p, &input, true).len(), 1);
    }

    #[test]
    fn test_length_only() {
        let input = input_text(KANJI_DEF);
        let lexicon = empty_lexicon();
        let p = provider(
            CategoryInfo {
                is_invoke: false,
                is_group: false,
                length: 2,
            },
            CategoryType::Kanji,
        );
        let nodes = run(&p, &input, false);
        assert_eq!(
            surfaces(&nodes, &lexicon),
            vec![("あ".to_string(), 3), ("あい".to_string(), 6)]
        );
        assert_eq!(run(&p, &input, true).len(), 0);
    }

    #[test]
    fn test_group_and_length() {
        let input = input_text(KANJI_DEF);
        let lexicon = empty_lexicon();
        let p = provider(
            CategoryInfo {
                is_invoke: false,
                is_group: true,
                length: 2,
            },
            CategoryType::Kanji,
        );
        let nodes = run(&p, &input, false);
        assert_eq!(
            surfaces(&nodes, &lexicon),
            vec![
                ("あいう".to_string(), 9),
                ("あ".to_string(), 3),
                ("あい".to_string(), 6),
            ]
        );
        assert_eq!(run(&p, &input, true).len(), 0);
    }

    #[test]
    fn test_length_covers_whole_run() {
        let input = input_text(KANJI_DEF);
        let lexicon = empty_lexicon();
        let p = provider(
            CategoryInfo {
                is_invoke: false,
                is_group: false,
                length: 6,
            },
            CategoryType::Kanji,
        );
        let nodes = run(&p, &input, false);
        assert_eq!(
            surfaces(&nodes, &lexicon),
            vec![
                ("あ".to_string(), 3),
                ("あい".to_string(), 6),
                ("あいう".to_string(), 9),
            ]
        );
    }

    #[test]
    fn test_multiple_oov_entries() {
        let input = input_text("0x3041..0x3043 KANJINUMERIC");
        let p = OovProviderPlugin::Mecab(MecabOovProvider::from_parts(
            vec![(
                CategoryType::KanjiNumeric,
                CategoryInfo {
                    is_invoke: false,
                    is_group: true,
                    length: 0,
                },
            )],
            vec![(
                CategoryType::KanjiNumeric,
                vec![(WordParam::new(0, 0, 100), 1), (WordParam::new(0, 0, 200), 2)],
            )],
        ));
        let nodes = run(&p, &input, false);
        assert_eq!(nodes.len(), 2);
        let lexicon = empty_lexicon();
        assert_eq!(nodes[0].word_info(&lexicon).pos_id, 1);
        assert_eq!(nodes[1].word_info(&lexicon).pos_id, 2);
    }

    #[test]
    fn test_unconfigured_category() {
        let input = input_text(KANJI_DEF);
        let p = OovProviderPlugin::Mecab(MecabOovProvider::from_parts(vec![], vec![]));
        assert_eq!(run(&p, &input, false).len(), 0);
    }

    #[test]
    fn test_category_without_oov_entries() {
        let input = input_text("0x3041..0x3043 HIRAGANA");
        let p = OovProviderPlugin::Mecab(MecabOovProvider::from_parts(
            vec![(
                CategoryType::Hiragana,
                CategoryInfo {
                    is_invoke: false,
                    is_group: true,
                    length: 0,
                },
            )],
            vec![],
        ));
        assert_eq!(run(&p, &input, false).len(), 0);
    }
}
