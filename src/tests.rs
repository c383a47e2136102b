//! クレート全体の結合テスト

use crate::config::TokenizerConfig;
use crate::dictionary::SystemDictionaryBuilder;
use crate::morpheme::MorphemeList;
use crate::tokenizer::{Mode, Tokenizer};

#[track_caller]
fn build_tokenizer(
    lexicon_csv: &str,
    matrix_def: &str,
    char_def: &str,
    config_json: Option<&str>,
) -> Tokenizer {
    let dict = SystemDictionaryBuilder::from_readers(
        lexicon_csv.as_bytes(),
        matrix_def.as_bytes(),
        char_def.as_bytes(),
    )
    .unwrap();
    match config_json {
        Some(json) => {
            let config = TokenizerConfig::from_json(json).unwrap();
            Tokenizer::from_config(dict, &config).unwrap()
        }
        None => Tokenizer::new(dict),
    }
}

fn surfaces(morphemes: &MorphemeList) -> Vec<String> {
    morphemes.iter().map(|m| m.surface().to_string()).collect()
}

const NLP_LEXICON: &str = "\
自然,0,0,1,名詞,普通名詞,一般,*,*,*,シゼン
言語,0,0,4,名詞,普通名詞,一般,*,*,*,ゲンゴ
処理,0,0,3,名詞,普通名詞,サ変可能,*,*,*,ショリ
自然言語,0,0,6,名詞,普通名詞,一般,*,*,*,シゼンゲンゴ
言語処理,0,0,5,名詞,普通名詞,一般,*,*,*,ゲンゴショリ";

const SIMPLE_MATRIX: &str = "1 1\n0 0 0";
const KANJI_CHAR_DEF: &str = "0x4E00..0x9FFF KANJI";

#[test]
fn test_tokenize_picks_min_cost_path() {
    let tokenizer = build_tokenizer(NLP_LEXICON, SIMPLE_MATRIX, KANJI_CHAR_DEF, None);
    let mut worker = tokenizer.new_worker();

    let morphemes = worker.tokenize(Mode::C, "自然言語処理").unwrap();
    assert_eq!(surfaces(&morphemes), vec!["自然", "言語処理"]);

    let first = morphemes.get(0);
    assert_eq!(first.begin(), 0);
    assert_eq!(first.end(), 2);
    assert_eq!(first.reading_form(), "シゼン");
    assert!(!first.is_oov());
    let pos = first.part_of_speech().unwrap();
    assert_eq!(pos.0[0], "名詞");

    let second = morphemes.get(1);
    assert_eq!(second.begin(), 2);
    assert_eq!(second.end(), 6);
    assert_eq!(second.reading_form(), "ゲンゴショリ");
}

#[test]
fn test_tokenize_with_grouping_oov() {
    let config = r#"
    {
        "oov_provider_plugins": [
            {"type": "mecab",
             "char_def": "DEFAULT 0 1 0",
             "unk_def": "DEFAULT,0,0,100,名詞,普通名詞,一般,*,*,*"}
        ]
    }
    "#;
    // Leave the kanji in the DEFAULT category so that the grouping rule
    // covers the out-of-vocabulary run.
    let tokenizer = build_tokenizer(NLP_LEXICON, SIMPLE_MATRIX, "0x0030..0x0039 NUMERIC", Some(config));
    let mut worker = tokenizer.new_worker();

    let morphemes = worker.tokenize(Mode::C, "自然日本語処理").unwrap();
    assert_eq!(surfaces(&morphemes), vec!["自然", "日本語処理"]);
    assert!(!morphemes.get(0).is_oov());
    assert!(morphemes.get(1).is_oov());
    let pos = morphemes.get(1).part_of_speech().unwrap();
    assert_eq!(pos.0[0], "名詞");
}

#[test]
fn test_tokenize_empty() {
    let tokenizer = build_tokenizer(NLP_LEXICON, SIMPLE_MATRIX, KANJI_CHAR_DEF, None);
    let mut worker = tokenizer.new_worker();
    let morphemes = worker.tokenize(Mode::C, "").unwrap();
    assert_eq!(morphemes.len(), 0);
}

const SPLIT_LEXICON: &str = "\
東京都,0,0,3,名詞,固有名詞,地名,一般,*,*,トウキョウト,*,*,1/2,*,1/2,*
東京,0,0,5,名詞,固有名詞,地名,一般,*,*,トウキョウ
都,0,0,5,名詞,普通名詞,一般,*,*,*,ト";

#[test]
fn test_split_modes() {
    let tokenizer = build_tokenizer(SPLIT_LEXICON, SIMPLE_MATRIX, KANJI_CHAR_DEF, None);
    let mut worker = tokenizer.new_worker();

    let coarse = worker.tokenize(Mode::C, "東京都").unwrap();
    assert_eq!(surfaces(&coarse), vec!["東京都"]);

    let fine = worker.tokenize(Mode::A, "東京都").unwrap();
    assert_eq!(surfaces(&fine), vec!["東京", "都"]);
    assert_eq!(fine.get(0).begin(), 0);
    assert_eq!(fine.get(0).end(), 2);
    assert_eq!(fine.get(1).begin(), 2);
    assert_eq!(fine.get(1).end(), 3);

    // An empty split table passes the node through for every mode.
    let middle = worker.tokenize(Mode::B, "東京都").unwrap();
    assert_eq!(surfaces(&middle), vec!["東京都"]);
}

#[test]
fn test_morpheme_split() {
    let tokenizer = build_tokenizer(SPLIT_LEXICON, SIMPLE_MATRIX, KANJI_CHAR_DEF, None);
    let mut worker = tokenizer.new_worker();

    let coarse = worker.tokenize(Mode::C, "東京都").unwrap();
    let morpheme = coarse.get(0);

    let split = morpheme.split(Mode::A).unwrap();
    assert_eq!(surfaces(&split), vec!["東京", "都"]);
    // Splitting again and concatenating reproduces the surface.
    let concatenated: String = split.iter().map(|m| m.surface().to_string()).collect();
    assert_eq!(concatenated, morpheme.surface());

    let unsplit = morpheme.split(Mode::B).unwrap();
    assert_eq!(surfaces(&unsplit), vec!["東京都"]);
}

#[test]
fn test_surface_concatenation_reproduces_text() {
    let config = r#"
    {
        "input_text_plugins": [ {"type": "default"} ]
    }
    "#;
    let tokenizer = build_tokenizer(NLP_LEXICON, SIMPLE_MATRIX, KANJI_CHAR_DEF, Some(config));
    let mut worker = tokenizer.new_worker();

    for text in ["自然言語処理", "ＡＢＣ自然言語", "自然123処理！", "カタカナとひらがな"] {
        let morphemes = worker.tokenize(Mode::C, text).unwrap();
        let concatenated: String = morphemes.iter().map(|m| m.surface().to_string()).collect();
        assert_eq!(concatenated, text, "gaps or overlaps in {text}");

        let mut previous_end = 0;
        for morpheme in morphemes.iter() {
            assert_eq!(morpheme.begin(), previous_end);
            previous_end = morpheme.end();
        }
        assert_eq!(previous_end, text.chars().count());
    }
}

#[test]
fn test_determinism() {
    let tokenizer = build_tokenizer(NLP_LEXICON, SIMPLE_MATRIX, KANJI_CHAR_DEF, None);
    let mut worker = tokenizer.new_worker();

    let text = "自然言語処理と自然日本語処理";
    let first = worker.tokenize(Mode::C, text).unwrap();
    let second = worker.tokenize(Mode::C, text).unwrap();
    assert_eq!(surfaces(&first), surfaces(&second));
    let ids: Vec<_> = first.iter().map(|m| m.word_id()).collect();
    let ids2: Vec<_> = second.iter().map(|m| m.word_id()).collect();
    assert_eq!(ids, ids2);
}

#[test]
fn test_normalization_is_idempotent() {
    let config = r#"
    {
        "input_text_plugins": [
            {"type": "default"},
            {"type": "prolonged_sound_mark"}
        ]
    }
    "#;
    let tokenizer = build_tokenizer(NLP_LEXICON, SIMPLE_MATRIX, KANJI_CHAR_DEF, Some(config));

    let once = tokenizer.build_input("ＡＢＣゴーーール①").unwrap();
    let twice = tokenizer.build_input(once.text()).unwrap();
    assert_eq!(once.text(), twice.text());
}

const KATAKANA_LEXICON: &str = "\
アイ,0,0,1,名詞,普通名詞,一般,*,*,*,アイ
アイウ,0,0,1,名詞,普通名詞,一般,*,*,*,アイウ";

const KATAKANA_CHAR_DEF: &str = "0x30A1..0x30FF KATAKANA";

fn katakana_config(min_length: usize) -> String {
    format!(
        r#"
        {{
            "path_rewrite_plugins": [
                {{"type": "join_katakana_oov",
                  "oov_pos": ["名詞", "普通名詞", "一般", "*", "*", "*"],
                  "min_length": {min_length}}}
            ]
        }}
        "#
    )
}

#[test]
fn test_join_katakana_oov_end_to_end() {
    // Two dictionary words cover アイアイウ; at min_length 2 they survive,
    // at min_length 3 the five-code-point katakana span collapses into a
    // single OOV node.
    let config = katakana_config(2);
    let tokenizer = build_tokenizer(
        KATAKANA_LEXICON,
        SIMPLE_MATRIX,
        KATAKANA_CHAR_DEF,
        Some(config.as_str()),
    );
    let mut worker = tokenizer.new_worker();
    let morphemes = worker.tokenize(Mode::C, "アイアイウ").unwrap();
    assert_eq!(surfaces(&morphemes), vec!["アイ", "アイウ"]);

    let config = katakana_config(3);
    let tokenizer = build_tokenizer(
        KATAKANA_LEXICON,
        SIMPLE_MATRIX,
        KATAKANA_CHAR_DEF,
        Some(config.as_str()),
    );
    let mut worker = tokenizer.new_worker();
    let morphemes = worker.tokenize(Mode::C, "アイアイウ").unwrap();
    assert_eq!(surfaces(&morphemes), vec!["アイアイウ"]);
    assert!(morphemes.get(0).is_oov());
}

#[test]
fn test_join_numeric_end_to_end() {
    let lexicon = "\
二,0,0,1,名詞,数詞,一般,*,*,*,ニ
十,0,0,1,名詞,数詞,一般,*,*,*,ジュウ
七,0,0,1,名詞,数詞,一般,*,*,*,ナナ";
    let char_def = "0x4E8C KANJINUMERIC\n0x5341 KANJINUMERIC\n0x4E03 KANJINUMERIC";
    let config = r#"
    {
        "path_rewrite_plugins": [
            {"type": "join_numeric", "join_kanji_numeric": true, "enable_normalize": true}
        ]
    }
    "#;
    let tokenizer = build_tokenizer(lexicon, SIMPLE_MATRIX, char_def, Some(config));
    let mut worker = tokenizer.new_worker();

    let morphemes = worker.tokenize(Mode::C, "二十七").unwrap();
    assert_eq!(surfaces(&morphemes), vec!["二十七"]);
    assert_eq!(morphemes.get(0).normalized_form(), "27");
}

#[test]
fn test_tokenize_sentences() {
    let lexicon = "\
京都,0,0,1,名詞,固有名詞,地名,一般,*,*,キョウト
東京,0,0,1,名詞,固有名詞,地名,一般,*,*,トウキョウ";
    let tokenizer = build_tokenizer(lexicon, SIMPLE_MATRIX, KANJI_CHAR_DEF, None);
    let mut worker = tokenizer.new_worker();

    let sentences = worker.tokenize_sentences(Mode::C, "京都。東京。").unwrap();
    assert_eq!(sentences.len(), 2);
    assert_eq!(surfaces(&sentences[0]), vec!["京都", "。"]);
    assert_eq!(surfaces(&sentences[1]), vec!["東京", "。"]);

    // Offsets resolve into the whole original text.
    assert_eq!(sentences[1].get(0).begin(), 3);
    assert_eq!(sentences[1].get(0).end(), 5);
}

#[test]
fn test_sentence_boundary_never_splits_dictionary_word() {
    // 都。東 is a dictionary word crossing the period, so the boundary
    // after 。 is rejected and the whole text is one sentence.
    let lexicon = "\
京都,0,0,1,名詞,固有名詞,地名,一般,*,*,キョウト
都。東,0,0,1,名詞,普通名詞,一般,*,*,*,ミヤコヒガシ
東京,0,0,1,名詞,固有名詞,地名,一般,*,*,トウキョウ";
    let tokenizer = build_tokenizer(lexicon, SIMPLE_MATRIX, KANJI_CHAR_DEF, None);
    let mut worker = tokenizer.new_worker();

    let sentences = worker
        .tokenize_sentences(Mode::C, "京都。東京")
        .unwrap();
    assert_eq!(sentences.len(), 1);
}

#[test]
fn test_tokenize_sentences_empty() {
    let tokenizer = build_tokenizer(NLP_LEXICON, SIMPLE_MATRIX, KANJI_CHAR_DEF, None);
    let mut worker = tokenizer.new_worker();
    assert!(worker.tokenize_sentences(Mode::C, "").unwrap().is_empty());
}

#[test]
fn test_regex_oov_end_to_end() {
    let config = r#"
    {
        "oov_provider_plugins": [
            {"type": "regex", "regex": "[0-9a-z-]+", "left_id": 0, "right_id": 0,
             "cost": 500, "oov_pos": ["名詞", "普通名詞", "一般", "*", "*", "*"]},
            {"type": "simple", "left_id": 0, "right_id": 0, "cost": 10000,
             "oov_pos": ["補助記号", "一般", "*", "*", "*", "*"]}
        ]
    }
    "#;
    let char_def = "0x0030..0x0039 NUMERIC\n0x0061..0x007A ALPHA\n0x4E00..0x9FFF KANJI";
    let tokenizer = build_tokenizer(NLP_LEXICON, SIMPLE_MATRIX, char_def, Some(config));
    let mut worker = tokenizer.new_worker();

    let morphemes = worker.tokenize(Mode::C, "自然abc-012処理").unwrap();
    assert_eq!(surfaces(&morphemes), vec!["自然", "abc-012", "処理"]);
    assert!(morphemes.get(1).is_oov());
}

#[test]
fn test_unresolvable_pos_is_a_setup_error() {
    let dict = SystemDictionaryBuilder::from_readers(
        NLP_LEXICON.as_bytes(),
        SIMPLE_MATRIX.as_bytes(),
        KANJI_CHAR_DEF.as_bytes(),
    )
    .unwrap();
    let config = TokenizerConfig::from_json(
        r#"
        {
            "oov_provider_plugins": [
                {"type": "simple", "left_id": 0, "right_id": 0, "cost": 10000,
                 "oov_pos": ["名詞", "普通名詞"]}
            ]
        }
        "#,
    )
    .unwrap();
    assert!(Tokenizer::from_config(dict, &config).is_err());
}

#[test]
fn test_out_of_range_connection_id_is_a_setup_error() {
    let dict = SystemDictionaryBuilder::from_readers(
        NLP_LEXICON.as_bytes(),
        SIMPLE_MATRIX.as_bytes(),
        KANJI_CHAR_DEF.as_bytes(),
    )
    .unwrap();
    let config = TokenizerConfig::from_json(
        r#"
        {
            "oov_provider_plugins": [
                {"type": "simple", "left_id": 100, "right_id": 0, "cost": 10000,
                 "oov_pos": ["補助記号", "一般", "*", "*", "*", "*"]}
            ]
        }
        "#,
    )
    .unwrap();
    assert!(Tokenizer::from_config(dict, &config).is_err());
}

#[test]
fn test_yomigana_offsets_resolve_to_original_text() {
    let lexicon = "\
徳島,0,0,1,名詞,固有名詞,地名,一般,*,*,トクシマ
に,0,0,1,助詞,格助詞,*,*,*,*,ニ
行く,0,0,1,動詞,一般,*,*,*,*,イク";
    let char_def = "0x3041..0x309F HIRAGANA\n0x4E00..0x9FFF KANJI";
    let config = r#"
    {
        "input_text_plugins": [
            {"type": "ignore_yomigana", "left_brackets": ["（"], "right_brackets": ["）"]}
        ]
    }
    "#;
    let tokenizer = build_tokenizer(lexicon, SIMPLE_MATRIX, char_def, Some(config));
    let mut worker = tokenizer.new_worker();

    let morphemes = worker.tokenize(Mode::C, "徳島（とくしま）に").unwrap();
    assert_eq!(surfaces(&morphemes), vec!["徳島（とくしま）", "に"]);
    assert_eq!(morphemes.get(0).begin(), 0);
    assert_eq!(morphemes.get(0).end(), 8);
    assert_eq!(morphemes.get(1).begin(), 8);
    assert_eq!(morphemes.get(1).end(), 9);
}

#[test]
fn test_mode_from_str() {
    assert_eq!("A".parse::<Mode>().unwrap(), Mode::A);
    assert_eq!("b".parse::<Mode>().unwrap(), Mode::B);
    assert_eq!("C".parse::<Mode>().unwrap(), Mode::C);
    assert!("D".parse::<Mode>().is_err());
    assert_eq!(Mode::A.to_string(), "A");
}
