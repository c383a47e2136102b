//! 辞書ビルダー
//!
//! このモジュールは、CSV形式の語彙定義と`matrix.def`、`char.def`から
//! 辞書をメモリ上に構築するビルダーを提供します。
//!
//! # 語彙CSVのフォーマット
//!
//! 各行は以下のフィールドをカンマ区切りで持ちます。
//! 10列目以降は省略可能で、省略時は`*`として扱われます。
//!
//! ```text
//! 表層形,左文脈ID,右文脈ID,コスト,品詞1,品詞2,品詞3,品詞4,品詞5,品詞6,
//! 読み,正規化形,辞書形参照,A単位分割,B単位分割,語構成,同義語グループID
//! ```
//!
//! 分割テーブルと語構成は`/`区切りの単語参照のリストです。単語参照は
//! 同じCSV内の行番号（システム辞書参照）、またはユーザー辞書内の行番号を
//! 指す`U`付き番号です。`*`は空を意味します。

use std::io::Read;

use csv_core::ReadRecordResult;

use crate::dictionary::character::CharacterCategory;
use crate::dictionary::connector::MatrixConnector;
use crate::dictionary::grammar::{Grammar, PartOfSpeech, WordParam};
use crate::dictionary::lexicon::Lexicon;
use crate::dictionary::word_id::{WordId, MAX_WORD_ID};
use crate::dictionary::word_info::{WordInfo, DICTIONARY_FORM_SELF};
use crate::dictionary::{
    Dictionary, DictionaryHeader, DictionaryKind, UserDictionary, UserDictionaryData,
};
use crate::errors::{KabosuError, Result};

/// CSVの必須フィールド数（表層形から品詞6まで）。
const MIN_FIELDS: usize = 10;
/// CSVの全フィールド数。
const NUM_FIELDS: usize = 17;

/// システム辞書を構築するビルダー。
pub struct SystemDictionaryBuilder {}

impl SystemDictionaryBuilder {
    /// 語彙CSV、接続コスト行列、文字カテゴリ定義のリーダーから
    /// システム辞書を構築します。
    ///
    /// # 引数
    ///
    /// * `lexicon_rdr` - 語彙CSVのリーダー
    /// * `matrix_rdr` - `matrix.def`形式のリーダー
    /// * `char_def_rdr` - `char.def`形式のリーダー
    ///
    /// # エラー
    ///
    /// 入力のフォーマットが不正な場合や、接続IDが行列の範囲外の場合に
    /// エラーを返します。
    ///
    /// # 例
    ///
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use kabosu::dictionary::SystemDictionaryBuilder;
    ///
    /// let dict = SystemDictionaryBuilder::from_readers(
    ///     "京都,0,0,5,名詞,固有名詞,地名,一般,*,*,キョウト".as_bytes(),
    ///     "1 1\n0 0 0".as_bytes(),
    ///     "0x4E00..0x9FFF KANJI".as_bytes(),
    /// )?;
    /// let results: Vec<_> = dict.lexicon().lookup("京都".as_bytes(), 0).collect();
    /// assert_eq!(results.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_readers<L, M, C>(lexicon_rdr: L, matrix_rdr: M, char_def_rdr: C) -> Result<Dictionary>
    where
        L: Read,
        M: Read,
        C: Read,
    {
        let connector = MatrixConnector::from_reader(matrix_rdr)?;
        let char_category = CharacterCategory::from_reader(char_def_rdr)?;
        let mut grammar = Grammar::new(vec![], connector, char_category);

        let raw_entries = read_raw_entries(lexicon_rdr, &mut grammar, None)?;
        let num_words = raw_entries.len();
        let entries = resolve_entries(raw_entries, num_words, None)?;
        let lexicon = Lexicon::from_entries(entries)?;

        let connector = grammar.connector();
        if !lexicon.verify(connector.num_left(), connector.num_right()) {
            return Err(KabosuError::invalid_argument(
                "lexicon_rdr",
                "The lexicon includes connection ids larger than the matrix.",
            ));
        }

        log::info!(
            "Built a system dictionary: {} words, {} part-of-speech tags",
            lexicon.len(),
            grammar.pos_size()
        );
        Ok(Dictionary::from_parts(
            DictionaryHeader::new(DictionaryKind::System, String::new()),
            grammar,
            lexicon,
        ))
    }
}

/// ユーザー辞書を構築するビルダー。
pub struct UserDictionaryBuilder {}

impl UserDictionaryBuilder {
    /// 語彙CSVのリーダーからユーザー辞書を構築します。
    ///
    /// 品詞タグと接続IDはシステム辞書に対して解決・検証されます。
    ///
    /// # 引数
    ///
    /// * `system` - マージ先となるシステム辞書
    /// * `lexicon_rdr` - 語彙CSVのリーダー
    ///
    /// # エラー
    ///
    /// システム辞書に存在しない品詞タグが使用された場合や、
    /// 接続IDが範囲外の場合にエラーを返します。
    pub fn from_readers<L>(system: &Dictionary, lexicon_rdr: L) -> Result<UserDictionary>
    where
        L: Read,
    {
        // The grammar is cloned so that POS resolution can reject unknown
        // tags without mutating the system dictionary.
        let mut grammar = system.grammar().clone();
        let num_pos = grammar.pos_size();
        let raw_entries = read_raw_entries(lexicon_rdr, &mut grammar, Some(num_pos))?;

        let num_system_words = system.lexicon().system().len();
        let num_words = raw_entries.len();
        let entries = resolve_entries(raw_entries, num_system_words, Some(num_words))?;
        let lexicon = Lexicon::from_entries(entries)?;

        let connector = system.grammar().connector();
        if !lexicon.verify(connector.num_left(), connector.num_right()) {
            return Err(KabosuError::invalid_argument(
                "lexicon_rdr",
                "The user lexicon includes connection ids larger than the matrix.",
            ));
        }

        log::info!("Built a user dictionary: {} words", lexicon.len());
        Ok(UserDictionary {
            data: UserDictionaryData {
                header: DictionaryHeader::new(DictionaryKind::User, String::new()),
                lexicon,
            },
        })
    }
}

/// 参照解決前の1エントリ。
struct RawEntry {
    surface: String,
    param: WordParam,
    pos_id: u16,
    reading_form: String,
    normalized_form: String,
    dictionary_form_ref: Option<usize>,
    a_unit_split: Vec<WordRef>,
    b_unit_split: Vec<WordRef>,
    word_structure: Vec<WordRef>,
    synonym_group_ids: Vec<u32>,
}

/// CSV中の単語参照。
#[derive(Clone, Copy)]
enum WordRef {
    /// システム辞書の行番号
    System(usize),
    /// 構築中のユーザー辞書の行番号
    User(usize),
}

fn read_raw_entries<R>(
    mut rdr: R,
    grammar: &mut Grammar,
    max_pos: Option<usize>,
) -> Result<Vec<RawEntry>>
where
    R: Read,
{
    let mut buf = vec![];
    rdr.read_to_end(&mut buf)?;
    let records = parse_csv_records(&buf, "lex.csv")?;

    let mut entries = Vec::with_capacity(records.len());
    for mut fields in records {
        if fields.len() == 1 && fields[0].is_empty() {
            continue;
        }
        if fields.len() < MIN_FIELDS {
            return Err(KabosuError::invalid_format(
                "lex.csv",
                format!(
                    "A csv row must have {} fields at least: {:?}",
                    MIN_FIELDS,
                    fields.join(",")
                ),
            ));
        }
        fields.resize(NUM_FIELDS, "*".to_string());

        let surface = fields[0].clone();
        if surface.is_empty() {
            log::warn!("Skipped an empty surface: {:?}", fields.join(","));
            continue;
        }
        if surface.len() > usize::from(u16::MAX) {
            return Err(KabosuError::invalid_format(
                "lex.csv",
                format!("The surface is too long: {surface}"),
            ));
        }

        let left_id: u16 = fields[1].parse()?;
        let right_id: u16 = fields[2].parse()?;
        let cost: i16 = fields[3].parse()?;

        let pos = PartOfSpeech::from_strs(
            &fields[4..10].iter().map(String::as_str).collect::<Vec<_>>(),
        )
        .expect("slice of six fields");
        let pos_id = match max_pos {
            // User dictionaries cannot extend the system POS table.
            Some(_) => grammar.pos_id(&pos).ok_or_else(|| {
                KabosuError::invalid_argument(
                    "lexicon_rdr",
                    format!("The POS is not defined in the system dictionary: {pos:?}"),
                )
            })?,
            None => grammar.pos_id_or_insert(pos),
        };

        let reading_form = parse_optional_text(&fields[10], "");
        let normalized_form = parse_optional_text(&fields[11], &surface);
        let dictionary_form_ref = parse_word_index(&fields[12])?;

        entries.push(RawEntry {
            surface,
            param: WordParam::new(left_id, right_id, cost),
            pos_id,
            reading_form,
            normalized_form,
            dictionary_form_ref,
            a_unit_split: parse_word_refs(&fields[13])?,
            b_unit_split: parse_word_refs(&fields[14])?,
            word_structure: parse_word_refs(&fields[15])?,
            synonym_group_ids: parse_group_ids(&fields[16])?,
        });
    }
    Ok(entries)
}

fn resolve_entries(
    raw_entries: Vec<RawEntry>,
    num_system_words: usize,
    num_user_words: Option<usize>,
) -> Result<Vec<(String, WordParam, WordInfo)>> {
    let num_own_words = num_user_words.unwrap_or(num_system_words);
    let surfaces: Vec<String> = raw_entries.iter().map(|e| e.surface.clone()).collect();

    let resolve_refs = |refs: &[WordRef]| -> Result<Vec<u32>> {
        refs.iter()
            .map(|&r| match r {
                WordRef::System(i) if i < num_system_words => {
                    Ok(WordId::new(0, i as u32).to_packed())
                }
                // User references are marked with dictionary id 1 and are
                // rebased when the lexicon is attached.
                WordRef::User(i) if num_user_words.is_some() && i < num_own_words => {
                    Ok(WordId::new(1, i as u32).to_packed())
                }
                WordRef::System(i) | WordRef::User(i) => Err(KabosuError::invalid_format(
                    "lex.csv",
                    format!("The word reference is out of range: {i}"),
                )),
            })
            .collect()
    };

    let mut entries = Vec::with_capacity(raw_entries.len());
    for raw in &raw_entries {
        let (dictionary_form_word_id, dictionary_form) = match raw.dictionary_form_ref {
            None => (DICTIONARY_FORM_SELF, raw.surface.clone()),
            Some(i) if i < num_own_words => (i as i32, surfaces[i].clone()),
            Some(i) => {
                return Err(KabosuError::invalid_format(
                    "lex.csv",
                    format!("The dictionary form reference is out of range: {i}"),
                ));
            }
        };
        let info = WordInfo {
            surface: raw.surface.clone(),
            head_word_length: raw.surface.len() as u16,
            pos_id: raw.pos_id,
            normalized_form: raw.normalized_form.clone(),
            dictionary_form_word_id,
            dictionary_form,
            reading_form: raw.reading_form.clone(),
            a_unit_split: resolve_refs(&raw.a_unit_split)?,
            b_unit_split: resolve_refs(&raw.b_unit_split)?,
            word_structure: resolve_refs(&raw.word_structure)?,
            synonym_group_ids: raw.synonym_group_ids.clone(),
        };
        entries.push((raw.surface.clone(), raw.param, info));
    }
    Ok(entries)
}

fn parse_optional_text(field: &str, default: &str) -> String {
    if field == "*" || field.is_empty() {
        default.to_string()
    } else {
        field.to_string()
    }
}

fn parse_word_index(field: &str) -> Result<Option<usize>> {
    if field == "*" || field.is_empty() {
        return Ok(None);
    }
    Ok(Some(field.parse()?))
}

fn parse_word_refs(field: &str) -> Result<Vec<WordRef>> {
    if field == "*" || field.is_empty() {
        return Ok(vec![]);
    }
    field
        .split('/')
        .map(|item| {
            let word_ref = if let Some(rest) = item.strip_prefix('U') {
                WordRef::User(rest.parse()?)
            } else {
                WordRef::System(item.parse()?)
            };
            let index = match word_ref {
                WordRef::System(i) | WordRef::User(i) => i,
            };
            if index > MAX_WORD_ID as usize {
                return Err(KabosuError::invalid_format(
                    "lex.csv",
                    format!("The word reference is too large: {item}"),
                ));
            }
            Ok(word_ref)
        })
        .collect()
}

fn parse_group_ids(field: &str) -> Result<Vec<u32>> {
    if field == "*" || field.is_empty() {
        return Ok(vec![]);
    }
    field.split('/').map(|item| Ok(item.parse()?)).collect()
}

/// CSVバイト列をレコードごとのフィールドのベクタにパースします。
///
/// クォートされたフィールドを含む一般的なCSVを受け付けます。
pub(crate) fn parse_csv_records(mut bytes: &[u8], name: &'static str) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv_core::Reader::new();
    let mut output = [0u8; 16384];
    let mut ends = [0usize; 64];
    let mut records = vec![];

    loop {
        let (result, nin, _nout, nend) = rdr.read_record(bytes, &mut output, &mut ends);
        bytes = &bytes[nin..];
        match result {
            ReadRecordResult::InputEmpty => continue,
            ReadRecordResult::OutputFull | ReadRecordResult::OutputEndsFull => {
                return Err(KabosuError::invalid_format(name, "A csv record is too large"));
            }
            ReadRecordResult::Record => {
                let mut fields = Vec::with_capacity(nend);
                let mut start = 0;
                for &end in &ends[..nend] {
                    fields.push(std::str::from_utf8(&output[start..end])?.to_string());
                    start = end;
                }
                records.push(fields);
            }
            ReadRecordResult::End => break,
        }
    }
    Ok(records)
}
