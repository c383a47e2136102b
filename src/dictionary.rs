//! トークン化のための辞書モジュール
//!
//! このモジュールは、形態素解析に必要な辞書データの構築、読み込み、
//! シリアライズを行います。主な機能として以下を提供します:
//!
//! - CSV形式のソースデータからのシステム辞書・ユーザー辞書の構築
//! - rkyvフォーマットによるバイナリ辞書の書き込みと検証付き読み込み
//! - メモリマップドファイルによる読み込み
//! - 複数ユーザー辞書の1つのシステム辞書へのマージ
//!
//! # 辞書の読み込み方法
//!
//! - [`Dictionary::from_path`]: ファイルパスから辞書を読み込む（推奨）
//! - [`Dictionary::read`]: リーダーから辞書を読み込む
//! - [`SystemDictionaryBuilder::from_readers`]: ソースデータから構築する

pub mod builder;
pub(crate) mod character;
pub(crate) mod connector;
pub(crate) mod grammar;
pub(crate) mod lexicon;
pub(crate) mod lexicon_set;
pub(crate) mod word_id;
pub(crate) mod word_info;

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use memmap2::Mmap;
use rkyv::api::serialize_using;
use rkyv::rancor::Error as RancorError;
use rkyv::ser::allocator::Arena;
use rkyv::ser::sharing::Share;
use rkyv::ser::writer::IoWriter;
use rkyv::ser::Serializer;
use rkyv::util::{with_arena, AlignedVec};
use rkyv::{access, Archive, Deserialize, Serialize};

use crate::errors::{KabosuError, Result};

pub use crate::dictionary::builder::{SystemDictionaryBuilder, UserDictionaryBuilder};
pub use crate::dictionary::character::{CategorySet, CategoryType, CharacterCategory};
pub use crate::dictionary::connector::{MatrixConnector, INHIBITED_CONNECTION};
pub use crate::dictionary::grammar::{Grammar, PartOfSpeech, WordParam};
pub use crate::dictionary::lexicon::{Lexicon, LexiconMatch};
pub use crate::dictionary::lexicon_set::LexiconSet;
pub use crate::dictionary::word_id::WordId;
pub use crate::dictionary::word_info::WordInfo;

/// kabosuの辞書ファイルを識別するマジックバイト。
///
/// 末尾の"0.1"は辞書フォーマットのバージョンを示しており、
/// クレートのセマンティックバージョンからは切り離されています。
pub const MODEL_MAGIC: &[u8] = b"KabosuDictionary 0.1\n";

const MODEL_MAGIC_LEN: usize = MODEL_MAGIC.len();
const RKYV_ALIGNMENT: usize = 16;
const PADDING_LEN: usize = (RKYV_ALIGNMENT - (MODEL_MAGIC_LEN % RKYV_ALIGNMENT)) % RKYV_ALIGNMENT;
const DATA_START: usize = MODEL_MAGIC_LEN + PADDING_LEN;

/// 辞書の種類。
#[derive(
    Clone, Copy, Eq, PartialEq, Debug, Hash, Default, Archive, Serialize, Deserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug, Eq, PartialEq, Hash, Clone, Copy))]
#[repr(u8)]
pub enum DictionaryKind {
    /// システム辞書。
    ///
    /// 文法情報と基本語彙を含むメインの辞書です。
    #[default]
    System,
    /// ユーザー辞書。
    ///
    /// 追加の語彙のみを含み、システム辞書にマージして使用します。
    User,
}

/// 辞書ファイルのヘッダ。
///
/// 辞書の種類、構築時刻、自由記述のコメントを保持します。
#[derive(Archive, Serialize, Deserialize, Clone, Debug)]
pub struct DictionaryHeader {
    /// 辞書の種類
    pub kind: DictionaryKind,
    /// 構築時刻（Unix秒）
    pub build_time: u64,
    /// 自由記述のコメント
    pub description: String,
}

impl DictionaryHeader {
    /// 新しいヘッダを作成します。構築時刻には現在時刻が記録されます。
    pub fn new(kind: DictionaryKind, description: String) -> Self {
        let build_time = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            kind,
            build_time,
            description,
        }
    }
}

/// システム辞書ファイルのアーカイブペイロード。
#[derive(Archive, Serialize, Deserialize)]
pub(crate) struct SystemDictionaryData {
    pub(crate) header: DictionaryHeader,
    pub(crate) grammar: Grammar,
    pub(crate) lexicon: Lexicon,
}

/// ユーザー辞書ファイルのアーカイブペイロード。
#[derive(Archive, Serialize, Deserialize)]
pub(crate) struct UserDictionaryData {
    pub(crate) header: DictionaryHeader,
    pub(crate) lexicon: Lexicon,
}

/// トークン化のための読み取り専用辞書。
///
/// 文法情報（品詞テーブル、接続コスト行列、文字カテゴリ）と、
/// システム辞書およびマージされたユーザー辞書の語彙を保持します。
/// 一度構築された辞書は不変で、複数のトークナイザー間で安全に共有できます。
pub struct Dictionary {
    header: DictionaryHeader,
    grammar: Grammar,
    lexicons: LexiconSet,
}

impl Dictionary {
    pub(crate) fn from_parts(
        header: DictionaryHeader,
        grammar: Grammar,
        system_lexicon: Lexicon,
    ) -> Self {
        Self {
            header,
            grammar,
            lexicons: LexiconSet::new(system_lexicon),
        }
    }

    /// 辞書ファイルのヘッダを返します。
    #[inline(always)]
    pub fn header(&self) -> &DictionaryHeader {
        &self.header
    }

    /// 文法情報への参照を返します。
    #[inline(always)]
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// 文法情報への可変参照を返します。
    ///
    /// プラグイン設定時の品詞登録に使用します。辞書が共有された後は
    /// 呼び出せません。
    #[inline(always)]
    pub(crate) fn grammar_mut(&mut self) -> &mut Grammar {
        &mut self.grammar
    }

    /// 統合語彙への参照を返します。
    #[inline(always)]
    pub fn lexicon(&self) -> &LexiconSet {
        &self.lexicons
    }

    /// ユーザー辞書をこの辞書にマージします。
    ///
    /// # エラー
    ///
    /// ユーザー辞書の接続IDがシステム辞書の行列の範囲外の場合や、
    /// ユーザー辞書数が上限を超えた場合にエラーを返します。
    pub fn attach_user_dictionary(&mut self, user: UserDictionary) -> Result<()> {
        let connector = self.grammar.connector();
        if !user
            .data
            .lexicon
            .verify(connector.num_left(), connector.num_right())
        {
            return Err(KabosuError::invalid_argument(
                "user",
                "The user dictionary includes invalid connection ids.",
            ));
        }
        self.lexicons.append(user.data.lexicon)?;
        log::info!(
            "Attached a user dictionary: {} dictionaries in total",
            self.lexicons.num_dictionaries()
        );
        Ok(())
    }

    /// 辞書データをrkyvフォーマットでライターにシリアライズします。
    ///
    /// マージ済みのユーザー辞書は書き込まれません。ユーザー辞書は
    /// [`UserDictionary::write`]で個別にシリアライズしてください。
    ///
    /// # エラー
    ///
    /// 書き込みまたはシリアライズに失敗した場合にエラーを返します。
    pub fn write<W>(&self, wtr: W) -> Result<()>
    where
        W: Write,
    {
        let data = SystemDictionaryData {
            header: self.header.clone(),
            grammar: self.grammar.clone(),
            lexicon: self.lexicons.system().clone(),
        };
        data.write_model(wtr)
    }

    /// リーダーからシステム辞書を読み込みます。
    ///
    /// すべてのデータをヒープバッファに読み込みます。ファイルパスが
    /// 利用できる場合は[`Dictionary::from_path`]の方が効率的です。
    ///
    /// # エラー
    ///
    /// マジックバイトの不一致、検証の失敗、辞書の種類の不一致で
    /// エラーを返します。
    pub fn read<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let aligned = read_model_bytes(rdr)?;
        let archived = access::<ArchivedSystemDictionaryData, RancorError>(&aligned)
            .map_err(map_validation_error)?;
        let data: SystemDictionaryData = rkyv::deserialize::<_, RancorError>(archived)?;
        Self::from_system_data(data)
    }

    /// メモリマッピングを使用してファイルパスからシステム辞書を読み込みます。
    ///
    /// # 引数
    ///
    /// * `path` - 辞書ファイルへのパス
    ///
    /// # エラー
    ///
    /// ファイルが存在しない場合やヘッダが不正な場合、対象のパスを含む
    /// エラーを返します。
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let mmap = map_model_file(path)?;
        let archived = access::<ArchivedSystemDictionaryData, RancorError>(&mmap[DATA_START..])
            .map_err(map_validation_error)?;
        let data: SystemDictionaryData = rkyv::deserialize::<_, RancorError>(archived)?;
        let dict = Self::from_system_data(data)?;
        log::info!(
            "Loaded the system dictionary from {}: {} words",
            path.display(),
            dict.lexicons.system().len()
        );
        Ok(dict)
    }

    fn from_system_data(data: SystemDictionaryData) -> Result<Self> {
        if data.header.kind != DictionaryKind::System {
            return Err(KabosuError::invalid_format(
                "dictionary",
                "The input is not a system dictionary.",
            ));
        }
        Ok(Self::from_parts(data.header, data.grammar, data.lexicon))
    }
}

/// スタンドアロンのユーザー辞書。
///
/// [`Dictionary::attach_user_dictionary`]でシステム辞書にマージするまで、
/// 単独ではトークン化に使用できません。
pub struct UserDictionary {
    pub(crate) data: UserDictionaryData,
}

impl UserDictionary {
    /// 辞書ファイルのヘッダを返します。
    #[inline(always)]
    pub fn header(&self) -> &DictionaryHeader {
        &self.data.header
    }

    /// 辞書データをrkyvフォーマットでライターにシリアライズします。
    pub fn write<W>(&self, wtr: W) -> Result<()>
    where
        W: Write,
    {
        self.data.write_model(wtr)
    }

    /// リーダーからユーザー辞書を読み込みます。
    pub fn read<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let aligned = read_model_bytes(rdr)?;
        let archived = access::<ArchivedUserDictionaryData, RancorError>(&aligned)
            .map_err(map_validation_error)?;
        let data: UserDictionaryData = rkyv::deserialize::<_, RancorError>(archived)?;
        Self::from_user_data(data)
    }

    /// メモリマッピングを使用してファイルパスからユーザー辞書を読み込みます。
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let mmap = map_model_file(path)?;
        let archived = access::<ArchivedUserDictionaryData, RancorError>(&mmap[DATA_START..])
            .map_err(map_validation_error)?;
        let data: UserDictionaryData = rkyv::deserialize::<_, RancorError>(archived)?;
        Self::from_user_data(data)
    }

    fn from_user_data(data: UserDictionaryData) -> Result<Self> {
        if data.header.kind != DictionaryKind::User {
            return Err(KabosuError::invalid_format(
                "dictionary",
                "The input is not a user dictionary.",
            ));
        }
        Ok(Self { data })
    }
}

// The write routine is duplicated per payload type so that the serializer
// types stay concrete.
macro_rules! impl_model_write {
    ($type:ty) => {
        impl $type {
            fn write_model<W>(&self, mut wtr: W) -> Result<()>
            where
                W: Write,
            {
                wtr.write_all(MODEL_MAGIC)?;

                let padding_bytes = [0xFFu8; PADDING_LEN];
                wtr.write_all(&padding_bytes)?;

                with_arena(|arena: &mut Arena| {
                    let writer = IoWriter::new(&mut wtr);
                    let mut serializer = Serializer::new(writer, arena.acquire(), Share::new());
                    serialize_using::<_, RancorError>(self, &mut serializer)
                })
                .map_err(|e| {
                    KabosuError::invalid_state(
                        "rkyv serialization failed".to_string(),
                        e.to_string(),
                    )
                })?;

                Ok(())
            }
        }
    };
}

impl_model_write!(SystemDictionaryData);
impl_model_write!(UserDictionaryData);

fn read_model_bytes<R>(mut rdr: R) -> Result<AlignedVec>
where
    R: Read,
{
    let mut magic = [0u8; MODEL_MAGIC_LEN];
    rdr.read_exact(&mut magic)?;
    if magic != MODEL_MAGIC {
        return Err(KabosuError::invalid_format(
            "dictionary",
            "The magic number of the input model mismatches.",
        ));
    }

    let mut padding_buf = [0u8; PADDING_LEN];
    rdr.read_exact(&mut padding_buf)?;

    let mut buffer = Vec::new();
    rdr.read_to_end(&mut buffer)?;

    let mut aligned = AlignedVec::with_capacity(buffer.len());
    aligned.extend_from_slice(&buffer);
    Ok(aligned)
}

fn map_model_file(path: &Path) -> Result<Mmap> {
    if path.is_dir() {
        return Err(KabosuError::PathIsDirectory(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| {
        KabosuError::invalid_argument(
            "path",
            format!("Failed to open the dictionary file {}: {e}", path.display()),
        )
    })?;
    // SAFETY: the mapped file is treated as read-only and kabosu never
    // modifies dictionary files while they are mapped.
    let mmap = unsafe { Mmap::map(&file)? };

    if mmap.len() < DATA_START || !mmap[..MODEL_MAGIC_LEN].eq(MODEL_MAGIC) {
        return Err(KabosuError::invalid_format(
            "dictionary",
            format!(
                "The magic number of the input model mismatches: {}",
                path.display()
            ),
        ));
    }
    Ok(mmap)
}

fn map_validation_error(e: RancorError) -> KabosuError {
    KabosuError::invalid_state(
        "rkyv validation failed. The dictionary file may be corrupted or incompatible."
            .to_string(),
        e.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_test_dictionary() -> Dictionary {
        SystemDictionaryBuilder::from_readers(
            "東京,0,0,3,名詞,固有名詞,地名,一般,*,*,トウキョウ,*,*,*,*,*,*\n\
             京都,0,0,3,名詞,固有名詞,地名,一般,*,*,キョウト,*,*,*,*,*,*"
                .as_bytes(),
            "1 1\n0 0 0".as_bytes(),
            "0x4E00..0x9FFF KANJI".as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_write_read_round_trip() {
        let dict = build_test_dictionary();
        let mut buf = vec![];
        dict.write(&mut buf).unwrap();
        assert!(buf.starts_with(MODEL_MAGIC));

        let loaded = Dictionary::read(buf.as_slice()).unwrap();
        assert_eq!(loaded.header().kind, DictionaryKind::System);
        assert_eq!(loaded.lexicon().system().len(), 2);

        let input = "東京".as_bytes();
        let results: Vec<_> = loaded.lexicon().lookup(input, 0).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].end_byte, 6);
        let info = loaded.lexicon().word_info(results[0].word_id).unwrap();
        assert_eq!(info.surface, "東京");
        assert_eq!(info.reading_form, "トウキョウ");
    }

    #[test]
    fn test_read_bad_magic() {
        let result = Dictionary::read(&b"NotADictionaryAtAll.............."[..]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_path_round_trip() {
        let dict = build_test_dictionary();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.dic");
        {
            let mut file = File::create(&path).unwrap();
            dict.write(&mut file).unwrap();
        }
        let loaded = Dictionary::from_path(&path).unwrap();
        assert_eq!(loaded.lexicon().system().len(), 2);
    }

    #[test]
    fn test_from_path_missing_file() {
        assert!(Dictionary::from_path("/nonexistent/system.dic").is_err());
    }
}
