//! Flat-file codecs for element sets.
//!
//! Two CSV families are supported, each with a legacy and a v2 dialect chosen
//! by the exact keyword on line 1:
//! * the standard form (`#DtalgebraSet2` / `#DtalgebraSet`), one
//!   `value,name,type,attr,subject` row per entry with blank lines between
//!   elements,
//! * the table form (`#DtalgebraTable2` / `#DtalgebraTable`), four header rows
//!   naming one basis per column and one element per body row.
//!
//! v2 dialects escape values with the two-character marker `!#`: `!#N` is
//! null and `!#!#rest` is the literal text `!#rest`. Legacy dialects take
//! every field verbatim and read empty fields as null.
//!
//! XML files are always UTF-8 and go through [`xml`]. A small thesaurus file
//! format lives in [`thesaurus`].

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::cache::KeyCache;
use crate::collection::ElementSet;
use crate::datatype::{Value, ValueType};
use crate::error::{DtalgebraError, Result};
use crate::thesaurus::Thesaurus;

mod record;
pub mod standard;
pub mod table;
pub mod thesaurus;
pub mod xml;

use record::{parse_records, Field};

pub const SET_KEYWORD: &str = "#DtalgebraSet2";
pub const SET_KEYWORD_LEGACY: &str = "#DtalgebraSet";
pub const TABLE_KEYWORD: &str = "#DtalgebraTable2";
pub const TABLE_KEYWORD_LEGACY: &str = "#DtalgebraTable";

/// Marks an escaped value in v2 dialects.
pub const ESCAPE: &str = "!#";
/// Follows the escape marker to denote null.
pub const NULL_COMMAND: &str = "N";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    Legacy,
    V2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CsvForm {
    Standard,
    Table,
}

impl CsvForm {
    /// Identifies form and dialect from the keyword on line 1 (case-sensitive).
    pub fn detect(keyword: &str) -> Option<(CsvForm, Dialect)> {
        match keyword {
            SET_KEYWORD => Some((CsvForm::Standard, Dialect::V2)),
            SET_KEYWORD_LEGACY => Some((CsvForm::Standard, Dialect::Legacy)),
            TABLE_KEYWORD => Some((CsvForm::Table, Dialect::V2)),
            TABLE_KEYWORD_LEGACY => Some((CsvForm::Table, Dialect::Legacy)),
            _ => None,
        }
    }
    pub fn keyword(&self, dialect: Dialect) -> &'static str {
        match (self, dialect) {
            (CsvForm::Standard, Dialect::V2) => SET_KEYWORD,
            (CsvForm::Standard, Dialect::Legacy) => SET_KEYWORD_LEGACY,
            (CsvForm::Table, Dialect::V2) => TABLE_KEYWORD,
            (CsvForm::Table, Dialect::Legacy) => TABLE_KEYWORD_LEGACY,
        }
    }
}

// ------------- Charset -------------
/// The fixed set of encodings CSV files can be read and written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl Charset {
    /// The charset used when the caller does not pick one.
    pub fn platform_default() -> Charset {
        Charset::Utf8
    }
    pub fn from_name(name: &str) -> Result<Charset> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Charset::Latin1),
            "us-ascii" | "ascii" => Ok(Charset::Ascii),
            _ => Err(DtalgebraError::Encoding(format!("unsupported charset '{}'", name))),
        }
    }
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Ascii => "US-ASCII",
        }
    }
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| DtalgebraError::Encoding(e.to_string())),
            Charset::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Charset::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(at) => Err(DtalgebraError::Encoding(format!(
                    "byte 0x{:02x} at offset {} is not US-ASCII",
                    bytes[at], at
                ))),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
        }
    }
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let limit = match self {
            Charset::Utf8 => return Ok(text.as_bytes().to_vec()),
            Charset::Latin1 => 0xff,
            Charset::Ascii => 0x7f,
        };
        text.chars()
            .map(|c| {
                if (c as u32) <= limit {
                    Ok(c as u8)
                } else {
                    Err(DtalgebraError::Encoding(format!(
                        "character {:?} cannot be written as {}",
                        c,
                        self.name()
                    )))
                }
            })
            .collect()
    }
}

// ------------- Field values -------------
/// The text of a field after escape processing, `None` meaning null.
pub(crate) fn unescape(field: &Field, dialect: Dialect) -> Result<Option<String>> {
    match dialect {
        Dialect::Legacy => {
            if field.text.is_empty() {
                Ok(None)
            } else {
                Ok(Some(field.text.clone()))
            }
        }
        Dialect::V2 => {
            if field.is_empty_bare() {
                return Ok(None);
            }
            match field.text.strip_prefix(ESCAPE) {
                None => Ok(Some(field.text.clone())),
                Some(command) if command.eq_ignore_ascii_case(NULL_COMMAND) => Ok(None),
                Some(command) if command.starts_with(ESCAPE) => Ok(Some(command.to_owned())),
                Some(command) => Err(field.error(format!("undefined command '{}{}'", ESCAPE, command))),
            }
        }
    }
}

/// Reads a field as a value of the given type.
pub(crate) fn field_value(field: &Field, value_type: ValueType, dialect: Dialect) -> Result<Value> {
    match unescape(field, dialect)? {
        None => Ok(Value::Null),
        Some(text) if text.is_empty() && value_type != ValueType::String => Ok(Value::Null),
        Some(text) => Value::parse(value_type, &text).map_err(|e| field.error(e.to_string())),
    }
}

/// The v2 text of a value, before CSV quoting.
pub(crate) fn escape(value: &Value) -> String {
    match value {
        Value::Null => format!("{}{}", ESCAPE, NULL_COMMAND),
        Value::String(s) if s.starts_with(ESCAPE) => format!("{}{}", ESCAPE, s),
        other => other.to_string(),
    }
}

/// A value ready to be placed in a v2 CSV line.
pub(crate) fn value_field(value: &Value) -> String {
    record::quote(&escape(value))
}

/// Wraps a key validation failure with the position of the offending field.
pub(crate) fn at_field(field: &Field) -> impl Fn(DtalgebraError) -> DtalgebraError + '_ {
    move |e| match e {
        DtalgebraError::Format { .. } => e,
        other => field.error(other.to_string()),
    }
}

// ------------- Codec -------------
/// Reads and writes element sets, building every basis through the given cache.
pub struct Codec<'c> {
    cache: &'c mut KeyCache,
    charset: Charset,
}

impl<'c> Codec<'c> {
    pub fn new(cache: &'c mut KeyCache) -> Self {
        Self {
            cache,
            charset: Charset::platform_default(),
        }
    }
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }
    pub fn charset(&self) -> Charset {
        self.charset
    }
    pub fn cache(&mut self) -> &mut KeyCache {
        &mut *self.cache
    }

    /// Parses either CSV form, picked by the keyword on line 1.
    pub fn parse_csv(&mut self, text: &str) -> Result<ElementSet> {
        let records = parse_records(text)?;
        let first = records
            .first()
            .and_then(|r| r.fields.first())
            .ok_or_else(|| DtalgebraError::format("missing keyword", 1, 1))?;
        let (form, dialect) = CsvForm::detect(&first.text)
            .ok_or_else(|| first.error(format!("unknown keyword '{}'", first.text)))?;
        debug!("Detected {:?} form in {:?} dialect", form, dialect);
        let set = match form {
            CsvForm::Standard => standard::parse(&records, self.cache, dialect)?,
            CsvForm::Table => table::parse(&records, self.cache, dialect)?,
        };
        Ok(set)
    }
    pub fn read_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<ElementSet> {
        let path = path.as_ref();
        let text = self.charset.decode(&fs::read(path)?)?;
        let set = self.parse_csv(&text)?;
        info!("Read {} elements from {}", set.len(), path.display());
        Ok(set)
    }
    pub fn write_standard_csv<P: AsRef<Path>>(&self, path: P, set: &ElementSet) -> Result<()> {
        self.write_text(path.as_ref(), &standard::format(set), set.len())
    }
    pub fn write_table_csv<P: AsRef<Path>>(&self, path: P, set: &ElementSet) -> Result<()> {
        self.write_text(path.as_ref(), &table::format(set), set.len())
    }
    fn write_text(&self, path: &Path, text: &str, count: usize) -> Result<()> {
        fs::write(path, self.charset.encode(text)?)?;
        info!("Wrote {} records to {} as {}", count, path.display(), self.charset.name());
        Ok(())
    }

    pub fn parse_xml(&mut self, text: &str) -> Result<ElementSet> {
        xml::parse(text, self.cache)
    }
    /// XML is always read as UTF-8, whatever charset the codec was given.
    pub fn read_xml<P: AsRef<Path>>(&mut self, path: P) -> Result<ElementSet> {
        let path = path.as_ref();
        let text = Charset::Utf8.decode(&fs::read(path)?)?;
        let set = self.parse_xml(&text)?;
        info!("Read {} elements from {}", set.len(), path.display());
        Ok(set)
    }
    pub fn write_xml<P: AsRef<Path>>(&self, path: P, set: &ElementSet) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, xml::format(set))?;
        info!("Wrote {} elements to {} as UTF-8 XML", set.len(), path.display());
        Ok(())
    }

    pub fn parse_thesaurus(&self, text: &str) -> Result<Thesaurus> {
        thesaurus::parse(&parse_records(text)?)
    }
    pub fn read_thesaurus<P: AsRef<Path>>(&self, path: P) -> Result<Thesaurus> {
        let text = self.charset.decode(&fs::read(path.as_ref())?)?;
        self.parse_thesaurus(&text)
    }
    pub fn write_thesaurus<P: AsRef<Path>>(&self, path: P, thesaurus: &Thesaurus) -> Result<()> {
        self.write_text(path.as_ref(), &thesaurus::format(thesaurus), thesaurus.len())
    }
}
