use thiserror::Error;

use crate::datatype::ValueType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DtalgebraError {
    #[error("Invalid key: character {ch:?} is not allowed in slot {slot}")]
    InvalidKey { slot: usize, ch: char },
    #[error("Invalid key: slot {slot} is mandatory")]
    MissingSlot { slot: usize },
    #[error("Unknown type: {0}")]
    UnknownType(String),
    #[error("Type mismatch at {basis}: expected {expected}, found {found}")]
    TypeMismatch { basis: String, expected: ValueType, found: ValueType },
    #[error("Invalid {value_type} value: {text:?}")]
    InvalidValue { value_type: ValueType, text: String },
    #[error("Not a classification set: {0}")]
    NotClassificationSet(String),
    #[error("Invalid relation: {0}")]
    InvalidRelation(String),
    #[error("Relation {parent} -> {child} would create a cycle")]
    Cycle { parent: String, child: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Format error at {}: {message}", position(.line, .col))]
    Format { message: String, line: Option<usize>, col: Option<usize> },
    #[error("XML error at {location} (line {line}, column {col}): {message}")]
    Xml { message: String, location: String, line: usize, col: usize },
    #[error("Iterator invalidated: generation {expected} expected, found {found}")]
    IteratorInvalidated { expected: u64, found: u64 },
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DtalgebraError>;

impl DtalgebraError {
    pub(crate) fn format(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::Format { message: message.into(), line: Some(line), col: Some(col) }
    }
}

fn position(line: &Option<usize>, col: &Option<usize>) -> String {
    match (line, col) {
        (Some(l), Some(c)) => format!("line {}, column {}", l, c),
        (Some(l), None) => format!("line {}", l),
        _ => String::from("unknown position"),
    }
}

// Helper conversions
impl From<std::io::Error> for DtalgebraError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
impl From<config::ConfigError> for DtalgebraError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
