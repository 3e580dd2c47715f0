use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::{DtalgebraError, Result};

#[derive(Parser)]
#[grammar = "codec/record.pest"]
struct RecordParser;

/// One CSV field together with where it started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Field {
    pub text: String,
    pub quoted: bool,
    pub line: usize,
    pub col: usize,
}
impl Field {
    /// An unquoted field with no text.
    pub fn is_empty_bare(&self) -> bool {
        !self.quoted && self.text.is_empty()
    }
    pub fn error(&self, message: impl Into<String>) -> DtalgebraError {
        DtalgebraError::format(message, self.line, self.col)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Record {
    pub fields: Vec<Field>,
    pub line: usize,
}
impl Record {
    /// A line with nothing on it.
    pub fn is_blank(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].is_empty_bare()
    }
    pub fn error(&self, message: impl Into<String>) -> DtalgebraError {
        DtalgebraError::format(message, self.line, 1)
    }
}

fn field(pair: Pair<Rule>) -> Field {
    let (line, col) = pair.line_col();
    match pair.as_rule() {
        Rule::quoted => {
            let inner = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Field {
                text: inner.replace("\"\"", "\""),
                quoted: true,
                line,
                col,
            }
        }
        _ => Field {
            text: pair.as_str().to_owned(),
            quoted: false,
            line,
            col,
        },
    }
}

/// Splits decoded text into records. The empty record produced by a final
/// line break is dropped.
pub(crate) fn parse_records(text: &str) -> Result<Vec<Record>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let file = RecordParser::parse(Rule::file, text)
        .map_err(|e| {
            let (line, col) = match e.line_col {
                LineColLocation::Pos(pos) => pos,
                LineColLocation::Span(start, _) => start,
            };
            DtalgebraError::format(format!("malformed record: {}", e.variant.message()), line, col)
        })?
        .next()
        .ok_or_else(|| DtalgebraError::format("empty input", 1, 1))?;
    let mut records = Vec::new();
    for pair in file.into_inner() {
        if pair.as_rule() != Rule::record {
            continue;
        }
        let (line, _) = pair.line_col();
        records.push(Record {
            fields: pair.into_inner().map(field).collect(),
            line,
        });
    }
    if records.len() > 1 && text.ends_with(['\n', '\r']) {
        records.pop();
    }
    Ok(records)
}

/// Quotes a field when the text would otherwise not survive a round-trip.
pub(crate) fn quote(text: &str) -> String {
    if text.is_empty() || text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_fields_keep_commas_quotes_and_line_breaks() {
        let records = parse_records("a,\"b,\"\"c\"\"\",\"x\ny\"\nlast\n").unwrap();
        assert_eq!(records.len(), 2);
        let texts: Vec<&str> = records[0].fields.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b,\"c\"", "x\ny"]);
        assert!(records[0].fields[1].quoted);
        assert_eq!(records[1].line, 3);
        assert_eq!(records[1].fields[0].text, "last");
    }

    #[test]
    fn blank_lines_and_empty_quotes_differ() {
        let records = parse_records("x\n\n\"\"\n").unwrap();
        assert_eq!(records.len(), 3);
        assert!(records[1].is_blank());
        assert!(!records[2].is_blank());
        assert!(records[2].fields[0].quoted);
    }

    #[test]
    fn stray_quote_reports_position() {
        let err = parse_records("ok\nab\"c,d\n").unwrap_err();
        match err {
            DtalgebraError::Format { line, .. } => assert_eq!(line, Some(2)),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
