use tracing::debug;

use crate::error::{DtalgebraError, Result};
use crate::thesaurus::Thesaurus;

use super::record::{quote, Record};

pub const THESAURUS_KEYWORD: &str = "#DtStringThesaurus";

/// Builds a thesaurus from `parent,child` rows, inserting them in file order.
/// Fields are taken verbatim; a row that would close a cycle fails at its line.
pub(crate) fn parse(records: &[Record]) -> Result<Thesaurus> {
    let keyword = records
        .first()
        .and_then(|r| r.fields.first())
        .ok_or_else(|| DtalgebraError::format("missing keyword", 1, 1))?;
    if keyword.text != THESAURUS_KEYWORD {
        return Err(keyword.error(format!("unknown keyword '{}'", keyword.text)));
    }
    let mut thesaurus = Thesaurus::new();
    for record in records.iter().skip(1) {
        if record.is_blank() {
            continue;
        }
        if record.fields.len() != 2 {
            return Err(record.error(format!(
                "expected parent and child, found {} columns",
                record.fields.len()
            )));
        }
        let (parent, child) = (&record.fields[0], &record.fields[1]);
        if let Some(empty) = record.fields.iter().find(|f| f.text.is_empty()) {
            return Err(empty.error("empty word"));
        }
        thesaurus
            .put(&parent.text, &child.text)
            .map_err(|e| parent.error(e.to_string()))?;
    }
    debug!("Parsed thesaurus with {} relations", thesaurus.len());
    Ok(thesaurus)
}

pub fn format(thesaurus: &Thesaurus) -> String {
    let mut out = String::from(THESAURUS_KEYWORD);
    out.push('\n');
    for entry in thesaurus.entries() {
        out += &format!("{},{}\n", quote(entry.parent()), quote(entry.child()));
    }
    out
}
