use std::mem;

use tracing::debug;

use crate::basis::{ATTRIBUTE, NAME, SUBJECT, TYPE};
use crate::basis::Basis;
use crate::cache::KeyCache;
use crate::collection::ElementSet;
use crate::element::AlgebraElement;
use crate::error::{DtalgebraError, Result};

use super::record::Record;
use super::{at_field, field_value, value_field, Dialect, SET_KEYWORD};

// value,name,type,attr,subject with the last two optional
const VALUE: usize = 0;
const MIN_COLUMNS: usize = 3;
const MAX_COLUMNS: usize = 5;

pub(crate) fn parse(records: &[Record], cache: &mut KeyCache, dialect: Dialect) -> Result<ElementSet> {
    let mut set = ElementSet::new();
    let mut current = AlgebraElement::new();
    let mut rows = 0;
    for record in records.iter().skip(1) {
        if record.is_blank() {
            if !current.is_empty() {
                set.insert(mem::take(&mut current));
            }
            continue;
        }
        let fields = &record.fields;
        if fields.len() < MIN_COLUMNS || fields.len() > MAX_COLUMNS {
            return Err(record.error(format!(
                "expected {} to {} columns, found {}",
                MIN_COLUMNS,
                MAX_COLUMNS,
                fields.len()
            )));
        }
        // key slots are shifted by one column, the value comes first
        let slot = |index: usize| fields.get(index + 1).map(|f| f.text.as_str());
        let basis = Basis::new(
            cache,
            slot(NAME).unwrap_or(""),
            slot(TYPE).unwrap_or(""),
            slot(ATTRIBUTE),
            slot(SUBJECT),
        )
        .map_err(|e| {
            let column = match &e {
                DtalgebraError::InvalidKey { slot, .. } | DtalgebraError::MissingSlot { slot } => slot + 1,
                _ => NAME + 1,
            };
            at_field(fields.get(column).unwrap_or(&fields[NAME + 1]))(e)
        })?;
        let value = field_value(&fields[VALUE], basis.value_type(), dialect)?;
        current = current.with(basis, value).map_err(at_field(&fields[VALUE]))?;
        rows += 1;
    }
    if !current.is_empty() {
        set.insert(current);
    }
    debug!("Parsed {} rows into {} elements", rows, set.len());
    Ok(set)
}

/// Renders a set in the v2 standard form. Empty elements have no rows and are left out.
pub fn format(set: &ElementSet) -> String {
    let mut out = String::from(SET_KEYWORD);
    out.push('\n');
    let mut first = true;
    for element in set.iter().filter(|e| !e.is_empty()) {
        if !first {
            out.push('\n');
        }
        first = false;
        for (basis, value) in element.iter() {
            out += &format!(
                "{},{},{},{},{}\n",
                value_field(value),
                basis.name(),
                basis.type_token(),
                basis.attribute(),
                basis.subject()
            );
        }
    }
    out
}
