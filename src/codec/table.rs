use tracing::debug;

use crate::basis::Basis;
use crate::cache::KeyCache;
use crate::datatype::Value;
use crate::collection::ElementSet;
use crate::element::AlgebraElement;
use crate::error::{DtalgebraError, Result};

use super::record::{Field, Record};
use super::{at_field, field_value, value_field, Dialect, TABLE_KEYWORD};

// keyword row followed by the name, type, attribute and subject rows
const HEADER_ROWS: usize = 5;

fn header_bases(records: &[Record], cache: &mut KeyCache) -> Result<Vec<Basis>> {
    if records.len() < HEADER_ROWS {
        let missing = records.last().map(|r| r.line + 1).unwrap_or(1);
        return Err(DtalgebraError::format(
            format!("expected {} header rows, found {}", HEADER_ROWS, records.len()),
            missing,
            1,
        ));
    }
    let names = &records[1];
    if names.is_blank() {
        return Ok(Vec::new());
    }
    let columns = names.fields.len();
    for row in &records[2..HEADER_ROWS] {
        if row.fields.len() > columns {
            return Err(row.error(format!(
                "header row has {} columns, the name row has {}",
                row.fields.len(),
                columns
            )));
        }
    }
    let text = |row: usize, column: usize| -> Option<&Field> { records[row].fields.get(column) };
    let mut bases = Vec::with_capacity(columns);
    for (column, name) in names.fields.iter().enumerate() {
        let basis = Basis::new(
            cache,
            &name.text,
            text(2, column).map(|f| f.text.as_str()).unwrap_or(""),
            text(3, column).map(|f| f.text.as_str()),
            text(4, column).map(|f| f.text.as_str()),
        )
        .map_err(|e| {
            let row = match &e {
                DtalgebraError::InvalidKey { slot, .. } | DtalgebraError::MissingSlot { slot } => slot + 1,
                _ => 1,
            };
            let field = text(row, column).unwrap_or(name);
            at_field(field)(e)
        })?;
        bases.push(basis);
    }
    Ok(bases)
}

pub(crate) fn parse(records: &[Record], cache: &mut KeyCache, dialect: Dialect) -> Result<ElementSet> {
    let bases = header_bases(records, cache)?;
    let mut set = ElementSet::new();
    for record in &records[HEADER_ROWS..] {
        if record.is_blank() {
            continue;
        }
        if record.fields.len() > bases.len() {
            return Err(record.error(format!(
                "expected at most {} columns, found {}",
                bases.len(),
                record.fields.len()
            )));
        }
        let mut element = AlgebraElement::new();
        // a basis repeated over several columns ends up with the rightmost value
        for (column, basis) in bases.iter().enumerate() {
            // short rows are padded with bare empty fields
            let Some(field) = record.fields.get(column) else {
                if dialect == Dialect::Legacy {
                    element = element.with(basis.clone(), Value::Null)?;
                }
                continue;
            };
            if dialect == Dialect::V2 && field.is_empty_bare() {
                continue;
            }
            let value = field_value(field, basis.value_type(), dialect)?;
            element = element.with(basis.clone(), value).map_err(at_field(field))?;
        }
        if !element.is_empty() {
            set.insert(element);
        }
    }
    debug!("Parsed {} columns into {} elements", bases.len(), set.len());
    Ok(set)
}

/// Renders a set in the v2 table form. Columns are the bases of all elements
/// in first-occurrence order; a basis an element lacks is left empty.
pub fn format(set: &ElementSet) -> String {
    let bases: Vec<Basis> = set.bases().into_iter().collect();
    let mut out = String::from(TABLE_KEYWORD);
    out.push('\n');
    let header = |slot: fn(&Basis) -> &str| -> String {
        bases.iter().map(slot).collect::<Vec<_>>().join(",")
    };
    out += &header(Basis::name);
    out.push('\n');
    out += &header(Basis::type_token);
    out.push('\n');
    out += &header(Basis::attribute);
    out.push('\n');
    out += &header(Basis::subject);
    out.push('\n');
    for element in set.iter().filter(|e| !e.is_empty()) {
        let row: Vec<String> = bases
            .iter()
            .map(|b| element.find(b).map(value_field).unwrap_or_default())
            .collect();
        out += &row.join(",");
        out.push('\n');
    }
    out
}
