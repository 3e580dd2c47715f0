use std::sync::Arc;

// custom made ordering for key tuples
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

// used to print out readable forms of a key
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::cache::KeyCache;
use crate::datatype::ValueType;
use crate::error::{DtalgebraError, Result};

/// Placeholder for an attribute or subject slot that was not specified.
pub const OMITTED: &str = "#";
/// Separates the four slots in the unique key of a basis or pattern.
pub const DELIMITER: char = '|';

pub const NAME: usize = 0;
pub const TYPE: usize = 1;
pub const ATTRIBUTE: usize = 2;
pub const SUBJECT: usize = 3;

lazy_static! {
    static ref FORBIDDEN: Regex = Regex::new(r#"[ \t\r\n<>\-,^"%&?|@']"#).unwrap();
}

/// Fails with the first forbidden character found in a slot.
pub(crate) fn validate_slot(slot: usize, component: &str) -> Result<()> {
    match FORBIDDEN.find(component) {
        Some(m) => Err(DtalgebraError::InvalidKey {
            slot,
            ch: m.as_str().chars().next().unwrap_or(' '),
        }),
        None => Ok(()),
    }
}

// ------------- KeyTuple -------------
// The four raw slots shared by bases and patterns. Comparison and formatting
// live here so both wrappers behave identically.
#[derive(PartialEq, Eq, Hash, Debug)]
pub(crate) struct KeyTuple {
    slots: [Arc<str>; 4],
}
impl KeyTuple {
    pub(crate) fn new(slots: [Arc<str>; 4]) -> Self {
        Self { slots }
    }
    pub(crate) fn slot(&self, index: usize) -> &str {
        &self.slots[index]
    }
    pub(crate) fn unique_key(&self) -> String {
        let mut key = String::new();
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                key.push(DELIMITER);
            }
            key.push_str(slot);
        }
        key
    }
    pub(crate) fn cmp_slots(&self, other: &Self) -> Ordering {
        self.slots.iter().cmp(other.slots.iter())
    }
    pub(crate) fn cmp_slots_ignore_case(&self, other: &Self) -> Ordering {
        for (a, b) in self.slots.iter().zip(other.slots.iter()) {
            let ordering = a
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
impl fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.unique_key())
    }
}

/// Splits a unique key into at most four slots.
pub(crate) fn split_key(key: &str) -> Vec<&str> {
    key.splitn(4, DELIMITER).collect()
}

// ------------- Basis -------------
/// The 4-part typed key (name, type, attribute, subject) identifying a data slot.
///
/// Bases are only created through a [`KeyCache`], so two value-equal bases
/// built from the same cache share one allocation.
#[derive(Clone, Debug)]
pub struct Basis {
    key: Arc<KeyTuple>,
    value_type: ValueType,
}

impl Basis {
    /// Builds (or fetches) the canonical basis for the given slots. Empty
    /// attribute or subject fall back to the omitted sentinel.
    pub fn new(
        cache: &mut KeyCache,
        name: &str,
        value_type: &str,
        attribute: Option<&str>,
        subject: Option<&str>,
    ) -> Result<Basis> {
        if name.is_empty() {
            return Err(DtalgebraError::MissingSlot { slot: NAME });
        }
        if value_type.is_empty() {
            return Err(DtalgebraError::MissingSlot { slot: TYPE });
        }
        let attribute = attribute.filter(|a| !a.is_empty()).unwrap_or(OMITTED);
        let subject = subject.filter(|s| !s.is_empty()).unwrap_or(OMITTED);
        for (slot, component) in [name, value_type, attribute, subject].into_iter().enumerate() {
            validate_slot(slot, component)?;
        }
        let parsed_type = ValueType::from_token(value_type)
            .ok_or_else(|| DtalgebraError::UnknownType(value_type.to_owned()))?;
        let slots = [
            cache.intern_str(name),
            cache.intern_str(parsed_type.token()),
            cache.intern_str(attribute),
            cache.intern_str(subject),
        ];
        let basis = Basis {
            key: Arc::new(KeyTuple::new(slots)),
            value_type: parsed_type,
        };
        Ok(cache.intern_basis(basis))
    }
    /// Builds a basis from its delimited unique key, e.g. `weight|decimal|#|#`.
    pub fn parse(cache: &mut KeyCache, key: &str) -> Result<Basis> {
        let parts = split_key(key);
        Basis::new(
            cache,
            parts.first().copied().unwrap_or(""),
            parts.get(TYPE).copied().unwrap_or(""),
            parts.get(ATTRIBUTE).copied(),
            parts.get(SUBJECT).copied(),
        )
    }
    pub fn name(&self) -> &str {
        self.key.slot(NAME)
    }
    pub fn type_token(&self) -> &str {
        self.key.slot(TYPE)
    }
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
    pub fn attribute(&self) -> &str {
        self.key.slot(ATTRIBUTE)
    }
    pub fn subject(&self) -> &str {
        self.key.slot(SUBJECT)
    }
    pub fn is_omitted_attribute(&self) -> bool {
        self.attribute() == OMITTED
    }
    pub fn is_omitted_subject(&self) -> bool {
        self.subject() == OMITTED
    }
    pub fn slot(&self, index: usize) -> &str {
        self.key.slot(index)
    }
    pub fn unique_key(&self) -> String {
        self.key.unique_key()
    }
    /// True when both handles point at the same canonical instance.
    pub fn ptr_eq(&self, other: &Basis) -> bool {
        Arc::ptr_eq(&self.key, &other.key)
    }
    pub fn cmp_ignore_case(&self, other: &Basis) -> Ordering {
        self.key.cmp_slots_ignore_case(&other.key)
    }
    pub(crate) fn key(&self) -> &KeyTuple {
        &self.key
    }
}
impl PartialEq for Basis {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.key == other.key
    }
}
impl Eq for Basis {}
impl Hash for Basis {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
impl Ord for Basis {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp_slots(&other.key)
    }
}
impl PartialOrd for Basis {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}
