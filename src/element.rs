//! Algebra elements: ordered, duplicate-free maps from basis to value.
//!
//! Elements are values. Every transform returns a new element and leaves the
//! receiver alone. Putting a basis that is already present overwrites its value
//! but keeps its position, which is what keeps table columns stable when
//! elements are summed or written back out.

use std::hash::{Hash, Hasher};
use std::fmt;

use indexmap::IndexMap;
use seahash::SeaHasher;

use crate::basis::Basis;
use crate::cache::KeyHasher;
use crate::collection::BasisSet;
use crate::datatype::Value;
use crate::error::{DtalgebraError, Result};
use crate::pattern::BasisPattern;
use crate::thesaurus::Thesaurus;

/// Anything that can decide whether a basis takes part in a projection.
pub trait BasisFilter {
    fn accepts(&self, basis: &Basis) -> bool;
}
impl BasisFilter for Basis {
    fn accepts(&self, basis: &Basis) -> bool {
        self == basis
    }
}
impl BasisFilter for BasisPattern {
    fn accepts(&self, basis: &Basis) -> bool {
        self.matches(basis)
    }
}

/// Outcome of reassigning a value through a thesaurus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reassigned {
    /// The value already was one of the target words.
    Unchanged(AlgebraElement),
    /// The value descended from exactly one target word and was replaced by it.
    Replaced(AlgebraElement),
    /// No single target word covers the value.
    NotConvertible,
}
impl Reassigned {
    pub fn element(self) -> Option<AlgebraElement> {
        match self {
            Reassigned::Unchanged(e) | Reassigned::Replaced(e) => Some(e),
            Reassigned::NotConvertible => None,
        }
    }
}

// ------------- AlgebraElement -------------
#[derive(Clone, Debug, Default)]
pub struct AlgebraElement {
    entries: IndexMap<Basis, Value, KeyHasher>,
}

impl AlgebraElement {
    pub fn new() -> Self {
        Self::default()
    }
    /// Consuming put, handy when building an element up from scratch.
    pub fn with(mut self, basis: Basis, value: Value) -> Result<Self> {
        if !value.fits(basis.value_type()) {
            return Err(DtalgebraError::TypeMismatch {
                basis: basis.to_string(),
                expected: basis.value_type(),
                found: value.value_type().unwrap_or(basis.value_type()),
            });
        }
        self.entries.insert(basis, value);
        Ok(self)
    }
    pub fn put(&self, basis: Basis, value: Value) -> Result<Self> {
        self.clone().with(basis, value)
    }
    pub fn remove(&self, basis: &Basis) -> Self {
        let mut entries = self.entries.clone();
        entries.shift_remove(basis);
        Self { entries }
    }
    /// The value at `basis`, failing when the basis is absent.
    pub fn value(&self, basis: &Basis) -> Result<&Value> {
        self.entries
            .get(basis)
            .ok_or_else(|| DtalgebraError::NotFound(basis.to_string()))
    }
    pub fn find(&self, basis: &Basis) -> Option<&Value> {
        self.entries.get(basis)
    }
    pub fn contains(&self, basis: &Basis) -> bool {
        self.entries.contains_key(basis)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&Basis, &Value)> {
        self.entries.iter()
    }
    pub fn bases(&self) -> BasisSet {
        self.entries.keys().cloned().collect()
    }

    fn filtered<P: Fn(&Basis, &Value) -> bool>(&self, keep: P) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|&(b, v)| keep(b, v))
                .map(|(b, v)| (b.clone(), v.clone()))
                .collect(),
        }
    }
    /// Keeps the entries whose basis passes the filter, in their current order.
    pub fn projection<F: BasisFilter + ?Sized>(&self, filter: &F) -> Self {
        self.filtered(|b, _| filter.accepts(b))
    }
    pub fn value_projection(&self, value: &Value) -> Self {
        self.filtered(|_, v| v == value)
    }
    pub fn null_projection(&self) -> Self {
        self.filtered(|_, v| v.is_null())
    }
    pub fn non_null_projection(&self) -> Self {
        self.filtered(|_, v| !v.is_null())
    }
    pub fn normalize(&self) -> Self {
        self.non_null_projection()
    }
    /// Folds left to right; a later value for a basis replaces an earlier one
    /// while the basis keeps the position of its first occurrence.
    pub fn sum<'a, I: IntoIterator<Item = &'a AlgebraElement>>(elements: I) -> Self {
        let mut entries: IndexMap<Basis, Value, KeyHasher> = IndexMap::default();
        for element in elements {
            for (basis, value) in &element.entries {
                entries.insert(basis.clone(), value.clone());
            }
        }
        Self { entries }
    }
    pub fn sum_with(&self, other: &AlgebraElement) -> Self {
        Self::sum([self, other])
    }
    /// Moves the string value at `basis` up the thesaurus onto one of `targets`.
    ///
    /// `targets` must be a classification set of `thesaurus`.
    pub fn reassign_via_thesaurus<S: AsRef<str>>(
        &self,
        basis: &Basis,
        thesaurus: &Thesaurus,
        targets: &[S],
    ) -> Result<Reassigned> {
        if !thesaurus.is_classification_set(targets) {
            let words: Vec<&str> = targets.iter().map(|t| t.as_ref()).collect();
            return Err(DtalgebraError::NotClassificationSet(words.join(", ")));
        }
        let current = match self.find(basis).and_then(Value::as_str) {
            Some(word) => word,
            None => return Ok(Reassigned::NotConvertible),
        };
        if targets.iter().any(|t| t.as_ref() == current) {
            return Ok(Reassigned::Unchanged(self.clone()));
        }
        let mut covering = targets
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| thesaurus.has_relation(current, t));
        match (covering.next(), covering.next()) {
            (Some(target), None) => {
                let replaced = self.put(basis.clone(), Value::string(target))?;
                Ok(Reassigned::Replaced(replaced))
            }
            _ => Ok(Reassigned::NotConvertible),
        }
    }
}

impl PartialEq for AlgebraElement {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(basis, value)| other.entries.get(basis) == Some(value))
    }
}
impl Eq for AlgebraElement {}
impl Hash for AlgebraElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // order independent, so equal elements hash alike whatever their order
        let mut combined = 0u64;
        for (basis, value) in &self.entries {
            let mut basis_hasher = SeaHasher::new();
            basis.hash(&mut basis_hasher);
            let mut value_hasher = SeaHasher::new();
            value.hash(&mut value_hasher);
            combined ^= basis_hasher.finish() ^ value_hasher.finish();
        }
        state.write_u64(combined);
    }
}
impl fmt::Display for AlgebraElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for (basis, value) in &self.entries {
            s += &format!("{}={},", basis, value);
        }
        s.pop();
        write!(f, "{{{}}}", s)
    }
}
