//! Ordered, duplicate-free collections of bases, patterns and elements.
//!
//! All three share [`OrderedSet`]: insertion ordered, keyed by value equality,
//! with non-destructive set algebra. Structural mutators bump a generation
//! counter so a detached [`SetCursor`] can tell when the set changed under it.

use std::hash::Hash;
use std::fmt;
use std::cmp::Ordering;

use indexmap::IndexSet;
use tracing::debug;

use crate::basis::Basis;
use crate::cache::KeyHasher;
use crate::datatype::Value;
use crate::element::{AlgebraElement, BasisFilter, Reassigned};
use crate::error::{DtalgebraError, Result};
use crate::pattern::BasisPattern;
use crate::thesaurus::Thesaurus;

/// Something an [`OrderedSet`] can hold.
pub trait SetMember: Hash + Eq + Clone {
    /// Vacant members are dropped from the results of set algebra.
    fn is_vacant(&self) -> bool {
        false
    }
}
impl SetMember for Basis {}
impl SetMember for BasisPattern {}
impl SetMember for AlgebraElement {
    fn is_vacant(&self) -> bool {
        self.is_empty()
    }
}

pub type BasisSet = OrderedSet<Basis>;
pub type PatternSet = OrderedSet<BasisPattern>;
pub type ElementSet = OrderedSet<AlgebraElement>;

// ------------- OrderedSet -------------
#[derive(Clone, Debug)]
pub struct OrderedSet<T: SetMember> {
    items: IndexSet<T, KeyHasher>,
    generation: u64,
}

impl<T: SetMember> OrderedSet<T> {
    pub fn new() -> Self {
        Self {
            items: IndexSet::default(),
            generation: 0,
        }
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get_index(index)
    }
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }
    pub fn iter(&self) -> indexmap::set::Iter<'_, T> {
        self.items.iter()
    }
    pub fn generation(&self) -> u64 {
        self.generation
    }
    /// Starts a cursor that fails once the set is structurally changed.
    pub fn cursor(&self) -> SetCursor {
        SetCursor {
            position: 0,
            generation: self.generation,
        }
    }

    // in-place mutators
    pub fn insert(&mut self, item: T) -> bool {
        let inserted = self.items.insert(item);
        if inserted {
            self.generation += 1;
        }
        inserted
    }
    pub fn remove(&mut self, item: &T) -> bool {
        let removed = self.items.shift_remove(item);
        if removed {
            self.generation += 1;
        }
        removed
    }
    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.generation += 1;
        }
    }
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, keep: F) {
        let before = self.items.len();
        self.items.retain(keep);
        if before != self.items.len() {
            self.generation += 1;
        }
    }

    // set algebra, all returning new sets
    fn without_vacant(mut self) -> Self {
        self.items.retain(|item| !item.is_vacant());
        self
    }
    pub fn union(&self, other: &Self) -> Self {
        self.iter().chain(other.iter()).cloned().collect::<Self>().without_vacant()
    }
    pub fn intersection(&self, other: &Self) -> Self {
        self.iter()
            .filter(|item| other.contains(item))
            .cloned()
            .collect::<Self>()
            .without_vacant()
    }
    pub fn difference(&self, other: &Self) -> Self {
        self.iter()
            .filter(|item| !other.contains(item))
            .cloned()
            .collect::<Self>()
            .without_vacant()
    }
}

impl<T: SetMember> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T: SetMember> PartialEq for OrderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}
impl<T: SetMember> Eq for OrderedSet<T> {}
impl<T: SetMember> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            generation: 0,
        }
    }
}
impl<T: SetMember> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}
impl<'a, T: SetMember> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = indexmap::set::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
impl<T: SetMember> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = indexmap::set::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
impl<T: SetMember + fmt::Display> fmt::Display for OrderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for item in &self.items {
            s += &(item.to_string() + ", ");
        }
        s.truncate(s.len().saturating_sub(2));
        write!(f, "[{}]", s)
    }
}

// ------------- SetCursor -------------
/// A position in an [`OrderedSet`] that does not borrow it.
///
/// Stepping after the set was structurally changed yields
/// [`DtalgebraError::IteratorInvalidated`]. This is a diagnostic aid, not a
/// synchronization mechanism.
#[derive(Clone, Copy, Debug)]
pub struct SetCursor {
    position: usize,
    generation: u64,
}
impl SetCursor {
    pub fn next<'s, T: SetMember>(&mut self, set: &'s OrderedSet<T>) -> Result<Option<&'s T>> {
        if set.generation != self.generation {
            return Err(DtalgebraError::IteratorInvalidated {
                expected: self.generation,
                found: set.generation,
            });
        }
        let item = set.items.get_index(self.position);
        if item.is_some() {
            self.position += 1;
        }
        Ok(item)
    }
    pub fn position(&self) -> usize {
        self.position
    }
}

// ------------- Filters over sets -------------
impl BasisFilter for BasisSet {
    fn accepts(&self, basis: &Basis) -> bool {
        self.contains(basis)
    }
}
impl BasisFilter for PatternSet {
    fn accepts(&self, basis: &Basis) -> bool {
        self.iter().any(|pattern| pattern.matches(basis))
    }
}

impl OrderedSet<Basis> {
    /// The bases accepted by a pattern or pattern set, in set order.
    pub fn get_matched_bases<F: BasisFilter + ?Sized>(&self, filter: &F) -> BasisSet {
        self.iter().filter(|b| filter.accepts(b)).cloned().collect()
    }
}

// ------------- ElementSet -------------
impl OrderedSet<AlgebraElement> {
    /// Every basis used by any element, in first-occurrence order.
    pub fn bases(&self) -> BasisSet {
        self.iter()
            .flat_map(|e| e.iter().map(|(b, _)| b.clone()))
            .collect()
    }
    /// The bases used by any element that the filter accepts, without duplicates.
    pub fn get_matched_bases<F: BasisFilter + ?Sized>(&self, filter: &F) -> BasisSet {
        self.iter()
            .flat_map(|e| e.iter().map(|(b, _)| b))
            .filter(|b| filter.accepts(b))
            .cloned()
            .collect()
    }
    pub fn projection<F: BasisFilter + ?Sized>(&self, filter: &F) -> Self {
        self.iter()
            .map(|e| e.projection(filter))
            .collect::<Self>()
            .without_vacant()
    }
    pub fn normalize(&self) -> Self {
        self.iter().map(AlgebraElement::normalize).collect::<Self>().without_vacant()
    }
    /// All elements folded into one, later elements winning.
    pub fn sum(&self) -> AlgebraElement {
        AlgebraElement::sum(self.iter())
    }
    pub fn min(&self, basis: &Basis) -> Option<Value> {
        self.extreme(basis, Ordering::Less)
    }
    pub fn max(&self, basis: &Basis) -> Option<Value> {
        self.extreme(basis, Ordering::Greater)
    }
    // seeds from the first non-null value; any failed comparison aborts the query
    fn extreme(&self, basis: &Basis, wanted: Ordering) -> Option<Value> {
        let mut best: Option<&Value> = None;
        for value in self.iter().filter_map(|e| e.find(basis)) {
            if value.is_null() {
                continue;
            }
            best = match best {
                None => Some(value),
                Some(current) => match value.try_cmp(current) {
                    Ok(ordering) if ordering == wanted => Some(value),
                    Ok(_) => Some(current),
                    Err(e) => {
                        debug!("Aborting extreme search at {}: {}", basis, e);
                        return None;
                    }
                },
            };
        }
        best.cloned()
    }
    /// The elements whose string value at `basis` sits in the top (`want_max`)
    /// or bottom class of the thesaurus order among the values present.
    ///
    /// The top class holds the known words with no ancestor among the other
    /// values, the bottom class those with no descendant among them.
    pub fn select_thesaurus_extremes(
        &self,
        basis: &Basis,
        thesaurus: &Thesaurus,
        want_max: bool,
    ) -> Self {
        let mut words: IndexSet<&str, KeyHasher> = IndexSet::default();
        for element in self.iter() {
            if let Some(word) = element.find(basis).and_then(Value::as_str) {
                if thesaurus.contains_word(word) {
                    words.insert(word);
                }
            }
        }
        let class: IndexSet<&str, KeyHasher> = words
            .iter()
            .copied()
            .filter(|word| {
                !words.iter().any(|other| {
                    if want_max {
                        thesaurus.has_relation(word, other)
                    } else {
                        thesaurus.has_relation(other, word)
                    }
                })
            })
            .collect();
        self.iter()
            .filter(|e| {
                e.find(basis)
                    .and_then(Value::as_str)
                    .is_some_and(|word| class.contains(word))
            })
            .cloned()
            .collect()
    }
    /// Reassigns every element through the thesaurus. Returns the resulting set,
    /// where unconvertible elements are kept as they were, and the set of those
    /// unconvertible elements.
    pub fn reassign_via_thesaurus<S: AsRef<str>>(
        &self,
        basis: &Basis,
        thesaurus: &Thesaurus,
        targets: &[S],
    ) -> Result<(Self, Self)> {
        let mut reassigned = Self::new();
        let mut unconvertible = Self::new();
        for element in self.iter() {
            match element.reassign_via_thesaurus(basis, thesaurus, targets)? {
                Reassigned::Unchanged(e) | Reassigned::Replaced(e) => {
                    reassigned.insert(e);
                }
                Reassigned::NotConvertible => {
                    reassigned.insert(element.clone());
                    unconvertible.insert(element.clone());
                }
            }
        }
        Ok((reassigned, unconvertible))
    }
}
