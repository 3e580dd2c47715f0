//! A word hierarchy with multiple parents per word and no cycles.
//!
//! Relations are kept in insertion order, with two indexes (child → parents
//! and parent → children) used by the transitive queries. A relation that
//! would close a cycle is rejected before the graph is touched.

use std::cmp::Ordering;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::warn;

use crate::cache::KeyHasher;
use crate::error::{DtalgebraError, Result};

type WordSet = IndexSet<String, KeyHasher>;

// ------------- ThesaurusEntry -------------
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThesaurusEntry {
    parent: String,
    child: String,
}
impl ThesaurusEntry {
    pub fn new(parent: &str, child: &str) -> Result<Self> {
        if parent.is_empty() || child.is_empty() {
            return Err(DtalgebraError::InvalidRelation(format!(
                "empty word in relation '{}' -> '{}'",
                parent, child
            )));
        }
        if parent == child {
            return Err(DtalgebraError::InvalidRelation(format!(
                "'{}' cannot be its own parent",
                parent
            )));
        }
        Ok(Self {
            parent: parent.to_owned(),
            child: child.to_owned(),
        })
    }
    pub fn parent(&self) -> &str {
        &self.parent
    }
    pub fn child(&self) -> &str {
        &self.child
    }
}
impl fmt::Display for ThesaurusEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.parent, self.child)
    }
}

// ------------- Thesaurus -------------
#[derive(Clone, Debug, Default)]
pub struct Thesaurus {
    entries: IndexSet<ThesaurusEntry, KeyHasher>,
    parents: IndexMap<String, WordSet, KeyHasher>,
    children: IndexMap<String, WordSet, KeyHasher>,
}

impl Thesaurus {
    pub fn new() -> Self {
        Self::default()
    }
    /// Adds `parent -> child`. Returns `false` if the relation was already known.
    pub fn put(&mut self, parent: &str, child: &str) -> Result<bool> {
        let entry = ThesaurusEntry::new(parent, child)?;
        if self.entries.contains(&entry) {
            return Ok(false);
        }
        if self.has_relation(parent, child) {
            warn!("Rejected relation {} that would create a cycle", entry);
            return Err(DtalgebraError::Cycle {
                parent: parent.to_owned(),
                child: child.to_owned(),
            });
        }
        self.parents
            .entry(child.to_owned())
            .or_default()
            .insert(parent.to_owned());
        self.children
            .entry(parent.to_owned())
            .or_default()
            .insert(child.to_owned());
        self.entries.insert(entry);
        Ok(true)
    }
    /// Removes every relation that touches `word`.
    pub fn remove_word(&mut self, word: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| e.parent != word && e.child != word);
        if before == self.entries.len() {
            return false;
        }
        self.reindex();
        true
    }
    /// Removes the single relation `parent -> child`.
    pub fn remove_relation(&mut self, parent: &str, child: &str) -> bool {
        let position = self
            .entries
            .iter()
            .position(|e| e.parent == parent && e.child == child);
        match position {
            Some(index) => {
                self.entries.shift_remove_index(index);
                self.reindex();
                true
            }
            None => false,
        }
    }
    fn reindex(&mut self) {
        self.parents.clear();
        self.children.clear();
        for entry in &self.entries {
            self.parents
                .entry(entry.child.clone())
                .or_default()
                .insert(entry.parent.clone());
            self.children
                .entry(entry.parent.clone())
                .or_default()
                .insert(entry.child.clone());
        }
    }
    /// True iff `ancestor` is reachable from `descendant` by following parent edges.
    pub fn has_relation(&self, descendant: &str, ancestor: &str) -> bool {
        let mut visited = WordSet::default();
        let mut pending = vec![descendant];
        while let Some(word) = pending.pop() {
            if let Some(parents) = self.parents.get(word) {
                for parent in parents {
                    if parent == ancestor {
                        return true;
                    }
                    if visited.insert(parent.clone()) {
                        pending.push(parent);
                    }
                }
            }
        }
        false
    }
    pub fn is_comparable(&self, a: &str, b: &str) -> bool {
        a != b && (self.has_relation(a, b) || self.has_relation(b, a))
    }
    /// `Less` when `a` descends from `b`, `Greater` when `b` descends from `a`,
    /// and `Equal` both for equal words and for incomparable ones.
    pub fn compare_to(&self, a: &str, b: &str) -> Ordering {
        if a == b {
            Ordering::Equal
        } else if self.has_relation(a, b) {
            Ordering::Less
        } else if self.has_relation(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
    /// True iff every word is known and no two of them are comparable.
    pub fn is_classification_set<S: AsRef<str>>(&self, words: &[S]) -> bool {
        if !words.iter().all(|w| self.contains_word(w.as_ref())) {
            return false;
        }
        for (i, a) in words.iter().enumerate() {
            for b in &words[i + 1..] {
                if self.is_comparable(a.as_ref(), b.as_ref()) {
                    return false;
                }
            }
        }
        true
    }
    pub fn contains_word(&self, word: &str) -> bool {
        self.parents.contains_key(word) || self.children.contains_key(word)
    }
    pub fn contains_relation(&self, parent: &str, child: &str) -> bool {
        self.parents
            .get(child)
            .is_some_and(|parents| parents.contains(parent))
    }
    pub fn parents_of(&self, word: &str) -> Vec<&str> {
        self.parents
            .get(word)
            .map(|p| p.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
    pub fn children_of(&self, word: &str) -> Vec<&str> {
        self.children
            .get(word)
            .map(|c| c.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
    pub fn ancestors_of(&self, word: &str) -> Vec<&str> {
        Self::closure(&self.parents, word)
    }
    pub fn descendants_of(&self, word: &str) -> Vec<&str> {
        Self::closure(&self.children, word)
    }
    // breadth first, each word once
    fn closure<'a>(edges: &'a IndexMap<String, WordSet, KeyHasher>, word: &str) -> Vec<&'a str> {
        let mut found: IndexSet<&'a str, KeyHasher> = IndexSet::default();
        let mut next = 0;
        if let Some(first) = edges.get(word) {
            found.extend(first.iter().map(String::as_str));
        }
        while next < found.len() {
            let current = found[next];
            if let Some(more) = edges.get(current) {
                found.extend(more.iter().map(String::as_str));
            }
            next += 1;
        }
        found.into_iter().collect()
    }
    /// Every word taking part in at least one relation, in first-seen order.
    pub fn words(&self) -> Vec<&str> {
        let mut words: IndexSet<&str, KeyHasher> = IndexSet::default();
        for entry in &self.entries {
            words.insert(&entry.parent);
            words.insert(&entry.child);
        }
        words.into_iter().collect()
    }
    pub fn entries(&self) -> impl Iterator<Item = &ThesaurusEntry> {
        self.entries.iter()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
