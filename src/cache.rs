use std::sync::Arc;

// keepers use HashSets with a fast, deterministic hasher
use core::hash::BuildHasherDefault;
use std::collections::HashSet;
use seahash::SeaHasher;

use crate::basis::Basis;
use crate::pattern::BasisPattern;

pub type KeyHasher = BuildHasherDefault<SeaHasher>;

/// Interning pool for key strings, bases and patterns.
///
/// The first instance kept for a given value becomes the canonical one and is
/// handed out for every later equal value, so identity implies equality for
/// anything built through the same cache. Nothing is ever evicted; dropping
/// the cache (and every handle) releases everything at once.
#[derive(Debug, Default)]
pub struct KeyCache {
    strings: HashSet<Arc<str>, KeyHasher>,
    bases: HashSet<Basis, KeyHasher>,
    patterns: HashSet<BasisPattern, KeyHasher>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self {
            strings: HashSet::default(),
            bases: HashSet::default(),
            patterns: HashSet::default(),
        }
    }
    pub fn keep_str(&mut self, s: &str) -> (Arc<str>, bool) {
        match self.strings.get(s) {
            Some(kept) => (Arc::clone(kept), true),
            None => {
                let keepsake: Arc<str> = Arc::from(s);
                self.strings.insert(Arc::clone(&keepsake));
                (keepsake, false)
            }
        }
    }
    pub fn keep_basis(&mut self, basis: Basis) -> (Basis, bool) {
        match self.bases.get(&basis) {
            Some(kept) => (kept.clone(), true),
            None => {
                self.bases.insert(basis.clone());
                (basis, false)
            }
        }
    }
    pub fn keep_pattern(&mut self, pattern: BasisPattern) -> (BasisPattern, bool) {
        match self.patterns.get(&pattern) {
            Some(kept) => (kept.clone(), true),
            None => {
                self.patterns.insert(pattern.clone());
                (pattern, false)
            }
        }
    }
    pub fn intern_str(&mut self, s: &str) -> Arc<str> {
        self.keep_str(s).0
    }
    pub fn intern_basis(&mut self, basis: Basis) -> Basis {
        self.keep_basis(basis).0
    }
    pub fn intern_pattern(&mut self, pattern: BasisPattern) -> BasisPattern {
        self.keep_pattern(pattern).0
    }
    pub fn strings(&self) -> usize {
        self.strings.len()
    }
    pub fn bases(&self) -> usize {
        self.bases.len()
    }
    pub fn patterns(&self) -> usize {
        self.patterns.len()
    }
}
