//! Wildcard patterns over bases.
//!
//! Every slot of a [`BasisPattern`] is compiled once, when the pattern is
//! built, into one of three shapes:
//! * a literal, compared by plain string equality,
//! * a mixed slot (`abc*xyz`, `*mid*`), decomposed into an optional prefix,
//!   an optional suffix and the ordered infix fragments found between markers,
//! * a match-anything slot (`*`), which is dropped from the compiled form.
//!
//! Compiled slots are evaluated literal first, then mixed, each group by slot
//! index, so the cheap equality checks reject most candidates early.

use std::sync::Arc;

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::fmt;

use crate::basis::{self, Basis, KeyTuple, NAME, SUBJECT, TYPE};
use crate::cache::KeyCache;
use crate::datatype::ValueType;
use crate::error::{DtalgebraError, Result};

/// Matches zero or more characters inside a pattern slot.
pub const WILDCARD: char = '*';
pub const WILDCARD_STR: &str = "*";

// ------------- WildcardSlot -------------
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixedSlot {
    prefix: Option<String>,
    suffix: Option<String>,
    infixes: Vec<String>,
}
impl MixedSlot {
    fn decompose(raw: &str) -> Self {
        let parts: Vec<&str> = raw.split(WILDCARD).collect();
        let last = parts.len() - 1;
        let non_empty = |s: &str| if s.is_empty() { None } else { Some(s.to_owned()) };
        Self {
            prefix: non_empty(parts[0]),
            suffix: non_empty(parts[last]),
            infixes: parts[1..last]
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| p.to_string())
                .collect(),
        }
    }
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
    pub fn infixes(&self) -> &[String] {
        &self.infixes
    }
    pub fn matches(&self, candidate: &str) -> bool {
        let mut start = 0;
        let mut end = candidate.len();
        if let Some(prefix) = &self.prefix {
            if !candidate.starts_with(prefix.as_str()) {
                return false;
            }
            start = prefix.len();
        }
        if let Some(suffix) = &self.suffix {
            // the suffix may not overlap the prefix
            if end - start < suffix.len() || !candidate.ends_with(suffix.as_str()) {
                return false;
            }
            end -= suffix.len();
        }
        let middle = &candidate[start..end];
        let mut cursor = 0;
        for infix in &self.infixes {
            match middle[cursor..].find(infix.as_str()) {
                Some(found) => cursor += found + infix.len(),
                None => return false,
            }
        }
        true
    }
}

/// One compiled slot of a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WildcardSlot {
    Literal(String),
    Mixed(MixedSlot),
    Any,
}
impl WildcardSlot {
    pub fn compile(raw: &str) -> Self {
        if !raw.contains(WILDCARD) {
            WildcardSlot::Literal(raw.to_owned())
        } else if raw.chars().all(|c| c == WILDCARD) {
            WildcardSlot::Any
        } else {
            WildcardSlot::Mixed(MixedSlot::decompose(raw))
        }
    }
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            WildcardSlot::Literal(literal) => literal == candidate,
            WildcardSlot::Mixed(mixed) => mixed.matches(candidate),
            WildcardSlot::Any => true,
        }
    }
    pub fn is_any(&self) -> bool {
        matches!(self, WildcardSlot::Any)
    }
    fn rank(&self) -> u8 {
        match self {
            WildcardSlot::Literal(_) => 0,
            WildcardSlot::Mixed(_) => 1,
            WildcardSlot::Any => 2,
        }
    }
}

// ------------- BasisPattern -------------
#[derive(Debug)]
struct CompiledPattern {
    key: KeyTuple,
    // (slot index, matcher) in evaluation order, match-anything slots left out
    matchers: Vec<(usize, WildcardSlot)>,
}

/// A basis-shaped key whose slots may contain the wildcard marker.
///
/// Equality, hashing and ordering only look at the four raw slot strings.
#[derive(Clone, Debug)]
pub struct BasisPattern {
    inner: Arc<CompiledPattern>,
}

impl BasisPattern {
    /// Builds (or fetches) the canonical pattern. Unspecified or empty slots match anything.
    pub fn new(
        cache: &mut KeyCache,
        name: &str,
        value_type: Option<&str>,
        attribute: Option<&str>,
        subject: Option<&str>,
    ) -> Result<BasisPattern> {
        let raw = [Some(name), value_type, attribute, subject]
            .map(|s| s.filter(|s| !s.is_empty()).unwrap_or(WILDCARD_STR));
        for (slot, component) in raw.iter().enumerate() {
            basis::validate_slot(slot, component)?;
        }
        let type_slot = if raw[TYPE].contains(WILDCARD) {
            raw[TYPE].to_ascii_lowercase()
        } else {
            ValueType::from_token(raw[TYPE])
                .ok_or_else(|| DtalgebraError::UnknownType(raw[TYPE].to_owned()))?
                .token()
                .to_owned()
        };
        let slots = [
            cache.intern_str(raw[NAME]),
            cache.intern_str(&type_slot),
            cache.intern_str(raw[basis::ATTRIBUTE]),
            cache.intern_str(raw[SUBJECT]),
        ];
        let mut matchers: Vec<(usize, WildcardSlot)> = slots
            .iter()
            .enumerate()
            .map(|(i, s)| (i, WildcardSlot::compile(s)))
            .filter(|(_, m)| !m.is_any())
            .collect();
        matchers.sort_by_key(|(i, m)| (m.rank(), *i));
        let pattern = BasisPattern {
            inner: Arc::new(CompiledPattern {
                key: KeyTuple::new(slots),
                matchers,
            }),
        };
        Ok(cache.intern_pattern(pattern))
    }
    /// A pattern constraining only the name slot.
    pub fn name_only(cache: &mut KeyCache, name: &str) -> Result<BasisPattern> {
        BasisPattern::new(cache, name, None, None, None)
    }
    /// A pattern from a delimited key; missing trailing slots match anything.
    pub fn parse(cache: &mut KeyCache, key: &str) -> Result<BasisPattern> {
        let parts = basis::split_key(key);
        BasisPattern::new(
            cache,
            parts.first().copied().unwrap_or(""),
            parts.get(TYPE).copied(),
            parts.get(basis::ATTRIBUTE).copied(),
            parts.get(SUBJECT).copied(),
        )
    }
    /// The pattern matching exactly the given basis (as long as it holds no marker).
    pub fn from_basis(cache: &mut KeyCache, basis: &Basis) -> Result<BasisPattern> {
        BasisPattern::new(
            cache,
            basis.name(),
            Some(basis.type_token()),
            Some(basis.attribute()),
            Some(basis.subject()),
        )
    }
    pub fn slot(&self, index: usize) -> &str {
        self.inner.key.slot(index)
    }
    pub fn name(&self) -> &str {
        self.slot(NAME)
    }
    pub fn unique_key(&self) -> String {
        self.inner.key.unique_key()
    }
    /// True when every slot is the match-anything marker.
    pub fn is_match_all(&self) -> bool {
        self.inner.matchers.is_empty()
    }
    pub fn ptr_eq(&self, other: &BasisPattern) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
    pub fn cmp_ignore_case(&self, other: &BasisPattern) -> Ordering {
        self.inner.key.cmp_slots_ignore_case(&other.inner.key)
    }
    pub fn matches(&self, basis: &Basis) -> bool {
        self.matches_key(basis.key())
    }
    fn matches_key(&self, key: &KeyTuple) -> bool {
        self.inner
            .matchers
            .iter()
            .all(|(index, matcher)| matcher.matches(key.slot(*index)))
    }
}
impl PartialEq for BasisPattern {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.key == other.inner.key
    }
}
impl Eq for BasisPattern {}
impl Hash for BasisPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.key.hash(state);
    }
}
impl Ord for BasisPattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.key.cmp_slots(&other.inner.key)
    }
}
impl PartialOrd for BasisPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl fmt::Display for BasisPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.inner.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_slot_decomposition() {
        match WildcardSlot::compile("ab*c**d*ef") {
            WildcardSlot::Mixed(m) => {
                assert_eq!(m.prefix(), Some("ab"));
                assert_eq!(m.suffix(), Some("ef"));
                assert_eq!(m.infixes(), &["c".to_string(), "d".to_string()]);
            }
            other => panic!("expected mixed slot, got {:?}", other),
        }
        match WildcardSlot::compile("*mid*") {
            WildcardSlot::Mixed(m) => {
                assert_eq!(m.prefix(), None);
                assert_eq!(m.suffix(), None);
                assert_eq!(m.infixes(), &["mid".to_string()]);
            }
            other => panic!("expected mixed slot, got {:?}", other),
        }
        assert_eq!(WildcardSlot::compile("**"), WildcardSlot::Any);
        assert_eq!(WildcardSlot::compile("plain"), WildcardSlot::Literal("plain".into()));
    }

    #[test]
    fn suffix_does_not_reuse_prefix() {
        let slot = WildcardSlot::compile("ab*ba");
        assert!(!slot.matches("aba"));
        assert!(slot.matches("abba"));
        assert!(slot.matches("ab--ba"));
    }

    #[test]
    fn infixes_are_found_in_order() {
        let slot = WildcardSlot::compile("*a*b*");
        assert!(slot.matches("xaxbx"));
        assert!(slot.matches("ab"));
        assert!(!slot.matches("ba"));
        let slot = WildcardSlot::compile("s*aa*aa*e");
        assert!(slot.matches("saaaae"));
        assert!(!slot.matches("saaae"));
    }

    #[test]
    fn compiled_order_puts_literals_first() {
        let mut cache = KeyCache::new();
        let pattern = BasisPattern::new(&mut cache, "w*t", Some("decimal"), None, Some("s")).unwrap();
        let order: Vec<usize> = pattern.inner.matchers.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![TYPE, SUBJECT, NAME]);
    }
}
