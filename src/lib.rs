//! Dtalgebra – a small typed data algebra with a versioned flat-file codec.
//!
//! Data is held as immutable *algebra elements*: maps from a four-part typed
//! key, the *basis*, to a value. A basis reads `name|type|attribute|subject`,
//! where:
//! * `name` and `type` are mandatory, the type being one of `boolean`,
//!   `decimal` or `string`.
//! * `attribute` and `subject` may be left out, in which case they hold the
//!   omitted sentinel `#`.
//!
//! Bases, patterns and the strings inside them are deduplicated by a
//! [`cache::KeyCache`] owned by the caller, so equal keys built through the same
//! cache share one allocation.
//!
//! ## Modules
//! * [`basis`] – Validated four-part keys.
//! * [`pattern`] – Wildcard patterns over bases, compiled per slot.
//! * [`datatype`] – Value types and typed values (`Decimal` compares numerically).
//! * [`element`] – Algebra elements and the [`element::BasisFilter`] seam used by projections.
//! * [`collection`] – Ordered sets of bases, patterns and elements with set algebra.
//! * [`thesaurus`] – A cycle-free word hierarchy with transitive queries.
//! * [`codec`] – CSV (standard and table forms, legacy and v2 dialects) and XML.
//! * [`settings`] – Converter settings read through `config`.
//!
//! ## Quick Start
//! ```
//! use dtalgebra::{AlgebraElement, Basis, BasisPattern, ElementSet, KeyCache, Value};
//! use dtalgebra::codec::Codec;
//!
//! let mut cache = KeyCache::new();
//! let weight = Basis::new(&mut cache, "weight", "decimal", None, None).unwrap();
//! let label = Basis::new(&mut cache, "label", "string", Some("en"), None).unwrap();
//! let element = AlgebraElement::new()
//!     .with(weight.clone(), Value::decimal("1.50").unwrap()).unwrap()
//!     .with(label, Value::string("crate")).unwrap();
//! let pattern = BasisPattern::name_only(&mut cache, "w*").unwrap();
//! assert_eq!(element.projection(&pattern).len(), 1);
//!
//! let set: ElementSet = [element].into_iter().collect();
//! let text = dtalgebra::codec::standard::format(&set);
//! let mut codec = Codec::new(&mut cache);
//! assert_eq!(codec.parse_csv(&text).unwrap(), set);
//! ```
//!
//! ## Formats
//! Writers always produce the v2 dialects. Readers accept both dialects and
//! detect the CSV form from the keyword on line 1; see [`codec`] for the
//! escape and null rules.

pub mod basis;
pub mod cache;
pub mod codec;
pub mod collection;
pub mod datatype;
pub mod element;
pub mod error;
pub mod pattern;
pub mod settings;
pub mod thesaurus;

pub use basis::Basis;
pub use cache::KeyCache;
pub use collection::{BasisSet, ElementSet, OrderedSet, PatternSet, SetCursor};
pub use datatype::{Decimal, Value, ValueType};
pub use element::{AlgebraElement, BasisFilter, Reassigned};
pub use error::{DtalgebraError, Result};
pub use pattern::BasisPattern;
pub use thesaurus::{Thesaurus, ThesaurusEntry};
