use std::cmp::Ordering;

use dtalgebra::basis::{ATTRIBUTE, NAME, OMITTED, SUBJECT, TYPE};
use dtalgebra::{Basis, DtalgebraError, KeyCache, ValueType};

#[test]
fn components_round_trip() {
    let mut cache = KeyCache::new();
    let basis = Basis::new(&mut cache, "weight", "decimal", Some("kg"), Some("box")).unwrap();
    assert_eq!(basis.name(), "weight");
    assert_eq!(basis.value_type(), ValueType::Decimal);
    assert_eq!(basis.attribute(), "kg");
    assert_eq!(basis.subject(), "box");
    assert_eq!(basis.unique_key(), "weight|decimal|kg|box");
    assert_eq!(basis.to_string(), "weight|decimal|kg|box");
    let parsed = Basis::parse(&mut cache, &basis.unique_key()).unwrap();
    assert!(parsed.ptr_eq(&basis));
}

#[test]
fn omitted_slots_default_to_sentinel() {
    let mut cache = KeyCache::new();
    let basis = Basis::new(&mut cache, "label", "string", None, Some("")).unwrap();
    assert_eq!(basis.attribute(), OMITTED);
    assert_eq!(basis.subject(), OMITTED);
    assert!(basis.is_omitted_attribute());
    assert!(basis.is_omitted_subject());
    assert_eq!(basis.unique_key(), "label|string|#|#");
    let short = Basis::parse(&mut cache, "label|string").unwrap();
    assert!(short.ptr_eq(&basis));
}

#[test]
fn type_token_is_case_folded() {
    let mut cache = KeyCache::new();
    let upper = Basis::new(&mut cache, "flag", "BOOLEAN", None, None).unwrap();
    let lower = Basis::new(&mut cache, "flag", "boolean", None, None).unwrap();
    assert_eq!(upper.type_token(), "boolean");
    assert!(upper.ptr_eq(&lower));
}

#[test]
fn equal_tuples_share_one_instance() {
    let mut cache = KeyCache::new();
    let a = Basis::new(&mut cache, "weight", "decimal", None, None).unwrap();
    let b = Basis::new(&mut cache, "weight", "decimal", Some("#"), Some("#")).unwrap();
    assert!(a.ptr_eq(&b));
    assert_eq!(cache.bases(), 1);
    let (kept, previously) = cache.keep_basis(b.clone());
    assert!(previously);
    assert!(kept.ptr_eq(&a));
}

#[test]
fn separate_caches_are_independent() {
    let mut first = KeyCache::new();
    let mut second = KeyCache::new();
    let a = Basis::new(&mut first, "weight", "decimal", None, None).unwrap();
    let b = Basis::new(&mut second, "weight", "decimal", None, None).unwrap();
    assert!(!a.ptr_eq(&b));
    assert_eq!(a, b);
}

#[test]
fn interned_strings_are_shared() {
    let mut cache = KeyCache::new();
    let (first, previously) = cache.keep_str("weight");
    assert!(!previously);
    let (second, previously) = cache.keep_str("weight");
    assert!(previously);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn forbidden_characters_name_their_slot() {
    let mut cache = KeyCache::new();
    let cases = [
        (("we ight", "decimal", "#", "#"), NAME, ' '),
        (("weight", "decimal", "k,g", "#"), ATTRIBUTE, ','),
        (("weight", "decimal", "#", "b@x"), SUBJECT, '@'),
        (("weight", "dec-imal", "#", "#"), TYPE, '-'),
    ];
    for ((name, value_type, attribute, subject), slot, ch) in cases {
        let err = Basis::new(&mut cache, name, value_type, Some(attribute), Some(subject)).unwrap_err();
        assert_eq!(err, DtalgebraError::InvalidKey { slot, ch });
    }
    assert_eq!(cache.bases(), 0);
}

#[test]
fn mandatory_slots_and_unknown_types() {
    let mut cache = KeyCache::new();
    assert_eq!(
        Basis::new(&mut cache, "", "string", None, None).unwrap_err(),
        DtalgebraError::MissingSlot { slot: NAME }
    );
    assert_eq!(
        Basis::new(&mut cache, "label", "", None, None).unwrap_err(),
        DtalgebraError::MissingSlot { slot: TYPE }
    );
    assert_eq!(
        Basis::new(&mut cache, "label", "integer", None, None).unwrap_err(),
        DtalgebraError::UnknownType(String::from("integer"))
    );
}

#[test]
fn ordering_is_slot_by_slot() {
    let mut cache = KeyCache::new();
    let a = Basis::parse(&mut cache, "alpha|string|z|#").unwrap();
    let b = Basis::parse(&mut cache, "beta|string|a|#").unwrap();
    let c = Basis::parse(&mut cache, "alpha|string|a|#").unwrap();
    let mut sorted = vec![a.clone(), b.clone(), c.clone()];
    sorted.sort();
    assert_eq!(sorted, vec![c, a, b]);

    let upper = Basis::parse(&mut cache, "Beta|string|#|#").unwrap();
    let lower = Basis::parse(&mut cache, "alpha|string|#|#").unwrap();
    assert_eq!(upper.cmp(&lower), Ordering::Less);
    assert_eq!(upper.cmp_ignore_case(&lower), Ordering::Greater);
}
