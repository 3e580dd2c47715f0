use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use dtalgebra::{
    AlgebraElement, Basis, BasisPattern, BasisSet, DtalgebraError, KeyCache, PatternSet, Reassigned,
    Thesaurus, Value,
};

fn hash_of<T: Hash>(item: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    item.hash(&mut hasher);
    hasher.finish()
}

fn dec(text: &str) -> Value {
    Value::decimal(text).unwrap()
}

struct Fixture {
    cache: KeyCache,
    b1: Basis,
    b2: Basis,
    label: Basis,
}

fn fixture() -> Fixture {
    let mut cache = KeyCache::new();
    let b1 = Basis::parse(&mut cache, "b1|decimal|#|#").unwrap();
    let b2 = Basis::parse(&mut cache, "b2|decimal|#|#").unwrap();
    let label = Basis::parse(&mut cache, "label|string|en|#").unwrap();
    Fixture { cache, b1, b2, label }
}

#[test]
fn decimals_compare_numerically() {
    let f = fixture();
    let a = AlgebraElement::new().put(f.b1.clone(), dec("1.50")).unwrap();
    let b = AlgebraElement::new().put(f.b1.clone(), dec("1.5")).unwrap();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_eq!(a.value(&f.b1).unwrap(), &dec("1.500"));
}

#[test]
fn put_rejects_mismatched_types() {
    let f = fixture();
    let err = AlgebraElement::new().put(f.b1.clone(), Value::string("heavy")).unwrap_err();
    assert!(matches!(err, DtalgebraError::TypeMismatch { .. }));
    // null fits any basis
    let element = AlgebraElement::new().put(f.b1.clone(), Value::Null).unwrap();
    assert_eq!(element.find(&f.b1), Some(&Value::Null));
}

#[test]
fn put_is_pure_and_overwrites_in_place() {
    let f = fixture();
    let first = AlgebraElement::new()
        .with(f.b1.clone(), dec("1")).unwrap()
        .with(f.b2.clone(), dec("2")).unwrap();
    let second = first.put(f.b1.clone(), dec("9")).unwrap();
    assert_eq!(first.value(&f.b1).unwrap(), &dec("1"));
    let order: Vec<&Basis> = second.iter().map(|(b, _)| b).collect();
    assert_eq!(order, vec![&f.b1, &f.b2]);
    assert_eq!(second.value(&f.b1).unwrap(), &dec("9"));
}

#[test]
fn value_and_find_differ_on_absent_bases() {
    let f = fixture();
    let element = AlgebraElement::new().with(f.b1.clone(), dec("1")).unwrap();
    assert_eq!(element.find(&f.b2), None);
    assert_eq!(
        element.value(&f.b2).unwrap_err(),
        DtalgebraError::NotFound(String::from("b2|decimal|#|#"))
    );
}

#[test]
fn sum_is_last_writer_wins_in_first_occurrence_order() {
    let f = fixture();
    let first = AlgebraElement::new()
        .with(f.b1.clone(), dec("1")).unwrap()
        .with(f.b2.clone(), dec("2")).unwrap();
    let second = AlgebraElement::new().with(f.b1.clone(), dec("3")).unwrap();
    let sum = AlgebraElement::sum([&first, &second]);
    let expected = AlgebraElement::new()
        .with(f.b1.clone(), dec("3")).unwrap()
        .with(f.b2.clone(), dec("2")).unwrap();
    assert_eq!(sum, expected);
    let order: Vec<&str> = sum.iter().map(|(b, _)| b.name()).collect();
    assert_eq!(order, vec!["b1", "b2"]);
    assert_eq!(first.sum_with(&second), sum);
}

#[test]
fn projections_keep_relative_order() {
    let mut f = fixture();
    let element = AlgebraElement::new()
        .with(f.label.clone(), Value::string("box")).unwrap()
        .with(f.b1.clone(), dec("1")).unwrap()
        .with(f.b2.clone(), Value::Null).unwrap();

    let by_basis = element.projection(&f.b1);
    assert_eq!(by_basis.len(), 1);

    let set: BasisSet = [f.b2.clone(), f.label.clone()].into_iter().collect();
    let projected = element.projection(&set);
    let names: Vec<&str> = projected.iter().map(|(b, _)| b.name()).collect();
    assert_eq!(names, vec!["label", "b2"]);

    let pattern = BasisPattern::parse(&mut f.cache, "b*|decimal").unwrap();
    assert_eq!(element.projection(&pattern).len(), 2);

    let mut patterns = PatternSet::new();
    patterns.insert(BasisPattern::name_only(&mut f.cache, "nothing").unwrap());
    assert!(element.projection(&patterns).is_empty());

    assert_eq!(element.value_projection(&dec("1.0")).len(), 1);
    assert_eq!(element.null_projection().len(), 1);
    assert_eq!(element.non_null_projection().len(), 2);
    assert_eq!(element.normalize(), element.remove(&f.b2));
}

#[test]
fn equality_ignores_entry_order() {
    let f = fixture();
    let a = AlgebraElement::new()
        .with(f.b1.clone(), dec("1")).unwrap()
        .with(f.b2.clone(), dec("2")).unwrap();
    let b = AlgebraElement::new()
        .with(f.b2.clone(), dec("2")).unwrap()
        .with(f.b1.clone(), dec("1")).unwrap();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(a, a.remove(&f.b2));
}

fn animals() -> Thesaurus {
    let mut thesaurus = Thesaurus::new();
    thesaurus.put("animal", "mammal").unwrap();
    thesaurus.put("animal", "bird").unwrap();
    thesaurus.put("mammal", "dog").unwrap();
    thesaurus.put("mammal", "cat").unwrap();
    thesaurus.put("bird", "crow").unwrap();
    thesaurus
}

#[test]
fn reassign_moves_values_up_to_a_target() {
    let mut f = fixture();
    let kind = Basis::parse(&mut f.cache, "kind|string|#|#").unwrap();
    let thesaurus = animals();
    let targets = ["mammal", "bird"];

    let dog = AlgebraElement::new().with(kind.clone(), Value::string("dog")).unwrap();
    match dog.reassign_via_thesaurus(&kind, &thesaurus, &targets).unwrap() {
        Reassigned::Replaced(e) => assert_eq!(e.value(&kind).unwrap(), &Value::string("mammal")),
        other => panic!("expected a replacement, got {:?}", other),
    }

    let bird = AlgebraElement::new().with(kind.clone(), Value::string("bird")).unwrap();
    assert_eq!(
        bird.reassign_via_thesaurus(&kind, &thesaurus, &targets).unwrap(),
        Reassigned::Unchanged(bird.clone())
    );

    let animal = AlgebraElement::new().with(kind.clone(), Value::string("animal")).unwrap();
    assert_eq!(
        animal.reassign_via_thesaurus(&kind, &thesaurus, &targets).unwrap(),
        Reassigned::NotConvertible
    );
}

#[test]
fn reassign_requires_a_classification_set() {
    let mut f = fixture();
    let kind = Basis::parse(&mut f.cache, "kind|string|#|#").unwrap();
    let dog = AlgebraElement::new().with(kind.clone(), Value::string("dog")).unwrap();
    let err = dog
        .reassign_via_thesaurus(&kind, &animals(), &["mammal", "dog"])
        .unwrap_err();
    assert!(matches!(err, DtalgebraError::NotClassificationSet(_)));
}
