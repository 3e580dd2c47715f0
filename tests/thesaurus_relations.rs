use std::cmp::Ordering;

use dtalgebra::{DtalgebraError, Thesaurus};

fn animals() -> Thesaurus {
    let mut thesaurus = Thesaurus::new();
    thesaurus.put("animal", "mammal").unwrap();
    thesaurus.put("mammal", "dog").unwrap();
    thesaurus.put("mammal", "cat").unwrap();
    thesaurus.put("pet", "dog").unwrap();
    thesaurus
}

#[test]
fn cycles_are_rejected_before_mutation() {
    let mut thesaurus = animals();
    let err = thesaurus.put("dog", "mammal").unwrap_err();
    assert_eq!(
        err,
        DtalgebraError::Cycle {
            parent: String::from("dog"),
            child: String::from("mammal")
        }
    );
    assert!(matches!(thesaurus.put("dog", "animal"), Err(DtalgebraError::Cycle { .. })));
    assert_eq!(thesaurus.len(), 4);
    assert!(!thesaurus.contains_relation("dog", "mammal"));
}

#[test]
fn degenerate_relations_are_invalid() {
    let mut thesaurus = Thesaurus::new();
    assert!(matches!(thesaurus.put("dog", "dog"), Err(DtalgebraError::InvalidRelation(_))));
    assert!(matches!(thesaurus.put("", "dog"), Err(DtalgebraError::InvalidRelation(_))));
    assert!(thesaurus.is_empty());
    assert!(thesaurus.put("a", "b").unwrap());
    assert!(!thesaurus.put("a", "b").unwrap());
}

#[test]
fn relations_are_transitive() {
    let thesaurus = animals();
    assert!(thesaurus.has_relation("dog", "animal"));
    assert!(!thesaurus.has_relation("animal", "dog"));
    assert!(!thesaurus.has_relation("dog", "cat"));
    assert!(thesaurus.is_comparable("animal", "cat"));
    assert!(!thesaurus.is_comparable("dog", "dog"));
    assert_eq!(thesaurus.compare_to("dog", "mammal"), Ordering::Less);
    assert_eq!(thesaurus.compare_to("animal", "dog"), Ordering::Greater);
    assert_eq!(thesaurus.compare_to("dog", "cat"), Ordering::Equal);
    assert_eq!(thesaurus.compare_to("cat", "cat"), Ordering::Equal);
}

#[test]
fn classification_sets_need_known_incomparable_words() {
    let thesaurus = animals();
    assert!(thesaurus.is_classification_set(&["dog", "cat"]));
    assert!(!thesaurus.is_classification_set(&["dog", "mammal"]));
    assert!(!thesaurus.is_classification_set(&["dog", "fish"]));
    assert!(thesaurus.is_classification_set::<&str>(&[]));
}

#[test]
fn neighbourhood_queries() {
    let thesaurus = animals();
    assert_eq!(thesaurus.parents_of("dog"), vec!["mammal", "pet"]);
    assert_eq!(thesaurus.children_of("mammal"), vec!["dog", "cat"]);
    assert_eq!(thesaurus.ancestors_of("dog"), vec!["mammal", "pet", "animal"]);
    assert_eq!(thesaurus.descendants_of("animal"), vec!["mammal", "dog", "cat"]);
    assert_eq!(thesaurus.words(), vec!["animal", "mammal", "dog", "cat", "pet"]);
}

#[test]
fn removals_update_the_indexes() {
    let mut thesaurus = animals();
    assert!(thesaurus.remove_relation("pet", "dog"));
    assert!(!thesaurus.remove_relation("pet", "dog"));
    assert!(!thesaurus.contains_word("pet"));
    assert!(thesaurus.remove_word("mammal"));
    assert!(!thesaurus.has_relation("dog", "animal"));
    assert!(thesaurus.is_empty());
    // the reverse edge is allowed once the old path is gone
    thesaurus.put("animal", "mammal").unwrap();
    thesaurus.put("mammal", "animal").unwrap_err();
    thesaurus.remove_word("animal");
    assert!(thesaurus.put("mammal", "animal").unwrap());
}
