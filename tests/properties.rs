//! Property tests over generated keys, wildcard slots and element sets.

use proptest::prelude::*;

use dtalgebra::codec::{standard, Codec};
use dtalgebra::pattern::WildcardSlot;
use dtalgebra::{AlgebraElement, Basis, ElementSet, KeyCache, Value};

fn slot_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_.*#]{1,8}").expect("valid regex")
}

fn type_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["string", "STRING", "decimal", "Decimal", "boolean", "BOOLEAN"])
}

/// Plain recursive glob where `*` matches any run of characters.
fn glob(pattern: &[char], candidate: &[char]) -> bool {
    match pattern.split_first() {
        None => candidate.is_empty(),
        Some(('*', rest)) => (0..=candidate.len()).any(|skip| glob(rest, &candidate[skip..])),
        Some((c, rest)) => candidate.first() == Some(c) && glob(rest, &candidate[1..]),
    }
}

#[derive(Debug, Clone)]
struct Entry {
    column: usize,
    text: String,
    units: i32,
    fraction: u16,
    flag: bool,
    null: bool,
}

fn entry_strategy() -> impl Strategy<Value = Entry> {
    (
        0..4usize,
        prop::string::string_regex("(!#)?[a-zA-Z0-9 ,\"!#\n]{0,12}").expect("valid regex"),
        any::<i32>(),
        any::<u16>(),
        any::<bool>(),
        prop::bool::weighted(0.15),
    )
        .prop_map(|(column, text, units, fraction, flag, null)| Entry {
            column,
            text,
            units,
            fraction,
            flag,
            null,
        })
}

fn build_set(cache: &mut KeyCache, elements: &[Vec<Entry>]) -> ElementSet {
    let bases: Vec<Basis> = ["text|string", "note|string|en", "size|decimal|#|s", "flag|boolean"]
        .iter()
        .map(|key| Basis::parse(cache, key).unwrap())
        .collect();
    elements
        .iter()
        .map(|entries| {
            entries.iter().fold(AlgebraElement::new(), |element, entry| {
                let value = if entry.null {
                    Value::Null
                } else {
                    match entry.column {
                        0 | 1 => Value::string(entry.text.clone()),
                        2 => Value::decimal(&format!("{}.{}", entry.units, entry.fraction)).unwrap(),
                        _ => Value::Boolean(entry.flag),
                    }
                };
                element.with(bases[entry.column].clone(), value).unwrap()
            })
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn basis_components_survive_the_unique_key(
        name in slot_strategy(),
        value_type in type_strategy(),
        attribute in slot_strategy(),
        subject in slot_strategy(),
    ) {
        let mut cache = KeyCache::new();
        let basis = Basis::new(&mut cache, &name, value_type, Some(&attribute), Some(&subject)).unwrap();
        prop_assert_eq!(basis.name(), name.as_str());
        prop_assert_eq!(basis.type_token(), value_type.to_lowercase());
        prop_assert_eq!(basis.attribute(), attribute.as_str());
        prop_assert_eq!(basis.subject(), subject.as_str());

        let parsed = Basis::parse(&mut cache, &basis.unique_key()).unwrap();
        prop_assert!(parsed.ptr_eq(&basis));

        let mut other = KeyCache::new();
        let elsewhere = Basis::parse(&mut other, &basis.unique_key()).unwrap();
        prop_assert_eq!(&elsewhere, &basis);
        prop_assert!(!elsewhere.ptr_eq(&basis));
    }

    #[test]
    fn wildcard_slots_agree_with_a_plain_glob(
        raw in "[ab*]{0,6}",
        candidate in "[ab]{0,8}",
    ) {
        let pattern: Vec<char> = raw.chars().collect();
        let text: Vec<char> = candidate.chars().collect();
        prop_assert_eq!(
            WildcardSlot::compile(&raw).matches(&candidate),
            glob(&pattern, &text),
            "slot {:?} against {:?}", raw, candidate
        );
    }

    #[test]
    fn standard_form_reads_back_what_it_writes(
        elements in prop::collection::vec(prop::collection::vec(entry_strategy(), 1..5), 0..6),
    ) {
        let mut cache = KeyCache::new();
        let set = build_set(&mut cache, &elements);
        let text = standard::format(&set);
        let read = Codec::new(&mut cache).parse_csv(&text).unwrap();
        prop_assert_eq!(read, set, "{}", text);
    }
}
