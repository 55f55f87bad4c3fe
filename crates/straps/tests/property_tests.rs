//! Property-based tests for injection and the utility statics

use std::collections::BTreeMap;

use proptest::prelude::*;
use straps::{pick_first, EachKey, FieldSource, Realm, Value};

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]"
}

fn fields_strategy() -> impl Strategy<Value = BTreeMap<String, i32>> {
    prop::collection::btree_map(key_strategy(), any::<i32>(), 0..5)
}

// =============================================================================
// Injection Properties
// =============================================================================

#[cfg(test)]
mod injection_tests {
    use super::*;

    proptest! {
        /// Property: every re-injection of a method lengthens its link by one
        #[test]
        fn reinjection_depth_counts_repeats(times in 1usize..8) {
            let mut realm = Realm::new();
            let method = realm.define_function("run", 0, |_, _| Ok(Value::Undefined));
            let obj = realm.record();
            let source = FieldSource::new().field("run", method);
            for _ in 0..times {
                realm.inject(obj, &[source.clone()]).unwrap();
            }

            let depth = realm.override_link(obj, "run").map_or(0, |link| link.depth());
            prop_assert_eq!(depth, times - 1);
        }

        /// Property: preserving injection never changes fields already present
        #[test]
        fn preserve_never_overwrites(existing in fields_strategy(), incoming in fields_strategy()) {
            let mut realm = Realm::new();
            let obj = realm.record();
            for (name, value) in &existing {
                realm.set(obj, name, *value).unwrap();
            }
            let mut source = FieldSource::new().preserve(true);
            for (name, value) in &incoming {
                source = source.field(name, *value);
            }
            realm.inject(obj, &[source]).unwrap();

            for (name, value) in &incoming {
                let expected = existing.get(name).unwrap_or(value);
                prop_assert_eq!(realm.get(obj, name).unwrap(), Value::from(*expected));
            }
        }
    }
}

// =============================================================================
// Utility Properties
// =============================================================================

#[cfg(test)]
mod utility_tests {
    use super::*;

    proptest! {
        /// Property: merge lets later sources win, key by key
        #[test]
        fn merge_later_source_wins(first in fields_strategy(), second in fields_strategy()) {
            let mut realm = Realm::new();
            let a = realm.record();
            for (name, value) in &first {
                realm.set(a, name, *value).unwrap();
            }
            let b = realm.record();
            for (name, value) in &second {
                realm.set(b, name, *value).unwrap();
            }
            let dest = realm.record();
            realm.merge(dest, &[a, b]).unwrap();

            let mut expected = first.clone();
            expected.extend(second.iter().map(|(k, v)| (k.clone(), *v)));
            prop_assert_eq!(realm.own_keys(dest).len(), expected.len());
            for (name, value) in &expected {
                prop_assert_eq!(realm.get(dest, name).unwrap(), Value::from(*value));
            }
        }

        /// Property: array-likes are visited once per index, in order
        #[test]
        fn each_visits_indices_in_order(values in prop::collection::vec(any::<i32>(), 0..10)) {
            let mut realm = Realm::new();
            let arr = realm.array(values.iter().map(|v| Value::from(*v)));

            let seen = realm
                .each_with(arr, Vec::new(), |_, seen, value, key| {
                    seen.push((key, value));
                    Ok(())
                })
                .unwrap();
            let expected: Vec<_> = values
                .iter()
                .enumerate()
                .map(|(i, v)| (EachKey::Index(i), Value::from(*v)))
                .collect();
            prop_assert_eq!(seen, expected);
        }

        /// Property: pick_first skips exactly the undefined prefix
        #[test]
        fn pick_first_skips_undefined(values in prop::collection::vec(prop::option::of(any::<i32>()), 0..6)) {
            let picked = pick_first(values.iter().map(|v| v.map(Value::from).unwrap_or_default()));
            let expected = values
                .iter()
                .flatten()
                .next()
                .map(|v| Value::from(*v))
                .unwrap_or(Value::Null);
            prop_assert_eq!(picked, expected);
        }
    }
}
