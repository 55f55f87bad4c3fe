//! Iteration over array-like and named collections

use std::fmt;
use std::rc::Rc;

use crate::error::StrapsResult;
use crate::object::Slot;
use crate::realm::Realm;
use crate::value::{ObjectId, Value};

/// Position of an element visited by [`Realm::each`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EachKey {
    /// Index into an array-like collection
    Index(usize),
    /// Own enumerable field name
    Name(Rc<str>),
}

impl fmt::Display for EachKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EachKey::Index(index) => write!(f, "{}", index),
            EachKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<EachKey> for Value {
    fn from(key: EachKey) -> Self {
        match key {
            EachKey::Index(index) => Value::Number(index as f64),
            EachKey::Name(name) => Value::Str(name),
        }
    }
}

/// Largest length an array-like may claim
const MAX_ARRAY_LENGTH: f64 = 4_294_967_295.0;

impl Realm {
    /// Visit every element of `obj`, bound to `obj` itself; returns `obj`
    pub fn each<F>(&mut self, obj: ObjectId, mut f: F) -> StrapsResult<ObjectId>
    where
        F: FnMut(&mut Realm, ObjectId, Value, EachKey) -> StrapsResult<()>,
    {
        self.each_with(obj, obj, |realm, bind, value, key| f(realm, *bind, value, key))
    }

    /// Visit every element of `obj` with an explicit binding; returns it.
    ///
    /// An own numeric data field `length` makes `obj` array-like: indices
    /// `0..length` are visited, with `length` read once up front. Otherwise
    /// own enumerable fields are visited in insertion order; a field removed
    /// or hidden by an earlier step is skipped. Values are read at the step
    /// that visits them.
    pub fn each_with<B, F>(&mut self, obj: ObjectId, mut bind: B, mut f: F) -> StrapsResult<B>
    where
        F: FnMut(&mut Realm, &mut B, Value, EachKey) -> StrapsResult<()>,
    {
        match self.array_length(obj) {
            Some(length) => {
                for index in 0..length {
                    let value = self.get(obj, &index.to_string())?;
                    f(self, &mut bind, value, EachKey::Index(index))?;
                }
            }
            None => {
                for name in self.own_enumerable_keys(obj) {
                    if !self.owns_enumerable(obj, &name) {
                        continue;
                    }
                    let value = self.get(obj, &name)?;
                    f(self, &mut bind, value, EachKey::Name(name))?;
                }
            }
        }
        Ok(bind)
    }

    /// Element count of an array-like object. A `length` accessor (a
    /// `getLength` bean, say) or a non-finite length does not count, and
    /// larger lengths are clamped to `2^32 - 1`.
    fn array_length(&self, obj: ObjectId) -> Option<usize> {
        match &self.object(obj).descriptor("length")?.slot {
            Slot::Data {
                value: Value::Number(n),
                ..
            } if n.is_finite() => Some(if *n > 0.0 {
                n.ceil().min(MAX_ARRAY_LENGTH) as usize
            } else {
                0
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::PropertyDescriptor;

    #[test]
    fn test_array_like_visits_indices() {
        let mut realm = Realm::new();
        let arr = realm.array(vec![Value::from(10), Value::from(20)]);

        let seen = realm
            .each_with(arr, Vec::new(), |_, seen, value, key| {
                seen.push((key, value));
                Ok(())
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                (EachKey::Index(0), Value::Number(10.0)),
                (EachKey::Index(1), Value::Number(20.0)),
            ]
        );
    }

    #[test]
    fn test_length_accessor_is_not_array_like() {
        let mut realm = Realm::new();
        let get = realm.define_function("getLength", 0, |_, _| Ok(Value::Number(5.0)));
        let obj = realm.record();
        realm.define(obj, "length", PropertyDescriptor::accessor(Some(get.into()), None).enumerable(false));
        realm.set(obj, "a", 1).unwrap();

        let keys = realm
            .each_with(obj, Vec::new(), |_, keys, _, key| {
                keys.push(key.to_string());
                Ok(())
            })
            .unwrap();
        assert_eq!(keys, vec!["a"]);
    }

    #[test]
    fn test_deleted_field_is_skipped() {
        let mut realm = Realm::new();
        let obj = realm.record();
        realm.set(obj, "a", 1).unwrap();
        realm.set(obj, "b", 2).unwrap();

        let mut visited = Vec::new();
        realm
            .each(obj, |realm, this, _, key| {
                visited.push(key.to_string());
                realm.delete(this, "b");
                Ok(())
            })
            .unwrap();
        assert_eq!(visited, vec!["a"]);
    }

    #[test]
    fn test_infinite_length_is_not_array_like() {
        let mut realm = Realm::new();
        let obj = realm.record();
        realm.define(obj, "length", PropertyDescriptor::data(f64::INFINITY).enumerable(false));
        realm.set(obj, "a", 1).unwrap();

        let keys = realm
            .each_with(obj, Vec::new(), |_, keys, _, key| {
                keys.push(key);
                Ok(())
            })
            .unwrap();
        assert_eq!(keys, vec![EachKey::Name("a".into())]);
    }

    #[test]
    fn test_huge_length_is_clamped() {
        let mut realm = Realm::new();
        let obj = realm.record();
        realm.define(obj, "length", PropertyDescriptor::data(1e300).enumerable(false));

        assert_eq!(realm.array_length(obj), Some(MAX_ARRAY_LENGTH as usize));
    }

    #[test]
    fn test_key_as_value() {
        assert_eq!(Value::from(EachKey::Index(2)), Value::Number(2.0));
        assert_eq!(Value::from(EachKey::Name("a".into())), Value::from("a"));
    }
}
