//! Small helpers shared by callers and the class machinery

use crate::error::StrapsResult;
use crate::realm::Realm;
use crate::value::{ObjectId, Value};

/// `a`, unless it is undefined. `Null` counts as a value.
pub fn pick(a: Value, b: Value) -> Value {
    if a.is_undefined() {
        b
    } else {
        a
    }
}

/// First value that is not undefined, `Null` if there is none
pub fn pick_first(values: impl IntoIterator<Item = Value>) -> Value {
    values
        .into_iter()
        .find(|value| !value.is_undefined())
        .unwrap_or(Value::Null)
}

impl Realm {
    /// Check whether `value` is an object whose class is `Object` or `Base`
    pub fn is_plain_object(&self, value: &Value) -> bool {
        self.class_of(value)
            .is_some_and(|class| class == self.object_class() || class == self.base_class())
    }

    /// Shallow copy of `obj` into a fresh instance of its class.
    ///
    /// The class constructor runs without arguments. Objects without a class
    /// get a fresh object with the same delegation parent.
    pub fn clone_object(&mut self, obj: ObjectId) -> StrapsResult<ObjectId> {
        let copy = match self.class_of(&Value::Object(obj)) {
            Some(class) => self.construct(class, Vec::new())?,
            None => {
                let proto = self.prototype_of(obj);
                self.create(proto)
            }
        };
        self.copy(copy, obj)
    }

    /// Assign the own enumerable fields of each source to `dest`, in order
    pub fn merge(&mut self, dest: ObjectId, sources: &[ObjectId]) -> StrapsResult<ObjectId> {
        for &source in sources {
            self.copy(dest, source)?;
        }
        Ok(dest)
    }

    /// Assign the own enumerable fields of `source` to `dest`. Getters on
    /// `source` and setters on `dest` run.
    pub fn copy(&mut self, dest: ObjectId, source: ObjectId) -> StrapsResult<ObjectId> {
        for name in self.own_enumerable_keys(source) {
            let value = self.get(source, &name)?;
            self.set(dest, &name, value)?;
        }
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick() {
        assert_eq!(pick(Value::Undefined, Value::from(2)), Value::Number(2.0));
        assert_eq!(pick(Value::Null, Value::from(2)), Value::Null);
        assert_eq!(
            pick_first(vec![Value::Undefined, Value::from("x"), Value::from(1)]),
            Value::from("x")
        );
        assert_eq!(pick_first(vec![Value::Undefined]), Value::Null);
    }

    #[test]
    fn test_merge_later_wins() {
        let mut realm = Realm::new();
        let a = realm.record();
        realm.set(a, "x", 1).unwrap();
        realm.set(a, "y", 1).unwrap();
        let b = realm.record();
        realm.set(b, "y", 2).unwrap();
        let dest = realm.record();

        assert_eq!(realm.merge(dest, &[a, b]).unwrap(), dest);
        assert_eq!(realm.get(dest, "x").unwrap(), Value::Number(1.0));
        assert_eq!(realm.get(dest, "y").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_plain_object() {
        let mut realm = Realm::new();
        let record = realm.record();
        let base = realm.base_class();
        let derived = realm.extend(base, &[]).unwrap();
        let instance = realm.construct(derived, Vec::new()).unwrap();
        let bare = realm.create(None);

        assert!(realm.is_plain_object(&Value::Object(record)));
        assert!(!realm.is_plain_object(&Value::Object(instance)));
        assert!(!realm.is_plain_object(&Value::Object(bare)));
        assert!(!realm.is_plain_object(&Value::from(1)));
    }

    #[test]
    fn test_clone_without_class_keeps_parent() {
        let mut realm = Realm::new();
        let parent = realm.create(None);
        let obj = realm.create(Some(parent));
        realm.set(obj, "a", 1).unwrap();

        let copy = realm.clone_object(obj).unwrap();
        assert_ne!(copy, obj);
        assert_eq!(realm.prototype_of(copy), Some(parent));
        assert_eq!(realm.get(copy, "a").unwrap(), Value::Number(1.0));
    }
}
