//! Object model: property descriptors and ordered property storage
//!
//! An [`Object`] is an ordered map from names to properties plus an optional
//! delegation parent. Lookups that miss on the object continue on the
//! parent; nothing is ever copied from it.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::function::{Method, OverrideLink};
use crate::value::{ObjectId, Value};

/// Storage shape of a property
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Plain value
    Data {
        /// Stored value
        value: Value,
        /// Whether assignment may replace the value
        writable: bool,
    },
    /// Getter/setter pair
    Accessor {
        /// Called on read
        get: Option<Method>,
        /// Called on assignment
        set: Option<Method>,
    },
}

/// Shape and flags of a property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Value or accessor pair
    pub slot: Slot,
    /// Visible to enumeration and copying
    pub enumerable: bool,
    /// May be deleted or have its flags changed
    pub configurable: bool,
}

impl PropertyDescriptor {
    /// Writable, enumerable, configurable data property (what assignment creates)
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            slot: Slot::Data {
                value: value.into(),
                writable: true,
            },
            enumerable: true,
            configurable: true,
        }
    }

    /// Enumerable, configurable accessor property
    pub fn accessor(get: Option<Method>, set: Option<Method>) -> Self {
        Self {
            slot: Slot::Accessor { get, set },
            enumerable: true,
            configurable: true,
        }
    }

    /// Set the enumerable flag
    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    /// Set the configurable flag
    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }

    /// Make a data property read-only (no effect on accessors)
    pub fn read_only(mut self) -> Self {
        if let Slot::Data { writable, .. } = &mut self.slot {
            *writable = false;
        }
        self
    }

    /// Stored value of a data property
    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Data { value, .. } => Some(value),
            Slot::Accessor { .. } => None,
        }
    }

    /// Check for a getter/setter pair
    pub fn is_accessor(&self) -> bool {
        matches!(self.slot, Slot::Accessor { .. })
    }
}

/// A stored property: its descriptor plus the override link of the field
#[derive(Debug, Clone)]
pub(crate) struct Property {
    pub(crate) descriptor: PropertyDescriptor,
    pub(crate) link: Option<Rc<OverrideLink>>,
}

/// Object instance (arena allocated)
#[derive(Debug, Default)]
pub struct Object {
    proto: Option<ObjectId>,
    entries: Vec<(Rc<str>, Property)>,
    index: FxHashMap<Rc<str>, usize>,
}

impl Object {
    /// Create an empty object delegating to `proto`
    pub fn new(proto: Option<ObjectId>) -> Self {
        Self {
            proto,
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Delegation parent
    pub fn proto(&self) -> Option<ObjectId> {
        self.proto
    }

    /// Number of own properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for no own properties
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check for an own property
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Own property names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &Rc<str>> {
        self.entries.iter().map(|(name, _)| name)
    }

    /// Own descriptor by name
    pub fn descriptor(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.property(name).map(|prop| &prop.descriptor)
    }

    pub(crate) fn property(&self, name: &str) -> Option<&Property> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    pub(crate) fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        match self.index.get(name) {
            Some(&pos) => Some(&mut self.entries[pos].1),
            None => None,
        }
    }

    /// Append a new property, or replace an existing one in place
    pub(crate) fn insert(&mut self, name: Rc<str>, property: Property) {
        match self.index.get(&name) {
            Some(&pos) => self.entries[pos].1 = property,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, property));
            }
        }
    }

    /// Remove a property regardless of its flags
    pub(crate) fn remove(&mut self, name: &str) -> Option<Property> {
        let pos = self.index.remove(name)?;
        let (_, property) = self.entries.remove(pos);
        for (_, slot) in self.index.iter_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(value: i32) -> Property {
        Property {
            descriptor: PropertyDescriptor::data(value),
            link: None,
        }
    }

    #[test]
    fn test_insertion_order() {
        let mut obj = Object::new(None);
        obj.insert("b".into(), prop(1));
        obj.insert("a".into(), prop(2));
        obj.insert("c".into(), prop(3));

        let keys: Vec<&str> = obj.keys().map(|k| &**k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut obj = Object::new(None);
        obj.insert("a".into(), prop(1));
        obj.insert("b".into(), prop(2));
        obj.insert("a".into(), prop(3));

        let keys: Vec<&str> = obj.keys().map(|k| &**k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(obj.descriptor("a").unwrap().value(), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut obj = Object::new(None);
        obj.insert("a".into(), prop(1));
        obj.insert("b".into(), prop(2));
        obj.insert("c".into(), prop(3));

        assert!(obj.remove("a").is_some());
        assert!(obj.remove("a").is_none());
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.descriptor("c").unwrap().value(), Some(&Value::Number(3.0)));

        obj.insert("a".into(), prop(4));
        let keys: Vec<&str> = obj.keys().map(|k| &**k).collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_descriptor_builders() {
        let desc = PropertyDescriptor::data(1).enumerable(false).read_only();
        assert!(!desc.enumerable);
        assert!(desc.configurable);
        assert_eq!(
            desc.slot,
            Slot::Data {
                value: Value::Number(1.0),
                writable: false
            }
        );
        assert!(PropertyDescriptor::accessor(None, None).is_accessor());
    }
}
