//! Field sources: what an injection copies, and how
//!
//! A [`FieldSource`] is an ordered list of named fields plus the control
//! flags `statics`, `enumerable`, `beans` and `preserve`. Sources are built
//! with the builder methods or snapshotted from an existing object with
//! [`FieldSource::from_object`], in which case reserved names on the object
//! are read as flags.

use std::rc::Rc;

use crate::function::{Method, OverrideLink};
use crate::object::Slot;
use crate::realm::Realm;
use crate::value::{FunctionId, ObjectId, Value};

/// Names that are never copied as data
pub const RESERVED_NAMES: [&str; 5] = ["statics", "enumerable", "beans", "preserve", "prototype"];

/// Field name designating the constructor in `extend`
pub const INITIALIZE: &str = "initialize";

/// Field name designating an instance template override in `extend`
pub const PROTOTYPE: &str = "prototype";

/// Check whether `name` is a control name rather than data
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Value or accessor carried by a source entry
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Plain value (functions included)
    Value(Value),
    /// Getter/setter pair
    Accessor {
        /// Getter
        get: Option<Method>,
        /// Setter
        set: Option<Method>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) name: Rc<str>,
    pub(crate) field: Field,
    pub(crate) link: Option<Rc<OverrideLink>>,
}

/// Which part of a source goes to the class itself
#[derive(Debug, Clone, Default)]
pub enum Statics {
    /// Everything goes to the instance template
    #[default]
    None,
    /// The whole source is static
    All,
    /// Only this nested source is static
    Nested(Box<FieldSource>),
    /// Only the fields of this object are static; snapshotted when the
    /// source is injected
    Object(ObjectId),
}

/// Ordered fields plus injection flags
#[derive(Debug, Clone, Default)]
pub struct FieldSource {
    entries: Vec<Entry>,
    statics: Statics,
    enumerable: bool,
    beans: Option<bool>,
    preserve: bool,
    explicit_beans: Vec<Rc<str>>,
}

impl FieldSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value field.
    ///
    /// The control names `enumerable`, `beans` and `preserve` set the
    /// matching flag. `statics: true` marks the whole source static, an
    /// object value makes that object's fields static, anything else clears
    /// the static part.
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match name {
            "enumerable" => self.enumerable = value.is_truthy(),
            "preserve" => self.preserve = value.is_truthy(),
            "beans" => self.beans = value.as_bool(),
            "statics" => {
                self.statics = match value {
                    Value::Bool(true) => Statics::All,
                    Value::Object(obj) => Statics::Object(obj),
                    _ => Statics::None,
                }
            }
            _ => self.push(Rc::from(name), Field::Value(value), None),
        }
        self
    }

    /// Add an accessor field
    pub fn accessor(mut self, name: &str, get: Option<FunctionId>, set: Option<FunctionId>) -> Self {
        let field = Field::Accessor {
            get: get.map(Method::new),
            set: set.map(Method::new),
        };
        self.push(Rc::from(name), field, None);
        self
    }

    /// Designate the constructor used by `extend`
    pub fn initialize(self, function: FunctionId) -> Self {
        self.field(INITIALIZE, function)
    }

    /// Replace the instance template used by `extend`
    pub fn prototype(self, template: ObjectId) -> Self {
        self.field(PROTOTYPE, template)
    }

    /// Fields injected into the class itself instead of its template
    pub fn statics(mut self, statics: FieldSource) -> Self {
        self.statics = Statics::Nested(Box::new(statics));
        self
    }

    /// Mark the whole source as static
    pub fn all_static(mut self) -> Self {
        self.statics = Statics::All;
        self
    }

    /// Make injected fields enumerable
    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    /// Force (`true`) or disable (`false`) bean detection
    pub fn beans(mut self, beans: bool) -> Self {
        self.beans = Some(beans);
        self
    }

    /// Never overwrite fields the destination already resolves
    pub fn preserve(mut self, preserve: bool) -> Self {
        self.preserve = preserve;
        self
    }

    /// Register a bean accessor by its canonical name.
    ///
    /// Resolved like a detected candidate (`getName`/`isName`/`setName` on
    /// the destination), even when pattern detection is disabled.
    pub fn bean(mut self, name: &str) -> Self {
        let name: Rc<str> = Rc::from(name);
        if !self.explicit_beans.contains(&name) {
            self.explicit_beans.push(name);
        }
        self
    }

    pub(crate) fn push(&mut self, name: Rc<str>, field: Field, link: Option<Rc<OverrideLink>>) {
        self.entries.push(Entry { name, field, link });
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn explicit_beans(&self) -> &[Rc<str>] {
        &self.explicit_beans
    }

    /// First entry named `name`
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.entries
            .iter()
            .find(|entry| &*entry.name == name)
            .map(|entry| &entry.field)
    }

    /// Entry names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| &*entry.name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Static part of this source
    pub fn statics_mode(&self) -> &Statics {
        &self.statics
    }

    /// Enumerable flag
    pub fn is_enumerable(&self) -> bool {
        self.enumerable
    }

    /// Bean mode: unset, forced or disabled
    pub fn beans_mode(&self) -> Option<bool> {
        self.beans
    }

    /// Preserve flag
    pub fn is_preserve(&self) -> bool {
        self.preserve
    }

    /// Snapshot the own enumerable fields of `obj`.
    ///
    /// Accessors keep their shape, function fields keep their override
    /// links, and reserved names are read as flags. A `statics` object is
    /// snapshotted one level deep with [`fields_of`](Self::fields_of).
    /// Getters are not run.
    pub fn from_object(realm: &Realm, obj: ObjectId) -> Self {
        let mut source = FieldSource::new();
        let object = realm.object(obj);
        for name in object.keys() {
            let Some(prop) = object.property(name) else {
                continue;
            };
            if !prop.descriptor.enumerable {
                continue;
            }
            let flag = prop.descriptor.value().cloned().unwrap_or_default();
            match &**name {
                "enumerable" => source.enumerable = flag.is_truthy(),
                "preserve" => source.preserve = flag.is_truthy(),
                "beans" => source.beans = flag.as_bool(),
                "statics" => {
                    source.statics = match flag {
                        Value::Bool(true) => Statics::All,
                        Value::Object(id) if id == obj => Statics::All,
                        Value::Object(id) => {
                            Statics::Nested(Box::new(FieldSource::fields_of(realm, id)))
                        }
                        _ => Statics::None,
                    }
                }
                _ => source.push(name.clone(), field_of(&prop.descriptor.slot), prop.link.clone()),
            }
        }
        source
    }

    /// Snapshot the own enumerable fields of `obj`, dropping reserved names
    /// instead of reading them as flags
    pub fn fields_of(realm: &Realm, obj: ObjectId) -> Self {
        let mut source = FieldSource::new();
        let object = realm.object(obj);
        for name in object.keys() {
            if is_reserved(name) {
                continue;
            }
            match object.property(name) {
                Some(prop) if prop.descriptor.enumerable => {
                    source.push(name.clone(), field_of(&prop.descriptor.slot), prop.link.clone())
                }
                _ => {}
            }
        }
        source
    }
}

fn field_of(slot: &Slot) -> Field {
    match slot {
        Slot::Data { value, .. } => Field::Value(value.clone()),
        Slot::Accessor { get, set } => Field::Accessor {
            get: get.clone(),
            set: set.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_names_become_flags() {
        let source = FieldSource::new()
            .field("a", 1)
            .field("preserve", true)
            .field("enumerable", 1)
            .field("beans", false)
            .field("statics", true);

        assert_eq!(source.names().collect::<Vec<_>>(), vec!["a"]);
        assert!(source.is_preserve());
        assert!(source.is_enumerable());
        assert_eq!(source.beans_mode(), Some(false));
        assert!(matches!(source.statics_mode(), Statics::All));
    }

    #[test]
    fn test_prototype_is_kept_but_reserved() {
        let source = FieldSource::new().prototype(ObjectId(7));
        assert_eq!(source.get(PROTOTYPE), Some(&Field::Value(Value::Object(ObjectId(7)))));
        assert!(is_reserved(PROTOTYPE));
        assert!(!is_reserved(INITIALIZE));
    }

    #[test]
    fn test_explicit_beans_deduplicated() {
        let source = FieldSource::new().bean("width").bean("width").bean("height");
        assert_eq!(source.explicit_beans().len(), 2);
    }

    #[test]
    fn test_from_object_reads_flags_and_fields() {
        let mut realm = Realm::new();
        let statics = realm.record();
        realm.set(statics, "count", Value::from(3)).unwrap();
        let obj = realm.record();
        realm.set(obj, "x", Value::from(1)).unwrap();
        realm.set(obj, "preserve", Value::Bool(true)).unwrap();
        realm.set(obj, "statics", Value::Object(statics)).unwrap();

        let source = FieldSource::from_object(&realm, obj);
        assert_eq!(source.names().collect::<Vec<_>>(), vec!["x"]);
        assert!(source.is_preserve());
        match source.statics_mode() {
            Statics::Nested(nested) => {
                assert_eq!(nested.get("count"), Some(&Field::Value(Value::Number(3.0))))
            }
            other => panic!("expected nested statics, got {:?}", other),
        }
    }

    #[test]
    fn test_from_object_statics_cycle_stops_one_level_down() {
        let mut realm = Realm::new();
        let a = realm.record();
        let b = realm.record();
        realm.set(a, "x", 1).unwrap();
        realm.set(a, "statics", Value::Object(b)).unwrap();
        realm.set(b, "count", 2).unwrap();
        realm.set(b, "statics", Value::Object(a)).unwrap();

        let source = FieldSource::from_object(&realm, a);
        match source.statics_mode() {
            Statics::Nested(nested) => {
                assert_eq!(nested.names().collect::<Vec<_>>(), vec!["count"]);
                assert!(matches!(nested.statics_mode(), Statics::None));
            }
            other => panic!("expected nested statics, got {:?}", other),
        }
    }

    #[test]
    fn test_statics_field_values() {
        let statics = ObjectId(3);
        let object = FieldSource::new().field("statics", Value::Object(statics));
        assert!(matches!(object.statics_mode(), Statics::Object(id) if *id == statics));
        assert!(object.is_empty());

        let cleared = FieldSource::new().all_static().field("statics", Value::Bool(false));
        assert!(matches!(cleared.statics_mode(), Statics::None));
        assert!(cleared.get("statics").is_none());

        let null = FieldSource::new().field("statics", Value::Null);
        assert!(matches!(null.statics_mode(), Statics::None));
    }
}
