//! Field injection
//!
//! Injection copies the fields of a [`FieldSource`] into a destination
//! object. Along the way it:
//!
//! - resolves alias strings (`"#name"`) against the destination,
//! - links function fields to the functions they replace,
//! - skips fields the destination already resolves when preserving,
//! - collects `getX`/`setX`/`isX` methods and, once all fields are in,
//!   defines `x` accessors for the pairs that qualify.
//!
//! Injection never fails on its own. Errors only come from getters it has
//! to run while reading the destination.

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{StrapsError, StrapsResult};
use crate::function::{Method, OverrideLink};
use crate::object::{PropertyDescriptor, Slot};
use crate::realm::{Realm, Resolved};
use crate::source::{is_reserved, Field, FieldSource};
use crate::value::{ObjectId, Value};

/// `getWidth` -> part `Width`, first `W`, rest `idth`
static BEAN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:get|set|is)(([A-Z])(.*))$").expect("bean pattern is valid"));

/// Flags of one injection pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InjectMode {
    /// Enumerable flag of newly written fields
    pub enumerable: bool,
    /// `None`: detect beans, synthesize those with a setter or a zero-arity
    /// getter. `Some(true)`: any getter qualifies. `Some(false)`: no
    /// pattern detection.
    pub beans: Option<bool>,
    /// Skip fields the destination already resolves
    pub preserve: bool,
}

impl InjectMode {
    /// Non-enumerable, default beans, no preserve
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags carried by `source`
    pub fn from_source(source: &FieldSource) -> Self {
        Self {
            enumerable: source.is_enumerable(),
            beans: source.beans_mode(),
            preserve: source.is_preserve(),
        }
    }

    /// Static fields are always enumerable so derivation can copy them
    pub fn statics(beans: Option<bool>, preserve: bool) -> Self {
        Self {
            enumerable: true,
            beans,
            preserve,
        }
    }

    /// Set the enumerable flag
    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    /// Set the bean mode
    pub fn beans(mut self, beans: Option<bool>) -> Self {
        self.beans = beans;
        self
    }

    /// Set the preserve flag
    pub fn preserve(mut self, preserve: bool) -> Self {
        self.preserve = preserve;
        self
    }
}

/// Canonical bean name and accessor part of a method name
fn bean_parts(name: &str) -> Option<(String, String)> {
    let caps = BEAN_NAME.captures(name)?;
    let part = caps.get(1)?.as_str();
    let first = caps.get(2)?.as_str();
    let rest = caps.get(3).map_or("", |m| m.as_str());
    Some((format!("{}{}", first.to_lowercase(), rest), part.to_string()))
}

fn capitalize(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// State of one injection pass into one destination
struct Injector<'r> {
    realm: &'r mut Realm,
    dest: ObjectId,
    mode: InjectMode,
    /// Bean candidates `(key, Part)` in first-detection order
    candidates: Vec<(Rc<str>, Rc<str>)>,
}

impl<'r> Injector<'r> {
    fn new(realm: &'r mut Realm, dest: ObjectId, mode: InjectMode) -> Self {
        Self {
            realm,
            dest,
            mode,
            candidates: Vec::new(),
        }
    }

    fn run(mut self, source: &FieldSource) -> StrapsResult<()> {
        for entry in source.entries() {
            if is_reserved(&entry.name) || matches!(entry.field, Field::Value(Value::Undefined)) {
                continue;
            }
            self.field(entry.name.clone(), entry.field.clone(), entry.link.clone())?;
        }
        for name in source.explicit_beans() {
            if let Some(part) = capitalize(name) {
                self.candidate(name.clone(), Rc::from(part));
            }
        }
        self.resolve_beans()
    }

    fn field(
        &mut self,
        name: Rc<str>,
        field: Field,
        link: Option<Rc<OverrideLink>>,
    ) -> StrapsResult<()> {
        let (field, link) = self.resolve_alias(field, link)?;
        let slot = self.normalize(field);
        let callable = matches!(
            slot,
            Slot::Data {
                value: Value::Function(_),
                ..
            }
        );

        // Previous value, through the whole delegation chain. Accessors only
        // care whether the name exists.
        let mut previous: Option<Resolved> = None;
        let mut exists = false;
        if self.mode.preserve || (callable && link.is_none()) {
            if matches!(slot, Slot::Accessor { .. }) {
                exists = self.realm.has(self.dest, &name);
            } else {
                previous = self.realm.resolve(self.dest, &name)?;
                exists = previous.as_ref().is_some_and(|p| !p.value.is_undefined());
            }
        }

        if self.mode.preserve && exists {
            tracing::trace!(dest = ?self.dest, %name, "preserved existing field");
            return Ok(());
        }

        let link = match (callable, link, previous) {
            (false, ..) => None,
            (true, Some(link), _) => Some(link),
            (
                true,
                None,
                Some(Resolved {
                    value: Value::Function(replaced),
                    link: replaced_link,
                }),
            ) => Some(OverrideLink::new(replaced, replaced_link)),
            (true, None, _) => None,
        };

        if callable && self.mode.beans != Some(false) {
            if let Some((key, part)) = bean_parts(&name) {
                self.candidate(Rc::from(key), Rc::from(part));
            }
        }

        let (enumerable, configurable) = match self.realm.object(self.dest).descriptor(&name) {
            Some(existing) if !existing.configurable => (existing.enumerable, false),
            _ => (self.mode.enumerable, true),
        };
        tracing::trace!(
            dest = ?self.dest,
            %name,
            linked = link.is_some(),
            accessor = matches!(slot, Slot::Accessor { .. }),
            "inject field"
        );
        self.realm.define_linked(
            self.dest,
            name,
            PropertyDescriptor {
                slot,
                enumerable,
                configurable,
            },
            link,
        );
        Ok(())
    }

    /// `"#other"` becomes the destination's `other`, unless that is undefined
    fn resolve_alias(
        &mut self,
        field: Field,
        link: Option<Rc<OverrideLink>>,
    ) -> StrapsResult<(Field, Option<Rc<OverrideLink>>)> {
        let prefix = self.realm.options().alias_prefix;
        let target = match &field {
            Field::Value(Value::Str(s)) => match s.strip_prefix(prefix) {
                Some(target) => target.to_string(),
                None => return Ok((field, link)),
            },
            _ => return Ok((field, link)),
        };
        match self.realm.resolve(self.dest, &target)? {
            Some(resolved) if !resolved.value.is_undefined() => {
                Ok((Field::Value(resolved.value), resolved.link))
            }
            _ => Ok((field, link)),
        }
    }

    /// Callables stay data; explicit or plain-object accessor shapes become
    /// accessors; everything else is a writable data value.
    fn normalize(&self, field: Field) -> Slot {
        match field {
            Field::Accessor { get, set } => Slot::Accessor { get, set },
            Field::Value(value) => {
                if let Some(slot) = self.accessor_shape(&value) {
                    return slot;
                }
                Slot::Data {
                    value,
                    writable: true,
                }
            }
        }
    }

    /// A plain object whose `get` resolves to a function is read as an
    /// accessor descriptor. `get` and `set` are found through delegation,
    /// but only data fields count; getters are not run. A data value with
    /// that shape is misread the same way, which is why
    /// `RealmOptions::accessor_shapes` can turn this off.
    fn accessor_shape(&self, value: &Value) -> Option<Slot> {
        if !self.realm.options().accessor_shapes || !self.realm.is_plain_object(value) {
            return None;
        }
        let obj = value.as_object()?;
        let method = |name: &str| {
            let (_, prop) = self.realm.lookup(obj, name)?;
            match prop.descriptor.value()? {
                Value::Function(function) => Some(Method {
                    function: *function,
                    base: prop.link.clone(),
                }),
                _ => None,
            }
        };
        let get = method("get")?;
        let set = method("set");
        tracing::debug!(?obj, "plain object with callable get read as accessor descriptor");
        Some(Slot::Accessor {
            get: Some(get),
            set,
        })
    }

    fn candidate(&mut self, key: Rc<str>, part: Rc<str>) {
        match self.candidates.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = part,
            None => self.candidates.push((key, part)),
        }
    }

    /// Function field `name` resolves to on the destination
    fn method(&mut self, name: &str) -> StrapsResult<Option<Method>> {
        Ok(match self.realm.resolve(self.dest, name)? {
            Some(Resolved {
                value: Value::Function(function),
                link,
            }) => Some(Method {
                function,
                base: link,
            }),
            _ => None,
        })
    }

    /// Define accessors for candidates with a qualifying getter. `isX` only
    /// counts when there is a setter; a getter without a setter must take
    /// no parameters unless beans are forced.
    fn resolve_beans(&mut self) -> StrapsResult<()> {
        let candidates = std::mem::take(&mut self.candidates);
        for (key, part) in candidates {
            let set = self.method(&format!("set{}", part))?;
            let get = match self.method(&format!("get{}", part))? {
                Some(get) => Some(get),
                None if set.is_some() => self.method(&format!("is{}", part))?,
                None => None,
            };
            let Some(get) = get else {
                continue;
            };
            let arity = self.realm.function(get.function).arity();
            if self.mode.beans == Some(true) || arity == 0 || set.is_some() {
                tracing::debug!(dest = ?self.dest, %key, has_setter = set.is_some(), "bean accessor");
                self.field(
                    key,
                    Field::Accessor {
                        get: Some(get),
                        set,
                    },
                    None,
                )?;
            }
        }
        Ok(())
    }
}

impl Realm {
    /// Inject `source` into `dest` with explicit flags; returns `dest`
    pub fn inject_fields(
        &mut self,
        dest: ObjectId,
        source: &FieldSource,
        mode: InjectMode,
    ) -> StrapsResult<ObjectId> {
        Injector::new(self, dest, mode).run(source)?;
        Ok(dest)
    }

    /// Inject sources into an object or a class, in order.
    ///
    /// Objects take each source with that source's own flags. Classes split
    /// each source into its static part (into the class) and the rest (into
    /// the instance template), as class derivation does.
    pub fn inject(&mut self, target: impl Into<Value>, sources: &[FieldSource]) -> StrapsResult<Value> {
        let target = target.into();
        match target {
            Value::Object(obj) => {
                for source in sources {
                    self.inject_fields(obj, source, InjectMode::from_source(source))?;
                }
            }
            Value::Class(class) => {
                for source in sources {
                    self.inject_class_source(class, source)?;
                }
            }
            ref other => return Err(StrapsError::InvalidTarget(other.type_name().to_string())),
        }
        Ok(target)
    }

    /// New object delegating to `obj`, with `sources` injected into it
    pub fn beget(&mut self, obj: ObjectId, sources: &[FieldSource]) -> StrapsResult<ObjectId> {
        let child = self.create(Some(obj));
        self.inject(child, sources)?;
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bean_parts() {
        assert_eq!(
            bean_parts("getWidth"),
            Some(("width".to_string(), "Width".to_string()))
        );
        assert_eq!(
            bean_parts("isReady"),
            Some(("ready".to_string(), "Ready".to_string()))
        );
        assert_eq!(bean_parts("setX"), Some(("x".to_string(), "X".to_string())));
        assert_eq!(bean_parts("getwidth"), None);
        assert_eq!(bean_parts("get"), None);
        assert_eq!(bean_parts("width"), None);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("width").as_deref(), Some("Width"));
        assert_eq!(capitalize(""), None);
    }

    #[test]
    fn test_candidates_keep_first_order() {
        let mut realm = Realm::new();
        let dest = realm.record();
        let mut injector = Injector::new(&mut realm, dest, InjectMode::new());
        injector.candidate("a".into(), "A".into());
        injector.candidate("b".into(), "B".into());
        injector.candidate("a".into(), "A2".into());

        assert_eq!(
            injector.candidates,
            vec![(Rc::from("a"), Rc::from("A2")), (Rc::from("b"), Rc::from("B"))]
        );
    }

    #[test]
    fn test_inject_rejects_primitive_target() {
        let mut realm = Realm::new();
        let err = realm.inject(Value::from(1), &[FieldSource::new()]).unwrap_err();
        assert!(matches!(err, StrapsError::InvalidTarget(_)));
    }
}
