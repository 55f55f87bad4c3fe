//! The realm: arenas for objects, functions and classes
//!
//! The realm provides the primitives the composition algorithms are built
//! on: creating objects that delegate to other objects, reading and writing
//! property descriptors, delegated lookup and assignment, and calling native
//! functions.

use std::rc::Rc;

use crate::class::{Class, ClassRegistry};
use crate::error::{StrapsError, StrapsResult};
use crate::function::{Function, Invocation, Method, OverrideLink};
use crate::object::{Object, Property, PropertyDescriptor, Slot};
use crate::options::RealmOptions;
use crate::value::{ClassId, FunctionId, ObjectId, Value};

/// A value found by delegated lookup, with the link of the field holding it
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub(crate) value: Value,
    pub(crate) link: Option<Rc<OverrideLink>>,
}

/// Arena owning every object, function and class
pub struct Realm {
    options: RealmOptions,
    objects: Vec<Object>,
    functions: Vec<Function>,
    pub(crate) classes: ClassRegistry,
    object_class: ClassId,
    base_class: ClassId,
    depth: usize,
}

impl Realm {
    /// Create a realm with default options
    pub fn new() -> Self {
        Self::with_options(RealmOptions::default())
    }

    /// Create a realm with specific options
    pub fn with_options(options: RealmOptions) -> Self {
        let mut realm = Self {
            options,
            objects: Vec::new(),
            functions: Vec::new(),
            classes: ClassRegistry::new(),
            object_class: ClassId(0),
            base_class: ClassId(0),
            depth: 0,
        };
        let (object_class, base_class) = realm.bootstrap();
        realm.object_class = object_class;
        realm.base_class = base_class;
        realm
    }

    /// Options this realm was created with
    pub fn options(&self) -> &RealmOptions {
        &self.options
    }

    /// The generic record class
    pub fn object_class(&self) -> ClassId {
        self.object_class
    }

    /// The root class for composition
    pub fn base_class(&self) -> ClassId {
        self.base_class
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Register a native function declaring `arity` parameters
    pub fn define_function<F>(&mut self, name: &str, arity: usize, body: F) -> FunctionId
    where
        F: Fn(&mut Realm, &Invocation) -> StrapsResult<Value> + 'static,
    {
        let id = FunctionId::from_index(self.functions.len());
        self.functions.push(Function {
            name: Rc::from(name),
            arity,
            body: Rc::new(body),
        });
        id
    }

    /// Function metadata
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    /// Call a function with no override link
    pub fn call(&mut self, function: FunctionId, this: Value, args: Vec<Value>) -> StrapsResult<Value> {
        self.call_method(&Method::new(function), this, args)
    }

    /// Call a value, failing unless it is a function
    pub fn call_value(&mut self, callee: &Value, this: Value, args: Vec<Value>) -> StrapsResult<Value> {
        match callee {
            Value::Function(function) => self.call(*function, this, args),
            other => Err(StrapsError::NotCallable(other.type_name().to_string())),
        }
    }

    /// Call a function, passing `method.base` as its override link
    pub fn call_method(&mut self, method: &Method, this: Value, args: Vec<Value>) -> StrapsResult<Value> {
        if self.depth >= self.options.max_call_depth {
            return Err(StrapsError::CallDepthExceeded(self.options.max_call_depth));
        }
        let body = self.functions[method.function.index()].body.clone();
        let invocation = Invocation {
            this,
            args,
            callee: method.function,
            base: method.base.clone(),
        };
        self.depth += 1;
        let result = body(self, &invocation);
        self.depth -= 1;
        result
    }

    /// Look up `name` on `target` and call it with `target` as receiver.
    ///
    /// Objects resolve through their delegation chain, classes through their
    /// static fields. The field's override link is handed to the callee.
    pub fn invoke(
        &mut self,
        target: impl Into<Value>,
        name: &str,
        args: Vec<Value>,
    ) -> StrapsResult<Value> {
        let target = target.into();
        let host = self
            .field_host(&target)
            .ok_or_else(|| StrapsError::NotCallable(format!("{}.{}", target.type_name(), name)))?;
        let found = self
            .lookup(host, name)
            .map(|(_, prop)| (prop.descriptor.slot.clone(), prop.link.clone()));
        let method = match found {
            Some((
                Slot::Data {
                    value: Value::Function(function),
                    ..
                },
                link,
            )) => Some(Method {
                function,
                base: link,
            }),
            Some((Slot::Accessor { .. }, _)) => {
                match self.resolve_for(host, name, target.clone())? {
                    Some(Resolved {
                        value: Value::Function(function),
                        ..
                    }) => Some(Method::new(function)),
                    _ => None,
                }
            }
            _ => None,
        };
        match method {
            Some(method) => self.call_method(&method, target, args),
            None => Err(StrapsError::NotCallable(format!("'{}' is not a method", name))),
        }
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Object storage
    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.index()]
    }

    fn object_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.index()]
    }

    /// Create an empty object delegating field lookup to `proto`
    pub fn create(&mut self, proto: Option<ObjectId>) -> ObjectId {
        let id = ObjectId::from_index(self.objects.len());
        self.objects.push(Object::new(proto));
        id
    }

    /// Create a plain record
    pub fn record(&mut self) -> ObjectId {
        let template = self.classes.get(self.object_class).template;
        self.create(Some(template))
    }

    /// Create an array-like record with a non-enumerable `length`
    pub fn array(&mut self, values: impl IntoIterator<Item = Value>) -> ObjectId {
        let id = self.record();
        let mut length = 0usize;
        for (index, value) in values.into_iter().enumerate() {
            self.define(id, &index.to_string(), PropertyDescriptor::data(value));
            length = index + 1;
        }
        self.define(
            id,
            "length",
            PropertyDescriptor::data(length as f64).enumerable(false),
        );
        id
    }

    /// Delegation parent of `obj`
    pub fn prototype_of(&self, obj: ObjectId) -> Option<ObjectId> {
        self.object(obj).proto()
    }

    /// Own descriptor of `name`
    pub fn describe(&self, obj: ObjectId, name: &str) -> Option<PropertyDescriptor> {
        self.object(obj).descriptor(name).cloned()
    }

    /// Define an own property; see [`define_linked`](Self::define_linked)
    pub fn define(&mut self, obj: ObjectId, name: &str, descriptor: PropertyDescriptor) -> bool {
        self.define_linked(obj, Rc::from(name), descriptor, None)
    }

    /// Delete-then-define.
    ///
    /// A configurable (or missing) property is removed and appended anew. A
    /// non-configurable property keeps its flags; only a writable data value
    /// is replaced by a data descriptor, anything else is left as it is.
    /// Returns whether the property now holds the new descriptor.
    pub(crate) fn define_linked(
        &mut self,
        obj: ObjectId,
        name: Rc<str>,
        descriptor: PropertyDescriptor,
        link: Option<Rc<OverrideLink>>,
    ) -> bool {
        let object = self.object_mut(obj);
        match object.property_mut(&name) {
            Some(existing) if !existing.descriptor.configurable => {
                let replaced = match (&mut existing.descriptor.slot, descriptor.slot) {
                    (
                        Slot::Data {
                            value,
                            writable: true,
                        },
                        Slot::Data { value: new, .. },
                    ) => {
                        *value = new;
                        existing.link = link;
                        true
                    }
                    _ => false,
                };
                if !replaced {
                    tracing::trace!(?obj, %name, "left non-configurable field untouched");
                }
                replaced
            }
            _ => {
                object.remove(&name);
                object.insert(name, Property { descriptor, link });
                true
            }
        }
    }

    /// Delete a configurable own property
    pub fn delete(&mut self, obj: ObjectId, name: &str) -> bool {
        let object = self.object_mut(obj);
        match object.descriptor(name) {
            Some(desc) if !desc.configurable => false,
            Some(_) => object.remove(name).is_some(),
            None => true,
        }
    }

    /// Own property names in insertion order
    pub fn own_keys(&self, obj: ObjectId) -> Vec<Rc<str>> {
        self.object(obj).keys().cloned().collect()
    }

    /// Own enumerable property names in insertion order
    pub fn own_enumerable_keys(&self, obj: ObjectId) -> Vec<Rc<str>> {
        let object = self.object(obj);
        object
            .keys()
            .filter(|name| object.descriptor(name).is_some_and(|d| d.enumerable))
            .cloned()
            .collect()
    }

    /// Check for an own enumerable property
    pub(crate) fn owns_enumerable(&self, obj: ObjectId, name: &str) -> bool {
        self.object(obj).descriptor(name).is_some_and(|d| d.enumerable)
    }

    pub(crate) fn lookup(&self, obj: ObjectId, name: &str) -> Option<(ObjectId, &Property)> {
        let mut current = Some(obj);
        while let Some(id) = current {
            let object = self.object(id);
            if let Some(prop) = object.property(name) {
                return Some((id, prop));
            }
            current = object.proto();
        }
        None
    }

    /// First object in the delegation chain of `obj` owning `name`
    pub fn holder_of(&self, obj: ObjectId, name: &str) -> Option<ObjectId> {
        self.lookup(obj, name).map(|(holder, _)| holder)
    }

    /// Check whether `name` resolves on `obj` or its delegation chain
    pub fn has(&self, obj: ObjectId, name: &str) -> bool {
        self.lookup(obj, name).is_some()
    }

    /// Override link of the field `name` resolves to
    pub fn override_link(&self, obj: ObjectId, name: &str) -> Option<Rc<OverrideLink>> {
        self.lookup(obj, name).and_then(|(_, prop)| prop.link.clone())
    }

    /// Delegated read; getters run with `obj` as receiver
    pub fn get(&mut self, obj: ObjectId, name: &str) -> StrapsResult<Value> {
        Ok(self
            .resolve(obj, name)?
            .map(|resolved| resolved.value)
            .unwrap_or_default())
    }

    /// Delegated read that also reports the link of a data field
    pub(crate) fn resolve(&mut self, obj: ObjectId, name: &str) -> StrapsResult<Option<Resolved>> {
        self.resolve_for(obj, name, Value::Object(obj))
    }

    /// [`resolve`](Self::resolve) with an explicit getter receiver
    pub(crate) fn resolve_for(
        &mut self,
        obj: ObjectId,
        name: &str,
        receiver: Value,
    ) -> StrapsResult<Option<Resolved>> {
        let getter = match self.lookup(obj, name) {
            None => return Ok(None),
            Some((_, prop)) => match &prop.descriptor.slot {
                Slot::Data { value, .. } => {
                    return Ok(Some(Resolved {
                        value: value.clone(),
                        link: prop.link.clone(),
                    }))
                }
                Slot::Accessor { get, .. } => get.clone(),
            },
        };
        let value = match getter {
            Some(method) => self.call_method(&method, receiver, Vec::new())?,
            None => Value::Undefined,
        };
        Ok(Some(Resolved { value, link: None }))
    }

    /// Assignment.
    ///
    /// Setters found by delegation run with `obj` as receiver; a missing
    /// setter or a read-only data field ignores the write. Writable own data
    /// is updated in place, anything else creates an own data field.
    pub fn set(&mut self, obj: ObjectId, name: &str, value: impl Into<Value>) -> StrapsResult<()> {
        let value = value.into();
        enum Plan {
            Setter(Method),
            Update,
            Ignore,
            Create,
        }
        let plan = match self.lookup(obj, name) {
            Some((_, prop)) => match &prop.descriptor.slot {
                Slot::Accessor { set: Some(m), .. } => Plan::Setter(m.clone()),
                Slot::Accessor { set: None, .. } => Plan::Ignore,
                Slot::Data { writable: false, .. } => Plan::Ignore,
                Slot::Data { .. } => {
                    if self.object(obj).contains(name) {
                        Plan::Update
                    } else {
                        Plan::Create
                    }
                }
            },
            None => Plan::Create,
        };
        match plan {
            Plan::Setter(method) => {
                self.call_method(&method, Value::Object(obj), vec![value])?;
            }
            Plan::Update => {
                if let Some(prop) = self.object_mut(obj).property_mut(name) {
                    if let Slot::Data { value: slot, .. } = &mut prop.descriptor.slot {
                        *slot = value;
                    }
                    prop.link = None;
                }
            }
            Plan::Ignore => {}
            Plan::Create => {
                self.object_mut(obj).insert(
                    Rc::from(name),
                    Property {
                        descriptor: PropertyDescriptor::data(value),
                        link: None,
                    },
                );
            }
        }
        Ok(())
    }

    /// Object holding the fields of a value: objects hold their own, classes
    /// hold their statics
    pub fn field_host(&self, value: &Value) -> Option<ObjectId> {
        match value {
            Value::Object(id) => Some(*id),
            Value::Class(id) => Some(self.classes.get(*id).statics),
            _ => None,
        }
    }

    /// Register a class record, used by bootstrap and class derivation
    pub(crate) fn register_class(&mut self, class: Class) -> ClassId {
        self.classes.register(class)
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Realm")
            .field("objects", &self.objects.len())
            .field("functions", &self.functions.len())
            .field("classes", &self.classes.len())
            .finish()
    }
}
