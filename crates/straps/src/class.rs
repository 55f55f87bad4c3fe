//! Class registry and class derivation
//!
//! A class is a constructor function, an instance template that instances
//! delegate to, and a static field set. Deriving a class links the new
//! template to the parent's, snapshots the parent's statics, and injects the
//! given field sources into the template and the statics.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{StrapsError, StrapsResult};
use crate::function::Method;
use crate::inject::InjectMode;
use crate::object::PropertyDescriptor;
use crate::realm::Realm;
use crate::source::{Field, FieldSource, Statics, INITIALIZE, PROTOTYPE};
use crate::value::{ClassId, FunctionId, ObjectId, Value};

/// Runtime class record
#[derive(Debug, Clone)]
pub struct Class {
    /// Class ID (unique identifier)
    pub id: ClassId,
    /// Name given at definition, if any
    pub name: Option<Rc<str>>,
    /// Function run on new instances
    pub constructor: FunctionId,
    /// Object every instance delegates to
    pub template: ObjectId,
    /// Static fields (no delegation parent)
    pub statics: ObjectId,
    parent: Option<ClassId>,
}

impl Class {
    fn new(
        name: Option<Rc<str>>,
        constructor: FunctionId,
        template: ObjectId,
        statics: ObjectId,
    ) -> Self {
        Self {
            id: ClassId(0),
            name,
            constructor,
            template,
            statics,
            parent: None,
        }
    }

    /// Parent class (None for root classes)
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    /// Display name
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

/// Class registry for a realm
#[derive(Debug, Default)]
pub struct ClassRegistry {
    /// Classes indexed by ID
    classes: Vec<Class>,
    /// Class name to ID mapping
    name_to_id: FxHashMap<Rc<str>, ClassId>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, assigning its ID. The class is not found by name
    /// until it is published.
    pub(crate) fn register(&mut self, mut class: Class) -> ClassId {
        let id = ClassId::from_index(self.classes.len());
        class.id = id;
        self.classes.push(class);
        id
    }

    /// Get class by ID
    pub fn get(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    /// Get class by name (later definitions shadow earlier ones)
    pub fn get_by_name(&self, name: &str) -> Option<&Class> {
        self.name_to_id.get(name).map(|id| self.get(*id))
    }

    /// Set the parent link and make the class findable by name, once the
    /// class is fully built
    fn publish(&mut self, id: ClassId, parent: Option<ClassId>) {
        let class = &mut self.classes[id.index()];
        debug_assert!(class.parent.is_none(), "{:?} already published", id);
        class.parent = parent;
        if let Some(name) = class.name.clone() {
            self.name_to_id.insert(name, id);
        }
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if no class is registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterate over all classes
    pub fn iter(&self) -> impl Iterator<Item = &Class> {
        self.classes.iter()
    }
}

fn constructor_field(class: ClassId) -> PropertyDescriptor {
    PropertyDescriptor::data(class).enumerable(false)
}

/// First `initialize` function and first `prototype` object across sources
fn designated_fields(sources: &[FieldSource]) -> (Option<FunctionId>, Option<ObjectId>) {
    let mut initialize = None;
    let mut prototype = None;
    for source in sources {
        if initialize.is_none() {
            if let Some(Field::Value(Value::Function(f))) = source.get(INITIALIZE) {
                initialize = Some(*f);
            }
        }
        if prototype.is_none() {
            if let Some(Field::Value(Value::Object(o))) = source.get(PROTOTYPE) {
                prototype = Some(*o);
            }
        }
        if initialize.is_some() && prototype.is_some() {
            break;
        }
    }
    (initialize, prototype)
}

/// Object arguments of a native call, snapshotted as field sources
fn object_sources(realm: &Realm, args: &[Value]) -> Vec<FieldSource> {
    args.iter()
        .filter_map(Value::as_object)
        .map(|obj| FieldSource::from_object(realm, obj))
        .collect()
}

impl Realm {
    /// Create the `Object` and `Base` classes
    pub(crate) fn bootstrap(&mut self) -> (ClassId, ClassId) {
        let object_template = self.create(None);
        let object_statics = self.create(None);
        let object_ctor = self.define_function("Object", 0, |_, _| Ok(Value::Undefined));
        let object_class = self.register_class(Class::new(
            Some(Rc::from("Object")),
            object_ctor,
            object_template,
            object_statics,
        ));
        self.define(object_template, "constructor", constructor_field(object_class));
        self.classes.publish(object_class, None);

        let base_template = self.create(Some(object_template));
        let base_statics = self.create(None);
        let base_ctor = self.define_function("Base", 0, |realm, inv| {
            if let Some(this) = inv.this.as_object() {
                for arg in &inv.args {
                    if let Value::Object(src) = arg {
                        realm.copy(this, *src)?;
                    }
                }
            }
            Ok(Value::Undefined)
        });
        let base_class = self.register_class(Class::new(
            Some(Rc::from("Base")),
            base_ctor,
            base_template,
            base_statics,
        ));
        self.define(base_template, "constructor", constructor_field(base_class));
        self.install_base_methods(base_template);
        self.classes.publish(base_class, None);

        (object_class, base_class)
    }

    /// `inject`, `extend`, `each` and `clone` on every Base-derived instance
    fn install_base_methods(&mut self, template: ObjectId) {
        let inject = self.define_function("inject", 0, |realm, inv| {
            let sources = object_sources(realm, &inv.args);
            realm.inject(inv.this.clone(), &sources)
        });
        let extend = self.define_function("extend", 0, |realm, inv| {
            let this = inv
                .this
                .as_object()
                .ok_or_else(|| StrapsError::InvalidTarget(inv.this.type_name().to_string()))?;
            let sources = object_sources(realm, &inv.args);
            Ok(Value::Object(realm.beget(this, &sources)?))
        });
        let each = self.define_function("each", 1, |realm, inv| {
            let this = inv
                .this
                .as_object()
                .ok_or_else(|| StrapsError::InvalidTarget(inv.this.type_name().to_string()))?;
            let callback = inv.arg(0);
            if !callback.is_callable() {
                return Err(StrapsError::NotCallable(callback.type_name().to_string()));
            }
            let bind = match inv.arg(1) {
                Value::Undefined => inv.this.clone(),
                bind => bind,
            };
            realm.each_with(this, bind, |realm, bind, value, key| {
                let args = vec![value, key.into(), Value::Object(this)];
                realm.call_value(&callback, bind.clone(), args)?;
                Ok(())
            })
        });
        let clone = self.define_function("clone", 0, |realm, inv| {
            let this = inv
                .this
                .as_object()
                .ok_or_else(|| StrapsError::InvalidTarget(inv.this.type_name().to_string()))?;
            let copy = match realm.class_of(&inv.this) {
                Some(class) => realm.construct(class, vec![inv.this.clone()])?,
                None => realm.clone_object(this)?,
            };
            Ok(Value::Object(copy))
        });
        for (name, function) in [
            ("inject", inject),
            ("extend", extend),
            ("each", each),
            ("clone", clone),
        ] {
            self.define(template, name, PropertyDescriptor::data(function).enumerable(false));
        }
    }

    /// Class registry
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Parent class of `class`
    pub fn parent_of(&self, class: ClassId) -> Option<ClassId> {
        self.classes.get(class).parent()
    }

    /// Instance template of `class`
    pub fn template_of(&self, class: ClassId) -> ObjectId {
        self.classes.get(class).template
    }

    /// Static field set of `class`
    pub fn statics_of(&self, class: ClassId) -> ObjectId {
        self.classes.get(class).statics
    }

    /// Derive an anonymous class from `base`
    pub fn extend(&mut self, base: ClassId, sources: &[FieldSource]) -> StrapsResult<ClassId> {
        self.derive(None, base, sources)
    }

    /// Derive a class from `base` and register it under `name`.
    ///
    /// The name is only registered once every source is injected; a class
    /// whose injection failed is never found by name.
    pub fn define_class(
        &mut self,
        name: &str,
        base: ClassId,
        sources: &[FieldSource],
    ) -> StrapsResult<ClassId> {
        self.derive(Some(name), base, sources)
    }

    #[tracing::instrument(skip_all, fields(name = name.unwrap_or("<anonymous>"), base = ?base, sources = sources.len()))]
    fn derive(
        &mut self,
        name: Option<&str>,
        base: ClassId,
        sources: &[FieldSource],
    ) -> StrapsResult<ClassId> {
        let (initialize, prototype) = designated_fields(sources);
        let constructor = match initialize {
            Some(function) => function,
            None => self.define_function(name.unwrap_or("constructor"), 0, move |realm, inv| {
                realm.construct_with(base, inv.this.clone(), inv.args.clone())?;
                Ok(Value::Undefined)
            }),
        };

        let (base_template, base_statics) = {
            let parent = self.classes.get(base);
            (parent.template, parent.statics)
        };
        let template = match prototype {
            Some(template) => template,
            None => self.create(Some(base_template)),
        };
        let statics = self.create(None);
        let id = self.register_class(Class::new(name.map(Rc::from), constructor, template, statics));
        self.define(template, "constructor", constructor_field(id));

        // Statics cannot delegate, so they are copied once. Enumerable, so
        // the next derivation copies them again.
        let inherited = FieldSource::from_object(self, base_statics);
        self.inject_fields(statics, &inherited, InjectMode::statics(None, false))?;

        for source in sources {
            self.inject_class_source(id, source)?;
        }

        self.classes.publish(id, Some(base));
        tracing::debug!(
            class = ?id,
            instance_fields = self.object(template).len(),
            static_fields = self.object(statics).len(),
            "derived class"
        );
        Ok(id)
    }

    /// Inject one source into a class: the static part into its statics,
    /// the rest into its template
    pub(crate) fn inject_class_source(
        &mut self,
        class: ClassId,
        source: &FieldSource,
    ) -> StrapsResult<()> {
        let (template, statics) = {
            let class = self.classes.get(class);
            (class.template, class.statics)
        };
        let instance_mode = InjectMode::from_source(source);
        let static_mode = InjectMode::statics(source.beans_mode(), source.is_preserve());
        match source.statics_mode() {
            Statics::None => {
                self.inject_fields(template, source, instance_mode)?;
            }
            Statics::All => {
                self.inject_fields(statics, source, static_mode)?;
            }
            Statics::Nested(nested) => {
                self.inject_fields(template, source, instance_mode)?;
                self.inject_fields(statics, nested, static_mode)?;
            }
            Statics::Object(obj) => {
                let nested = FieldSource::fields_of(self, *obj);
                self.inject_fields(template, source, instance_mode)?;
                self.inject_fields(statics, &nested, static_mode)?;
            }
        }
        Ok(())
    }

    /// Create an instance of `class` and run its constructor on it
    pub fn construct(&mut self, class: ClassId, args: Vec<Value>) -> StrapsResult<ObjectId> {
        let template = self.template_of(class);
        let instance = self.create(Some(template));
        self.construct_with(class, Value::Object(instance), args)?;
        Ok(instance)
    }

    /// [`construct`](Self::construct) for a value that should be a class
    pub fn construct_value(&mut self, callee: &Value, args: Vec<Value>) -> StrapsResult<ObjectId> {
        match callee {
            Value::Class(class) => self.construct(*class, args),
            other => Err(StrapsError::NotConstructible(other.type_name().to_string())),
        }
    }

    /// Run the constructor of `class` on an existing receiver.
    ///
    /// Used for parent constructor calls. An `initialize` constructor gets
    /// the override link of the template's `initialize` field, so it can
    /// reach the `initialize` it replaced.
    pub fn construct_with(&mut self, class: ClassId, this: Value, args: Vec<Value>) -> StrapsResult<()> {
        let (constructor, template) = {
            let class = self.classes.get(class);
            (class.constructor, class.template)
        };
        let base = self
            .object(template)
            .property(INITIALIZE)
            .filter(|prop| prop.descriptor.value() == Some(&Value::Function(constructor)))
            .and_then(|prop| prop.link.clone());
        let method = Method {
            function: constructor,
            base,
        };
        self.call_method(&method, this, args)?;
        Ok(())
    }

    /// Runtime class of a value: the `constructor` data field its
    /// delegation chain resolves to. Getters are not run.
    pub fn class_of(&self, value: &Value) -> Option<ClassId> {
        let obj = value.as_object()?;
        let (_, prop) = self.lookup(obj, "constructor")?;
        prop.descriptor.value()?.as_class()
    }

    /// Check whether `value`'s class is `class` or derives from it
    pub fn is_instance_of(&self, value: &Value, class: ClassId) -> bool {
        let mut current = self.class_of(value);
        while let Some(id) = current {
            if id == class {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Read a static field; getters receive the class as receiver
    pub fn get_static(&mut self, class: ClassId, name: &str) -> StrapsResult<Value> {
        let statics = self.statics_of(class);
        Ok(self
            .resolve_for(statics, name, Value::Class(class))?
            .map(|resolved| resolved.value)
            .unwrap_or_default())
    }

    /// Call a static method with the class as receiver
    pub fn invoke_static(&mut self, class: ClassId, name: &str, args: Vec<Value>) -> StrapsResult<Value> {
        self.invoke(Value::Class(class), name, args)
    }
}
