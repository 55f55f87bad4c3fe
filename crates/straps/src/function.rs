//! Native functions, invocations and override links
//!
//! Functions are plain Rust closures registered in the realm. When a field
//! holding a function replaces another function during injection, the new
//! field records an [`OverrideLink`] to the replaced one. The link lives with
//! the destination field rather than on the (possibly shared) function, and
//! every link captures the link of the field it replaced, so chains are
//! immutable and acyclic.

use std::fmt;
use std::rc::Rc;

use crate::error::{StrapsError, StrapsResult};
use crate::realm::Realm;
use crate::value::{FunctionId, Value};

/// Native function body
pub type NativeFn = Rc<dyn Fn(&mut Realm, &Invocation) -> StrapsResult<Value>>;

/// A registered native function
pub struct Function {
    pub(crate) name: Rc<str>,
    pub(crate) arity: usize,
    pub(crate) body: NativeFn,
}

impl Function {
    /// Function name (diagnostics only)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter count
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Reference from a replacing function field to the function it replaced
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideLink {
    target: FunctionId,
    base: Option<Rc<OverrideLink>>,
}

impl OverrideLink {
    pub(crate) fn new(target: FunctionId, base: Option<Rc<OverrideLink>>) -> Rc<Self> {
        Rc::new(Self { target, base })
    }

    /// The replaced function
    pub fn target(&self) -> FunctionId {
        self.target
    }

    /// The link the replaced function itself carried
    pub fn base(&self) -> Option<&Rc<OverrideLink>> {
        self.base.as_ref()
    }

    /// Number of links in the chain, this one included
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut link = self.base.as_deref();
        while let Some(next) = link {
            depth += 1;
            link = next.base.as_deref();
        }
        depth
    }

    /// Replaced functions from most to least recent
    pub fn chain(&self) -> impl Iterator<Item = FunctionId> + '_ {
        std::iter::successors(Some(self), |link| link.base.as_deref()).map(|link| link.target)
    }
}

/// A function together with the override link of the field it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// The function to call
    pub function: FunctionId,
    /// Link passed to the function as its base
    pub base: Option<Rc<OverrideLink>>,
}

impl Method {
    /// Method without an override link
    pub fn new(function: FunctionId) -> Self {
        Self {
            function,
            base: None,
        }
    }
}

impl From<FunctionId> for Method {
    fn from(function: FunctionId) -> Self {
        Method::new(function)
    }
}

/// Everything a native function sees about one call
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Receiver: an object, a class (static calls) or `Undefined`
    pub this: Value,
    /// Arguments in call order
    pub args: Vec<Value>,
    pub(crate) callee: FunctionId,
    pub(crate) base: Option<Rc<OverrideLink>>,
}

impl Invocation {
    /// Argument at `index`, `Undefined` when not passed
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }

    /// The function being run
    pub fn callee(&self) -> FunctionId {
        self.callee
    }

    /// Override link of the field the callee was invoked through
    pub fn base(&self) -> Option<&OverrideLink> {
        self.base.as_deref()
    }

    /// Whether the callee overrides a previous implementation
    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Invoke the overridden implementation with the same receiver
    pub fn call_base(&self, realm: &mut Realm, args: Vec<Value>) -> StrapsResult<Value> {
        match &self.base {
            Some(link) => realm.call_method(
                &Method {
                    function: link.target,
                    base: link.base.clone(),
                },
                self.this.clone(),
                args,
            ),
            None => Err(StrapsError::NoBaseImplementation {
                name: realm.function(self.callee).name().to_string(),
            }),
        }
    }

    /// [`call_base`](Self::call_base) with this call's own arguments
    pub fn forward_base(&self, realm: &mut Realm) -> StrapsResult<Value> {
        self.call_base(realm, self.args.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_depth_and_chain() {
        let first = OverrideLink::new(FunctionId(1), None);
        let second = OverrideLink::new(FunctionId(2), Some(first.clone()));

        assert_eq!(first.depth(), 1);
        assert_eq!(second.depth(), 2);
        assert_eq!(
            second.chain().collect::<Vec<_>>(),
            vec![FunctionId(2), FunctionId(1)]
        );
        assert_eq!(second.base(), Some(&first));
    }

    #[test]
    fn test_missing_argument_is_undefined() {
        let inv = Invocation {
            this: Value::Undefined,
            args: vec![Value::from(1)],
            callee: FunctionId(0),
            base: None,
        };
        assert_eq!(inv.arg(0), Value::Number(1.0));
        assert_eq!(inv.arg(1), Value::Undefined);
        assert!(!inv.has_base());
    }
}
