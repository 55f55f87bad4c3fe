//! Realm configuration

use serde::{Deserialize, Serialize};

use crate::error::{StrapsError, StrapsResult};

/// Default leading character of alias strings (`"#other"`).
pub const DEFAULT_ALIAS_PREFIX: char = '#';

/// Default maximum nesting of native calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Options for creating a [`Realm`](crate::Realm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmOptions {
    /// Leading character that turns a string field into an alias
    pub alias_prefix: char,

    /// Maximum nesting of native calls before `CallDepthExceeded`
    pub max_call_depth: usize,

    /// Treat plain-object values owning a callable `get` as accessor
    /// descriptors during injection.
    ///
    /// This is a structural check: a data value that merely has that shape
    /// is defined as an accessor. Turn it off to require explicit
    /// `Field::Accessor` entries.
    pub accessor_shapes: bool,
}

impl Default for RealmOptions {
    fn default() -> Self {
        Self {
            alias_prefix: DEFAULT_ALIAS_PREFIX,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            accessor_shapes: true,
        }
    }
}

impl RealmOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that only honor explicit accessors
    pub fn strict() -> Self {
        Self {
            accessor_shapes: false,
            ..Self::default()
        }
    }

    /// Parse options from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> StrapsResult<Self> {
        serde_json::from_str(json).map_err(|e| StrapsError::Config(e.to_string()))
    }

    /// Set the alias prefix
    pub fn with_alias_prefix(mut self, prefix: char) -> Self {
        self.alias_prefix = prefix;
        self
    }

    /// Set the maximum call depth
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RealmOptions::default();
        assert_eq!(options.alias_prefix, '#');
        assert_eq!(options.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert!(options.accessor_shapes);
        assert!(!RealmOptions::strict().accessor_shapes);
    }

    #[test]
    fn test_from_json_partial() {
        let options = RealmOptions::from_json(r#"{ "alias_prefix": "@" }"#).unwrap();
        assert_eq!(options.alias_prefix, '@');
        assert_eq!(options.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = RealmOptions::from_json(r#"{ "max_call_depth": "deep" }"#).unwrap_err();
        assert!(matches!(err, StrapsError::Config(_)));
    }
}
