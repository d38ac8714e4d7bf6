//! Registry of sample types, keyed by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{DataType, TypeRef, builtin};
use crate::error::DfgError;

/// Set of known sample types.
///
/// Populated once at startup and read-only afterwards; lookups through a
/// shared reference are safe from any number of threads.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeRef>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the wildcard and all built-in types.
    pub fn with_builtin_types() -> Self {
        let types = builtin::builtin_types()
            .into_iter()
            .map(|t| (t.name().to_string(), Arc::new(t)))
            .collect();
        Self { types }
    }

    /// Adds a type. Fails with [`DfgError::DuplicateType`] if the name is taken.
    pub fn register(&mut self, data_type: DataType) -> Result<TypeRef, DfgError> {
        if self.types.contains_key(data_type.name()) {
            return Err(DfgError::DuplicateType {
                kind: "sample type",
                name: data_type.name().to_string(),
            });
        }
        #[cfg(feature = "tracing")]
        tracing::trace!("register_type: {}", data_type.name());
        let data_type = Arc::new(data_type);
        self.types
            .insert(data_type.name().to_string(), Arc::clone(&data_type));
        Ok(data_type)
    }

    /// Looks up a type by name.
    pub fn lookup(&self, name: &str) -> Result<TypeRef, DfgError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| DfgError::not_found("sample type", name))
    }

    /// Returns `true` if a type with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// All types, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &TypeRef> {
        self.types.values()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_type_rejected() {
        let mut reg = TypeRegistry::new();
        reg.register(DataType::new::<u64>("am::core::uint64")).unwrap();
        let err = reg
            .register(DataType::new::<u32>("am::core::uint64"))
            .unwrap_err();
        assert!(matches!(err, DfgError::DuplicateType { kind: "sample type", .. }));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_lookup_miss_is_not_found() {
        let reg = TypeRegistry::with_builtin_types();
        let err = reg.lookup("am::core::quaternion").unwrap_err();
        assert!(matches!(err, DfgError::NotFound { kind: "sample type", .. }));
    }

    #[test]
    fn test_with_builtin_types_matches_registration() {
        let direct = TypeRegistry::with_builtin_types();
        let mut manual = TypeRegistry::new();
        builtin::register_builtin_types(&mut manual).unwrap();
        let a: Vec<_> = direct.iter().map(|t| t.name().to_string()).collect();
        let b: Vec<_> = manual.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(a, b);
        assert!(direct.contains("am::core::double"));
    }
}
