//! Capability registry.
//!
//! Capabilities are configured service instances keyed by type. They are
//! written through a [`RegistryBuilder`] while the bootstrap runs, then frozen
//! into a [`CapabilityRegistry`] that has no way to insert. The frozen registry
//! is shared by `Arc` with request handling and read without locks.
//!
//! Trait objects are registered as `Arc<dyn Trait>` and read back with
//! [`CapabilityRegistry::resolve`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;

/// Identity of a capability: its type id plus a readable type name.
#[derive(Clone, Copy)]
pub struct CapabilityKey {
    id: TypeId,
    name: &'static str,
}

impl CapabilityKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for CapabilityKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CapabilityKey {}

impl Hash for CapabilityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("capability `{0}` is not registered")]
    Missing(CapabilityKey),

    #[error("capability `{0}` is already registered")]
    Duplicate(CapabilityKey),
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Mutable registry used while bootstrapping.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: HashMap<CapabilityKey, Entry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability. Each type may be registered once.
    pub fn register<T: Any + Send + Sync>(&mut self, value: T) -> Result<(), RegistryError> {
        let key = CapabilityKey::of::<T>();
        if self.entries.contains_key(&key) {
            return Err(RegistryError::Duplicate(key));
        }
        self.entries.insert(key, Arc::new(value));
        Ok(())
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, RegistryError> {
        lookup(&self.entries)
    }

    pub fn contains(&self, key: &CapabilityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Freeze into the read-only registry.
    pub fn freeze(self) -> CapabilityRegistry {
        CapabilityRegistry {
            entries: self.entries,
        }
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Read-only registry available during request handling.
pub struct CapabilityRegistry {
    entries: HashMap<CapabilityKey, Entry>,
}

impl CapabilityRegistry {
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, RegistryError> {
        lookup(&self.entries)
    }

    /// Clone the registered value out, e.g. an `Arc<dyn Trait>`.
    pub fn resolve<T: Any + Send + Sync + Clone>(&self) -> Result<T, RegistryError> {
        self.get::<T>().map(|value| (*value).clone())
    }

    pub fn contains(&self, key: &CapabilityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Names of registered capabilities, sorted (diagnostics).
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().map(CapabilityKey::name).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

fn lookup<T: Any + Send + Sync>(
    entries: &HashMap<CapabilityKey, Entry>,
) -> Result<Arc<T>, RegistryError> {
    let key = CapabilityKey::of::<T>();
    entries
        .get(&key)
        .cloned()
        .and_then(|entry| entry.downcast::<T>().ok())
        .ok_or(RegistryError::Missing(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut builder = RegistryBuilder::new();
        builder.register(42u32).unwrap();
        assert_eq!(*builder.get::<u32>().unwrap(), 42);

        let registry = builder.freeze();
        assert_eq!(*registry.get::<u32>().unwrap(), 42);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_capability_names_the_type() {
        let registry = RegistryBuilder::new().freeze();
        let err = registry.get::<String>().unwrap_err();
        assert_eq!(err, RegistryError::Missing(CapabilityKey::of::<String>()));
        assert!(err.to_string().contains("alloc::string::String"));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.register(1u8).unwrap();
        assert!(matches!(builder.register(2u8), Err(RegistryError::Duplicate(_))));
        assert_eq!(*builder.get::<u8>().unwrap(), 1);
    }

    #[test]
    fn test_trait_objects_resolve() {
        let mut builder = RegistryBuilder::new();
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        builder.register(greeter).unwrap();

        let registry = builder.freeze();
        let resolved = registry.resolve::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(resolved.greet(), "hello");
        assert!(registry.contains(&CapabilityKey::of::<Arc<dyn Greeter>>()));
    }
}
