//! Process-wide cache of type descriptions.
//!
//! The `TypeRegistry` maps runtime type identity to its cached
//! [`TypeDescription`] and guarantees at most one construction per type, even
//! under concurrent first access from many threads. Reads outside of
//! construction are lock-free; construction serializes on a single coarse
//! build lock scoped to "construct and install one description".
//!
//! # Key Components
//!
//! - [`TypeRegistry`]: the identity-keyed cache with a secondary name index
//! - [`TypeRegistry::describe`]: infallible lazy description
//! - [`TypeRegistry::describe_eager`]: description plus up-front member passes
//!
//! # Registry Architecture
//!
//! The registry is deliberately not ambient state: materialization entry
//! points receive a registry handle explicitly, so tests can substitute an
//! isolated instance and [`TypeRegistry::clear`] gives process-wide reset
//! between test runs.
//!
//! # Thread Safety
//!
//! Lock-free concurrent maps for storage and indices, one `Mutex` for the
//! construction critical section. Descriptions are immutable after
//! construction apart from their own internally synchronized member passes.
//!
//! # Examples
//!
//! ```rust
//! use rowcast::metadata::TypeRegistry;
//!
//! let registry = TypeRegistry::new();
//! let first = registry.describe::<i32>();
//! let second = registry.describe::<i32>();
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! ```

use std::{
    any::TypeId,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use dashmap::DashMap;

use crate::{
    metadata::{BindingScope, Reflected, TypeDescription},
    Result,
};

/// Process-scoped, thread-safe map from runtime type identity to its cached
/// [`TypeDescription`].
pub struct TypeRegistry {
    types: DashMap<TypeId, Arc<TypeDescription>>,
    names: DashMap<&'static str, TypeId>,
    build_lock: Mutex<()>,
    constructions: AtomicUsize,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        TypeRegistry {
            types: DashMap::new(),
            names: DashMap::new(),
            build_lock: Mutex::new(()),
            constructions: AtomicUsize::new(0),
        }
    }

    /// The cached description for `T`, constructing it on first access.
    ///
    /// Construction happens inside the build lock, so concurrent first
    /// callers block for the duration of one construction and then all
    /// observe the same instance; every later call is a lock-free read.
    /// Construction cannot fail: shapes without any specific capability
    /// degrade to the complex classification.
    pub fn describe<T: Reflected>(&self) -> Arc<TypeDescription> {
        let type_id = TypeId::of::<T>();
        if let Some(existing) = self.types.get(&type_id) {
            return existing.clone();
        }

        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = self.types.get(&type_id) {
            // A racing caller won the build lock first; adopt its instance.
            return existing.clone();
        }

        let description = Arc::new(TypeDescription::from_shape(type_id, T::shape()));
        self.constructions.fetch_add(1, Ordering::Relaxed);
        self.names.insert(description.name, type_id);
        self.types.insert(type_id, description.clone());
        description
    }

    /// Describe `T` and run its constructor presence check and public member
    /// passes up front.
    ///
    /// # Errors
    /// Returns [`crate::Error::Shape`] for an inconsistent blueprint and
    /// [`crate::Error::UnsupportedMember`] when a public method of `T`
    /// declares a shape the thunk convention cannot express. The description
    /// itself is still cached; only the failing pass is not.
    pub fn describe_eager<T: Reflected>(&self) -> Result<Arc<TypeDescription>> {
        let description = self.describe::<T>();
        description.validate()?;
        description.properties(BindingScope::public());
        description.fields(BindingScope::public());
        description.methods(BindingScope::public())?;
        Ok(description)
    }

    /// Look up a cached description by runtime type identity.
    #[must_use]
    pub fn get(&self, type_id: &TypeId) -> Option<Arc<TypeDescription>> {
        self.types.get(type_id).map(|entry| entry.clone())
    }

    /// Look up a cached description by type name.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] when no type with that name has
    /// been described yet.
    pub fn get_by_name(&self, name: &str) -> Result<Arc<TypeDescription>> {
        self.names
            .get(name)
            .and_then(|entry| self.get(entry.value()))
            .ok_or_else(|| crate::Error::TypeNotFound(name.to_string()))
    }

    /// Number of cached descriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// `true` if no descriptions are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Number of description constructions performed by this registry.
    ///
    /// Diagnostic counter; under concurrent first access for one type this
    /// still advances exactly once.
    #[must_use]
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    /// Drop every cached description, e.g. between test runs.
    ///
    /// Descriptions still referenced elsewhere stay alive through their
    /// `Arc`s; the registry simply forgets them and will rebuild on the next
    /// demand.
    pub fn clear(&self) {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.types.clear();
        self.names.clear();
    }
}
