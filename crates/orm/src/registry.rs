//! # Registry
//!
//! Write-once, read-many metadata for every entity type. Schemas are
//! registered on a [`RegistryBuilder`] during start-up and frozen into a
//! [`Registry`]. The process-wide instance is published through a
//! [`OnceLock`], which provides the happens-before edge between
//! initialization and every later (lock-free) read.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::schema::Schema;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

struct Registration {
    entity: &'static str,
    table: &'static str,
    schema: Arc<dyn Any + Send + Sync>,
}

/// Immutable map from entity type to its [`Schema`].
#[derive(Default)]
pub struct Registry {
    schemas: HashMap<TypeId, Registration>,
}

impl Registry {
    /// Start collecting schemas.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Returns the schema registered for `E`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRegistered`] if `E` was never registered.
    pub fn describe<E: 'static>(&self) -> Result<Arc<Schema<E>>> {
        self.schemas
            .get(&TypeId::of::<E>())
            .and_then(|registration| Arc::clone(&registration.schema).downcast::<Schema<E>>().ok())
            .ok_or(Error::NotRegistered(type_name::<E>()))
    }

    /// Returns `true` if `E` is registered.
    #[must_use]
    pub fn contains<E: 'static>(&self) -> bool {
        self.schemas.contains_key(&TypeId::of::<E>())
    }

    /// Number of registered entity types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Publish this registry process-wide.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if a registry was already installed.
    pub fn install(self) -> Result<&'static Self> {
        let mut installed = false;
        let registry = GLOBAL.get_or_init(|| {
            installed = true;
            self
        });
        if !installed {
            return Err(Error::AlreadyRegistered(type_name::<Self>()));
        }

        tracing::debug!(entities = registry.len(), "registry installed");
        Ok(registry)
    }

    /// The process-wide registry, once installed.
    #[must_use]
    pub fn global() -> Option<&'static Self> {
        GLOBAL.get()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.schemas.values().map(|registration| (registration.entity, registration.table)))
            .finish()
    }
}

/// Collects schemas during start-up.
#[derive(Default)]
pub struct RegistryBuilder {
    schemas: HashMap<TypeId, Registration>,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.schemas.values().map(|registration| (registration.entity, registration.table)))
            .finish()
    }
}

impl RegistryBuilder {
    /// Register a schema for `E`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if `E` is already present.
    pub fn register<E: 'static>(&mut self, schema: Schema<E>) -> Result<&mut Self> {
        let key = TypeId::of::<E>();
        if self.schemas.contains_key(&key) {
            return Err(Error::AlreadyRegistered(type_name::<E>()));
        }

        tracing::debug!(entity = schema.entity(), table = schema.table(), "registering entity");
        self.schemas.insert(
            key,
            Registration {
                entity: schema.entity(),
                table: schema.table(),
                schema: Arc::new(schema),
            },
        );
        Ok(self)
    }

    /// Build and register the schema of an [`Entity`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] if the entity's schema is invalid or
    /// [`Error::AlreadyRegistered`] if it is already present.
    pub fn register_entity<E: Entity>(&mut self) -> Result<&mut Self> {
        self.register(E::schema()?)
    }

    /// Freeze the collected schemas.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            schemas: self.schemas,
        }
    }
}
