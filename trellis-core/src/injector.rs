use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::controller::{Controller, ControllerProvider};

/// Typed service locator handed to the [`Platform`](crate::platform::Platform).
///
/// Holds two kinds of entries, both keyed by [`TypeId`]:
///
/// - controller providers, looked up while mounting routes;
/// - shared instances (exception handlers, settings, ...) that adapters
///   fetch with [`get`](Self::get).
pub struct Injector<H> {
    providers: HashMap<TypeId, Arc<ControllerProvider<H>>>,
    instances: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl<H> Injector<H> {
    /// Create an empty injector.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            instances: HashMap::new(),
        }
    }

    /// Register the metadata of a type implementing [`Controller`].
    pub fn add_controller<C: Controller<H>>(&mut self) -> &mut Self {
        self.add_provider(ControllerProvider::of::<C>())
    }

    /// Register an explicitly built provider. A later registration for the
    /// same controller type replaces the earlier one.
    pub fn add_provider(&mut self, provider: ControllerProvider<H>) -> &mut Self {
        if self.providers.contains_key(&provider.type_id()) {
            tracing::debug!(
                controller = provider.class_name(),
                "Replacing previously registered controller provider"
            );
        }
        self.providers.insert(provider.type_id(), Arc::new(provider));
        self
    }

    /// Look up the provider of a controller type.
    pub fn get_provider(&self, type_id: TypeId) -> Option<Arc<ControllerProvider<H>>> {
        self.providers.get(&type_id).cloned()
    }

    /// Typed variant of [`get_provider`](Self::get_provider).
    pub fn get_provider_of<T: 'static>(&self) -> Option<Arc<ControllerProvider<H>>> {
        self.get_provider(TypeId::of::<T>())
    }

    /// Iterate over every registered provider, in no particular order.
    pub fn providers(&self) -> impl Iterator<Item = &Arc<ControllerProvider<H>>> {
        self.providers.values()
    }

    /// Store a shared instance, replacing any previous one of the same type.
    pub fn provide<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.instances.insert(TypeId::of::<T>(), Box::new(value));
        self
    }

    /// Clone a shared instance out of the injector.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.instances
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Whether an instance of `T` was provided.
    pub fn contains<T: 'static>(&self) -> bool {
        self.instances.contains_key(&TypeId::of::<T>())
    }
}

impl<H> Default for Injector<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for Injector<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("provider_count", &self.providers.len())
            .field("instance_count", &self.instances.len())
            .finish()
    }
}
