//! Per-entity query route registration
//!
//! Each registered entity type contributes three read-only routes under its
//! resource name. Descriptors are keyed by resource name, so two types that
//! share a plural cannot produce overlapping routes.

use axum::Router;
use std::collections::BTreeMap;

use crate::core::dispatcher::QueryDispatcher;
use crate::core::entity::Entity;
use crate::server::rest;

/// Route source for one entity type
pub trait EntityDescriptor: Send + Sync {
    /// Singular type name used for metadata lookup
    fn entity_type(&self) -> &str;

    /// Resource name used as the route prefix
    fn plural(&self) -> &str;

    /// GET /{plural}, /{plural}/distinct and /{plural}/one
    fn build_routes(&self) -> Router;
}

/// Serves one entity type through its dispatcher
pub struct QueryEntityDescriptor<T: Entity> {
    dispatcher: QueryDispatcher<T>,
}

impl<T: Entity> QueryEntityDescriptor<T> {
    pub fn new(dispatcher: QueryDispatcher<T>) -> Self {
        Self { dispatcher }
    }
}

impl<T: Entity> EntityDescriptor for QueryEntityDescriptor<T> {
    fn entity_type(&self) -> &str {
        T::entity_type()
    }

    fn plural(&self) -> &str {
        T::resource_name()
    }

    fn build_routes(&self) -> Router {
        rest::entity_routes(T::resource_name(), self.dispatcher.clone())
    }
}

/// Query descriptors by resource name
#[derive(Default)]
pub struct EntityRegistry {
    descriptors: BTreeMap<String, Box<dyn EntityDescriptor>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor; a later one with the same resource name wins
    pub fn register(&mut self, descriptor: Box<dyn EntityDescriptor>) {
        let plural = descriptor.plural().to_string();
        if let Some(previous) = self.descriptors.get(&plural) {
            tracing::warn!(
                plural = %plural,
                replaced = previous.entity_type(),
                entity_type = descriptor.entity_type(),
                "resource name already registered, replacing routes"
            );
        } else {
            tracing::debug!(
                plural = %plural,
                entity_type = descriptor.entity_type(),
                "registering query routes"
            );
        }
        self.descriptors.insert(plural, descriptor);
    }

    /// Merge the query routes of every registered entity type
    pub fn build_routes(&self) -> Router {
        self.descriptors
            .values()
            .fold(Router::new(), |router, d| router.merge(d.build_routes()))
    }

    /// Registered entity types, ordered by resource name
    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.values().map(|d| d.entity_type()).collect()
    }

    /// Every query path served, ordered by resource name
    pub fn route_paths(&self) -> Vec<String> {
        self.descriptors
            .keys()
            .flat_map(|plural| {
                [
                    format!("/{}", plural),
                    format!("/{}/distinct", plural),
                    format!("/{}/one", plural),
                ]
            })
            .collect()
    }
}
