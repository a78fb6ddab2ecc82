//! ServerBuilder for fluent API to build HTTP servers

use super::entity_registry::{EntityDescriptor, EntityRegistry, QueryEntityDescriptor};
use super::rest;
use crate::config::QueryConfig;
use crate::core::conversion::ConversionService;
use crate::core::dispatcher::{QueryDispatcher, QueryEngine};
use crate::core::entity::Entity;
use crate::core::field::{FieldType, FieldValue};
use crate::core::metadata::{EntityMetadata, MetadataRegistry};
use crate::core::repository::Repository;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

type DescriptorFactory = Box<dyn FnOnce(Arc<QueryEngine>) -> Box<dyn EntityDescriptor> + Send>;

/// Builder for creating HTTP servers with auto-registered query routes
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(QueryConfig::from_yaml_file("sieve.yaml")?)
///     .register_entity::<Subject>(InMemoryRepository::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: QueryConfig,
    registry: MetadataRegistry,
    conversion: ConversionService,
    factories: Vec<DescriptorFactory>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            config: QueryConfig::default(),
            registry: MetadataRegistry::new(),
            conversion: ConversionService::new(),
            factories: Vec::new(),
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the conversion service
    pub fn with_conversion(mut self, conversion: ConversionService) -> Self {
        self.conversion = conversion;
        self
    }

    /// Register a converter for an application-defined type
    pub fn with_converter(
        mut self,
        target: FieldType,
        converter: impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + 'static,
    ) -> Self {
        self.conversion.register(target, converter);
        self
    }

    /// Register metadata for a type that is only reachable as a nested reference
    pub fn with_metadata(mut self, metadata: EntityMetadata) -> Self {
        self.registry.register(metadata);
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Register an entity type and the repository that stores it
    ///
    /// The entity's own metadata is registered immediately; tables from the
    /// configuration replace it at build time.
    pub fn register_entity<T: Entity>(mut self, repository: impl Repository<T> + 'static) -> Self {
        self.registry.register(T::metadata());
        let repository: Arc<dyn Repository<T>> = Arc::new(repository);
        self.factories.push(Box::new(move |engine| {
            Box::new(QueryEntityDescriptor::new(QueryDispatcher::new(
                engine, repository,
            )))
        }));
        self
    }

    /// Build the shared engine and the entity registry
    fn build_parts(self) -> (Arc<QueryEngine>, EntityRegistry, Vec<Router>) {
        let mut registry = self.registry;
        self.config.merge_into(&mut registry);

        let engine = Arc::new(QueryEngine::new(
            Arc::new(registry),
            self.conversion,
            self.config,
        ));

        let mut entity_registry = EntityRegistry::new();
        for factory in self.factories {
            entity_registry.register(factory(engine.clone()));
        }

        (engine, entity_registry, self.custom_routes)
    }

    /// Build the shared query engine without any routes
    pub fn build_engine(self) -> Arc<QueryEngine> {
        self.build_parts().0
    }

    /// Build the final REST router
    ///
    /// This generates:
    /// - GET /{plural}, /{plural}/distinct and /{plural}/one for all registered entities
    /// - health routes
    /// - custom routes
    pub fn build(self) -> Result<Router> {
        self.config.validate()?;
        let (_engine, entity_registry, custom_routes) = self.build_parts();
        tracing::info!(
            entities = ?entity_registry.entity_types(),
            routes = ?entity_registry.route_paths(),
            "built query router"
        );
        Ok(rest::build_router(&entity_registry, custom_routes).layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
