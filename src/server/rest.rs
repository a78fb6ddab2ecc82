//! REST exposure: query handlers and the top-level router

use axum::extract::State;
use axum::http::Uri;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::core::dispatcher::{QueryDispatcher, QueryRequest, QueryResponse};
use crate::core::entity::Entity;
use crate::core::error::QueryError;
use crate::server::entity_registry::EntityRegistry;

/// Routes for one entity type:
/// - GET /{plural}
/// - GET /{plural}/distinct
/// - GET /{plural}/one
pub fn entity_routes<T: Entity>(plural: &str, dispatcher: QueryDispatcher<T>) -> Router {
    Router::new()
        .route(&format!("/{}", plural), get(find_entities::<T>))
        .route(&format!("/{}/distinct", plural), get(find_distinct::<T>))
        .route(&format!("/{}/one", plural), get(find_one::<T>))
        .with_state(dispatcher)
}

fn query_request(uri: &Uri) -> QueryRequest {
    QueryRequest::new(uri.path(), uri.query().unwrap_or_default())
}

/// GET /{plural}
pub async fn find_entities<T: Entity>(
    State(dispatcher): State<QueryDispatcher<T>>,
    uri: Uri,
) -> Result<QueryResponse, QueryError> {
    dispatcher.resolve(&query_request(&uri)).await
}

/// GET /{plural}/distinct?field=...
pub async fn find_distinct<T: Entity>(
    State(dispatcher): State<QueryDispatcher<T>>,
    uri: Uri,
) -> Result<QueryResponse, QueryError> {
    dispatcher.resolve_distinct(&query_request(&uri)).await
}

/// GET /{plural}/one
pub async fn find_one<T: Entity>(
    State(dispatcher): State<QueryDispatcher<T>>,
    uri: Uri,
) -> Result<QueryResponse, QueryError> {
    dispatcher.resolve_one(&query_request(&uri)).await
}

/// Merge health, entity and custom routes
pub fn build_router(registry: &EntityRegistry, custom_routes: Vec<Router>) -> Router {
    let mut app = health_routes().merge(registry.build_routes());
    for custom in custom_routes {
        app = app.merge(custom);
    }
    app
}

fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sieve"
    }))
}
