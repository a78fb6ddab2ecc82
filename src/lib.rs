//! # Sieve
//!
//! Metadata-driven query criteria resolution for entity REST APIs.
//!
//! ## Features
//!
//! - **Declarative metadata**: per-field types, aliases, operator overrides,
//!   ignored fields and one-level nested-entity flattening
//! - **Typed predicates**: raw string parameters become typed, operator-tagged
//!   predicates over a closed set of 18 operators
//! - **Pluggable storage**: any backend implementing [`Repository`](core::Repository);
//!   an in-memory reference backend is included
//! - **Paging, sorting and projection**: `page`, `size`, `sort`, `fields` and
//!   `exclude` reserved parameters, with alias-aware sort keys
//! - **REST exposure**: axum routes per entity with typed error responses
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sieve::prelude::*;
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Subject {
//!     id: i64,
//!     name: String,
//!     species: String,
//! }
//!
//! impl Entity for Subject {
//!     fn entity_type() -> &'static str { "subject" }
//!     fn resource_name() -> &'static str { "subjects" }
//!     fn metadata() -> EntityMetadata {
//!         EntityMetadata::new("subject")
//!             .field(FieldDescriptor::new("id", FieldType::Long))
//!             .field(FieldDescriptor::new("name", FieldType::String)
//!                 .alias(AliasDescriptor::new("label")))
//!             .field(FieldDescriptor::new("species", FieldType::String))
//!     }
//! }
//!
//! // GET /subjects?label=MCF7&sort=id,desc&page=0&size=20
//! ServerBuilder::new()
//!     .register_entity::<Subject>(InMemoryRepository::new())
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        AliasDescriptor, ConversionError, ConversionService, CriteriaBuilder, Direction, Entity,
        EntityMetadata, FieldDescriptor, FieldProjection, FieldType, FieldValue, Introspector,
        Link, MetadataRegistry, Operator, Page, PageRequest, Predicate, PredicateValue,
        QueryBranch, QueryDispatcher, QueryEngine, QueryError, QueryParameterDescriptor,
        QueryRequest, QueryResponse, RawParams, Repository, ResultEnvelope, Sort, SortOrder,
    };

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryRepository;

    // === Config ===
    pub use crate::config::{PagingConfig, QueryConfig};

    // === Server ===
    pub use crate::server::{EntityDescriptor, EntityRegistry, ServerBuilder, init_tracing};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
}
