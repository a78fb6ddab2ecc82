//! Core module containing the query resolution engine

pub mod conversion;
pub mod criteria;
pub mod dispatcher;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod field;
pub mod introspect;
pub mod metadata;
pub mod predicate;
pub mod repository;
pub mod sort;

pub use conversion::{ConversionService, Converter};
pub use criteria::{CriteriaBuilder, RawParams};
pub use dispatcher::{
    FindBranch, QueryBranch, QueryDispatcher, QueryEngine, QueryRequest, QueryResponse,
};
pub use entity::Entity;
pub use envelope::{FieldProjection, Link, PageMetadata, Payload, ResultEnvelope};
pub use error::{ConversionError, ErrorResponse, QueryError};
pub use field::{FieldType, FieldValue};
pub use introspect::{Introspector, ParameterMap, QueryParameterDescriptor};
pub use metadata::{
    AliasDescriptor, EntityMetadata, FieldDescriptor, MetadataRegistry, NestedReference,
};
pub use predicate::{Arity, Operator, Predicate, PredicateValue};
pub use repository::{Page, Repository};
pub use sort::{Direction, PageRequest, Sort, SortOrder};
