//! Request resolution: branch selection, criteria, repository call, envelope
//!
//! A request is classified once by its reserved control parameters:
//!
//! - `page` or `size` present: paged find
//! - otherwise `sort` present: sorted find
//! - otherwise: plain find
//!
//! Distinct and find-one requests have their own entry points and reserve a
//! smaller set of parameters.
//!
//! Every predicate is built before the repository is called, so a caller
//! fault never reaches the backend.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::config::{
    EXCLUDE_PARAM, FIELD_PARAM, FIELDS_PARAM, HAL_PARAM, PAGE_PARAM, QueryConfig, SIZE_PARAM,
    SORT_PARAM,
};
use crate::core::conversion::ConversionService;
use crate::core::criteria::{CriteriaBuilder, RawParams};
use crate::core::entity::Entity;
use crate::core::envelope::{FieldProjection, Link, PageMetadata, Payload, ResultEnvelope};
use crate::core::error::{ConversionError, QueryError};
use crate::core::field::{FieldType, FieldValue};
use crate::core::introspect::Introspector;
use crate::core::metadata::{EntityMetadata, MetadataRegistry};
use crate::core::predicate::Predicate;
use crate::core::repository::Repository;
use crate::core::sort::{PageRequest, Sort, remap};

/// One inbound query call
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Request path, used for links
    pub path: String,
    /// Original query string without the leading `?`
    pub query_string: String,
    pub params: RawParams,
}

impl QueryRequest {
    /// Build from a path and its raw query string
    pub fn new(path: impl Into<String>, query_string: impl Into<String>) -> Self {
        let query_string = query_string.into();
        let query_string = query_string.trim_start_matches('?').to_string();
        Self {
            path: path.into(),
            params: RawParams::parse_query(&query_string),
            query_string,
        }
    }

    /// Build from already-split parameters; the query string is re-encoded
    pub fn from_pairs<I, K, V>(path: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let query_string = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        Self {
            path: path.into(),
            params: RawParams::from_pairs(pairs),
            query_string,
        }
    }

    /// `path?query`, or just the path when there is no query
    pub fn self_href(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }

    /// This request's href with the `page` parameter set to `page`
    pub fn page_href(&self, page: usize) -> String {
        let mut replaced = false;
        let mut pairs: Vec<String> = Vec::new();
        for pair in self.query_string.split('&').filter(|p| !p.is_empty()) {
            let name = pair.split_once('=').map(|(k, _)| k).unwrap_or(pair);
            if name == PAGE_PARAM {
                if !replaced {
                    pairs.push(format!("{}={}", PAGE_PARAM, page));
                    replaced = true;
                }
            } else {
                pairs.push(pair.to_string());
            }
        }
        if !replaced {
            pairs.push(format!("{}={}", PAGE_PARAM, page));
        }
        format!("{}?{}", self.path, pairs.join("&"))
    }
}

/// The repository operation a request resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryBranch {
    Plain,
    Sorted,
    Paged,
    Distinct,
    One,
}

/// Shape of a find request, chosen by its reserved parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindBranch {
    Plain,
    Sorted,
    Paged,
}

impl FindBranch {
    /// Classify a find request by its reserved parameters
    pub fn classify(params: &RawParams) -> Self {
        if params.contains(PAGE_PARAM) || params.contains(SIZE_PARAM) {
            FindBranch::Paged
        } else if params.contains(SORT_PARAM) {
            FindBranch::Sorted
        } else {
            FindBranch::Plain
        }
    }
}

impl From<FindBranch> for QueryBranch {
    fn from(branch: FindBranch) -> Self {
        match branch {
            FindBranch::Plain => QueryBranch::Plain,
            FindBranch::Sorted => QueryBranch::Sorted,
            FindBranch::Paged => QueryBranch::Paged,
        }
    }
}

/// Resolved response: status, chosen branch and the envelope to render
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub status: StatusCode,
    pub branch: QueryBranch,
    pub envelope: ResultEnvelope,
}

impl IntoResponse for QueryResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// Shared, entity-independent query machinery
#[derive(Debug)]
pub struct QueryEngine {
    introspector: Introspector,
    conversion: ConversionService,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(
        registry: Arc<MetadataRegistry>,
        conversion: ConversionService,
        config: QueryConfig,
    ) -> Self {
        Self {
            introspector: Introspector::new(registry),
            conversion,
            config,
        }
    }

    pub fn introspector(&self) -> &Introspector {
        &self.introspector
    }

    pub fn conversion(&self) -> &ConversionService {
        &self.conversion
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Build the predicates for one entity type from non-reserved parameters
    pub fn criteria(
        &self,
        entity_type: &str,
        reserved: &[String],
        params: &RawParams,
    ) -> Result<Vec<Predicate>, QueryError> {
        let param_map = self
            .introspector
            .describe(entity_type)
            .map_err(QueryError::Backend)?;
        CriteriaBuilder::new(&self.conversion).build(&param_map, reserved, params)
    }

    fn links_enabled(&self, params: &RawParams) -> Result<bool, QueryError> {
        match params.first(HAL_PARAM) {
            None => Ok(self.config.links_by_default),
            Some(raw) => match self.conversion.convert(raw, &FieldType::Boolean) {
                Ok(FieldValue::Boolean(b)) => Ok(b),
                Ok(_) => Ok(self.config.links_by_default),
                Err(e) => Err(QueryError::conversion(HAL_PARAM, e)),
            },
        }
    }

    fn page_request(&self, params: &RawParams, sort: Sort) -> Result<PageRequest, QueryError> {
        let page = match params.first(PAGE_PARAM) {
            Some(raw) => parse_index(PAGE_PARAM, raw)?,
            None => 0,
        };
        let size = match params.first(SIZE_PARAM) {
            Some(raw) => self.config.clamp_page_size(parse_index(SIZE_PARAM, raw)?),
            None => self.config.paging.default_page_size,
        };
        Ok(PageRequest::new(page, size).with_sort(sort))
    }
}

fn parse_index(parameter: &str, raw: &str) -> Result<usize, QueryError> {
    raw.trim().parse::<usize>().map_err(|e| {
        QueryError::conversion(
            parameter,
            ConversionError::new(raw, &FieldType::Integer, e.to_string()),
        )
    })
}

fn field_projection(params: &RawParams) -> FieldProjection {
    FieldProjection::new(params.values(FIELDS_PARAM), params.values(EXCLUDE_PARAM))
}

/// Dispatches query requests for one entity type to its repository
pub struct QueryDispatcher<T: Entity> {
    engine: Arc<QueryEngine>,
    repository: Arc<dyn Repository<T>>,
}

impl<T: Entity> Clone for QueryDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            repository: self.repository.clone(),
        }
    }
}

impl<T: Entity> QueryDispatcher<T> {
    pub fn new(engine: Arc<QueryEngine>, repository: Arc<dyn Repository<T>>) -> Self {
        Self { engine, repository }
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    fn metadata(&self) -> Arc<EntityMetadata> {
        self.engine
            .introspector
            .registry()
            .get(T::entity_type())
            .unwrap_or_else(|| Arc::new(T::metadata()))
    }

    /// Resolve a find request to a plain, sorted or paged repository call
    pub async fn resolve(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        let params = &request.params;
        tracing::info!(
            entity_type = T::entity_type(),
            query = %request.query_string,
            "Generating query criteria for request"
        );

        let branch = FindBranch::classify(params);
        let predicates =
            self.engine
                .criteria(T::entity_type(), &self.engine.config.reserved_find_params(), params)?;
        let links_enabled = self.engine.links_enabled(params)?;
        let projection = field_projection(params);
        let sort = Sort::parse(params.occurrences(SORT_PARAM)).remapped(&self.metadata());
        tracing::debug!(?branch, predicates = predicates.len(), sort = %sort, "resolved query");

        let mut links = vec![Link::new("self", request.self_href())];
        let payload = match branch {
            FindBranch::Paged => {
                let page_request = self.engine.page_request(params, sort)?;
                let page = self
                    .repository
                    .find_paged(&predicates, &page_request)
                    .await
                    .map_err(QueryError::Backend)?;
                if page.has_previous() {
                    links.push(Link::new("prev", request.page_href(page.number - 1)));
                }
                if page.has_next() {
                    let next = request.page_href(page.number.saturating_add(1));
                    links.push(Link::new("next", next));
                }
                let metadata = PageMetadata::from(&page);
                Payload::Page {
                    content: page.content.iter().map(T::to_json).collect(),
                    page: metadata,
                }
            }
            FindBranch::Sorted => {
                let found = self
                    .repository
                    .find_sorted(&predicates, &sort)
                    .await
                    .map_err(QueryError::Backend)?;
                Payload::Collection(found.iter().map(T::to_json).collect())
            }
            FindBranch::Plain => {
                let found = self
                    .repository
                    .find(&predicates)
                    .await
                    .map_err(QueryError::Backend)?;
                Payload::Collection(found.iter().map(T::to_json).collect())
            }
        };

        Ok(respond(
            branch.into(),
            projection.project(payload),
            links_enabled,
            links,
        ))
    }

    /// Resolve a distinct-values request on the reserved `field` parameter
    pub async fn resolve_distinct(
        &self,
        request: &QueryRequest,
    ) -> Result<QueryResponse, QueryError> {
        let params = &request.params;
        let field = match params.first(FIELD_PARAM).map(str::trim) {
            Some(field) if !field.is_empty() => remap(field, &self.metadata()),
            _ => {
                return Err(QueryError::UnknownParameter {
                    parameter: FIELD_PARAM.to_string(),
                });
            }
        };
        tracing::info!(
            entity_type = T::entity_type(),
            field = %field,
            query = %request.query_string,
            "Generating distinct query criteria for request"
        );

        let predicates = self.engine.criteria(
            T::entity_type(),
            &self.engine.config.reserved_distinct_params(),
            params,
        )?;
        let links_enabled = self.engine.links_enabled(params)?;

        let values = self
            .repository
            .find_distinct(&field, &predicates)
            .await
            .map_err(QueryError::Backend)?;
        let payload = Payload::Collection(values.iter().map(FieldValue::to_json).collect());
        let links = vec![Link::new("self", request.self_href())];

        Ok(respond(QueryBranch::Distinct, payload, links_enabled, links))
    }

    /// Resolve a find-one request to the first matching entity
    ///
    /// Only projection and the link toggle are reserved, so `page`, `size`
    /// and `sort` are rejected as unknown filters.
    pub async fn resolve_one(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        let params = &request.params;
        tracing::info!(
            entity_type = T::entity_type(),
            query = %request.query_string,
            "Generating find-one query criteria for request"
        );

        let predicates = self.engine.criteria(
            T::entity_type(),
            &self.engine.config.reserved_one_params(),
            params,
        )?;
        let links_enabled = self.engine.links_enabled(params)?;
        let projection = field_projection(params);

        let found = self
            .repository
            .find(&predicates)
            .await
            .map_err(QueryError::Backend)?;
        let entity = found.first().ok_or_else(|| QueryError::NotFound {
            entity_type: T::entity_type().to_string(),
        })?;
        let payload = projection.project(Payload::Single(entity.to_json()));
        let links = vec![Link::new("self", request.self_href())];

        Ok(respond(QueryBranch::One, payload, links_enabled, links))
    }
}

fn respond(
    branch: QueryBranch,
    payload: Payload,
    links_enabled: bool,
    links: Vec<Link>,
) -> QueryResponse {
    let envelope = ResultEnvelope::new(payload);
    QueryResponse {
        status: StatusCode::OK,
        branch,
        envelope: if links_enabled {
            envelope.with_links(links)
        } else {
            envelope
        },
    }
}
