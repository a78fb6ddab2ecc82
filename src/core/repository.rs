//! Repository contract consumed by the dispatcher

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::core::entity::Entity;
use crate::core::field::FieldValue;
use crate::core::predicate::Predicate;
use crate::core::sort::{PageRequest, Sort};

/// One page of results with total-count metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Zero-based page index
    pub number: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: usize) -> Self {
        let total_pages = if request.size == 0 {
            0
        } else {
            total_elements.div_ceil(request.size)
        };
        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0 && self.total_pages > 0
    }

    pub fn has_next(&self) -> bool {
        self.number
            .checked_add(1)
            .is_some_and(|next| next < self.total_pages)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Storage contract for one entity type
///
/// Predicates within one call combine with logical AND and follow the
/// evaluation of [`Predicate::matches`] exactly.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// All entities matching every predicate
    async fn find(&self, predicates: &[Predicate]) -> Result<Vec<T>>;

    /// One page of matching entities, ordered by `request.sort`
    async fn find_paged(&self, predicates: &[Predicate], request: &PageRequest) -> Result<Page<T>>;

    /// All matching entities, ordered by `sort`
    async fn find_sorted(&self, predicates: &[Predicate], sort: &Sort) -> Result<Vec<T>>;

    /// Distinct non-null values stored at `field` among matching entities, ascending
    async fn find_distinct(&self, field: &str, predicates: &[Predicate]) -> Result<Vec<FieldValue>>;

    async fn insert(&self, entity: T) -> Result<T>;

    async fn insert_all(&self, entities: Vec<T>) -> Result<Vec<T>> {
        let mut inserted = Vec::with_capacity(entities.len());
        for entity in entities {
            inserted.push(self.insert(entity).await?);
        }
        Ok(inserted)
    }

    async fn count(&self, predicates: &[Predicate]) -> Result<usize> {
        Ok(self.find(predicates).await?.len())
    }

    async fn delete_all(&self) -> Result<()>;
}
