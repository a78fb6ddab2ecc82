//! In-memory repository for testing and development

use crate::core::entity::Entity;
use crate::core::field::FieldValue;
use crate::core::predicate::Predicate;
use crate::core::repository::{Page, Repository};
use crate::core::sort::{Direction, PageRequest, Sort};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

/// In-memory repository implementation
///
/// Linear scan over insertion order, evaluating each predicate with
/// [`Predicate::matches`]. Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryRepository<T: Entity> {
    entities: Arc<RwLock<Vec<T>>>,
}

impl<T: Entity> InMemoryRepository<T> {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            entities: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a repository pre-loaded with `entities`
    pub fn with_entities(entities: Vec<T>) -> Self {
        Self {
            entities: Arc::new(RwLock::new(entities)),
        }
    }

    fn matching(&self, predicates: &[Predicate]) -> Result<Vec<T>> {
        let entities = self
            .entities
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(entities
            .iter()
            .filter(|entity| matches_all(*entity, predicates))
            .cloned()
            .collect())
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_all<T: Entity>(entity: &T, predicates: &[Predicate]) -> bool {
    predicates
        .iter()
        .all(|p| p.matches(&entity.field_values(p.field())))
}

/// Total order for sorting: absent values first, then typed comparison,
/// then textual comparison for kinds that do not order against each other
fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a
            .compare(b)
            .unwrap_or_else(|| a.to_string().cmp(&b.to_string())),
    }
}

fn sort_entities<T: Entity>(entities: &mut [T], sort: &Sort) {
    if sort.is_unsorted() {
        return;
    }
    let mut keyed: Vec<(Vec<Option<FieldValue>>, T)> = entities
        .iter()
        .map(|e| {
            let keys = sort
                .orders()
                .iter()
                .map(|o| e.field_values(&o.property).into_iter().next())
                .collect();
            (keys, e.clone())
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        for (i, order) in sort.orders().iter().enumerate() {
            let ordering = compare_values(a[i].as_ref(), b[i].as_ref());
            let ordering = match order.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    for (slot, (_, entity)) in entities.iter_mut().zip(keyed) {
        *slot = entity;
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn find(&self, predicates: &[Predicate]) -> Result<Vec<T>> {
        self.matching(predicates)
    }

    async fn find_paged(&self, predicates: &[Predicate], request: &PageRequest) -> Result<Page<T>> {
        let mut found = self.matching(predicates)?;
        sort_entities(&mut found, &request.sort);
        let total = found.len();
        let content = found
            .into_iter()
            .skip(request.offset())
            .take(request.size)
            .collect();
        Ok(Page::new(content, request, total))
    }

    async fn find_sorted(&self, predicates: &[Predicate], sort: &Sort) -> Result<Vec<T>> {
        let mut found = self.matching(predicates)?;
        sort_entities(&mut found, sort);
        Ok(found)
    }

    async fn find_distinct(
        &self,
        field: &str,
        predicates: &[Predicate],
    ) -> Result<Vec<FieldValue>> {
        let mut values: Vec<FieldValue> = self
            .matching(predicates)?
            .iter()
            .flat_map(|e| e.field_values(field))
            .filter(|v| !v.is_null())
            .collect();
        values.sort_by(|a, b| compare_values(Some(a), Some(b)));
        values.dedup_by(|a, b| a == b || a.loosely_equals(b));
        Ok(values)
    }

    async fn insert(&self, entity: T) -> Result<T> {
        let mut entities = self
            .entities
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        entities.push(entity.clone());

        Ok(entity)
    }

    async fn count(&self, predicates: &[Predicate]) -> Result<usize> {
        let entities = self
            .entities
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(entities
            .iter()
            .filter(|entity| matches_all(*entity, predicates))
            .count())
    }

    async fn delete_all(&self) -> Result<()> {
        let mut entities = self
            .entities
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        entities.clear();

        Ok(())
    }
}
