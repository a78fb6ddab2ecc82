//! Queryable-parameter introspection with a per-type cache

use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::field::FieldType;
use crate::core::metadata::{EntityMetadata, MetadataRegistry};
use crate::core::predicate::Operator;

/// How one public parameter name resolves against an entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParameterDescriptor {
    /// Name the caller uses
    pub param_name: String,
    /// Storage field (dotted path for nested fields)
    pub field_name: String,
    pub field_type: FieldType,
    pub operator: Operator,
}

impl QueryParameterDescriptor {
    pub fn new(
        param_name: impl Into<String>,
        field_name: impl Into<String>,
        field_type: FieldType,
        operator: Operator,
    ) -> Self {
        Self {
            param_name: param_name.into(),
            field_name: field_name.into(),
            field_type,
            operator,
        }
    }
}

/// Public parameter name → descriptor, in registration order
pub type ParameterMap = IndexMap<String, QueryParameterDescriptor>;

/// Resolves entity metadata into parameter maps, caching one map per type
///
/// The cache is populated lazily. Concurrent first lookups of one type may
/// each compute a map, but only the first to publish is kept and every
/// caller receives that same shared map.
#[derive(Debug)]
pub struct Introspector {
    registry: Arc<MetadataRegistry>,
    cache: RwLock<HashMap<String, Arc<ParameterMap>>>,
}

impl Introspector {
    pub fn new(registry: Arc<MetadataRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Parameter map for `entity_type`
    ///
    /// An unregistered type yields an empty map.
    pub fn describe(&self, entity_type: &str) -> Result<Arc<ParameterMap>> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
            if let Some(map) = cache.get(entity_type) {
                return Ok(map.clone());
            }
        }

        let computed = Arc::new(match self.registry.get(entity_type) {
            Some(metadata) => self.describe_metadata(&metadata, true),
            None => ParameterMap::new(),
        });

        let mut cache = self
            .cache
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        let published = cache
            .entry(entity_type.to_string())
            .or_insert(computed)
            .clone();
        tracing::debug!(
            entity_type,
            parameters = published.len(),
            "introspected queryable parameters"
        );
        Ok(published)
    }

    /// Build the parameter map for one metadata table without caching
    ///
    /// Nested references are followed only when `recursive` is set, and the
    /// nested table is always read non-recursively, so expansion stops one
    /// level deep. In non-recursive mode a referencing field keeps its plain
    /// name but none of its aliases.
    pub fn describe_metadata(&self, metadata: &EntityMetadata, recursive: bool) -> ParameterMap {
        let mut map = ParameterMap::new();

        for field in &metadata.fields {
            if field.ignored {
                continue;
            }

            map.insert(
                field.name.clone(),
                QueryParameterDescriptor::new(
                    &field.name,
                    &field.name,
                    field.field_type.clone(),
                    Operator::Equals,
                ),
            );

            if let Some(nested) = &field.nested {
                // A reference inside a nested table contributes only its own name.
                if !recursive {
                    continue;
                }
                let relation = nested.relation.as_deref().unwrap_or(&field.name);
                if let Some(nested_meta) = self.registry.get(&nested.entity_type) {
                    for descriptor in self.describe_metadata(&nested_meta, false).into_values() {
                        let param_name = format!("{}.{}", relation, descriptor.param_name);
                        let field_name = format!("{}.{}", relation, descriptor.field_name);
                        map.insert(
                            param_name.clone(),
                            QueryParameterDescriptor {
                                param_name,
                                field_name,
                                ..descriptor
                            },
                        );
                    }
                }
            }

            for alias in &field.aliases {
                map.insert(
                    alias.name.clone(),
                    QueryParameterDescriptor::new(
                        &alias.name,
                        field.alias_target(alias),
                        field.field_type.clone(),
                        alias.operator.unwrap_or(Operator::Equals),
                    ),
                );
            }
        }

        map
    }
}
