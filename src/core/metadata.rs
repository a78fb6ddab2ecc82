//! Declarative entity metadata
//!
//! Each entity type publishes a static table of its fields: declared type,
//! whether it can be queried, the aliases it answers to, and an optional
//! reference to a nested entity type whose fields are exposed under a
//! relation prefix. Tables are built once at startup (builder API or YAML)
//! and only read afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::field::FieldType;
use crate::core::predicate::Operator;

/// An alternate public name for a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasDescriptor {
    /// Public parameter name
    pub name: String,
    /// Target field, when different from the declaring field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Operator applied when filtering through this alias (default EQUALS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
}

impl AliasDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
            operator: None,
        }
    }

    pub fn targeting(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }
}

/// Reference from a field to another entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedReference {
    /// Referenced entity type
    pub entity_type: String,
    /// Prefix for the nested parameters (default: the field name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

/// Metadata for one declared field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Declared type, or element type for containers
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub container: bool,
    /// Excluded from querying under any name
    #[serde(default)]
    pub ignored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<NestedReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<AliasDescriptor>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            container: false,
            ignored: false,
            nested: None,
            aliases: Vec::new(),
        }
    }

    /// A multi-valued field whose elements have `element_type`
    pub fn container(name: impl Into<String>, element_type: FieldType) -> Self {
        Self {
            container: true,
            ..Self::new(name, element_type)
        }
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub fn alias(mut self, alias: AliasDescriptor) -> Self {
        self.aliases.push(alias);
        self
    }

    /// Expose the fields of `entity_type` under this field's name
    pub fn nested(mut self, entity_type: impl Into<String>) -> Self {
        self.nested = Some(NestedReference {
            entity_type: entity_type.into(),
            relation: None,
        });
        self
    }

    /// Expose the fields of `entity_type` under `relation`
    pub fn nested_as(
        mut self,
        entity_type: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        self.nested = Some(NestedReference {
            entity_type: entity_type.into(),
            relation: Some(relation.into()),
        });
        self
    }

    /// The field an alias resolves to
    pub fn alias_target<'a>(&'a self, alias: &'a AliasDescriptor) -> &'a str {
        alias.field.as_deref().unwrap_or(&self.name)
    }
}

/// The field table of one entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub entity_type: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl EntityMetadata {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field; declaration order is preserved
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Metadata tables for every known entity type
///
/// Populated at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    tables: HashMap<String, Arc<EntityMetadata>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Register a table; a later table for the same type replaces the earlier one
    pub fn register(&mut self, metadata: EntityMetadata) {
        self.tables
            .insert(metadata.entity_type.clone(), Arc::new(metadata));
    }

    pub fn with(mut self, metadata: EntityMetadata) -> Self {
        self.register(metadata);
        self
    }

    pub fn get(&self, entity_type: &str) -> Option<Arc<EntityMetadata>> {
        self.tables.get(entity_type).cloned()
    }

    pub fn entity_types(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }
}
