//! Entity trait: the queryable model types served by a repository

use serde::Serialize;
use serde_json::Value;

use crate::core::field::FieldValue;
use crate::core::metadata::EntityMetadata;

/// Base trait for all queryable entities.
///
/// An entity publishes its metadata table statically. Field access for
/// predicate evaluation goes through the serialized JSON form by default,
/// so a plain `#[derive(Serialize)]` struct only needs the three names.
///
/// ```rust,ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Subject { id: i64, name: String, species: String }
///
/// impl Entity for Subject {
///     fn entity_type() -> &'static str { "subject" }
///     fn resource_name() -> &'static str { "subjects" }
///     fn metadata() -> EntityMetadata {
///         EntityMetadata::new("subject")
///             .field(FieldDescriptor::new("id", FieldType::Long))
///             .field(FieldDescriptor::new("name", FieldType::String)
///                 .alias(AliasDescriptor::new("label")))
///             .field(FieldDescriptor::new("species", FieldType::String))
///     }
/// }
/// ```
pub trait Entity: Serialize + Clone + Send + Sync + 'static {
    /// The entity type name used as the metadata key (e.g., "subject")
    fn entity_type() -> &'static str;

    /// The plural resource name used in URLs (e.g., "subjects")
    fn resource_name() -> &'static str;

    /// The declared field table
    fn metadata() -> EntityMetadata;

    /// Serialized form used for rendering and projection
    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Values stored at a dotted field path
    ///
    /// Arrays along the path contribute one value per element. A null or
    /// missing field yields no values.
    fn field_values(&self, path: &str) -> Vec<FieldValue> {
        values_at(&self.to_json(), path)
    }
}

/// Resolve a dotted path against a JSON document
pub fn values_at(document: &Value, path: &str) -> Vec<FieldValue> {
    let mut current: Vec<&Value> = vec![document];
    for segment in path.split('.') {
        current = current
            .into_iter()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .filter_map(|v| v.get(segment))
            .collect();
    }

    let mut values = Vec::new();
    for v in current {
        match v {
            Value::Null => {}
            Value::Array(items) => values.extend(
                items
                    .iter()
                    .filter(|i| !i.is_null())
                    .map(FieldValue::from_json),
            ),
            other => values.push(FieldValue::from_json(other)),
        }
    }
    values
}
