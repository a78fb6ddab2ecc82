//! Shared test harness for repository backend testing
//!
//! Provides `Subject` and `Study` fixtures implementing `Entity`, their
//! metadata tables, and helper functions for building predicates and
//! engines.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

pub mod repository_tests;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use sieve::config::QueryConfig;
use sieve::core::conversion::ConversionService;
use sieve::core::dispatcher::QueryEngine;
use sieve::core::entity::Entity;
use sieve::core::field::{FieldType, FieldValue};
use sieve::core::metadata::{AliasDescriptor, EntityMetadata, FieldDescriptor, MetadataRegistry};
use sieve::core::predicate::{Operator, Predicate, PredicateValue};

// ---------------------------------------------------------------------------
// Study: referenced from Subject as a nested entity
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: i64,
    pub name: String,
    pub year: i64,
    pub active: bool,
    pub notes: Option<String>,
}

impl Entity for Study {
    fn entity_type() -> &'static str {
        "study"
    }

    fn resource_name() -> &'static str {
        "studies"
    }

    fn metadata() -> EntityMetadata {
        EntityMetadata::new("study")
            .field(FieldDescriptor::new("id", FieldType::Long))
            .field(FieldDescriptor::new("name", FieldType::String))
            .field(
                FieldDescriptor::new("year", FieldType::Integer).alias(
                    AliasDescriptor::new("sinceYear").with_operator(Operator::GreaterThanEquals),
                ),
            )
            .field(FieldDescriptor::new("active", FieldType::Boolean))
            .field(FieldDescriptor::new("notes", FieldType::String).ignored())
    }
}

// ---------------------------------------------------------------------------
// Subject: the primary fixture
// ---------------------------------------------------------------------------

/// Fields:
/// - `id`: long
/// - `name`: string, alias `label`
/// - `species`: string
/// - `aliases`: container of strings, alias `alias`
/// - `notes`: optional string (null testing)
/// - `study`: embedded study, exposed as `study.*`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub species: String,
    pub aliases: Vec<String>,
    pub notes: Option<String>,
    pub study: Study,
}

impl Entity for Subject {
    fn entity_type() -> &'static str {
        "subject"
    }

    fn resource_name() -> &'static str {
        "subjects"
    }

    fn metadata() -> EntityMetadata {
        EntityMetadata::new("subject")
            .field(FieldDescriptor::new("id", FieldType::Long))
            .field(
                FieldDescriptor::new("name", FieldType::String)
                    .alias(AliasDescriptor::new("label")),
            )
            .field(FieldDescriptor::new("species", FieldType::String))
            .field(
                FieldDescriptor::container("aliases", FieldType::String)
                    .alias(AliasDescriptor::new("alias")),
            )
            .field(FieldDescriptor::new("notes", FieldType::String))
            .field(FieldDescriptor::new("study", FieldType::Long).nested("study"))
    }
}

// ---------------------------------------------------------------------------
// Helper functions: fixture creation
// ---------------------------------------------------------------------------

pub fn study(id: i64, name: &str, year: i64, active: bool) -> Study {
    Study {
        id,
        name: name.to_string(),
        year,
        active,
        notes: None,
    }
}

pub fn subject(id: i64, name: &str, species: &str, aliases: &[&str], study: Study) -> Subject {
    Subject {
        id,
        name: name.to_string(),
        species: species.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        notes: None,
        study,
    }
}

/// Five subjects with ids 1..=5 in ascending order; subject 4 is named "MCF7"
pub fn sample_subjects() -> Vec<Subject> {
    let tcga = study(1, "TCGA", 2006, true);
    let ccle = study(2, "CCLE", 2012, false);
    vec![
        subject(1, "A375", "human", &["A-375"], tcga.clone()),
        subject(2, "HeLa", "human", &["HELA", "Hela-S3"], tcga.clone()),
        Subject {
            notes: Some("murine line".to_string()),
            ..subject(3, "B16", "mouse", &[], ccle.clone())
        },
        subject(4, "MCF7", "human", &["MCF-7"], ccle.clone()),
        subject(5, "T47D", "human", &["T-47D"], tcga),
    ]
}

pub fn sample_studies() -> Vec<Study> {
    vec![
        study(1, "TCGA", 2006, true),
        study(2, "CCLE", 2012, false),
        study(3, "GDSC", 2013, true),
    ]
}

pub fn test_registry() -> Arc<MetadataRegistry> {
    Arc::new(
        MetadataRegistry::new()
            .with(Subject::metadata())
            .with(Study::metadata()),
    )
}

pub fn test_engine() -> Arc<QueryEngine> {
    test_engine_with(QueryConfig::default())
}

pub fn test_engine_with(config: QueryConfig) -> Arc<QueryEngine> {
    Arc::new(QueryEngine::new(
        test_registry(),
        ConversionService::new(),
        config,
    ))
}

// ---------------------------------------------------------------------------
// Helper functions: predicates
// ---------------------------------------------------------------------------

pub fn string(s: &str) -> FieldValue {
    FieldValue::String(s.to_string())
}

pub fn int(i: i64) -> FieldValue {
    FieldValue::Integer(i)
}

pub fn single(field: &str, operator: Operator, value: FieldValue) -> Predicate {
    Predicate::new(field, operator, PredicateValue::Single(value)).unwrap()
}

pub fn pair(field: &str, operator: Operator, lo: FieldValue, hi: FieldValue) -> Predicate {
    Predicate::new(field, operator, PredicateValue::Pair(lo, hi)).unwrap()
}

pub fn list(field: &str, values: Vec<FieldValue>) -> Predicate {
    Predicate::new(field, Operator::In, PredicateValue::List(values)).unwrap()
}

pub fn flag(field: &str, operator: Operator) -> Predicate {
    Predicate::new(field, operator, PredicateValue::Flag(true)).unwrap()
}

// ---------------------------------------------------------------------------
// Assertions helpers
// ---------------------------------------------------------------------------

pub fn ids(subjects: &[Subject]) -> Vec<i64> {
    subjects.iter().map(|s| s.id).collect()
}

/// Assert that a list contains exactly `n` entities.
pub fn assert_count<T>(list: &[T], expected: usize) {
    assert_eq!(
        list.len(),
        expected,
        "Expected {} items, got {}",
        expected,
        list.len()
    );
}
