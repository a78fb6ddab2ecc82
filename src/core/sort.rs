//! Sort and page requests, and sort-key remapping through aliases

use serde::Serialize;
use std::fmt;

use crate::core::metadata::EntityMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("asc") {
            Some(Direction::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(Direction::Desc)
        } else {
            None
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOrder {
    pub property: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Desc,
        }
    }
}

/// Ordered list of sort keys; earlier keys take priority
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Sort(pub Vec<SortOrder>);

impl Sort {
    pub fn unsorted() -> Self {
        Self(Vec::new())
    }

    pub fn by(orders: impl IntoIterator<Item = SortOrder>) -> Self {
        Self(orders.into_iter().collect())
    }

    pub fn is_unsorted(&self) -> bool {
        self.0.is_empty()
    }

    pub fn orders(&self) -> &[SortOrder] {
        &self.0
    }

    /// Parse `sort` occurrences of the form `a,b,desc`
    ///
    /// A trailing `asc`/`desc` token applies to every property in the same
    /// occurrence. Empty tokens are skipped.
    pub fn parse<S: AsRef<str>>(occurrences: &[S]) -> Self {
        let mut orders = Vec::new();
        for occurrence in occurrences {
            let tokens: Vec<&str> = occurrence
                .as_ref()
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect();
            let (direction, properties) = match tokens.split_last() {
                Some((last, rest)) => match Direction::parse(last) {
                    Some(direction) => (direction, rest),
                    None => (Direction::Asc, tokens.as_slice()),
                },
                None => continue,
            };
            orders.extend(properties.iter().map(|p| SortOrder {
                property: p.to_string(),
                direction,
            }));
        }
        Self(orders)
    }

    /// Rewrite every property through [`remap`]
    pub fn remapped(&self, metadata: &EntityMetadata) -> Self {
        Self(
            self.0
                .iter()
                .map(|order| SortOrder {
                    property: remap(&order.property, metadata),
                    direction: order.direction,
                })
                .collect(),
        )
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .0
            .iter()
            .map(|o| match o.direction {
                Direction::Asc => format!("{} ASC", o.property),
                Direction::Desc => format!("{} DESC", o.property),
            })
            .collect();
        write!(f, "{}", keys.join(", "))
    }
}

/// Zero-based page request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub sort: Sort,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            sort: Sort::unsorted(),
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

/// Storage field for a caller-supplied sort key
///
/// Keys matching an alias resolve to the alias's target field, the same field
/// a filter on that alias addresses. For an alias without an explicit target
/// that is the declaring field. Anything else passes through unchanged.
pub fn remap(sort_key: &str, metadata: &EntityMetadata) -> String {
    for field in &metadata.fields {
        if let Some(alias) = field.aliases.iter().find(|a| a.name == sort_key) {
            let target = field.alias_target(alias);
            tracing::debug!(sort_key, target, "remapped sort key");
            return target.to_string();
        }
    }
    sort_key.to_string()
}
