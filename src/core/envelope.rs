//! Response envelopes and field projection

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::core::repository::Page;

/// A navigation link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub number: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<T> From<&Page<T>> for PageMetadata {
    fn from(page: &Page<T>) -> Self {
        Self {
            number: page.number,
            size: page.size,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
        }
    }
}

/// Rendered result body before wrapping
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Single(Value),
    Collection(Vec<Value>),
    Page {
        content: Vec<Value>,
        page: PageMetadata,
    },
}

impl Payload {
    pub fn content(&self) -> Vec<&Value> {
        match self {
            Payload::Single(v) => vec![v],
            Payload::Collection(items) | Payload::Page { content: items, .. } => {
                items.iter().collect()
            }
        }
    }

    pub fn page(&self) -> Option<&PageMetadata> {
        match self {
            Payload::Page { page, .. } => Some(page),
            _ => None,
        }
    }
}

/// Caller-selected fields to keep or drop
///
/// When both lists are given only `include` is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldProjection {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl FieldProjection {
    pub fn new<I, E, A, B>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = A>,
        E: IntoIterator<Item = B>,
        A: Into<String>,
        B: Into<String>,
    {
        let clean = |names: Vec<String>| -> Vec<String> {
            names
                .into_iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        };
        Self {
            include: clean(include.into_iter().map(Into::into).collect()),
            exclude: clean(exclude.into_iter().map(Into::into).collect()),
        }
    }

    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(fields, Vec::<String>::new())
    }

    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Vec::<String>::new(), fields)
    }

    pub fn is_identity(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Filter one serialized entity; non-objects pass through
    pub fn apply(&self, value: Value) -> Value {
        let Value::Object(object) = value else {
            return value;
        };
        if !self.include.is_empty() {
            let kept: Map<String, Value> = object
                .into_iter()
                .filter(|(k, _)| self.include.iter().any(|f| f == k))
                .collect();
            return Value::Object(kept);
        }
        let kept: Map<String, Value> = object
            .into_iter()
            .filter(|(k, _)| !self.exclude.iter().any(|f| f == k))
            .collect();
        Value::Object(kept)
    }

    /// Filter every element of a payload, leaving page metadata untouched
    pub fn project(&self, payload: Payload) -> Payload {
        if self.is_identity() {
            return payload;
        }
        match payload {
            Payload::Single(v) => Payload::Single(self.apply(v)),
            Payload::Collection(items) => {
                Payload::Collection(items.into_iter().map(|v| self.apply(v)).collect())
            }
            Payload::Page { content, page } => Payload::Page {
                content: content.into_iter().map(|v| self.apply(v)).collect(),
                page,
            },
        }
    }
}

/// Payload plus optional navigation links
///
/// `links == None` means hypermedia is off for this response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    pub payload: Payload,
    pub links: Option<Vec<Link>>,
}

impl ResultEnvelope {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            links: None,
        }
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = Some(links);
        self
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.as_ref()?.iter().find(|l| l.rel == rel)
    }

    /// Render to the wire shape
    ///
    /// - collection: `{content, links}`, or a bare array without links
    /// - page: `{content, links, page}`, `links` omitted without links
    /// - single: the object itself with a `links` member
    pub fn to_json(&self) -> Value {
        let links = self.links.as_ref().map(|l| json!(l));
        match (&self.payload, links) {
            (Payload::Single(v), Some(links)) => match v.clone() {
                Value::Object(mut object) => {
                    object.insert("links".to_string(), links);
                    Value::Object(object)
                }
                other => json!({ "content": other, "links": links }),
            },
            (Payload::Single(v), None) => v.clone(),
            (Payload::Collection(items), Some(links)) => {
                json!({ "content": items, "links": links })
            }
            (Payload::Collection(items), None) => json!(items),
            (Payload::Page { content, page }, Some(links)) => {
                json!({ "content": content, "links": links, "page": page })
            }
            (Payload::Page { content, page }, None) => {
                json!({ "content": content, "page": page })
            }
        }
    }
}

impl Serialize for ResultEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
