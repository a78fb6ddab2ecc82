//! Operators and resolved query predicates

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::core::error::QueryError;
use crate::core::field::FieldValue;

/// Number of raw values an operator consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Existence and boolean tests, no value
    Nullary,
    /// One value
    Unary,
    /// An ordered pair
    Binary,
    /// Any number of values
    Variadic,
}

impl Arity {
    /// Minimum number of raw values required
    pub fn min_values(self) -> usize {
        match self {
            Arity::Nullary => 0,
            Arity::Unary | Arity::Variadic => 1,
            Arity::Binary => 2,
        }
    }
}

/// Comparison kinds a predicate can express
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    IsNull,
    NotNull,
    IsTrue,
    IsFalse,
    GreaterThan,
    GreaterThanEquals,
    LessThan,
    LessThanEquals,
    Between,
    Outside,
    BetweenInclusive,
    OutsideInclusive,
    StartsWith,
    EndsWith,
}

impl Operator {
    pub const ALL: [Operator; 18] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::In,
        Operator::NotIn,
        Operator::IsNull,
        Operator::NotNull,
        Operator::IsTrue,
        Operator::IsFalse,
        Operator::GreaterThan,
        Operator::GreaterThanEquals,
        Operator::LessThan,
        Operator::LessThanEquals,
        Operator::Between,
        Operator::Outside,
        Operator::BetweenInclusive,
        Operator::OutsideInclusive,
        Operator::StartsWith,
        Operator::EndsWith,
    ];

    pub fn arity(self) -> Arity {
        match self {
            Operator::IsNull | Operator::NotNull | Operator::IsTrue | Operator::IsFalse => {
                Arity::Nullary
            }
            Operator::In | Operator::NotIn => Arity::Variadic,
            Operator::Between
            | Operator::Outside
            | Operator::BetweenInclusive
            | Operator::OutsideInclusive => Arity::Binary,
            _ => Arity::Unary,
        }
    }

    /// Whether `value` has the payload shape this operator expects
    pub fn accepts(self, value: &PredicateValue) -> bool {
        matches!(
            (self, value),
            (Operator::In, PredicateValue::List(_))
                | (Operator::NotIn, PredicateValue::Raw(_))
                | (
                    Operator::IsNull | Operator::NotNull | Operator::IsTrue | Operator::IsFalse,
                    PredicateValue::Flag(true)
                )
                | (
                    Operator::Between
                        | Operator::Outside
                        | Operator::BetweenInclusive
                        | Operator::OutsideInclusive,
                    PredicateValue::Pair(_, _)
                )
                | (
                    Operator::Equals
                        | Operator::NotEquals
                        | Operator::GreaterThan
                        | Operator::GreaterThanEquals
                        | Operator::LessThan
                        | Operator::LessThanEquals
                        | Operator::StartsWith
                        | Operator::EndsWith,
                    PredicateValue::Single(_)
                )
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Equals => "EQUALS",
            Operator::NotEquals => "NOT_EQUALS",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::IsNull => "IS_NULL",
            Operator::NotNull => "NOT_NULL",
            Operator::IsTrue => "IS_TRUE",
            Operator::IsFalse => "IS_FALSE",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterThanEquals => "GREATER_THAN_EQUALS",
            Operator::LessThan => "LESS_THAN",
            Operator::LessThanEquals => "LESS_THAN_EQUALS",
            Operator::Between => "BETWEEN",
            Operator::Outside => "OUTSIDE",
            Operator::BetweenInclusive => "BETWEEN_INCLUSIVE",
            Operator::OutsideInclusive => "OUTSIDE_INCLUSIVE",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
        };
        f.write_str(name)
    }
}

/// Payload of a predicate, shaped by its operator's arity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredicateValue {
    Single(FieldValue),
    Pair(FieldValue, FieldValue),
    List(Vec<FieldValue>),
    /// Uninterpreted caller strings (`NOT_IN`)
    Raw(Vec<String>),
    /// Fixed marker for value-less operators
    Flag(bool),
}

/// One resolved, typed filter condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    field: String,
    operator: Operator,
    value: PredicateValue,
}

impl Predicate {
    /// Build a predicate, rejecting payloads that do not fit the operator
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value: PredicateValue,
    ) -> Result<Self, QueryError> {
        let field = field.into();
        if !operator.accepts(&value) {
            return Err(QueryError::PayloadMismatch { field, operator });
        }
        Ok(Self {
            field,
            operator,
            value,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &PredicateValue {
        &self.value
    }

    /// Evaluate against the values stored at this predicate's field
    ///
    /// `stored` holds one entry per element for container fields and is
    /// empty when the field is null or absent. Every backend must agree
    /// with this evaluation.
    pub fn matches(&self, stored: &[FieldValue]) -> bool {
        let present: Vec<&FieldValue> = stored.iter().filter(|v| !v.is_null()).collect();
        let cmp = |v: &FieldValue, probe: &FieldValue| v.compare(probe);

        match (&self.operator, &self.value) {
            (Operator::Equals, PredicateValue::Single(x)) => {
                any_value(&present, |v| v.loosely_equals(x))
            }
            (Operator::NotEquals, PredicateValue::Single(x)) => {
                !any_value(&present, |v| v.loosely_equals(x))
            }
            (Operator::In, PredicateValue::List(xs)) => {
                any_value(&present, |v| xs.iter().any(|x| v.loosely_equals(x)))
            }
            (Operator::NotIn, PredicateValue::Raw(raw)) => {
                !any_value(&present, |v| raw.iter().any(|r| *r == v.to_string()))
            }
            (Operator::IsNull, _) => present.is_empty(),
            (Operator::NotNull, _) => !present.is_empty(),
            (Operator::IsTrue, _) => any_value(&present, |v| v.as_bool() == Some(true)),
            (Operator::IsFalse, _) => any_value(&present, |v| v.as_bool() == Some(false)),
            (Operator::GreaterThan, PredicateValue::Single(x)) => {
                any_value(&present, |v| cmp(v, x) == Some(Ordering::Greater))
            }
            (Operator::GreaterThanEquals, PredicateValue::Single(x)) => {
                any_value(&present, |v| {
                    matches!(cmp(v, x), Some(Ordering::Greater | Ordering::Equal))
                })
            }
            (Operator::LessThan, PredicateValue::Single(x)) => {
                any_value(&present, |v| cmp(v, x) == Some(Ordering::Less))
            }
            (Operator::LessThanEquals, PredicateValue::Single(x)) => {
                any_value(&present, |v| {
                    matches!(cmp(v, x), Some(Ordering::Less | Ordering::Equal))
                })
            }
            (Operator::Between, PredicateValue::Pair(lo, hi)) => any_value(&present, |v| {
                matches!(cmp(v, lo), Some(Ordering::Greater | Ordering::Equal))
                    && cmp(v, hi) == Some(Ordering::Less)
            }),
            (Operator::BetweenInclusive, PredicateValue::Pair(lo, hi)) => any_value(&present, |v| {
                matches!(cmp(v, lo), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(cmp(v, hi), Some(Ordering::Less | Ordering::Equal))
            }),
            (Operator::Outside, PredicateValue::Pair(lo, hi)) => any_value(&present, |v| {
                cmp(v, lo) == Some(Ordering::Less)
                    || matches!(cmp(v, hi), Some(Ordering::Greater | Ordering::Equal))
            }),
            (Operator::OutsideInclusive, PredicateValue::Pair(lo, hi)) => any_value(&present, |v| {
                matches!(cmp(v, lo), Some(Ordering::Less | Ordering::Equal))
                    || matches!(cmp(v, hi), Some(Ordering::Greater | Ordering::Equal))
            }),
            (Operator::StartsWith, PredicateValue::Single(x)) => {
                let prefix = x.to_string();
                any_value(&present, |v| v.to_string().starts_with(&prefix))
            }
            (Operator::EndsWith, PredicateValue::Single(x)) => {
                let suffix = x.to_string();
                any_value(&present, |v| v.to_string().ends_with(&suffix))
            }
            _ => false,
        }
    }
}

fn any_value(present: &[&FieldValue], f: impl Fn(&FieldValue) -> bool) -> bool {
    present.iter().any(|v| f(v))
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            PredicateValue::Single(v) => write!(f, "{} {} {}", self.field, self.operator, v),
            PredicateValue::Pair(lo, hi) => {
                write!(f, "{} {} ({}, {})", self.field, self.operator, lo, hi)
            }
            PredicateValue::List(vs) => {
                let items: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                write!(f, "{} {} [{}]", self.field, self.operator, items.join(", "))
            }
            PredicateValue::Raw(vs) => {
                write!(f, "{} {} [{}]", self.field, self.operator, vs.join(", "))
            }
            PredicateValue::Flag(_) => write!(f, "{} {}", self.field, self.operator),
        }
    }
}
