//! Raw request parameters and predicate building

use indexmap::IndexMap;

use crate::core::conversion::ConversionService;
use crate::core::error::QueryError;
use crate::core::field::FieldValue;
use crate::core::introspect::{ParameterMap, QueryParameterDescriptor};
use crate::core::predicate::{Operator, Predicate, PredicateValue};

/// Caller-supplied parameters: name → raw occurrences, in arrival order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParams {
    params: IndexMap<String, Vec<String>>,
}

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect `(name, value)` pairs; repeated names accumulate
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (name, value) in pairs {
            params.append(name, value);
        }
        params
    }

    /// Parse an URL query string (`a=1&b=2,3&a=4`)
    ///
    /// Keys without `=` get an empty value. Malformed percent escapes are
    /// kept verbatim.
    pub fn parse_query(query: &str) -> Self {
        let mut params = Self::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = decode_component(name);
            if name.is_empty() {
                continue;
            }
            params.append(name, decode_component(value));
        }
        params
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Occurrences exactly as supplied
    pub fn occurrences(&self, name: &str) -> &[String] {
        self.params.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All values for `name`, every occurrence split on commas
    pub fn values(&self, name: &str) -> Vec<String> {
        split_values(self.occurrences(name))
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.occurrences(name).first().map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn split_values(occurrences: &[String]) -> Vec<String> {
    occurrences
        .iter()
        .flat_map(|o| o.split(','))
        .map(str::to_string)
        .collect()
}

/// Turns raw parameters into typed predicates
#[derive(Debug, Clone, Copy)]
pub struct CriteriaBuilder<'a> {
    conversion: &'a ConversionService,
}

impl<'a> CriteriaBuilder<'a> {
    pub fn new(conversion: &'a ConversionService) -> Self {
        Self { conversion }
    }

    /// Build one predicate per non-reserved parameter, in supplied order
    ///
    /// Nothing is returned unless every parameter resolves.
    pub fn build(
        &self,
        param_map: &ParameterMap,
        reserved: &[String],
        raw: &RawParams,
    ) -> Result<Vec<Predicate>, QueryError> {
        let mut predicates = Vec::new();

        for name in raw.names() {
            if reserved.iter().any(|r| r == name) {
                continue;
            }
            let Some(descriptor) = param_map.get(name) else {
                tracing::warn!(
                    parameter = name,
                    "Unable to map request parameter to available entity parameters"
                );
                return Err(QueryError::UnknownParameter {
                    parameter: name.to_string(),
                });
            };
            predicates.push(self.build_predicate(descriptor, &raw.values(name))?);
        }

        tracing::debug!(count = predicates.len(), "generated query predicates");
        Ok(predicates)
    }

    /// Build the predicate for one descriptor and its split raw values
    ///
    /// An EQUALS descriptor given several values is promoted to IN.
    pub fn build_predicate(
        &self,
        descriptor: &QueryParameterDescriptor,
        values: &[String],
    ) -> Result<Predicate, QueryError> {
        let operator = match descriptor.operator {
            Operator::Equals if values.len() > 1 => Operator::In,
            other => other,
        };

        let expected = operator.arity().min_values();
        if values.len() < expected {
            return Err(QueryError::Arity {
                parameter: descriptor.param_name.clone(),
                operator,
                expected,
                actual: values.len(),
            });
        }

        let convert = |raw: &str| -> Result<FieldValue, QueryError> {
            self.conversion
                .convert(raw, &descriptor.field_type)
                .map_err(|e| QueryError::conversion(&descriptor.param_name, e))
        };

        let value = match operator {
            Operator::Equals
            | Operator::NotEquals
            | Operator::GreaterThan
            | Operator::GreaterThanEquals
            | Operator::LessThan
            | Operator::LessThanEquals
            | Operator::StartsWith
            | Operator::EndsWith => PredicateValue::Single(convert(&values[0])?),
            Operator::In => PredicateValue::List(
                self.conversion
                    .convert_many(values, &descriptor.field_type)
                    .map_err(|e| QueryError::conversion(&descriptor.param_name, e))?,
            ),
            Operator::NotIn => PredicateValue::Raw(values.to_vec()),
            Operator::IsNull | Operator::NotNull | Operator::IsTrue | Operator::IsFalse => {
                PredicateValue::Flag(true)
            }
            Operator::Between
            | Operator::Outside
            | Operator::BetweenInclusive
            | Operator::OutsideInclusive => {
                PredicateValue::Pair(convert(&values[0])?, convert(&values[1])?)
            }
        };

        let predicate = Predicate::new(&descriptor.field_name, operator, value)?;
        tracing::debug!(
            parameter = %descriptor.param_name,
            predicate = %predicate,
            "built predicate"
        );
        Ok(predicate)
    }
}
