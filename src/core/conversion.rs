//! String-to-typed-value conversion
//!
//! Each [`FieldType`] maps to one converter closure. The defaults cover the
//! primitive, boolean, uuid and temporal types; applications register extra
//! converters for their [`FieldType::Custom`] types.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::ConversionError;
use crate::core::field::{FieldType, FieldValue};

/// Shared converter closure
pub type Converter = Arc<dyn Fn(&str) -> Result<FieldValue, String> + Send + Sync>;

/// Converter: keep the raw string
pub fn string() -> impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + Clone {
    |raw: &str| Ok(FieldValue::String(raw.to_string()))
}

/// Converter: 32-bit signed integer
pub fn integer() -> impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + Clone {
    |raw: &str| {
        raw.trim()
            .parse::<i32>()
            .map(|i| FieldValue::Integer(i64::from(i)))
            .map_err(|e| e.to_string())
    }
}

/// Converter: 64-bit signed integer
pub fn long() -> impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + Clone {
    |raw: &str| {
        raw.trim()
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|e| e.to_string())
    }
}

/// Converter: 32-bit float, widened for storage comparison
pub fn float() -> impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + Clone {
    |raw: &str| {
        raw.trim()
            .parse::<f32>()
            .map(|x| FieldValue::Float(f64::from(x)))
            .map_err(|e| e.to_string())
    }
}

/// Converter: 64-bit float
pub fn double() -> impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + Clone {
    |raw: &str| {
        raw.trim()
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|e| e.to_string())
    }
}

/// Converter: boolean, accepting the usual textual spellings
pub fn boolean() -> impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + Clone {
    |raw: &str| match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" | "y" => Ok(FieldValue::Boolean(true)),
        "false" | "no" | "off" | "0" | "n" => Ok(FieldValue::Boolean(false)),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}

/// Converter: hyphenated or simple UUID
pub fn uuid() -> impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + Clone {
    |raw: &str| {
        Uuid::parse_str(raw.trim())
            .map(FieldValue::Uuid)
            .map_err(|e| e.to_string())
    }
}

/// Converter: calendar date in `YYYY-MM-DD`
pub fn date() -> impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + Clone {
    |raw: &str| {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(FieldValue::Date)
            .map_err(|e| e.to_string())
    }
}

/// Converter: RFC 3339 timestamp, or a bare date taken as midnight UTC
pub fn datetime() -> impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + Clone {
    |raw: &str| {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(FieldValue::DateTime(dt.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| e.to_string())
            .and_then(|d| {
                d.and_hms_opt(0, 0, 0)
                    .map(|naive| FieldValue::DateTime(naive.and_utc()))
                    .ok_or_else(|| "invalid midnight".to_string())
            })
    }
}

/// Converter: `name:value` attribute pair, kept whole
///
/// A bare `name` (no colon) is accepted; an empty name is not.
pub fn attribute() -> impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + Clone {
    |raw: &str| {
        let mut bits = raw.splitn(2, ':');
        let name = bits.next().unwrap_or_default();
        if name.is_empty() {
            return Err("attribute name is empty".to_string());
        }
        Ok(FieldValue::String(raw.to_string()))
    }
}

/// Registry of converters keyed by target type
#[derive(Clone)]
pub struct ConversionService {
    converters: HashMap<FieldType, Converter>,
}

impl ConversionService {
    /// A service with no converters at all
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// A service with the built-in converters registered
    pub fn new() -> Self {
        Self::empty()
            .with_converter(FieldType::String, string())
            .with_converter(FieldType::Integer, integer())
            .with_converter(FieldType::Long, long())
            .with_converter(FieldType::Float, float())
            .with_converter(FieldType::Double, double())
            .with_converter(FieldType::Boolean, boolean())
            .with_converter(FieldType::Uuid, uuid())
            .with_converter(FieldType::Date, date())
            .with_converter(FieldType::DateTime, datetime())
    }

    /// Register (or replace) the converter for a target type
    pub fn with_converter(
        mut self,
        target: FieldType,
        converter: impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + 'static,
    ) -> Self {
        self.register(target, converter);
        self
    }

    pub fn register(
        &mut self,
        target: FieldType,
        converter: impl Fn(&str) -> Result<FieldValue, String> + Send + Sync + 'static,
    ) {
        self.converters.insert(target, Arc::new(converter));
    }

    pub fn can_convert(&self, target: &FieldType) -> bool {
        self.converters.contains_key(target)
    }

    /// Convert one raw value into `target`
    pub fn convert(&self, raw: &str, target: &FieldType) -> Result<FieldValue, ConversionError> {
        let converter = self.converters.get(target).ok_or_else(|| {
            ConversionError::new(raw, target, "no converter registered for target type")
        })?;
        tracing::debug!(value = raw, target = %target, "converting query value");
        converter(raw).map_err(|message| ConversionError::new(raw, target, message))
    }

    /// Convert every raw value into `target`, failing on the first bad one
    pub fn convert_many<S: AsRef<str>>(
        &self,
        raws: &[S],
        target: &FieldType,
    ) -> Result<Vec<FieldValue>, ConversionError> {
        raws.iter()
            .map(|raw| self.convert(raw.as_ref(), target))
            .collect()
    }
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<String> = self.converters.keys().map(|t| t.to_string()).collect();
        types.sort();
        f.debug_struct("ConversionService")
            .field("types", &types)
            .finish()
    }
}
