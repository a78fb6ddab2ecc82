//! Configuration loading and management

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::metadata::{EntityMetadata, MetadataRegistry};

/// Reserved parameter that selects the page index
pub const PAGE_PARAM: &str = "page";
/// Reserved parameter that selects the page size
pub const SIZE_PARAM: &str = "size";
/// Reserved parameter carrying sort keys
pub const SORT_PARAM: &str = "sort";
/// Reserved parameter listing fields to keep
pub const FIELDS_PARAM: &str = "fields";
/// Reserved parameter listing fields to drop
pub const EXCLUDE_PARAM: &str = "exclude";
/// Reserved parameter toggling navigation links
pub const HAL_PARAM: &str = "hal";
/// Reserved parameter naming the distinct-values field
pub const FIELD_PARAM: &str = "field";

/// Paging defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Size used when `page` is supplied without `size`
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Upper bound for a requested `size`
    #[serde(default = "default_page_size")]
    pub max_page_size: usize,
}

fn default_page_size() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_page_size(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub paging: PagingConfig,

    /// Whether responses carry links unless `hal=false` is given
    #[serde(default = "default_true")]
    pub links_by_default: bool,

    /// Declarative metadata tables merged into the registry at startup
    #[serde(default)]
    pub entities: Vec<EntityMetadata>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            paging: PagingConfig::default(),
            links_by_default: true,
            entities: Vec::new(),
        }
    }
}

impl QueryConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.paging.max_page_size == 0 {
            bail!("paging.max_page_size must be at least 1");
        }
        if self.paging.default_page_size == 0
            || self.paging.default_page_size > self.paging.max_page_size
        {
            bail!(
                "paging.default_page_size must be between 1 and {}",
                self.paging.max_page_size
            );
        }
        Ok(())
    }

    /// Clamp a requested page size to `1..=max_page_size`
    pub fn clamp_page_size(&self, size: usize) -> usize {
        size.clamp(1, self.paging.max_page_size.max(1))
    }

    /// Parameters never treated as filters on find requests
    pub fn reserved_find_params(&self) -> Vec<String> {
        [
            PAGE_PARAM,
            SIZE_PARAM,
            SORT_PARAM,
            FIELDS_PARAM,
            EXCLUDE_PARAM,
            HAL_PARAM,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Parameters never treated as filters on distinct requests
    pub fn reserved_distinct_params(&self) -> Vec<String> {
        [FIELDS_PARAM, EXCLUDE_PARAM, HAL_PARAM, FIELD_PARAM]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Parameters never treated as filters on find-one requests
    pub fn reserved_one_params(&self) -> Vec<String> {
        [FIELDS_PARAM, EXCLUDE_PARAM, HAL_PARAM]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Register every configured table; configured tables replace built-in ones
    pub fn merge_into(&self, registry: &mut MetadataRegistry) {
        for metadata in &self.entities {
            tracing::debug!(entity_type = %metadata.entity_type, "registering configured metadata");
            registry.register(metadata.clone());
        }
    }
}
