//! Top-level coverage configuration.

use crate::result::BucketResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration shared by every node of a coverage tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    /// Fail the sample when an illegal bucket is hit, rather than logging it
    pub except_on_illegal: bool,
}

impl CoverConfig {
    /// Create a builder for cover config
    #[must_use]
    pub fn builder() -> CoverConfigBuilder {
        CoverConfigBuilder::default()
    }

    /// Parse from YAML
    pub fn from_yaml_str(yaml: &str) -> BucketResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> BucketResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> BucketResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

/// Builder for cover configuration
#[derive(Debug, Default)]
pub struct CoverConfigBuilder {
    except_on_illegal: bool,
}

impl CoverConfigBuilder {
    /// Treat illegal bucket hits as errors
    #[must_use]
    pub fn except_on_illegal(mut self, enabled: bool) -> Self {
        self.except_on_illegal = enabled;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> CoverConfig {
        CoverConfig {
            except_on_illegal: self.except_on_illegal,
        }
    }
}
