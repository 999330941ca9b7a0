use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Naming and sizing knobs for one compilation.
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct IrConfig {
    /// Base name for aliases of pushed-down subqueries (`t`, `t0`, `t1`, ...)
    #[validate(length(min = 1, message = "Subquery alias prefix cannot be empty"))]
    pub subquery_alias_prefix: String,

    /// Column alias of the injected ROW_NUMBER() projection
    #[validate(length(min = 1, message = "Row number column cannot be empty"))]
    pub row_number_column: String,

    /// Number of memoized star bindings after which a structural-hash index
    /// is kept alongside the linear list
    #[validate(range(
        min = 1,
        max = 4096,
        message = "Star index threshold must be between 1 and 4096"
    ))]
    pub star_index_threshold: usize,
}

impl Default for IrConfig {
    fn default() -> Self {
        Self {
            subquery_alias_prefix: "t".to_string(),
            row_number_column: "__RowNumber__".to_string(),
            star_index_threshold: 32,
        }
    }
}

impl IrConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            subquery_alias_prefix: env::var("SELECT_IR_SUBQUERY_ALIAS_PREFIX")
                .unwrap_or_else(|_| "t".to_string()),
            row_number_column: env::var("SELECT_IR_ROW_NUMBER_COLUMN")
                .unwrap_or_else(|_| "__RowNumber__".to_string()),
            star_index_threshold: parse_env_var("SELECT_IR_STAR_INDEX_THRESHOLD", "32")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content.to_string(),
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        Self::from_yaml_str(&content)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
