//! Configuration types and parsing for wardflow.yml

use crate::error::{CoreError, CoreResult};
use crate::schedule::{Schedule, DEFAULT_INTERVAL};
use crate::serde_helpers::default_true;
use crate::table_name::TableName;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `dataset.path`
pub const DATASET_PATH_ENV: &str = "WF_DATASET_PATH";

/// Environment variable overriding `database.path`
pub const DATABASE_PATH_ENV: &str = "WF_DATABASE_PATH";

/// Pipeline configuration from wardflow.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Pipeline name, recorded on every run
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Source dataset settings
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Store connection and raw table
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Transform script and the tables it must produce
    #[serde(default)]
    pub transform: TransformConfig,

    /// Per-step retry policy
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Recurring trigger
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Directory for run state files
    #[serde(default = "default_state_path")]
    pub state_path: String,
}

/// Source dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Path to the CSV file (relative paths resolve against the project root)
    #[serde(default = "default_dataset_path")]
    pub path: String,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Whether a header-only CSV is a valid (zero-row) load
    #[serde(default = "default_true")]
    pub allow_empty: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            delimiter: default_delimiter(),
            allow_empty: true,
        }
    }
}

/// Store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// DuckDB file path, or `:memory:` for a store that lives only as long
    /// as the process
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Staging table replaced on every load
    #[serde(default = "default_raw_table")]
    pub raw_table: TableName,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            raw_table: default_raw_table(),
        }
    }
}

/// Transform unit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    /// Path to the SQL script
    #[serde(default = "default_sql_path")]
    pub sql_path: String,

    /// Tables the script must leave behind for the dashboard
    #[serde(default = "default_derived_tables")]
    pub derived_tables: Vec<TableName>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            sql_path: default_sql_path(),
            derived_tables: default_derived_tables(),
        }
    }
}

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    /// Re-attempts after the first failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between attempts, in seconds
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay_secs: delay.as_secs(),
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total attempts a step gets before it is marked failed
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Whether a failure on `attempt` (1-based) earns another attempt
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }
}

/// Schedule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Preset (`@hourly`, `@daily`, `@weekly`, `@monthly`, `@yearly`) or a
    /// cron expression
    #[serde(default = "default_interval")]
    pub interval: String,

    /// First logical date (midnight UTC)
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            start_date: default_start_date(),
        }
    }
}

impl ScheduleConfig {
    pub fn schedule(&self) -> CoreResult<Schedule> {
        Schedule::from_start_date(&self.interval, self.start_date)
    }
}

const MEMORY_DB_PATH: &str = ":memory:";

fn default_dataset_path() -> String {
    "data/HDHI Admission data.csv".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_db_path() -> String {
    "warehouse.duckdb".to_string()
}

fn default_raw_table() -> TableName {
    TableName::new("hdhi_raw")
}

fn default_sql_path() -> String {
    "sql/transform_hdhi.sql".to_string()
}

fn default_derived_tables() -> Vec<TableName> {
    vec![
        TableName::new("analytics_hdhi_clean"),
        TableName::new("analytics_hdhi_dashboard"),
    ]
}

fn default_max_retries() -> u32 {
    2
}

fn default_delay_secs() -> u64 {
    120
}

fn default_interval() -> String {
    DEFAULT_INTERVAL.to_string()
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

fn default_state_path() -> String {
    "target".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for wardflow.yml or wardflow.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("wardflow.yml");
        let yaml_path = dir.join("wardflow.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Pipeline name cannot be empty".to_string(),
            });
        }

        if self.dataset.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "dataset.path cannot be empty".to_string(),
            });
        }

        if !self.dataset.delimiter.is_ascii() {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "dataset.delimiter {:?} must be a single-byte (ASCII) character",
                    self.dataset.delimiter
                ),
            });
        }

        if self.transform.derived_tables.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "transform.derived_tables must list at least one table".to_string(),
            });
        }

        if self
            .transform
            .derived_tables
            .iter()
            .any(|t| t == &self.database.raw_table)
        {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "Raw table '{}' cannot also be a derived table",
                    self.database.raw_table
                ),
            });
        }

        self.schedule.schedule()?;

        Ok(())
    }

    /// Dataset path: CLI override, then `WF_DATASET_PATH`, then the config file
    pub fn resolve_dataset_path(&self, cli_override: Option<&str>, root: &Path) -> PathBuf {
        let raw = cli_override
            .map(String::from)
            .or_else(|| std::env::var(DATASET_PATH_ENV).ok())
            .unwrap_or_else(|| self.dataset.path.clone());
        root.join(raw)
    }

    /// Database path: CLI override, then `WF_DATABASE_PATH`, then the config
    /// file. `:memory:` is passed through untouched.
    pub fn resolve_database_path(&self, cli_override: Option<&str>, root: &Path) -> String {
        let raw = cli_override
            .map(String::from)
            .or_else(|| std::env::var(DATABASE_PATH_ENV).ok())
            .unwrap_or_else(|| self.database.path.clone());
        if raw == MEMORY_DB_PATH {
            raw
        } else {
            root.join(raw).display().to_string()
        }
    }

    /// Absolute path of the transform script
    pub fn transform_sql_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.transform.sql_path)
    }

    /// Absolute run-state directory
    pub fn state_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.state_path)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
