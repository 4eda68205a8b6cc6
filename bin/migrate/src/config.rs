//! Migration run configuration.
//!
//! Loaded via the `config` crate from `PIECEWORK__*` environment variables,
//! e.g. `PIECEWORK__FLOW_VERSIONS_DIR=/var/lib/piecework/flow-versions`.

use piecework_flow::RunnerOptions;
use serde::Deserialize;
use std::path::PathBuf;

/// Configuration of one migration run.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrateConfig {
    /// Directory holding one `<flow version id>.json` file per flow version.
    pub flow_versions_dir: PathBuf,

    /// Flow versions loaded per page.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Log progress every this many flow versions.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    /// Migrate and validate without writing anything back.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_batch_size() -> usize {
    100
}

fn default_progress_every() -> usize {
    1000
}

impl MigrateConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(environment())
    }

    fn from_environment(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Runner options derived from this configuration.
    #[must_use]
    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            batch_size: self.batch_size,
            progress_every: self.progress_every,
            dry_run: self.dry_run,
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("PIECEWORK")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
