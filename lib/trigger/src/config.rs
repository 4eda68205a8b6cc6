//! Lifecycle configuration.
//!
//! Embedded in a host application's configuration and deserialized by the
//! `config` crate there.

use crate::polling::PREVIEW_LIMIT;
use serde::Deserialize;

/// Settings shared by every trigger lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LifecycleConfig {
    /// Cron schedule handed to the scheduler for polling triggers.
    #[serde(default = "default_polling_cron")]
    pub polling_cron: String,

    /// Maximum number of items `test` returns. Values above
    /// [`PREVIEW_LIMIT`] are capped by [`LifecycleConfig::preview_limit`].
    #[serde(default = "default_test_preview_limit")]
    pub test_preview_limit: usize,
}

fn default_polling_cron() -> String {
    "*/5 * * * *".to_string()
}

fn default_test_preview_limit() -> usize {
    PREVIEW_LIMIT
}

impl LifecycleConfig {
    /// The effective preview bound.
    #[must_use]
    pub fn preview_limit(&self) -> usize {
        self.test_preview_limit.min(PREVIEW_LIMIT)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            polling_cron: default_polling_cron(),
            test_preview_limit: default_test_preview_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_config_has_correct_defaults() {
        let config = LifecycleConfig::default();
        assert_eq!(config.polling_cron, "*/5 * * * *");
        assert_eq!(config.test_preview_limit, 5);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: LifecycleConfig =
            serde_json::from_value(serde_json::json!({"polling_cron": "* * * * *"}))
                .expect("decode");
        assert_eq!(config.polling_cron, "* * * * *");
        assert_eq!(config.test_preview_limit, 5);
    }

    #[test]
    fn preview_limit_is_capped() {
        let config = LifecycleConfig {
            test_preview_limit: 50,
            ..LifecycleConfig::default()
        };
        assert_eq!(config.preview_limit(), 5);

        let config = LifecycleConfig {
            test_preview_limit: 3,
            ..LifecycleConfig::default()
        };
        assert_eq!(config.preview_limit(), 3);
    }
}
