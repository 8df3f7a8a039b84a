//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/qtree/qtree.toml`
//! 3. Local config: file given with `--config` (must exist)
//! 4. Environment variables: `QTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};

/// Prefix of environment variables overriding settings, e.g. `QTREE_ITEM_SEPARATOR`.
pub const ENV_PREFIX: &str = "QTREE";

/// Settings for reading batch documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Separator between category and text on item lines
    pub item_separator: String,
    /// Separator between category and prefix on query lines
    pub query_separator: String,
    /// Fail when the declared category count differs from the parsed tree
    pub verify_category_count: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            item_separator: ": ".into(),
            query_separator: " ".into(),
            verify_category_count: false,
        }
    }
}

/// Get the XDG config directory for qtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "qtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("qtree.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file layered over the global one
    pub fn load(local: Option<&Path>) -> ApplicationResult<Self> {
        Self::load_from(global_config_path().as_deref(), local, ENV_PREFIX)
    }

    /// Load settings from explicit sources.
    ///
    /// A missing global file is skipped; a missing local file is an error.
    #[instrument(level = "debug")]
    pub fn load_from(
        global: Option<&Path>,
        local: Option<&Path>,
        env_prefix: &str,
    ) -> ApplicationResult<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("item_separator", defaults.item_separator)
            .map_err(config_err)?
            .set_default("query_separator", defaults.query_separator)
            .map_err(config_err)?
            .set_default("verify_category_count", defaults.verify_category_count)
            .map_err(config_err)?;

        if let Some(global_path) = global {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                builder = builder.add_source(
                    File::from(global_path)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        if let Some(local_path) = local {
            debug!(path = %local_path.display(), "loading local config");
            builder = builder.add_source(
                File::from(local_path)
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        // Env vars replace values: explicit override
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;
        let settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> ApplicationResult<()> {
        if self.item_separator.is_empty() {
            return Err(ApplicationError::Config {
                message: "item_separator must not be empty".into(),
            });
        }
        if self.query_separator.is_empty() {
            return Err(ApplicationError::Config {
                message: "query_separator must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# qtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/qtree/qtree.toml  (your baseline)
#   Local:  file given with --config    (per-invocation override)
#   Env:    QTREE_* environment variables (explicit overrides)

# Separator between category and question on item lines
# item_separator = ": "

# Separator between category and prefix on query lines
# query_separator = " "

# Reject input whose first line does not match the number of categories
# verify_category_count = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn given_no_sources_when_loading_then_uses_defaults() {
        let settings = Settings::load_from(None, None, "QTREE_TEST_NONE").expect("load defaults");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn given_local_file_when_loading_then_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        let local = temp.path().join("local.toml");
        fs::write(&global, "item_separator = \" => \"\nquery_separator = \"|\"\n").unwrap();
        fs::write(&local, "query_separator = \"\\t\"\n").unwrap();

        let settings =
            Settings::load_from(Some(&global), Some(&local), "QTREE_TEST_LAYERS").unwrap();

        assert_eq!(settings.item_separator, " => ");
        assert_eq!(settings.query_separator, "\t");
        assert!(!settings.verify_category_count);
    }

    #[test]
    fn given_missing_global_file_when_loading_then_skips_it() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("absent.toml");
        let settings = Settings::load_from(Some(&global), None, "QTREE_TEST_ABSENT").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn given_missing_local_file_when_loading_then_fails() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join("absent.toml");
        let result = Settings::load_from(None, Some(&local), "QTREE_TEST_MISSING");
        assert!(matches!(result, Err(ApplicationError::Config { .. })));
    }

    #[test]
    fn given_env_override_when_loading_then_env_wins() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join("local.toml");
        fs::write(&local, "verify_category_count = false\n").unwrap();
        std::env::set_var("QTREE_TEST_ENV_VERIFY_CATEGORY_COUNT", "true");

        let settings = Settings::load_from(None, Some(&local), "QTREE_TEST_ENV").unwrap();

        std::env::remove_var("QTREE_TEST_ENV_VERIFY_CATEGORY_COUNT");
        assert!(settings.verify_category_count);
    }

    #[test]
    fn given_empty_separator_when_loading_then_rejects_config() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join("local.toml");
        fs::write(&local, "item_separator = \"\"\n").unwrap();

        let err = Settings::load_from(None, Some(&local), "QTREE_TEST_EMPTY").unwrap_err();
        assert!(err.to_string().contains("item_separator"), "{err}");
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let parsed: Settings = toml::from_str(&Settings::template()).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn given_settings_when_serializing_then_round_trips_through_toml() {
        let settings = Settings {
            verify_category_count: true,
            ..Settings::default()
        };
        let rendered = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, settings);
    }
}
