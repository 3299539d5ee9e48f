//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tukey/tukey.toml`
//! 3. Local config: `<dir>/.tukey.toml`
//! 4. Environment variables: `TUKEY_*` prefix, `__` between section and key

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{TreeError, TreeResult};
use crate::filter::{FilterOptions, OrphanStrategy};

/// Defaults for filter runs that do not set their own options.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterSettings {
    /// Keep leaves the predicate left undecided
    pub keep_leafs: bool,
    /// What happens to the descendants of dropped nodes
    pub orphan_strategy: OrphanStrategy,
}

/// Text rendering options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderSettings {
    /// Append `: value` to scalar leaves
    pub show_values: bool,
    /// Append `[node id]` to every line
    pub show_ids: bool,
    /// Placeholder for nodes without label
    pub unlabeled: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            show_values: true,
            show_ids: false,
            unlabeled: "(no label)".into(),
        }
    }
}

/// Unified configuration for tukey.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub filter: FilterSettings,
    pub render: RenderSettings,
}

/// File contents with every key optional, to tell "not specified" from a value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    filter: RawFilterSettings,
    render: RawRenderSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawFilterSettings {
    keep_leafs: Option<bool>,
    orphan_strategy: Option<OrphanStrategy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawRenderSettings {
    show_values: Option<bool>,
    show_ids: Option<bool>,
    unlabeled: Option<String>,
}

impl From<&FilterSettings> for FilterOptions {
    fn from(settings: &FilterSettings) -> Self {
        Self {
            keep_leafs: settings.keep_leafs,
            orphan_strategy: settings.orphan_strategy,
        }
    }
}

impl From<&Settings> for FilterOptions {
    fn from(settings: &Settings) -> Self {
        Self::from(&settings.filter)
    }
}

/// Get the XDG config directory for tukey.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tukey").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tukey.toml"))
}

pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".tukey.toml")
}

fn load_raw_settings(path: &Path) -> TreeResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| TreeError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| TreeError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn parse_orphan_strategy(value: &str) -> TreeResult<OrphanStrategy> {
    match value.to_ascii_lowercase().as_str() {
        "discard" => Ok(OrphanStrategy::Discard),
        "adopt" => Ok(OrphanStrategy::Adopt),
        other => Err(TreeError::Config {
            message: format!("unknown orphan strategy: {other}"),
        }),
    }
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            filter: FilterSettings {
                keep_leafs: overlay.filter.keep_leafs.unwrap_or(self.filter.keep_leafs),
                orphan_strategy: overlay
                    .filter
                    .orphan_strategy
                    .unwrap_or(self.filter.orphan_strategy),
            },
            render: RenderSettings {
                show_values: overlay.render.show_values.unwrap_or(self.render.show_values),
                show_ids: overlay.render.show_ids.unwrap_or(self.render.show_ids),
                unlabeled: overlay
                    .render
                    .unlabeled
                    .clone()
                    .unwrap_or_else(|| self.render.unlabeled.clone()),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.tukey.toml`
    pub fn load(local_dir: Option<&Path>) -> TreeResult<Self> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!(path = %local_path.display(), "loading local config");
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        Self::apply_env_overrides(current, None)
    }

    /// Apply `TUKEY_*` variables, read from `source` instead of the process
    /// environment when given.
    fn apply_env_overrides(
        mut settings: Self,
        source: Option<HashMap<String, String>>,
    ) -> TreeResult<Self> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("TUKEY")
                .prefix_separator("_")
                .separator("__")
                .source(source),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_bool("filter.keep_leafs") {
            settings.filter.keep_leafs = val;
        }
        if let Ok(val) = config.get_string("filter.orphan_strategy") {
            settings.filter.orphan_strategy = parse_orphan_strategy(&val)?;
        }
        if let Ok(val) = config.get_bool("render.show_values") {
            settings.render.show_values = val;
        }
        if let Ok(val) = config.get_bool("render.show_ids") {
            settings.render.show_ids = val;
        }
        if let Ok(val) = config.get_string("render.unlabeled") {
            settings.render.unlabeled = val;
        }

        Ok(settings)
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::from(self)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> TreeResult<String> {
        toml::to_string_pretty(self).map_err(|e| TreeError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# tukey configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/tukey/tukey.toml
#   Local:  <dir>/.tukey.toml
#   Env:    TUKEY_FILTER__KEEP_LEAFS, TUKEY_RENDER__SHOW_IDS, ...

[filter]
# Keep leaves the predicate leaves undecided
# keep_leafs = false

# "discard" drops the subtree of a dropped node,
# "adopt" attaches its surviving descendants to the grandparent
# orphan_strategy = "discard"

[render]
# show_values = true
# show_ids = false
# unlabeled = "(no label)"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> TreeError {
    TreeError::Config {
        message: e.to_string(),
    }
}
