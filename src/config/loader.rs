//! Config file loading

use super::settings::{ConfigError, Settings};
use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "thread-integrity.toml";
pub const ENV_PREFIX: &str = "THREAD_INTEGRITY_";

/// Load settings with precedence Env > File > Defaults.
///
/// Without an explicit path the default file is optional, so a bot can be
/// configured from the environment alone. An explicit path must exist.
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    load_settings_with_prefix(config_path, ENV_PREFIX)
}

fn load_settings_with_prefix(config_path: Option<&Path>, env_prefix: &str) -> Result<Settings> {
    let (config_file, explicit) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let mut figment = Figment::from(Serialized::defaults(Settings::default()));

    if config_file.exists() {
        let ext =
            config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        figment = match ext.as_str() {
            "toml" => figment.merge(Toml::file(&config_file)),
            "yaml" | "yml" => figment.merge(Yaml::file(&config_file)),
            other => anyhow::bail!(
                "Unsupported config extension '.{}' for file {}",
                other,
                config_file.display()
            ),
        };
        tracing::debug!("Loading config from {}", config_file.display());
    } else if explicit {
        return Err(ConfigError::MissingFile(config_file).into());
    }

    figment = figment.merge(Env::prefixed(env_prefix).split("__"));

    figment
        .extract()
        .with_context(|| format!("Invalid config: {}", config_file.display()))
}
