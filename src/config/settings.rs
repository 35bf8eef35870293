//! Bot settings and per-account profiles.

use crate::paste;
use crate::platform::RedditCredentials;
use crate::rank::SortKey;
use crate::render::ReportFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str = "ThreadIntegrityChecker reddit bot (by /u/Watchful1)";
pub const DEFAULT_OWNER: &str = "Watchful1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("User {0} not in config, aborting")]
    UnknownAccount(String),

    #[error("Pastebin key not in config for {0}, aborting")]
    MissingPasteKey(String),

    #[error("Account {account} is missing {field}")]
    MissingField { account: String, field: &'static str },

    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),
}

/// Credentials and paste key for one bot account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountProfile {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub pastebin_key: Option<String>,
}

/// Validated account selected on the command line.
#[derive(Debug, Clone)]
pub struct ResolvedAccount {
    pub selector: String,
    pub credentials: RedditCredentials,
    pub pastebin_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub user_agent: String,
    /// Account named in the reply footer and error replies.
    pub owner: String,
    /// Pause after each poll cycle and after loop-level failures.
    pub cooldown_secs: u64,
    /// How many recent items of each author are classified.
    pub activity_limit: usize,
    pub sort: SortKey,
    pub format: ReportFormat,
    pub log_dir: PathBuf,
    pub log_max_bytes: u64,
    pub log_backups: usize,
    pub paste_endpoint: String,
    /// Substring whose presence in the paste response marks success.
    pub paste_domain: String,
    pub accounts: BTreeMap<String, AccountProfile>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            cooldown_secs: 5 * 60,
            activity_limit: 100,
            sort: SortKey::Age,
            format: ReportFormat::Table,
            log_dir: PathBuf::from("logs"),
            log_max_bytes: 1024 * 256,
            log_backups: 5,
            paste_endpoint: paste::DEFAULT_ENDPOINT.to_string(),
            paste_domain: paste::DEFAULT_DOMAIN.to_string(),
            accounts: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Look up and validate the profile for `selector`.
    ///
    /// Environment-provided profiles arrive lower-cased, so a case-insensitive
    /// match is accepted when there is no exact one.
    pub fn account(&self, selector: &str) -> Result<ResolvedAccount, ConfigError> {
        let profile = self
            .accounts
            .get(selector)
            .or_else(|| {
                self.accounts
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(selector))
                    .map(|(_, profile)| profile)
            })
            .ok_or_else(|| ConfigError::UnknownAccount(selector.to_string()))?;

        let pastebin_key = profile
            .pastebin_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingPasteKey(selector.to_string()))?
            .to_string();

        let required = [
            ("client_id", &profile.client_id),
            ("client_secret", &profile.client_secret),
            ("username", &profile.username),
            ("password", &profile.password),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::MissingField { account: selector.to_string(), field: *field });
        }

        Ok(ResolvedAccount {
            selector: selector.to_string(),
            credentials: RedditCredentials {
                client_id: profile.client_id.clone(),
                client_secret: profile.client_secret.clone(),
                username: profile.username.clone(),
                password: profile.password.clone(),
            },
            pastebin_key,
        })
    }
}
