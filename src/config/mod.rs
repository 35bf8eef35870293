//! Configuration loading
//!
//! Settings come from defaults, an optional TOML/YAML file and
//! `THREAD_INTEGRITY_*` environment variables (Env > File > Defaults).

pub mod loader;
pub mod settings;

pub use loader::load_settings;
pub use settings::{AccountProfile, ConfigError, ResolvedAccount, Settings};
