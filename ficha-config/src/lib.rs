//! Configuration management for the ficha CRM core using Figment
//!
//! Settings are merged from several sources, later sources overriding earlier ones:
//!
//! 1. Built-in defaults ([`FichaConfig::default`])
//! 2. Global file: `~/.ficha/ficha.{toml,yaml,yml,json}`
//! 3. Project file: `./.ficha/ficha.{toml,yaml,yml,json}`
//! 4. Environment variables prefixed with `FICHA_` (nested keys split on `__`,
//!    e.g. `FICHA_COMMENTS__MAX_LEVEL=5`)
//!
//! ```no_run
//! use ficha_config::load_configuration;
//!
//! let config = load_configuration()?;
//! assert!(config.comments.max_level > 0);
//! # Ok::<(), ficha_config::ConfigError>(())
//! ```
//!
//! ## Example TOML Configuration
//!
//! ```toml
//! [comments]
//! max_level = 7
//! thread_message_limit = 7
//! thread_warning_threshold = 5
//!
//! [identity]
//! cache_ttl_secs = 30
//!
//! [storage]
//! bucket = "card-attachments"
//! ```

mod discovery;
mod error;
mod provider;
mod types;

pub use discovery::{ConfigFile, ConfigFormat, ConfigScope, FileDiscovery};
pub use error::{ConfigError, ConfigResult};
pub use provider::ConfigProvider;
pub use types::{CommentSettings, FichaConfig, IdentitySettings, StorageSettings, TaskSettings};

/// Load configuration from every available source.
pub fn load_configuration() -> ConfigResult<FichaConfig> {
    ConfigProvider::new().load()
}
