//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pk_core::FinePolicy;
use serde::{Deserialize, Serialize};

/// Floors created by `pk init` when nothing else is configured.
pub const DEFAULT_FLOORS: u32 = 5;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Name printed in reports.
    pub lot_name: String,
    /// Floors laid out by `pk init`.
    pub floors: u32,
    /// Policy used until one is stored with `pk policy set`.
    pub fine_policy: FinePolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("lot_name", &self.lot_name)
            .field("floors", &self.floors)
            .field("fine_policy", &self.fine_policy)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("pk.db"),
            lot_name: "University Parking Lot".to_string(),
            floors: DEFAULT_FLOORS,
            fine_policy: FinePolicy::default(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (PK_*)
        figment = figment.merge(Env::prefixed("PK_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for pk.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pk"))
}

/// Returns the platform-specific data directory for pk.
///
/// On Linux: `~/.local/share/pk`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("pk"))
}
