//! CLI configuration, parsed from TOML file + environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use bitcoin::Network;
use fgwallet_restore::{AppSettings, BACKUP_MAX_CHARS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Wallet storage and chain settings
    #[serde(default)]
    pub wallet: WalletSection,

    /// Logging
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSection {
    /// Directory holding wallet.json, preferences.json, blockchain.json
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Bitcoin network: "bitcoin", "testnet", "signet", "regtest"
    #[serde(default = "default_network")]
    pub network: String,

    /// Largest backup accepted for restore, in characters
    #[serde(default = "default_backup_max_chars")]
    pub backup_max_chars: usize,
}

impl Default for WalletSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            network: default_network(),
            backup_max_chars: default_backup_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./fgwallet-data")
}

fn default_network() -> String {
    "bitcoin".to_string()
}

fn default_backup_max_chars() -> usize {
    BACKUP_MAX_CHARS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `FGWALLET_DATA_DIR`
    /// - `FGWALLET_NETWORK`
    /// - `FGWALLET_BACKUP_MAX_CHARS`
    /// - `FGWALLET_LOG_LEVEL`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("FGWALLET_DATA_DIR") {
            self.wallet.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("FGWALLET_NETWORK") {
            self.wallet.network = v;
        }
        if let Ok(v) = std::env::var("FGWALLET_BACKUP_MAX_CHARS") {
            if let Ok(max) = v.parse::<usize>() {
                self.wallet.backup_max_chars = max;
            }
        }
        if let Ok(v) = std::env::var("FGWALLET_LOG_LEVEL") {
            self.log.level = v;
        }
    }

    /// Parse the network string. `None` if it isn't one we know.
    pub fn network(&self) -> Option<Network> {
        match self.wallet.network.as_str() {
            "bitcoin" | "mainnet" => Some(Network::Bitcoin),
            "testnet" | "testnet3" => Some(Network::Testnet),
            "signet" => Some(Network::Signet),
            "regtest" => Some(Network::Regtest),
            _ => None,
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.network().is_some(),
            "wallet.network must be one of bitcoin, testnet, signet, regtest (got {:?})",
            self.wallet.network
        );
        anyhow::ensure!(
            !self.wallet.data_dir.as_os_str().is_empty(),
            "wallet.data_dir must not be empty"
        );
        anyhow::ensure!(
            self.wallet.backup_max_chars > 0,
            "wallet.backup_max_chars must be > 0"
        );
        Ok(())
    }

    /// Settings for the wallet application. Call after [`validate`](Self::validate).
    pub fn app_settings(&self) -> Result<AppSettings> {
        let network = self
            .network()
            .with_context(|| format!("unknown network {:?}", self.wallet.network))?;
        let mut settings = AppSettings::new(&self.wallet.data_dir, network);
        settings.backup_max_chars = self.wallet.backup_max_chars;
        Ok(settings)
    }
}
