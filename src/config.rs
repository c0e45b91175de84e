//! Configuration management with validation and defaults
//!
//! Every tunable of the arcade lives here: game prices and payout tables, the
//! purchase range, the daily claim grant, contract settings and storage.
//! Values load from TOML and can be overridden through `ARCADE_*` variables.

use crate::errors::{ArcadeResult, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Top-level arcade configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    pub games: GamesConfig,
    pub purchase: PurchaseConfig,
    pub claim: ClaimConfig,
    pub settlement: SettlementConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
}

/// Per-game prices and payout rules
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    pub coin_flip: CoinFlipConfig,
    pub dice: DiceConfig,
    pub slots: SlotsConfig,
    pub word: WordGameConfig,
    /// Number of outcomes kept in a session's history
    pub history_window: usize,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            coin_flip: CoinFlipConfig::default(),
            dice: DiceConfig::default(),
            slots: SlotsConfig::default(),
            word: WordGameConfig::default(),
            history_window: 12,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinFlipConfig {
    pub price_per_flip: f64,
    pub win_multiplier: f64,
}

impl Default for CoinFlipConfig {
    fn default() -> Self {
        Self {
            price_per_flip: 3.0,
            win_multiplier: 2.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceConfig {
    pub price_per_roll: f64,
    pub win_multiplier: f64,
    pub winning_numbers: Vec<u8>,
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            price_per_roll: 2.0,
            win_multiplier: 2.0,
            winning_numbers: vec![1, 6],
        }
    }
}

/// A reel symbol and its three-of-a-kind multiplier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotSymbol {
    pub name: String,
    pub multiplier: f64,
}

impl SlotSymbol {
    pub fn new(name: impl Into<String>, multiplier: f64) -> Self {
        Self {
            name: name.into(),
            multiplier,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotsConfig {
    pub price_per_spin: f64,
    /// Multiplier applied to a symbol when only two reels match
    pub pair_factor: f64,
    pub symbols: Vec<SlotSymbol>,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            price_per_spin: 5.0,
            pair_factor: 0.5,
            symbols: vec![
                SlotSymbol::new("cherry", 2.0),
                SlotSymbol::new("lemon", 2.0),
                SlotSymbol::new("orange", 3.0),
                SlotSymbol::new("grape", 4.0),
                SlotSymbol::new("diamond", 10.0),
                SlotSymbol::new("seven", 20.0),
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WordGameConfig {
    pub entry_fee: f64,
    /// Reward step per unused attempt
    pub base_price: f64,
    pub max_attempts: u32,
    pub word_length: usize,
    pub words: Vec<String>,
}

impl Default for WordGameConfig {
    fn default() -> Self {
        Self {
            entry_fee: 5.0,
            base_price: 5.0,
            max_attempts: 5,
            word_length: 5,
            words: ["REACT", "REDUX", "CHAIN", "TOKEN", "SMART", "BLOCK", "STAKE", "WALLT", "PROOF"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }
}

/// Lives purchase range
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseConfig {
    pub min_quantity: u32,
    pub max_quantity: u32,
    pub default_quantity: u32,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            min_quantity: 1,
            max_quantity: 20,
            default_quantity: 5,
        }
    }
}

/// Daily claim grant
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimConfig {
    pub grant_amount: f64,
    pub cooldown_seconds: u64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            grant_amount: 100.0,
            cooldown_seconds: 24 * 60 * 60,
        }
    }
}

/// Token contract binding
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub token_symbol: String,
    pub contract_address: String,
    pub decimals: u32,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            token_symbol: "LTK".to_string(),
            contract_address: "0x506B41359218BCac5B648b78a56cA315365487ec".to_string(),
            decimals: 18,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    RocksDb,
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_directory: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::RocksDb,
            data_directory: "./DB/arcade_data".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: LogLevel,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

impl ArcadeConfig {
    /// In-memory store, for tests and throwaway sessions
    pub fn ephemeral() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let games = &self.games;

        for (field, price) in [
            ("games.coin_flip.price_per_flip", games.coin_flip.price_per_flip),
            ("games.dice.price_per_roll", games.dice.price_per_roll),
            ("games.slots.price_per_spin", games.slots.price_per_spin),
            ("games.word.entry_fee", games.word.entry_fee),
            ("games.word.base_price", games.word.base_price),
            ("claim.grant_amount", self.claim.grant_amount),
        ] {
            if !price.is_finite() || price < 0.0 {
                return Err(invalid(field, price, "must be a non-negative number"));
            }
        }

        for (field, multiplier) in [
            ("games.coin_flip.win_multiplier", games.coin_flip.win_multiplier),
            ("games.dice.win_multiplier", games.dice.win_multiplier),
            ("games.slots.pair_factor", games.slots.pair_factor),
        ] {
            if !multiplier.is_finite() || multiplier < 0.0 {
                return Err(invalid(field, multiplier, "must be a non-negative number"));
            }
        }
        if let Some(symbol) = games
            .slots
            .symbols
            .iter()
            .find(|s| !s.multiplier.is_finite() || s.multiplier < 0.0)
        {
            return Err(invalid(
                "games.slots.symbols",
                format!("{}={}", symbol.name, symbol.multiplier),
                "multipliers must be non-negative numbers",
            ));
        }

        if games.dice.winning_numbers.is_empty() {
            return Err(ConfigurationError::ValidationFailed(
                "games.dice.winning_numbers must not be empty".to_string(),
            ));
        }
        if let Some(face) = games.dice.winning_numbers.iter().find(|n| !(1..=6).contains(*n)) {
            return Err(invalid("games.dice.winning_numbers", face, "faces are 1..=6"));
        }

        if games.slots.symbols.is_empty() {
            return Err(ConfigurationError::ValidationFailed(
                "games.slots.symbols must not be empty".to_string(),
            ));
        }

        let word = &games.word;
        if word.max_attempts == 0 {
            return Err(invalid("games.word.max_attempts", word.max_attempts, "must be > 0"));
        }
        if word.words.is_empty() {
            return Err(ConfigurationError::ValidationFailed(
                "games.word.words must not be empty".to_string(),
            ));
        }
        if let Some(bad) = word
            .words
            .iter()
            .find(|w| w.chars().count() != word.word_length || !w.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(invalid(
                "games.word.words",
                bad,
                &format!("every word must be {} ASCII letters", word.word_length),
            ));
        }

        let purchase = &self.purchase;
        if purchase.min_quantity == 0 || purchase.min_quantity > purchase.max_quantity {
            return Err(ConfigurationError::ValidationFailed(format!(
                "purchase range {}..={} is empty or starts at zero",
                purchase.min_quantity, purchase.max_quantity
            )));
        }

        if self.settlement.decimals > 30 {
            return Err(invalid("settlement.decimals", self.settlement.decimals, "at most 30"));
        }

        Ok(())
    }

    pub fn claim_cooldown(&self) -> Duration {
        Duration::from_secs(self.claim.cooldown_seconds)
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> ArcadeResult<ArcadeConfig> {
        let mut config = match self.config_path {
            Some(ref path) => Self::load_from_file(path)?,
            None => ArcadeConfig::default(),
        };

        Self::apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document; missing sections keep their defaults
    pub fn from_toml_str(content: &str) -> ArcadeResult<ArcadeConfig> {
        let config: ArcadeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &str) -> ArcadeResult<ArcadeConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    fn apply_env_overrides(config: &mut ArcadeConfig) -> ArcadeResult<()> {
        if let Ok(data_dir) = env::var("ARCADE_DATA_DIR") {
            config.storage.data_directory = data_dir;
        }

        if let Ok(level) = env::var("ARCADE_LOG_LEVEL") {
            config.monitoring.log_level = level.parse().map_err(|reason| ConfigurationError::InvalidValue {
                field: "ARCADE_LOG_LEVEL".to_string(),
                value: level,
                reason,
            })?;
        }

        if let Ok(address) = env::var("ARCADE_CONTRACT_ADDRESS") {
            config.settlement.contract_address = address;
        }

        if let Ok(amount) = env::var("ARCADE_CLAIM_AMOUNT") {
            config.claim.grant_amount = amount.parse().map_err(|_| ConfigurationError::InvalidValue {
                field: "ARCADE_CLAIM_AMOUNT".to_string(),
                value: amount,
                reason: "Invalid token amount".to_string(),
            })?;
        }

        Ok(())
    }
}
