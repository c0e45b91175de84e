//! Token contract seam
//!
//! Entry fees, daily grants and reward payouts all settle through an external
//! fungible-token contract. The core only needs three calls from it: a balance
//! view, `transfer` and `mint`. Amounts cross the boundary in base units
//! (human amount × 10^decimals).

use crate::games::types::PlayerId;
use crate::storage::KeyValueStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Fixed fractional-unit exponent of the arcade token
pub const TOKEN_DECIMALS: u32 = 18;

const BALANCE_PREFIX: &str = "token:balance:";

/// Hash of a transaction accepted for submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settlement error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettlementError {
    #[error("Token contract unreachable: {0}")]
    Offline(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Invalid settlement amount: {0}")]
    InvalidAmount(f64),

    #[error("Insufficient funds for settlement")]
    InsufficientFunds,

    #[error("Contract state unreadable: {0}")]
    CorruptedState(String),
}

/// Binding to the token contract
///
/// A returned `TxHash` means the transaction was accepted for submission, not
/// that it was confirmed on chain.
#[async_trait]
pub trait TokenContract: Send + Sync {
    /// Address of the contract itself, used as the entry-fee sink
    fn address(&self) -> &str;

    /// View call, base units
    async fn read_balance(&self, owner: &PlayerId) -> Result<u128, SettlementError>;

    async fn transfer(&self, from: &PlayerId, to: &str, amount: u128) -> Result<TxHash, SettlementError>;

    async fn mint(&self, to: &PlayerId, amount: u128) -> Result<TxHash, SettlementError>;
}

fn unit_factor(decimals: u32) -> f64 {
    10f64.powi(decimals as i32)
}

/// Human amount to base units, flooring any dust below one base unit
pub fn to_base_units(amount: f64, decimals: u32) -> Result<u128, SettlementError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(SettlementError::InvalidAmount(amount));
    }
    let scaled = (amount * unit_factor(decimals)).floor();
    if scaled > u128::MAX as f64 {
        return Err(SettlementError::InvalidAmount(amount));
    }
    Ok(scaled as u128)
}

/// Base units back to a human amount
pub fn from_base_units(amount: u128, decimals: u32) -> f64 {
    amount as f64 / unit_factor(decimals)
}

/// Local stand-in for the token contract
///
/// Balances live in the key-value store so they persist alongside the ledger
/// when backed by RocksDB. `set_offline(true)` makes every call fail before
/// submission.
pub struct SimulatedToken {
    store: Arc<dyn KeyValueStore>,
    address: String,
    offline: AtomicBool,
    nonce: AtomicU64,
}

impl SimulatedToken {
    pub fn new(store: Arc<dyn KeyValueStore>, address: impl Into<String>) -> Self {
        Self {
            store,
            address: address.into(),
            offline: AtomicBool::new(false),
            nonce: AtomicU64::new(0),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Balance of any address, including the contract sink
    pub fn balance_of_address(&self, address: &str) -> Result<u128, SettlementError> {
        let key = format!("{}{}", BALANCE_PREFIX, address);
        match self.store.get(&key) {
            Ok(Some(raw)) => raw
                .parse::<u128>()
                .map_err(|e| SettlementError::CorruptedState(format!("{}: {}", key, e))),
            Ok(None) => Ok(0),
            Err(e) => Err(SettlementError::Offline(e.to_string())),
        }
    }

    fn set_balance(&self, address: &str, amount: u128) -> Result<(), SettlementError> {
        let key = format!("{}{}", BALANCE_PREFIX, address);
        self.store
            .put(&key, &amount.to_string())
            .map_err(|e| SettlementError::Offline(e.to_string()))
    }

    fn ensure_online(&self) -> Result<(), SettlementError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SettlementError::Offline("simulated contract is offline".to_string()));
        }
        Ok(())
    }

    fn next_tx_hash(&self, op: &str, target: &str, amount: u128) -> TxHash {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}:{}:{}:{}", self.address, op, target, amount, nonce).as_bytes());
        TxHash(format!("0x{}", hex::encode(hasher.finalize())))
    }
}

#[async_trait]
impl TokenContract for SimulatedToken {
    fn address(&self) -> &str {
        &self.address
    }

    async fn read_balance(&self, owner: &PlayerId) -> Result<u128, SettlementError> {
        self.ensure_online()?;
        self.balance_of_address(owner.as_str())
    }

    async fn transfer(&self, from: &PlayerId, to: &str, amount: u128) -> Result<TxHash, SettlementError> {
        self.ensure_online()?;
        if from.is_empty() {
            return Err(SettlementError::Rejected("no sender".to_string()));
        }

        let from_balance = self.balance_of_address(from.as_str())?;
        let remaining = from_balance
            .checked_sub(amount)
            .ok_or(SettlementError::InsufficientFunds)?;
        let to_balance = self.balance_of_address(to)?;

        self.set_balance(from.as_str(), remaining)?;
        self.set_balance(to, to_balance.saturating_add(amount))?;

        let tx = self.next_tx_hash("transfer", to, amount);
        tracing::debug!(from = %from, to, amount, tx = %tx, "Simulated transfer");
        Ok(tx)
    }

    async fn mint(&self, to: &PlayerId, amount: u128) -> Result<TxHash, SettlementError> {
        self.ensure_online()?;
        if to.is_empty() {
            return Err(SettlementError::Rejected("no recipient".to_string()));
        }

        let balance = self.balance_of_address(to.as_str())?;
        self.set_balance(to.as_str(), balance.saturating_add(amount))?;

        let tx = self.next_tx_hash("mint", to.as_str(), amount);
        tracing::debug!(to = %to, amount, tx = %tx, "Simulated mint");
        Ok(tx)
    }
}
