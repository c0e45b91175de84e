//! Pending rewards accrued from wins, awaiting settlement
//!
//! Balances are cached in memory and written through to the key-value store
//! under `pendingRewards_<address>`. The token contract stays authoritative;
//! this is a best-effort cache and a store failure never fails the caller.

use crate::errors::PreconditionError;
use crate::games::types::PlayerId;
use crate::storage::KeyValueStore;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

const PENDING_REWARDS_PREFIX: &str = "pendingRewards_";

fn pending_rewards_key(player: &PlayerId) -> String {
    format!("{}{}", PENDING_REWARDS_PREFIX, player.as_str())
}

pub struct PendingRewardsLedger {
    store: Arc<dyn KeyValueStore>,
    balances: DashMap<String, f64>,
}

impl PendingRewardsLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            balances: DashMap::new(),
        }
    }

    /// Accrue a positive reward; returns the new pending balance
    ///
    /// Without a connected wallet this is a no-op returning 0.
    pub fn add_reward(&self, player: &PlayerId, amount: f64) -> Result<f64, PreconditionError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(PreconditionError::InvalidRewardAmount(amount));
        }
        if player.is_empty() {
            return Ok(0.0);
        }

        let key = player.as_str().to_string();
        let stored = if self.balances.contains_key(&key) {
            0.0
        } else {
            self.read_stored(player)
        };

        // Add and write through under a single entry guard
        let updated = {
            let mut balance = self.balances.entry(key).or_insert(stored);
            *balance += amount;
            self.persist(player, *balance);
            *balance
        };

        debug!(player = %player, amount, pending = updated, "Reward accrued");
        Ok(updated)
    }

    pub fn get_pending_rewards(&self, player: &PlayerId) -> f64 {
        if player.is_empty() {
            return 0.0;
        }
        self.load(player)
    }

    /// Zero the balance and drop the stored record
    pub fn reset_rewards(&self, player: &PlayerId) {
        if player.is_empty() {
            return;
        }

        let mut balance = self.balances.entry(player.as_str().to_string()).or_insert(0.0);
        *balance = 0.0;
        let key = pending_rewards_key(player);
        if let Err(e) = self.store.delete(&key) {
            warn!(player = %player, error = %e, "Failed to remove pending rewards record");
        }
        drop(balance);
        debug!(player = %player, "Pending rewards reset");
    }

    fn load(&self, player: &PlayerId) -> f64 {
        if let Some(cached) = self.balances.get(player.as_str()) {
            return *cached;
        }

        let stored = self.read_stored(player);
        *self
            .balances
            .entry(player.as_str().to_string())
            .or_insert(stored)
    }

    fn read_stored(&self, player: &PlayerId) -> f64 {
        let key = pending_rewards_key(player);
        match self.store.get(&key) {
            Ok(Some(raw)) => match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => value,
                _ => {
                    warn!(player = %player, raw = %raw, "Corrupt pending rewards record, treating as 0");
                    0.0
                }
            },
            Ok(None) => 0.0,
            Err(e) => {
                warn!(player = %player, error = %e, "Pending rewards unreadable, treating as 0");
                0.0
            }
        }
    }

    fn persist(&self, player: &PlayerId, balance: f64) {
        let key = pending_rewards_key(player);
        if let Err(e) = self.store.put(&key, &balance.to_string()) {
            warn!(player = %player, error = %e, "Failed to persist pending rewards");
        }
    }
}
