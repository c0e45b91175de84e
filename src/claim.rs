//! Daily faucet gate
//!
//! One fixed grant per identity per rolling cooldown window. The last accepted
//! claim is stored as Unix seconds under `lastClaim_<address>`.

use crate::config::ClaimConfig;
use crate::errors::{ArcadeResult, PreconditionError};
use crate::games::types::PlayerId;
use crate::settlement::{to_base_units, TokenContract, TxHash};
use crate::storage::KeyValueStore;
use dashmap::DashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

const LAST_CLAIM_PREFIX: &str = "lastClaim_";

/// Wall clock in Unix seconds
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Settable clock for tests and replays
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now_secs: u64) -> Self {
        Self {
            now: AtomicU64::new(now_secs),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, now_secs: u64) {
        self.now.store(now_secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    Claimable,
    Cooldown { remaining_secs: u64 },
}

/// Result of an accepted claim
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimReceipt {
    pub tx: TxHash,
    pub amount: f64,
    pub claimed_at: u64,
    pub next_claim_at: u64,
}

pub struct DailyClaimGate {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: ClaimConfig,
    decimals: u32,
    /// Identities with a mint currently awaiting submission
    in_flight: DashSet<String>,
}

/// Holds an identity's slot in `in_flight` until dropped
struct ClaimReservation<'a> {
    in_flight: &'a DashSet<String>,
    address: String,
}

impl Drop for ClaimReservation<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.address);
    }
}

impl DailyClaimGate {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: ClaimConfig, decimals: u32) -> Self {
        Self {
            store,
            clock,
            config,
            decimals,
            in_flight: DashSet::new(),
        }
    }

    pub fn grant_amount(&self) -> f64 {
        self.config.grant_amount
    }

    /// Unix seconds of the last accepted claim, if any
    pub fn last_claim(&self, player: &PlayerId) -> Option<u64> {
        if player.is_empty() {
            return None;
        }

        let key = last_claim_key(player);
        match self.store.get(&key) {
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(secs) => Some(secs),
                Err(_) => {
                    warn!(player = %player, raw = %raw, "Corrupt claim record ignored");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(player = %player, error = %e, "Claim record unreadable");
                None
            }
        }
    }

    pub fn status(&self, player: &PlayerId) -> ClaimState {
        match self.time_until_next_claim(player) {
            0 => ClaimState::Claimable,
            remaining_secs => ClaimState::Cooldown { remaining_secs },
        }
    }

    /// Seconds left in the cooldown, 0 when a claim is allowed
    pub fn time_until_next_claim(&self, player: &PlayerId) -> u64 {
        let Some(last) = self.last_claim(player) else {
            return 0;
        };
        let elapsed = self.clock.now_secs().saturating_sub(last);
        self.config.cooldown_seconds.saturating_sub(elapsed)
    }

    /// Mint the daily grant and start the cooldown
    ///
    /// The cooldown is recorded once the mint is accepted for submission; a
    /// mint that fails before that leaves the gate claimable. A second claim
    /// for the same identity while the first is awaiting its mint is rejected
    /// with `ClaimInProgress`.
    pub async fn claim(&self, player: &PlayerId, token: &dyn TokenContract) -> ArcadeResult<ClaimReceipt> {
        if player.is_empty() {
            return Err(PreconditionError::MissingIdentity.into());
        }
        if !self.in_flight.insert(player.as_str().to_string()) {
            return Err(PreconditionError::ClaimInProgress.into());
        }
        let _reservation = ClaimReservation {
            in_flight: &self.in_flight,
            address: player.as_str().to_string(),
        };

        if let ClaimState::Cooldown { remaining_secs } = self.status(player) {
            return Err(PreconditionError::ClaimCooldown { remaining_secs }.into());
        }

        let amount = to_base_units(self.config.grant_amount, self.decimals)?;
        let tx = token.mint(player, amount).await?;

        let claimed_at = self.clock.now_secs();
        if let Err(e) = self.store.put(&last_claim_key(player), &claimed_at.to_string()) {
            warn!(player = %player, error = %e, "Failed to persist claim time");
        }

        info!(player = %player, amount = self.config.grant_amount, tx = %tx, "Daily claim accepted");
        Ok(ClaimReceipt {
            tx,
            amount: self.config.grant_amount,
            claimed_at,
            next_claim_at: claimed_at + self.config.cooldown_seconds,
        })
    }
}

fn last_claim_key(player: &PlayerId) -> String {
    format!("{}{}", LAST_CLAIM_PREFIX, player.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ArcadeError;
    use crate::settlement::{SettlementError, SimulatedToken};
    use crate::storage::MemoryStore;

    const START: u64 = 1_700_000_000;
    const DAY: u64 = 86_400;

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        token: SimulatedToken,
        gate: DailyClaimGate,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(START));
        let token = SimulatedToken::new(store.clone(), "0xcontract");
        let gate = DailyClaimGate::new(store.clone(), clock.clone(), ClaimConfig::default(), 18);
        Fixture {
            store,
            clock,
            token,
            gate,
        }
    }

    #[tokio::test]
    async fn test_first_claim_mints_grant() {
        let f = fixture();
        let alice = PlayerId::new("0xalice");

        let receipt = f.gate.claim(&alice, &f.token).await.unwrap();
        assert_eq!(receipt.amount, 100.0);
        assert_eq!(receipt.next_claim_at, START + DAY);
        assert_eq!(f.token.read_balance(&alice).await.unwrap(), 100 * 10u128.pow(18));
        assert_eq!(
            f.store.get("lastClaim_0xalice").unwrap().as_deref(),
            Some("1700000000")
        );
    }

    #[tokio::test]
    async fn test_second_claim_within_window_rejected() {
        let f = fixture();
        let alice = PlayerId::new("0xalice");
        f.gate.claim(&alice, &f.token).await.unwrap();

        f.clock.advance(DAY - 10);
        let err = f.gate.claim(&alice, &f.token).await.unwrap_err();
        assert!(matches!(
            err,
            ArcadeError::Precondition(PreconditionError::ClaimCooldown { remaining_secs: 10 })
        ));
        assert_eq!(f.token.read_balance(&alice).await.unwrap(), 100 * 10u128.pow(18));
    }

    #[tokio::test]
    async fn test_claim_allowed_after_window() {
        let f = fixture();
        let alice = PlayerId::new("0xalice");
        f.gate.claim(&alice, &f.token).await.unwrap();

        f.clock.advance(DAY + 1);
        assert_eq!(f.gate.status(&alice), ClaimState::Claimable);
        assert!(f.gate.claim(&alice, &f.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_mint_leaves_gate_open() {
        let f = fixture();
        let alice = PlayerId::new("0xalice");
        f.token.set_offline(true);

        let err = f.gate.claim(&alice, &f.token).await.unwrap_err();
        assert!(matches!(err, ArcadeError::Settlement(SettlementError::Offline(_))));
        assert_eq!(f.gate.status(&alice), ClaimState::Claimable);
        assert_eq!(f.gate.last_claim(&alice), None);
    }

    #[tokio::test]
    async fn test_missing_identity_rejected() {
        let f = fixture();
        let err = f.gate.claim(&PlayerId::none(), &f.token).await.unwrap_err();
        assert!(matches!(
            err,
            ArcadeError::Precondition(PreconditionError::MissingIdentity)
        ));
    }

    #[tokio::test]
    async fn test_cooldowns_are_per_identity() {
        let f = fixture();
        let alice = PlayerId::new("0xalice");
        let bob = PlayerId::new("0xbob");
        f.gate.claim(&alice, &f.token).await.unwrap();

        assert_eq!(f.gate.time_until_next_claim(&alice), DAY);
        assert_eq!(f.gate.time_until_next_claim(&bob), 0);
    }

    /// Yields once before minting, so a concurrent claim can run in between
    struct YieldingToken(SimulatedToken);

    #[async_trait::async_trait]
    impl TokenContract for YieldingToken {
        fn address(&self) -> &str {
            self.0.address()
        }

        async fn read_balance(&self, owner: &PlayerId) -> Result<u128, SettlementError> {
            self.0.read_balance(owner).await
        }

        async fn transfer(&self, from: &PlayerId, to: &str, amount: u128) -> Result<TxHash, SettlementError> {
            self.0.transfer(from, to, amount).await
        }

        async fn mint(&self, to: &PlayerId, amount: u128) -> Result<TxHash, SettlementError> {
            tokio::task::yield_now().await;
            self.0.mint(to, amount).await
        }
    }

    #[tokio::test]
    async fn test_interleaved_claims_mint_once() {
        let f = fixture();
        let token = YieldingToken(SimulatedToken::new(f.store.clone(), "0xcontract"));
        let alice = PlayerId::new("0xalice");

        let (first, second) = tokio::join!(f.gate.claim(&alice, &token), f.gate.claim(&alice, &token));

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(ArcadeError::Precondition(PreconditionError::ClaimInProgress))
        )));
        assert_eq!(token.read_balance(&alice).await.unwrap(), 100 * 10u128.pow(18));

        // reservation released; the cooldown now applies
        assert!(matches!(
            f.gate.claim(&alice, &token).await,
            Err(ArcadeError::Precondition(PreconditionError::ClaimCooldown { .. }))
        ));
    }

    #[tokio::test]
    async fn test_failed_mint_releases_reservation() {
        let f = fixture();
        let alice = PlayerId::new("0xalice");
        f.token.set_offline(true);
        assert!(f.gate.claim(&alice, &f.token).await.is_err());

        f.token.set_offline(false);
        assert!(f.gate.claim(&alice, &f.token).await.is_ok());
    }

    #[test]
    fn test_corrupt_record_is_claimable() {
        let f = fixture();
        f.store.put("lastClaim_0xalice", "yesterday").unwrap();
        assert_eq!(f.gate.status(&PlayerId::new("0xalice")), ClaimState::Claimable);
    }
}
