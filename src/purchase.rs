use crate::config::PurchaseConfig;
use crate::errors::{ArcadeResult, PreconditionError};
use crate::games::session::GameSession;
use crate::games::types::PlayerId;
use crate::settlement::{from_base_units, to_base_units, TokenContract, TxHash};
use tracing::{debug, info};

/// Clamp a requested quantity into `[min, max]`
pub fn clamp_quantity(quantity: u32, min: u32, max: u32) -> u32 {
    quantity.clamp(min, max.max(min))
}

/// Total price in LTK of `quantity` plays, clamped into `[min, max]` first
pub fn compute_cost(quantity: u32, unit_price: f64, min: u32, max: u32) -> f64 {
    clamp_quantity(quantity, min, max) as f64 * unit_price
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub tx: TxHash,
    pub quantity: u32,
    pub cost: f64,
}

/// Buys play credits by paying the fee into the token contract's own address
#[derive(Debug, Clone)]
pub struct PurchaseFlow {
    config: PurchaseConfig,
    decimals: u32,
}

impl PurchaseFlow {
    pub fn new(config: PurchaseConfig, decimals: u32) -> Self {
        Self { config, decimals }
    }

    pub fn default_quantity(&self) -> u32 {
        self.clamp(self.config.default_quantity)
    }

    pub fn clamp(&self, quantity: u32) -> u32 {
        clamp_quantity(quantity, self.config.min_quantity, self.config.max_quantity)
    }

    /// Quote the cost of a purchase after clamping
    pub fn quote(&self, quantity: u32, unit_price: f64) -> (u32, f64) {
        let quantity = self.clamp(quantity);
        let cost = compute_cost(quantity, unit_price, self.config.min_quantity, self.config.max_quantity);
        (quantity, cost)
    }

    /// Pay for `quantity` plays and set the session's credits to it
    ///
    /// Identity and balance are checked before any transfer is issued. The
    /// credits change only when the transfer is accepted.
    pub async fn purchase(
        &self,
        player: &PlayerId,
        quantity: u32,
        unit_price: f64,
        session: &mut GameSession,
        token: &dyn TokenContract,
    ) -> ArcadeResult<PurchaseReceipt> {
        if player.is_empty() {
            return Err(PreconditionError::MissingIdentity.into());
        }

        let (quantity, cost) = self.quote(quantity, unit_price);
        let cost_units = to_base_units(cost, self.decimals)?;

        let balance_units = token.read_balance(player).await?;
        if balance_units < cost_units {
            let available = from_base_units(balance_units, self.decimals);
            debug!(player = %player, cost, available, "Purchase rejected, balance too low");
            return Err(PreconditionError::InsufficientBalance {
                required: cost,
                available,
            }
            .into());
        }

        let tx = token.transfer(player, token.address(), cost_units).await?;
        session.set_credits(quantity);

        info!(
            player = %player,
            game = %session.game(),
            quantity,
            cost,
            tx = %tx,
            "Plays purchased"
        );
        Ok(PurchaseReceipt { tx, quantity, cost })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ArcadeError;
    use crate::games::types::GameType;
    use crate::settlement::{SettlementError, SimulatedToken};
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    const WEI: u128 = 1_000_000_000_000_000_000;

    async fn funded_token(player: &PlayerId, ltk: u128) -> SimulatedToken {
        let token = SimulatedToken::new(Arc::new(MemoryStore::new()), "0xcontract");
        token.mint(player, ltk * WEI).await.unwrap();
        token
    }

    #[test]
    fn test_quantity_clamped_into_range() {
        assert_eq!(clamp_quantity(0, 1, 20), 1);
        assert_eq!(clamp_quantity(25, 1, 20), 20);
        assert_eq!(clamp_quantity(7, 1, 20), 7);
    }

    #[test]
    fn test_cost_is_quantity_times_price() {
        assert_eq!(compute_cost(5, 3.0, 1, 20), 15.0);
        assert_eq!(compute_cost(25, 1.0, 1, 20), 20.0);
        assert_eq!(compute_cost(0, 2.0, 1, 20), 2.0);
        let flow = PurchaseFlow::new(PurchaseConfig::default(), 18);
        assert_eq!(flow.quote(50, 2.0), (20, 40.0));
        assert_eq!(flow.default_quantity(), 5);
    }

    #[tokio::test]
    async fn test_purchase_transfers_and_sets_credits() {
        let player = PlayerId::new("0xalice");
        let token = funded_token(&player, 20).await;
        let flow = PurchaseFlow::new(PurchaseConfig::default(), 18);
        let mut session = GameSession::new(GameType::CoinFlip, 12);
        session.set_credits(2);

        let receipt = flow.purchase(&player, 5, 3.0, &mut session, &token).await.unwrap();
        assert_eq!(receipt.cost, 15.0);
        assert_eq!(session.credits(), 5);
        assert_eq!(token.read_balance(&player).await.unwrap(), 5 * WEI);
        assert_eq!(token.balance_of_address("0xcontract").unwrap(), 15 * WEI);
    }

    #[tokio::test]
    async fn test_insufficient_balance_rejected_before_transfer() {
        let player = PlayerId::new("0xalice");
        let token = funded_token(&player, 10).await;
        let flow = PurchaseFlow::new(PurchaseConfig::default(), 18);
        let mut session = GameSession::new(GameType::CoinFlip, 12);

        let err = flow.purchase(&player, 5, 3.0, &mut session, &token).await.unwrap_err();
        match err {
            ArcadeError::Precondition(PreconditionError::InsufficientBalance { required, available }) => {
                assert_eq!(required, 15.0);
                assert_eq!(available, 10.0);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(session.credits(), 0);
        assert_eq!(token.balance_of_address("0xcontract").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_identity_rejected() {
        let token = SimulatedToken::new(Arc::new(MemoryStore::new()), "0xcontract");
        let flow = PurchaseFlow::new(PurchaseConfig::default(), 18);
        let mut session = GameSession::new(GameType::Dice, 12);

        let err = flow
            .purchase(&PlayerId::none(), 5, 2.0, &mut session, &token)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ArcadeError::Precondition(PreconditionError::MissingIdentity)
        ));
    }

    #[tokio::test]
    async fn test_failed_transfer_keeps_credits() {
        let player = PlayerId::new("0xalice");
        let token = funded_token(&player, 50).await;
        let flow = PurchaseFlow::new(PurchaseConfig::default(), 18);
        let mut session = GameSession::new(GameType::Slots, 12);
        session.set_credits(1);

        token.set_offline(true);
        let err = flow.purchase(&player, 5, 5.0, &mut session, &token).await.unwrap_err();
        assert!(matches!(err, ArcadeError::Settlement(SettlementError::Offline(_))));
        assert_eq!(session.credits(), 1);
    }
}
