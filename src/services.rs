//! Service container wiring the arcade core together
//!
//! Built once at start-up and passed explicitly to whatever drives the games
//! (the CLI, tests). Owns the configuration, the key-value store, the ledger,
//! the claim gate, the purchase flow, the outcome engine and the token
//! contract handle.

use crate::claim::{ClaimReceipt, Clock, DailyClaimGate, SystemClock};
use crate::config::ArcadeConfig;
use crate::errors::{ArcadeResult, PreconditionError};
use crate::games::{
    GameOutcome, GameSession, GameType, OutcomeEngine, Play, PlayerId, RandomSource, WordGameSession,
};
use crate::games::word::GuessResult;
use crate::ledger::PendingRewardsLedger;
use crate::purchase::{PurchaseFlow, PurchaseReceipt};
use crate::settlement::{from_base_units, to_base_units, SimulatedToken, TokenContract, TxHash};
use crate::storage::{open_store, KeyValueStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Minted payout of the pending rewards
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementReceipt {
    pub tx: TxHash,
    pub amount: f64,
}

pub struct ArcadeServices {
    config: ArcadeConfig,
    store: Arc<dyn KeyValueStore>,
    token: Arc<dyn TokenContract>,
    ledger: PendingRewardsLedger,
    claims: DailyClaimGate,
    purchases: PurchaseFlow,
    engine: OutcomeEngine,
}

impl ArcadeServices {
    /// Open the configured store and bind a simulated token contract to it
    pub fn from_config(config: ArcadeConfig) -> ArcadeResult<Self> {
        ServiceBuilder::new(config).build()
    }

    pub fn config(&self) -> &ArcadeConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    pub fn token(&self) -> Arc<dyn TokenContract> {
        Arc::clone(&self.token)
    }

    pub fn ledger(&self) -> &PendingRewardsLedger {
        &self.ledger
    }

    pub fn claims(&self) -> &DailyClaimGate {
        &self.claims
    }

    pub fn purchases(&self) -> &PurchaseFlow {
        &self.purchases
    }

    pub fn engine(&self) -> &OutcomeEngine {
        &self.engine
    }

    /// Fresh page state for one game, with no credits
    pub fn new_session(&self, game: GameType) -> GameSession {
        GameSession::new(game, self.config.games.history_window)
    }

    /// Token balance in LTK
    pub async fn balance_of(&self, player: &PlayerId) -> ArcadeResult<f64> {
        if player.is_empty() {
            return Err(PreconditionError::MissingIdentity.into());
        }
        let units = self.token.read_balance(player).await?;
        Ok(from_base_units(units, self.config.settlement.decimals))
    }

    pub async fn claim_daily(&self, player: &PlayerId) -> ArcadeResult<ClaimReceipt> {
        self.claims.claim(player, self.token.as_ref()).await
    }

    /// Buy plays for the session's game at that game's price
    pub async fn purchase(
        &self,
        player: &PlayerId,
        session: &mut GameSession,
        quantity: u32,
    ) -> ArcadeResult<PurchaseReceipt> {
        let unit_price = self.engine.stake_for(session.game());
        self.purchases
            .purchase(player, quantity, unit_price, session, self.token.as_ref())
            .await
    }

    /// Resolve the in-flight play and accrue any win
    pub fn finish_play(
        &self,
        player: &PlayerId,
        session: &mut GameSession,
        play: &Play,
        rng: &mut dyn RandomSource,
    ) -> ArcadeResult<GameOutcome> {
        let outcome = session.finish_play(&self.engine, play, rng)?;
        self.accrue(player, &outcome)?;
        Ok(outcome)
    }

    /// One complete play: gate, resolve, accrue
    pub fn play(
        &self,
        player: &PlayerId,
        session: &mut GameSession,
        play: &Play,
        rng: &mut dyn RandomSource,
    ) -> ArcadeResult<GameOutcome> {
        let outcome = session.play(&self.engine, play, rng)?;
        self.accrue(player, &outcome)?;
        Ok(outcome)
    }

    pub fn start_word_game(
        &self,
        session: &mut GameSession,
        rng: &mut dyn RandomSource,
    ) -> ArcadeResult<WordGameSession> {
        Ok(session.start_word_game(&self.engine, rng)?)
    }

    /// Score a guess; a finished board is recorded in the session and a win accrues
    pub fn submit_word_guess(
        &self,
        player: &PlayerId,
        session: &mut GameSession,
        board: &mut WordGameSession,
        guess: &str,
    ) -> ArcadeResult<GuessResult> {
        let result = board.submit_guess(guess)?;
        if let Some(outcome) = &result.outcome {
            session.record(outcome.clone());
            self.accrue(player, outcome)?;
        }
        Ok(result)
    }

    /// Mint the whole pending balance to the player
    ///
    /// The ledger resets only once the mint is accepted; on failure the
    /// balance stays as it was.
    pub async fn settle_pending_rewards(&self, player: &PlayerId) -> ArcadeResult<SettlementReceipt> {
        if player.is_empty() {
            return Err(PreconditionError::MissingIdentity.into());
        }

        let amount = self.ledger.get_pending_rewards(player);
        if amount <= 0.0 {
            return Err(PreconditionError::NothingToSettle.into());
        }

        let units = to_base_units(amount, self.config.settlement.decimals)?;
        let tx = match self.token.mint(player, units).await {
            Ok(tx) => tx,
            Err(e) => {
                warn!(player = %player, amount, error = %e, "Reward settlement failed");
                return Err(e.into());
            }
        };
        self.ledger.reset_rewards(player);

        info!(player = %player, amount, tx = %tx, "Pending rewards settled");
        Ok(SettlementReceipt { tx, amount })
    }

    fn accrue(&self, player: &PlayerId, outcome: &GameOutcome) -> ArcadeResult<()> {
        if outcome.won && outcome.reward_amount > 0.0 {
            self.ledger.add_reward(player, outcome.reward_amount)?;
        }
        Ok(())
    }
}

/// Builder for service containers; overrides are mainly for tests
pub struct ServiceBuilder {
    config: ArcadeConfig,
    store_override: Option<Arc<dyn KeyValueStore>>,
    token_override: Option<Arc<dyn TokenContract>>,
    clock_override: Option<Arc<dyn Clock>>,
}

impl ServiceBuilder {
    pub fn new(config: ArcadeConfig) -> Self {
        Self {
            config,
            store_override: None,
            token_override: None,
            clock_override: None,
        }
    }

    /// Override the key-value store
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store_override = Some(store);
        self
    }

    /// Override the token contract binding
    pub fn with_token(mut self, token: Arc<dyn TokenContract>) -> Self {
        self.token_override = Some(token);
        self
    }

    /// Override the claim clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock_override = Some(clock);
        self
    }

    pub fn build(self) -> ArcadeResult<ArcadeServices> {
        let config = self.config;
        config.validate()?;

        let store = match self.store_override {
            Some(store) => store,
            None => open_store(&config.storage)?,
        };
        let token: Arc<dyn TokenContract> = match self.token_override {
            Some(token) => token,
            None => Arc::new(SimulatedToken::new(
                Arc::clone(&store),
                config.settlement.contract_address.clone(),
            )),
        };
        let clock: Arc<dyn Clock> = match self.clock_override {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let decimals = config.settlement.decimals;

        let services = ArcadeServices {
            ledger: PendingRewardsLedger::new(Arc::clone(&store)),
            claims: DailyClaimGate::new(Arc::clone(&store), clock, config.claim.clone(), decimals),
            purchases: PurchaseFlow::new(config.purchase.clone(), decimals),
            engine: OutcomeEngine::new(config.games.clone()),
            store,
            token,
            config,
        };

        info!(
            backend = ?services.config.storage.backend,
            contract = %services.token.address(),
            "Arcade services ready"
        );
        Ok(services)
    }
}
