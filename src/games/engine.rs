use crate::config::GamesConfig;
use crate::games::rng::RandomSource;
use crate::games::slots::evaluate_reels;
use crate::games::types::{CoinSide, GameOutcome, GameType, OutcomeDetail, Play};
use crate::games::word::WordGameSession;

/// Turns a play and a source of randomness into an outcome
///
/// Holds only the configured prices and payout tables, so it can be shared
/// freely; all state lives in the caller's session.
#[derive(Debug, Clone)]
pub struct OutcomeEngine {
    config: GamesConfig,
}

impl OutcomeEngine {
    pub fn new(config: GamesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GamesConfig {
        &self.config
    }

    /// Price of one play (for the word game, one session)
    pub fn stake_for(&self, game: GameType) -> f64 {
        match game {
            GameType::CoinFlip => self.config.coin_flip.price_per_flip,
            GameType::Dice => self.config.dice.price_per_roll,
            GameType::Slots => self.config.slots.price_per_spin,
            GameType::Word => self.config.word.entry_fee,
        }
    }

    /// Resolve a single play
    pub fn play(&self, play: &Play, rng: &mut dyn RandomSource) -> GameOutcome {
        let outcome = match *play {
            Play::CoinFlip { choice } => self.flip_coin(choice, rng),
            Play::Dice => self.roll_dice(rng),
            Play::Slots => self.spin_slots(rng),
        };

        tracing::debug!(
            game = %outcome.game,
            won = outcome.won,
            reward = outcome.reward_amount,
            "Play resolved"
        );
        outcome
    }

    /// Start a word game with a randomly drawn target
    pub fn new_word_session(&self, rng: &mut dyn RandomSource) -> WordGameSession {
        WordGameSession::start(&self.config.word, rng)
    }

    fn flip_coin(&self, choice: CoinSide, rng: &mut dyn RandomSource) -> GameOutcome {
        let landed = if rng.next_bit() {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        };
        let detail = OutcomeDetail::CoinFlip { choice, landed };

        if landed == choice {
            let stake = self.config.coin_flip.price_per_flip;
            GameOutcome::won(GameType::CoinFlip, detail, stake * self.config.coin_flip.win_multiplier)
        } else {
            GameOutcome::lost(GameType::CoinFlip, detail)
        }
    }

    fn roll_dice(&self, rng: &mut dyn RandomSource) -> GameOutcome {
        let roll = rng.next_index(6) as u8 + 1;
        let detail = OutcomeDetail::Dice { roll };
        let dice = &self.config.dice;

        if dice.winning_numbers.contains(&roll) {
            GameOutcome::won(GameType::Dice, detail, dice.price_per_roll * dice.win_multiplier)
        } else {
            GameOutcome::lost(GameType::Dice, detail)
        }
    }

    fn spin_slots(&self, rng: &mut dyn RandomSource) -> GameOutcome {
        let slots = &self.config.slots;
        let faces = slots.symbols.len().max(1);
        let reels = [rng.next_index(faces), rng.next_index(faces), rng.next_index(faces)];

        let win = evaluate_reels(reels, slots, slots.price_per_spin);
        let detail = OutcomeDetail::Slots { reels, tier: win.tier };

        if win.payout > 0.0 {
            GameOutcome::won(GameType::Slots, detail, win.payout)
        } else {
            GameOutcome::lost(GameType::Slots, detail)
        }
    }
}

impl Default for OutcomeEngine {
    fn default() -> Self {
        Self::new(GamesConfig::default())
    }
}
