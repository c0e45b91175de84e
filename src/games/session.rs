use crate::errors::PreconditionError;
use crate::games::engine::OutcomeEngine;
use crate::games::rng::RandomSource;
use crate::games::types::{GameOutcome, GameType, Play};
use crate::games::word::WordGameSession;
use std::collections::VecDeque;
use uuid::Uuid;

/// Per-page play state: purchased credits, the in-flight gate and recent results
///
/// Not persisted; a fresh session starts with zero credits.
pub struct GameSession {
    id: Uuid,
    game: GameType,
    credits: u32,
    in_flight: bool,
    history: VecDeque<GameOutcome>,
    history_window: usize,
}

impl GameSession {
    pub fn new(game: GameType, history_window: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            game,
            credits: 0,
            in_flight: false,
            history: VecDeque::with_capacity(history_window),
            history_window,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn game(&self) -> GameType {
        self.game
    }

    pub fn credits(&self) -> u32 {
        self.credits
    }

    /// Purchases replace the counter, they do not add to it
    pub fn set_credits(&mut self, credits: u32) {
        tracing::debug!(session = %self.id, previous = self.credits, credits, "Credits set");
        self.credits = credits;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Open the animation gate for one play
    pub fn begin_play(&mut self) -> Result<(), PreconditionError> {
        if self.in_flight {
            return Err(PreconditionError::PlayInProgress);
        }
        if self.credits == 0 {
            return Err(PreconditionError::NoCreditsRemaining);
        }
        self.in_flight = true;
        Ok(())
    }

    /// Resolve the in-flight play, spend its credit and close the gate
    pub fn finish_play(
        &mut self,
        engine: &OutcomeEngine,
        play: &Play,
        rng: &mut dyn RandomSource,
    ) -> Result<GameOutcome, PreconditionError> {
        if !self.in_flight {
            return Err(PreconditionError::NoPlayInProgress);
        }
        if play.game_type() != self.game {
            return Err(PreconditionError::GameMismatch {
                expected: self.game.to_string(),
            });
        }

        let outcome = engine.play(play, rng);
        self.credits = self.credits.saturating_sub(1);
        self.record(outcome.clone());
        self.in_flight = false;
        Ok(outcome)
    }

    /// `begin_play` then `finish_play`
    pub fn play(
        &mut self,
        engine: &OutcomeEngine,
        play: &Play,
        rng: &mut dyn RandomSource,
    ) -> Result<GameOutcome, PreconditionError> {
        if play.game_type() != self.game {
            return Err(PreconditionError::GameMismatch {
                expected: self.game.to_string(),
            });
        }
        self.begin_play()?;
        self.finish_play(engine, play, rng)
    }

    /// Spend one credit on a new word board
    pub fn start_word_game(
        &mut self,
        engine: &OutcomeEngine,
        rng: &mut dyn RandomSource,
    ) -> Result<WordGameSession, PreconditionError> {
        if self.game != GameType::Word {
            return Err(PreconditionError::GameMismatch {
                expected: self.game.to_string(),
            });
        }
        if self.credits == 0 {
            return Err(PreconditionError::NoCreditsRemaining);
        }
        self.credits -= 1;
        Ok(engine.new_word_session(rng))
    }

    /// Push an outcome to the front of the history, dropping the oldest past the window
    pub fn record(&mut self, outcome: GameOutcome) {
        self.history.push_front(outcome);
        self.history.truncate(self.history_window);
    }

    /// Most recent first
    pub fn history(&self) -> impl Iterator<Item = &GameOutcome> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::rng::{ScriptedRandom, StdRandom};
    use crate::games::types::OutcomeDetail;

    fn dice_session(credits: u32) -> GameSession {
        let mut session = GameSession::new(GameType::Dice, 12);
        session.set_credits(credits);
        session
    }

    #[test]
    fn test_play_spends_one_credit() {
        let engine = OutcomeEngine::default();
        let mut session = dice_session(3);
        session.play(&engine, &Play::Dice, &mut ScriptedRandom::new([0])).unwrap();
        assert_eq!(session.credits(), 2);
        assert!(!session.is_in_flight());
    }

    #[test]
    fn test_zero_credits_rejected() {
        let engine = OutcomeEngine::default();
        let mut session = dice_session(0);
        let err = session.play(&engine, &Play::Dice, &mut ScriptedRandom::new([0])).unwrap_err();
        assert_eq!(err, PreconditionError::NoCreditsRemaining);
        assert_eq!(session.history_len(), 0);
    }

    #[test]
    fn test_second_begin_while_in_flight() {
        let engine = OutcomeEngine::default();
        let mut session = dice_session(2);
        session.begin_play().unwrap();
        assert_eq!(session.begin_play(), Err(PreconditionError::PlayInProgress));
        assert_eq!(session.credits(), 2);

        session.finish_play(&engine, &Play::Dice, &mut ScriptedRandom::new([5])).unwrap();
        assert!(session.begin_play().is_ok());
    }

    #[test]
    fn test_finish_without_begin() {
        let engine = OutcomeEngine::default();
        let mut session = dice_session(1);
        let err = session
            .finish_play(&engine, &Play::Dice, &mut ScriptedRandom::new([0]))
            .unwrap_err();
        assert_eq!(err, PreconditionError::NoPlayInProgress);
    }

    #[test]
    fn test_wrong_game_rejected() {
        let engine = OutcomeEngine::default();
        let mut session = dice_session(1);
        let err = session.play(&engine, &Play::Slots, &mut ScriptedRandom::new([0, 0, 0])).unwrap_err();
        assert!(matches!(err, PreconditionError::GameMismatch { .. }));
        assert_eq!(session.credits(), 1);
        assert!(!session.is_in_flight());
    }

    #[test]
    fn test_history_newest_first_and_bounded() {
        let engine = OutcomeEngine::default();
        let mut session = dice_session(20);
        let mut rng = StdRandom::seeded(1);
        for _ in 0..14 {
            session.play(&engine, &Play::Dice, &mut rng).unwrap();
        }
        session.play(&engine, &Play::Dice, &mut ScriptedRandom::new([2])).unwrap();

        assert_eq!(session.history_len(), 12);
        let newest = session.history().next().unwrap();
        assert_eq!(newest.detail, OutcomeDetail::Dice { roll: 3 });
    }

    #[test]
    fn test_purchase_sets_rather_than_adds() {
        let mut session = dice_session(4);
        session.set_credits(5);
        assert_eq!(session.credits(), 5);
    }

    #[test]
    fn test_word_game_costs_a_credit() {
        let engine = OutcomeEngine::default();
        let mut session = GameSession::new(GameType::Word, 12);
        assert!(session.start_word_game(&engine, &mut ScriptedRandom::new([0])).is_err());

        session.set_credits(1);
        let board = session.start_word_game(&engine, &mut ScriptedRandom::new([0])).unwrap();
        assert_eq!(board.attempts_used(), 0);
        assert_eq!(session.credits(), 0);
    }
}
