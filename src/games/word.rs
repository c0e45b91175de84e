//! Five-letter word guessing
//!
//! A session picks a hidden word, scores each guess letter by letter and ends
//! on a correct guess or when the attempts run out. Winning earlier pays more:
//! `base_price × (max_attempts + 1 − attempts_used)`.

use crate::config::WordGameConfig;
use crate::errors::PreconditionError;
use crate::games::rng::RandomSource;
use crate::games::types::{GameOutcome, GameType, OutcomeDetail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Per-letter verdict, ordered so that a higher value never gets replaced by a lower one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterStatus {
    Absent,
    Present,
    Correct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub letter: char,
    pub status: LetterStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordGameStatus {
    InProgress,
    Won,
    Lost,
}

/// Scored guess, plus the final outcome when this guess ended the session
#[derive(Debug, Clone, PartialEq)]
pub struct GuessResult {
    pub tiles: Vec<Tile>,
    pub outcome: Option<GameOutcome>,
}

/// Reward for a win after `attempts_used` guesses
pub fn word_reward(base_price: f64, max_attempts: u32, attempts_used: u32) -> f64 {
    let steps = (max_attempts + 1).saturating_sub(attempts_used);
    base_price * steps as f64
}

/// Score `guess` against `target`; both upper-case and of equal length
///
/// A letter is `Present` whenever it occurs anywhere in the target, repeated
/// letters are not counted off.
pub fn score_guess(guess: &str, target: &str) -> Vec<Tile> {
    let target_letters: Vec<char> = target.chars().collect();
    guess
        .chars()
        .enumerate()
        .map(|(idx, letter)| {
            let status = if target_letters.get(idx) == Some(&letter) {
                LetterStatus::Correct
            } else if target_letters.contains(&letter) {
                LetterStatus::Present
            } else {
                LetterStatus::Absent
            };
            Tile { letter, status }
        })
        .collect()
}

pub struct WordGameSession {
    id: Uuid,
    target: String,
    guesses: Vec<Vec<Tile>>,
    keyboard: BTreeMap<char, LetterStatus>,
    status: WordGameStatus,
    word_length: usize,
    max_attempts: u32,
    base_price: f64,
}

impl WordGameSession {
    /// Start with a word drawn uniformly from the configured list
    pub fn start(config: &WordGameConfig, rng: &mut dyn RandomSource) -> Self {
        let idx = rng.next_index(config.words.len().max(1));
        let target = config.words.get(idx).cloned().unwrap_or_default();
        Self::with_target(target, config)
    }

    /// Start with a known word
    pub fn with_target(target: impl Into<String>, config: &WordGameConfig) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            target: target.into().to_ascii_uppercase(),
            guesses: Vec::with_capacity(config.max_attempts as usize),
            keyboard: BTreeMap::new(),
            status: WordGameStatus::InProgress,
            word_length: config.word_length,
            max_attempts: config.max_attempts,
            base_price: config.base_price,
        };
        tracing::debug!(session = %session.id, "Word game started");
        session
    }

    /// Throw the current board away and draw a fresh word
    pub fn restart(&mut self, config: &WordGameConfig, rng: &mut dyn RandomSource) {
        *self = Self::start(config, rng);
    }

    /// Submit a guess; malformed guesses consume no attempt
    pub fn submit_guess(&mut self, guess: &str) -> Result<GuessResult, PreconditionError> {
        if self.status != WordGameStatus::InProgress {
            return Err(PreconditionError::GameOver);
        }

        let guess = guess.trim().to_ascii_uppercase();
        if guess.chars().count() != self.word_length {
            return Err(PreconditionError::InvalidGuess {
                reason: format!("word must be {} letters", self.word_length),
                guess,
            });
        }
        if !guess.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PreconditionError::InvalidGuess {
                reason: "letters only".to_string(),
                guess,
            });
        }

        let tiles = score_guess(&guess, &self.target);
        for tile in &tiles {
            self.keyboard
                .entry(tile.letter)
                .and_modify(|status| *status = (*status).max(tile.status))
                .or_insert(tile.status);
        }
        self.guesses.push(tiles.clone());

        let attempts_used = self.attempts_used();
        let outcome = if guess == self.target {
            self.status = WordGameStatus::Won;
            let reward = word_reward(self.base_price, self.max_attempts, attempts_used);
            tracing::info!(session = %self.id, attempts_used, reward, "Word game won");
            Some(GameOutcome::won(GameType::Word, self.detail(), reward))
        } else if attempts_used >= self.max_attempts {
            self.status = WordGameStatus::Lost;
            tracing::info!(session = %self.id, "Word game lost");
            Some(GameOutcome::lost(GameType::Word, self.detail()))
        } else {
            None
        };

        Ok(GuessResult { tiles, outcome })
    }

    fn detail(&self) -> OutcomeDetail {
        OutcomeDetail::Word {
            target: self.target.clone(),
            attempts_used: self.attempts_used(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> WordGameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status != WordGameStatus::InProgress
    }

    pub fn attempts_used(&self) -> u32 {
        self.guesses.len() as u32
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts_used())
    }

    pub fn guesses(&self) -> &[Vec<Tile>] {
        &self.guesses
    }

    /// Aggregate status of a letter across all guesses so far
    pub fn keyboard_status(&self, letter: char) -> Option<LetterStatus> {
        self.keyboard.get(&letter.to_ascii_uppercase()).copied()
    }

    pub fn keyboard(&self) -> &BTreeMap<char, LetterStatus> {
        &self.keyboard
    }

    /// Hidden word, revealed only once the session is over
    pub fn revealed_target(&self) -> Option<&str> {
        self.is_over().then_some(self.target.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::rng::ScriptedRandom;

    fn config() -> WordGameConfig {
        WordGameConfig::default()
    }

    #[test]
    fn test_first_try_win_pays_top_reward() {
        let mut session = WordGameSession::with_target("TOKEN", &config());
        let result = session.submit_guess("token").unwrap();

        let outcome = result.outcome.expect("session over");
        assert!(outcome.won);
        assert_eq!(outcome.reward_amount, 25.0);
        assert!(result.tiles.iter().all(|t| t.status == LetterStatus::Correct));
        assert_eq!(session.status(), WordGameStatus::Won);
    }

    #[test]
    fn test_reward_steps_down_per_attempt() {
        let rewards: Vec<f64> = (1..=5).map(|n| word_reward(5.0, 5, n)).collect();
        assert_eq!(rewards, vec![25.0, 20.0, 15.0, 10.0, 5.0]);
    }

    #[test]
    fn test_five_misses_lose() {
        let mut session = WordGameSession::with_target("BLOCK", &config());
        for guess in ["REACT", "REDUX", "CHAIN", "TOKEN", "SMART"] {
            let result = session.submit_guess(guess).unwrap();
            if session.attempts_used() < 5 {
                assert!(result.outcome.is_none());
            } else {
                let outcome = result.outcome.expect("session over");
                assert!(!outcome.won);
                assert_eq!(outcome.reward_amount, 0.0);
            }
        }
        assert_eq!(session.status(), WordGameStatus::Lost);
        assert_eq!(session.revealed_target(), Some("BLOCK"));
        assert_eq!(session.submit_guess("BLOCK"), Err(PreconditionError::GameOver));
    }

    #[test]
    fn test_wrong_length_consumes_no_attempt() {
        let mut session = WordGameSession::with_target("TOKEN", &config());
        let err = session.submit_guess("TOKE").unwrap_err();
        assert!(matches!(err, PreconditionError::InvalidGuess { .. }));
        assert!(session.submit_guess("TOK3N").is_err());
        assert_eq!(session.attempts_used(), 0);
        assert_eq!(session.revealed_target(), None);
    }

    #[test]
    fn test_scoring_marks_present_and_absent() {
        let tiles = score_guess("STAKE", "TOKEN");
        let statuses: Vec<LetterStatus> = tiles.iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![
                LetterStatus::Absent,  // S
                LetterStatus::Present, // T
                LetterStatus::Absent,  // A
                LetterStatus::Present, // K
                LetterStatus::Present, // E
            ]
        );
    }

    #[test]
    fn test_keyboard_never_downgrades_correct() {
        let mut session = WordGameSession::with_target("TOKEN", &config());
        // T correct at position 0
        session.submit_guess("TRAIL").unwrap();
        assert_eq!(session.keyboard_status('T'), Some(LetterStatus::Correct));
        // T only present here (position 1)
        session.submit_guess("STAKE").unwrap();
        assert_eq!(session.keyboard_status('t'), Some(LetterStatus::Correct));
        assert_eq!(session.keyboard_status('S'), Some(LetterStatus::Absent));
    }

    #[test]
    fn test_keyboard_upgrades_present_to_correct() {
        let mut session = WordGameSession::with_target("TOKEN", &config());
        session.submit_guess("STAKE").unwrap();
        assert_eq!(session.keyboard_status('K'), Some(LetterStatus::Present));
        session.submit_guess("POKER").unwrap();
        assert_eq!(session.keyboard_status('K'), Some(LetterStatus::Correct));
    }

    #[test]
    fn test_start_picks_from_word_list() {
        let mut rng = ScriptedRandom::new([3]);
        let mut session = WordGameSession::start(&config(), &mut rng);
        let result = session.submit_guess("TOKEN").unwrap();
        assert!(result.outcome.unwrap().won);
    }

    #[test]
    fn test_restart_clears_board() {
        let config = config();
        let mut session = WordGameSession::with_target("TOKEN", &config);
        let old_id = session.id();
        session.submit_guess("STAKE").unwrap();

        // index 5 is BLOCK
        session.restart(&config, &mut ScriptedRandom::new([5]));
        assert_ne!(session.id(), old_id);
        assert_eq!(session.attempts_used(), 0);
        assert!(session.keyboard().is_empty());
        assert!(session.submit_guess("BLOCK").unwrap().outcome.unwrap().won);
    }
}
