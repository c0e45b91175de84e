use serde::{Deserialize, Serialize};
use std::fmt;

/// Wallet address identifying a player
///
/// An empty id stands for "no wallet connected".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into().trim().to_string())
    }

    /// No wallet connected
    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Option<&str>> for PlayerId {
    fn from(address: Option<&str>) -> Self {
        address.map(PlayerId::new).unwrap_or_default()
    }
}

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    CoinFlip,
    Dice,
    Slots,
    Word,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::CoinFlip => write!(f, "coinflip"),
            GameType::Dice => write!(f, "dice"),
            GameType::Slots => write!(f, "slots"),
            GameType::Word => write!(f, "word"),
        }
    }
}

impl std::str::FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coinflip" | "coin" | "flip" => Ok(GameType::CoinFlip),
            "dice" => Ok(GameType::Dice),
            "slots" => Ok(GameType::Slots),
            "word" | "wordle" => Ok(GameType::Word),
            other => Err(format!("unknown game '{}'", other)),
        }
    }
}

/// Coin side, used both for the player's call and the landing side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "heads"),
            CoinSide::Tails => write!(f, "tails"),
        }
    }
}

impl std::str::FromStr for CoinSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heads" | "h" => Ok(CoinSide::Heads),
            "tails" | "t" => Ok(CoinSide::Tails),
            other => Err(format!("expected heads or tails, got '{}'", other)),
        }
    }
}

/// One play action, tagged by game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum Play {
    CoinFlip { choice: CoinSide },
    Dice,
    Slots,
}

impl Play {
    pub fn game_type(&self) -> GameType {
        match self {
            Play::CoinFlip { .. } => GameType::CoinFlip,
            Play::Dice => GameType::Dice,
            Play::Slots => GameType::Slots,
        }
    }
}

/// Payout tier of a slot spin
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotTier {
    Jackpot,
    Pair,
    NoMatch,
}

/// Game-specific result data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum OutcomeDetail {
    CoinFlip { choice: CoinSide, landed: CoinSide },
    Dice { roll: u8 },
    Slots { reels: [usize; 3], tier: SlotTier },
    Word { target: String, attempts_used: u32 },
}

/// Result of a single play, consumed right away by the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameOutcome {
    pub game: GameType,
    pub detail: OutcomeDetail,
    pub won: bool,
    pub reward_amount: f64,
}

impl GameOutcome {
    pub fn lost(game: GameType, detail: OutcomeDetail) -> Self {
        Self {
            game,
            detail,
            won: false,
            reward_amount: 0.0,
        }
    }

    pub fn won(game: GameType, detail: OutcomeDetail, reward_amount: f64) -> Self {
        Self {
            game,
            detail,
            won: true,
            reward_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_trims_and_detects_empty() {
        assert!(PlayerId::new("   ").is_empty());
        assert!(PlayerId::from(None).is_empty());
        assert_eq!(PlayerId::new(" 0xabc ").as_str(), "0xabc");
    }

    #[test]
    fn test_play_serializes_tagged() {
        let json = serde_json::to_value(Play::CoinFlip { choice: CoinSide::Tails }).unwrap();
        assert_eq!(json["game"], "coinflip");
        assert_eq!(json["choice"], "tails");
        assert_eq!(Play::Slots.game_type(), GameType::Slots);
    }

    #[test]
    fn test_game_type_parse() {
        assert_eq!("Wordle".parse::<GameType>(), Ok(GameType::Word));
        assert!("poker".parse::<GameType>().is_err());
    }
}
