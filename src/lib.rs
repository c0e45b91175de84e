//! LTK Arcade - play-to-earn arcade core
//!
//! Outcome engines for coin flip, dice, slots and a word game, a pending
//! rewards ledger, a daily claim gate and a lives purchase flow. Fees and
//! payouts settle through an external token contract behind [`TokenContract`].

pub mod claim;
pub mod config;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod purchase;
pub mod services;
pub mod settlement;
pub mod storage;

pub use config::{ArcadeConfig, ConfigLoader};
pub use errors::{ArcadeError, ArcadeResult, PreconditionError};
pub use games::{GameOutcome, GameType, PlayerId};
pub use ledger::PendingRewardsLedger;
pub use services::{ArcadeServices, ServiceBuilder};
pub use settlement::{SimulatedToken, TokenContract, TxHash};
