use crate::config::{SlotSymbol, SlotsConfig};
use crate::games::types::SlotTier;

/// Payout of one evaluated spin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotWin {
    pub tier: SlotTier,
    /// Index of the symbol that decided the payout
    pub symbol: Option<usize>,
    pub payout: f64,
}

/// Symbol shared by at least two of the three reels, never the odd one out
pub fn matched_symbol(reels: [usize; 3]) -> Option<usize> {
    let [a, b, c] = reels;
    if a == b {
        Some(a)
    } else if b == c {
        Some(b)
    } else if a == c {
        Some(a)
    } else {
        None
    }
}

/// Three of a kind pays the full multiplier, a pair pays `pair_factor` of it
pub fn evaluate_reels(reels: [usize; 3], config: &SlotsConfig, stake: f64) -> SlotWin {
    let multiplier = |idx: usize| {
        config
            .symbols
            .get(idx)
            .map(|s: &SlotSymbol| s.multiplier)
            .unwrap_or(0.0)
    };

    let [a, b, c] = reels;
    if a == b && b == c {
        return SlotWin {
            tier: SlotTier::Jackpot,
            symbol: Some(a),
            payout: stake * multiplier(a),
        };
    }

    match matched_symbol(reels) {
        Some(symbol) => SlotWin {
            tier: SlotTier::Pair,
            symbol: Some(symbol),
            payout: stake * multiplier(symbol) * config.pair_factor,
        },
        None => SlotWin {
            tier: SlotTier::NoMatch,
            symbol: None,
            payout: 0.0,
        },
    }
}
