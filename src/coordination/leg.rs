//! Legs, their outcomes and run bookkeeping

use crate::chain::{ChainClient, Receipt};
use crate::error::BridgeError;
use crate::tx::ChainConstants;

use ethers::types::{Bytes, H256};
use std::fmt;
use std::sync::Arc;

/// Direction of a leg within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Outbound,
    Return,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Return => "return",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to send one leg
pub struct LegRoute {
    pub direction: Direction,
    /// Human readable route, e.g. "op-sepolia -> unichain-sepolia"
    pub label: String,
    pub client: Arc<dyn ChainClient>,
    pub constants: ChainConstants,
    pub calldata: Bytes,
}

/// A leg that made it on chain
#[derive(Debug, Clone, PartialEq)]
pub struct LegConfirmation {
    pub nonce: u64,
    pub tx_hash: H256,
    pub receipt: Receipt,
}

/// Result of one leg
#[derive(Debug)]
pub enum LegOutcome {
    Confirmed(LegConfirmation),
    Failed { cause: BridgeError },
}

impl LegOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, LegOutcome::Confirmed(_))
    }
}

/// How many rounds to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundLimit {
    Count(u64),
    UntilStopped,
}

impl RoundLimit {
    /// Whether `completed` rounds exhaust the limit
    pub fn reached(&self, completed: u64) -> bool {
        match self {
            RoundLimit::Count(total) => completed >= *total,
            RoundLimit::UntilStopped => false,
        }
    }
}

impl fmt::Display for RoundLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundLimit::Count(total) => write!(f, "{}", total),
            RoundLimit::UntilStopped => f.write_str("unbounded"),
        }
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rounds_completed: u64,
    pub outbound_confirmed: u64,
    pub outbound_failed: u64,
    pub return_confirmed: u64,
    pub return_failed: u64,
}

impl RunSummary {
    pub fn record(&mut self, direction: Direction, outcome: &LegOutcome) {
        let confirmed = outcome.is_confirmed();
        let counter = match (direction, confirmed) {
            (Direction::Outbound, true) => &mut self.outbound_confirmed,
            (Direction::Outbound, false) => &mut self.outbound_failed,
            (Direction::Return, true) => &mut self.return_confirmed,
            (Direction::Return, false) => &mut self.return_failed,
        };
        *counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_limit() {
        assert!(!RoundLimit::Count(3).reached(2));
        assert!(RoundLimit::Count(3).reached(3));
        assert!(!RoundLimit::UntilStopped.reached(u64::MAX));
        assert_eq!(RoundLimit::UntilStopped.to_string(), "unbounded");
    }

    #[test]
    fn test_summary_record() {
        let mut summary = RunSummary::default();
        let failed = LegOutcome::Failed {
            cause: BridgeError::rpc(1, "send", "nope"),
        };
        summary.record(Direction::Outbound, &failed);
        summary.record(Direction::Return, &failed);
        summary.record(Direction::Return, &failed);

        assert_eq!(summary.outbound_failed, 1);
        assert_eq!(summary.return_failed, 2);
        assert_eq!(summary.outbound_confirmed + summary.return_confirmed, 0);
    }
}
