//! Balance presentation rules
//!
//! Decides what a balance display should show: the amount, a sync progress
//! line while the chain replays, and warnings about how much is stored on
//! a hot wallet.

use bitcoin::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 1/800 BTC
pub const SOME_BALANCE_THRESHOLD: Amount = Amount::from_sat(125_000);
/// 1/16 BTC
pub const TOO_MUCH_BALANCE_THRESHOLD: Amount = Amount::from_sat(6_250_000);

/// The chain counts as up to date when its tip is younger than this.
pub const BLOCKCHAIN_UPTODATE_THRESHOLD_SECS: u64 = HOUR;

const HOUR: u64 = 3600;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// Something keeping the chain from syncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impediment {
    Storage,
    Network,
}

/// Snapshot of the local chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainState {
    pub best_chain_height: u32,
    /// Timestamp of the best block, unix seconds
    pub best_chain_time: Option<u64>,
    pub replaying: bool,
    #[serde(default)]
    pub impediments: Vec<Impediment>,
}

impl Default for BlockchainState {
    fn default() -> Self {
        Self::genesis()
    }
}

impl BlockchainState {
    /// State right after a reset: replaying from the start.
    pub fn genesis() -> Self {
        Self {
            best_chain_height: 0,
            best_chain_time: None,
            replaying: true,
            impediments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Downloading,
    Stalled,
}

/// How far behind the chain tip is, in the coarsest sensible unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainLag {
    Hours(u64),
    Days(u64),
    Weeks(u64),
    Months(u64),
}

impl ChainLag {
    pub fn from_secs(lag: u64) -> Self {
        if lag < 2 * DAY {
            ChainLag::Hours(lag / HOUR)
        } else if lag < 2 * WEEK {
            ChainLag::Days(lag / DAY)
        } else if lag < 90 * DAY {
            ChainLag::Weeks(lag / WEEK)
        } else {
            ChainLag::Months(lag / (30 * DAY))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress {
    pub status: SyncStatus,
    pub lag: ChainLag,
}

impl fmt::Display for SyncProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            SyncStatus::Downloading => "downloading",
            SyncStatus::Stalled => "stalled",
        };
        match self.lag {
            ChainLag::Hours(n) => write!(f, "{}, {} hours behind", status, n),
            ChainLag::Days(n) => write!(f, "{}, {} days behind", status, n),
            ChainLag::Weeks(n) => write!(f, "{}, {} weeks behind", status, n),
            ChainLag::Months(n) => write!(f, "{}, {} months behind", status, n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceWarning {
    /// More than a phone wallet should hold
    TooMuch,
}

/// What a balance display should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceView {
    /// Set while the chain replays and is behind; the balance is hidden then
    pub progress: Option<SyncProgress>,
    pub balance: Option<Amount>,
    pub warning: Option<BalanceWarning>,
    pub has_some_balance: bool,
}

impl BalanceView {
    pub fn compute(balance: Option<Amount>, chain: Option<&BlockchainState>, now: u64) -> Self {
        let has_some_balance = balance.is_some_and(|b| b >= SOME_BALANCE_THRESHOLD);

        let progress = chain.and_then(|chain| {
            let best_time = chain.best_chain_time?;
            let lag = now.saturating_sub(best_time);
            let up_to_date = lag < BLOCKCHAIN_UPTODATE_THRESHOLD_SECS;
            if up_to_date || !chain.replaying {
                return None;
            }
            let status = if chain.impediments.is_empty() {
                SyncStatus::Downloading
            } else {
                SyncStatus::Stalled
            };
            Some(SyncProgress {
                status,
                lag: ChainLag::from_secs(lag),
            })
        });

        if progress.is_some() {
            return Self {
                progress,
                balance: None,
                warning: None,
                has_some_balance,
            };
        }

        let warning = match balance {
            Some(b) if b > TOO_MUCH_BALANCE_THRESHOLD => Some(BalanceWarning::TooMuch),
            _ => None,
        };

        Self {
            progress: None,
            balance,
            warning,
            has_some_balance,
        }
    }
}
