//! Receipts and status snapshots produced by basket operations.
//!
//! - [`CommitReceipt`]: what a successful commit moved.
//! - [`RollbackReport`]: per-holding outcome of one rollback call. Failed
//!   holdings stay in the basket and are retried by the next call.
//! - [`BasketStatus`]: read-only view of required vs. held amounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, AssetId, BasketState};

/// Result of one holding's transfer attempt during rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferOutcome {
    /// The whole live balance was moved.
    Transferred(Decimal),
    /// Nothing was held; no transfer attempted.
    Empty,
    /// The asset failed the transfer. Its balance is untouched.
    Failed { reason: String },
}

/// Outcome for one asset of a rollback call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingOutcome {
    pub asset: AssetId,
    pub outcome: TransferOutcome,
}

/// Report of a single `rollback()` call.
///
/// A rollback call never fails as a whole; failures are listed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackReport {
    /// Holding address of the basket.
    pub basket: Address,
    /// Where the balances went.
    pub beneficiary: Address,
    /// One entry per tracked holding, native first.
    pub outcomes: Vec<HoldingOutcome>,
    pub executed_at: DateTime<Utc>,
}

impl RollbackReport {
    /// True if no holding failed in this call.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self
            .outcomes
            .iter()
            .any(|o| matches!(o.outcome, TransferOutcome::Failed { .. }))
    }

    /// Assets whose transfer failed in this call.
    #[must_use]
    pub fn failed_assets(&self) -> Vec<&AssetId> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, TransferOutcome::Failed { .. }))
            .map(|o| &o.asset)
            .collect()
    }

    /// Amount of `asset` moved by this call (zero if none).
    #[must_use]
    pub fn transferred(&self, asset: &AssetId) -> Decimal {
        self.outcomes
            .iter()
            .find(|o| &o.asset == asset)
            .and_then(|o| match o.outcome {
                TransferOutcome::Transferred(amount) => Some(amount),
                _ => None,
            })
            .unwrap_or(Decimal::ZERO)
    }
}

/// Record of a successful `commit()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub basket: Address,
    pub beneficiary: Address,
    /// Exactly the required amounts, in settlement order. Zero-amount
    /// requirements are omitted.
    pub transfers: Vec<(AssetId, Decimal)>,
    pub executed_at: DateTime<Utc>,
}

impl CommitReceipt {
    /// Amount of `asset` moved by the commit (zero if none).
    #[must_use]
    pub fn amount_of(&self, asset: &AssetId) -> Decimal {
        self.transfers
            .iter()
            .find(|(a, _)| a == asset)
            .map_or(Decimal::ZERO, |(_, amount)| *amount)
    }
}

/// Required vs. held amount of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingStatus {
    pub asset: AssetId,
    pub required: Decimal,
    pub held: Decimal,
}

impl HoldingStatus {
    #[must_use]
    pub fn is_met(&self) -> bool {
        self.held >= self.required
    }

    /// How much is still missing (zero when met).
    #[must_use]
    pub fn shortfall(&self) -> Decimal {
        (self.required - self.held).max(Decimal::ZERO)
    }

    /// How much is held beyond the requirement (zero when short).
    #[must_use]
    pub fn surplus(&self) -> Decimal {
        (self.held - self.required).max(Decimal::ZERO)
    }
}

/// Point-in-time view of a basket, computed from live balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketStatus {
    pub basket: Address,
    pub state: BasketState,
    pub holdings: Vec<HoldingStatus>,
}

impl BasketStatus {
    /// Every holding meets its requirement. Ignores the lock.
    #[must_use]
    pub fn is_funded(&self) -> bool {
        self.holdings.iter().all(HoldingStatus::is_met)
    }

    /// Funded and not locked: a commit right now would pass its preconditions.
    #[must_use]
    pub fn can_commit(&self) -> bool {
        !self.state.is_locked() && self.is_funded()
    }

    /// The first holding below its requirement, if any.
    #[must_use]
    pub fn first_shortfall(&self) -> Option<&HoldingStatus> {
        self.holdings.iter().find(|h| !h.is_met())
    }
}
