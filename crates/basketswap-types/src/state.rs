//! # BasketState: the one-way commit lock
//!
//! ```text
//!   ┌──────┐  rollback()   ┌─────────────┐
//!   │ OPEN ├──────────────▶│ ROLLING_BACK │◀─┐ rollback() (retry)
//!   └──┬───┘               └──────┬──────┘  │
//!      │ commit()                 └─────────┘
//!      ▼
//!    (stays OPEN)
//! ```
//!
//! `RollingBack` is terminal with respect to commit: no transition leads
//! back to `Open`. A successful commit is not a recorded state.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a basket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasketState {
    /// Rollback has never been initiated. Commit may succeed.
    #[default]
    Open,
    /// Rollback has been initiated at least once. Commit fails forever.
    RollingBack,
}

impl BasketState {
    /// Can the basket move from this state to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Open | Self::RollingBack) | (Self::RollingBack, Self::RollingBack)
        )
    }

    /// True once rollback has been initiated.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        *self == Self::RollingBack
    }
}

impl std::fmt::Display for BasketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::RollingBack => write!(f, "ROLLING_BACK"),
        }
    }
}
