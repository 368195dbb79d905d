//! Misbehaving asset implementations for exercising fault isolation.
//! **Never register these on a production ledger.**
//!
//! - [`FlakyToken`]: fails or aborts transfers on demand, switchable at runtime.
//! - [`SkimmingToken`]: while transferring, also drains part of a different
//!   asset held by the sender.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, PoisonError,
};

use basketswap_types::{Address, AssetId, TransferError};
use rust_decimal::Decimal;

use crate::{asset::AssetCapability, ledger::Ledger};

/// How a [`FlakyToken`] handles the next transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlakyMode {
    /// Behave like a standard token.
    Succeed,
    /// Refuse every transfer without touching balances.
    Reject,
    /// Debit the sender, then report failure. Callers must revert.
    DebitThenReject,
    /// Refuse with the given probability in `[0, 1]`.
    FailWithProbability(f64),
    /// Debit the sender, then panic mid-transfer.
    Panic,
}

/// A token whose transfers fail according to a runtime-switchable [`FlakyMode`].
#[derive(Debug)]
pub struct FlakyToken {
    id: AssetId,
    mode: Mutex<FlakyMode>,
    attempts: AtomicU64,
}

impl FlakyToken {
    #[must_use]
    pub fn new(id: impl Into<AssetId>, mode: FlakyMode) -> Self {
        Self {
            id: id.into(),
            mode: Mutex::new(mode),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn set_mode(&self, mode: FlakyMode) {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    #[must_use]
    pub fn mode(&self) -> FlakyMode {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of transfer calls received, successful or not.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    fn rejection() -> TransferError {
        TransferError::Rejected {
            reason: "flaky token configured to fail".to_string(),
        }
    }
}

impl AssetCapability for FlakyToken {
    fn id(&self) -> &AssetId {
        &self.id
    }

    fn transfer(
        &self,
        ledger: &mut Ledger,
        from: Address,
        to: Address,
        amount: Decimal,
    ) -> Result<(), TransferError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        match self.mode() {
            FlakyMode::Succeed => ledger.move_balance(&self.id, from, to, amount),
            FlakyMode::Reject => Err(Self::rejection()),
            FlakyMode::DebitThenReject => {
                // Burn the sender's balance, leaving the ledger inconsistent.
                ledger.move_balance(&self.id, from, Address::ZERO, amount)?;
                Err(Self::rejection())
            }
            FlakyMode::Panic => {
                ledger.move_balance(&self.id, from, Address::ZERO, amount)?;
                panic!("flaky token {} aborted mid-transfer", self.id);
            }
            FlakyMode::FailWithProbability(p) => {
                if rand::random::<f64>() < p {
                    Err(Self::rejection())
                } else {
                    ledger.move_balance(&self.id, from, to, amount)
                }
            }
        }
    }
}

/// A token that, on every transfer, first moves up to `skim` of `victim`
/// from the sender to `sink`.
///
/// Models an asset whose transfer has side effects on the sender's other
/// balances.
#[derive(Debug)]
pub struct SkimmingToken {
    id: AssetId,
    victim: AssetId,
    skim: Decimal,
    sink: Address,
}

impl SkimmingToken {
    #[must_use]
    pub fn new(id: impl Into<AssetId>, victim: impl Into<AssetId>, skim: Decimal, sink: Address) -> Self {
        Self {
            id: id.into(),
            victim: victim.into(),
            skim,
            sink,
        }
    }
}

impl AssetCapability for SkimmingToken {
    fn id(&self) -> &AssetId {
        &self.id
    }

    fn transfer(
        &self,
        ledger: &mut Ledger,
        from: Address,
        to: Address,
        amount: Decimal,
    ) -> Result<(), TransferError> {
        let skim = self.skim.min(ledger.raw_balance(&self.victim, from));
        ledger.move_balance(&self.victim, from, self.sink, skim)?;
        ledger.move_balance(&self.id, from, to, amount)
    }
}
