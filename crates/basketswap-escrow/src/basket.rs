//! Basket: a multi-asset escrow with an irrevocable rollback.
//!
//! A basket is a holding address with a fixed [`Requirement`], a commit
//! beneficiary and a rollback beneficiary. Depositors push assets to the
//! holding address directly on the ledger; the basket never caches balances.
//!
//! - `commit()` forwards exactly the required amounts, all-or-nothing.
//! - `rollback()` latches the basket into [`BasketState::RollingBack`] and
//!   returns every live balance, one holding at a time. A failing asset is
//!   recorded and skipped; calling `rollback()` again retries it.
//!
//! Anyone may call any operation.

use basketswap_ledger::Ledger;
use basketswap_types::{
    Address, AssetId, AssetRequirement, BasketError, BasketState, BasketStatus, CommitReceipt,
    HoldingOutcome, HoldingStatus, Requirement, Result, RollbackReport, TransferError,
    TransferOutcome, ValidationPolicy,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

/// One escrow instance.
///
/// Not `Clone` or `Deserialize`: exactly one value owns the latch for a
/// holding address. `Serialize` is for inspection only.
#[derive(Debug, Serialize)]
pub struct Basket {
    /// Ledger account holding the deposits.
    address: Address,
    /// Fixed at creation.
    requirement: Requirement,
    /// Receives the required amounts on commit.
    commit_beneficiary: Address,
    /// Receives everything held on rollback.
    rollback_beneficiary: Address,
    /// One-way latch: `Open` until the first rollback call.
    state: BasketState,
}

impl Basket {
    /// Create a basket at a fresh address under the default [`ValidationPolicy`].
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the requirement or beneficiaries
    /// are rejected.
    pub fn create(
        requirement: Requirement,
        commit_beneficiary: Address,
        rollback_beneficiary: Address,
    ) -> Result<Self> {
        Self::create_at(
            Address::new(),
            requirement,
            commit_beneficiary,
            rollback_beneficiary,
            &ValidationPolicy::default(),
        )
    }

    /// Create a basket at a chosen holding address.
    ///
    /// Beneficiaries must be non-null and distinct from the holding address.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` describing the first violation.
    pub fn create_at(
        address: Address,
        requirement: Requirement,
        commit_beneficiary: Address,
        rollback_beneficiary: Address,
        policy: &ValidationPolicy,
    ) -> Result<Self> {
        if address.is_zero() {
            return Err(BasketError::invalid("basket address is the null address"));
        }
        if commit_beneficiary.is_zero() {
            return Err(BasketError::invalid("commit beneficiary is the null address"));
        }
        if rollback_beneficiary.is_zero() {
            return Err(BasketError::invalid(
                "rollback beneficiary is the null address",
            ));
        }
        if commit_beneficiary == address || rollback_beneficiary == address {
            return Err(BasketError::invalid(
                "a beneficiary cannot be the basket itself",
            ));
        }
        requirement.validate(policy)?;

        tracing::info!(
            basket = %address.short(),
            native = %requirement.native,
            assets = requirement.assets.len(),
            commit_to = %commit_beneficiary.short(),
            rollback_to = %rollback_beneficiary.short(),
            "basket created"
        );

        Ok(Self {
            address,
            requirement,
            commit_beneficiary,
            rollback_beneficiary,
            state: BasketState::Open,
        })
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Live balance of `asset` at the holding address.
    #[must_use]
    pub fn held(&self, ledger: &Ledger, asset: &AssetId) -> Decimal {
        ledger.balance(asset, self.address)
    }

    /// True iff every holding, native included, meets its requirement right
    /// now. Recomputed from the ledger on every call.
    #[must_use]
    pub fn is_ready_to_commit(&self, ledger: &Ledger) -> bool {
        self.first_shortfall(ledger).is_none()
    }

    /// Required vs. held for every holding, plus the lock state.
    #[must_use]
    pub fn check(&self, ledger: &Ledger) -> BasketStatus {
        BasketStatus {
            basket: self.address,
            state: self.state,
            holdings: self
                .requirement
                .holdings()
                .map(|(asset, required)| HoldingStatus {
                    held: self.held(ledger, &asset),
                    asset,
                    required,
                })
                .collect(),
        }
    }

    fn first_shortfall(&self, ledger: &Ledger) -> Option<HoldingStatus> {
        self.requirement.holdings().find_map(|(asset, required)| {
            let held = self.held(ledger, &asset);
            (held < required).then_some(HoldingStatus {
                asset,
                required,
                held,
            })
        })
    }

    // -----------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------

    /// Forward exactly the required amounts to the commit beneficiary.
    ///
    /// Surplus stays in the basket. If any transfer fails, every balance
    /// the call touched is restored and the error is returned.
    ///
    /// # Errors
    /// - `Locked` if rollback was ever initiated
    /// - `NotReady` if a holding is below its requirement
    /// - `AssetTransferFailure` if an asset failed its transfer
    pub fn commit(&mut self, ledger: &mut Ledger) -> Result<CommitReceipt> {
        // A commit leaves the basket `Open`; only a rollback closes that path.
        if !self.state.can_transition_to(BasketState::Open) {
            tracing::warn!(basket = %self.address.short(), "commit refused: basket locked");
            return Err(BasketError::Locked);
        }
        if let Some(short) = self.first_shortfall(ledger) {
            tracing::debug!(
                basket = %self.address.short(),
                asset = %short.asset,
                required = %short.required,
                held = %short.held,
                "commit refused: not ready"
            );
            return Err(BasketError::NotReady {
                asset: short.asset,
                required: short.required,
                held: short.held,
            });
        }

        let from = self.address;
        let to = self.commit_beneficiary;
        let transfers: Vec<(AssetId, Decimal)> = self
            .requirement
            .holdings()
            .filter(|(_, amount)| !amount.is_zero())
            .collect();

        let settled: Result<()> = ledger.atomically(|ledger| {
            for (asset, amount) in &transfers {
                ledger
                    .atomically_or_abort(
                        |ledger| ledger.transfer(asset, from, to, *amount),
                        aborted,
                    )
                    .map_err(|source| BasketError::transfer(asset.clone(), source))?;
            }
            Ok(())
        });
        if let Err(err) = settled {
            tracing::warn!(basket = %from.short(), error = %err, "commit aborted, balances restored");
            return Err(err);
        }

        tracing::info!(
            basket = %from.short(),
            beneficiary = %to.short(),
            transfers = transfers.len(),
            "basket committed"
        );
        Ok(CommitReceipt {
            basket: from,
            beneficiary: to,
            transfers,
            executed_at: Utc::now(),
        })
    }

    // -----------------------------------------------------------------
    // Rollback
    // -----------------------------------------------------------------

    /// Lock the basket against commit, then return every live balance to
    /// the rollback beneficiary.
    ///
    /// Each holding is attempted independently: a failing asset has its
    /// writes reverted, is recorded in the report, and does not stop the
    /// remaining holdings. Call again to retry what failed.
    pub fn rollback(&mut self, ledger: &mut Ledger) -> RollbackReport {
        // Latch before the first external call.
        if !self.state.is_locked() {
            tracing::info!(basket = %self.address.short(), "rollback initiated");
        }
        debug_assert!(self.state.can_transition_to(BasketState::RollingBack));
        self.state = BasketState::RollingBack;

        let outcomes: Vec<HoldingOutcome> = self
            .requirement
            .holdings()
            .map(|(asset, _)| {
                let outcome = self.return_holding(ledger, &asset);
                HoldingOutcome { asset, outcome }
            })
            .collect();

        let report = RollbackReport {
            basket: self.address,
            beneficiary: self.rollback_beneficiary,
            outcomes,
            executed_at: Utc::now(),
        };
        if report.is_complete() {
            tracing::info!(basket = %self.address.short(), "rollback complete");
        } else {
            tracing::warn!(
                basket = %self.address.short(),
                failed = report.failed_assets().len(),
                "rollback incomplete, retry to recover remaining assets"
            );
        }
        report
    }

    /// Move the whole live balance of one holding. Never propagates failure,
    /// including a panic inside the asset.
    fn return_holding(&self, ledger: &mut Ledger, asset: &AssetId) -> TransferOutcome {
        let (from, to) = (self.address, self.rollback_beneficiary);
        let attempt = ledger.atomically_or_abort(
            |ledger| {
                // Re-read: an earlier holding's transfer may have moved this one.
                let held = ledger.balance(asset, from);
                if held <= Decimal::ZERO {
                    return Ok(None);
                }
                ledger.transfer(asset, from, to, held).map(|()| Some(held))
            },
            aborted,
        );
        match attempt {
            Ok(None) => TransferOutcome::Empty,
            Ok(Some(held)) => TransferOutcome::Transferred(held),
            Err(err) => {
                tracing::warn!(
                    basket = %from.short(),
                    %asset,
                    error = %err,
                    "rollback transfer failed, balance left in basket"
                );
                TransferOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    #[must_use]
    pub fn native_requirement(&self) -> Decimal {
        self.requirement.native
    }

    /// The listed (non-native) asset requirements, in creation order.
    #[must_use]
    pub fn requirements(&self) -> &[AssetRequirement] {
        &self.requirement.assets
    }

    #[must_use]
    pub fn commit_beneficiary(&self) -> Address {
        self.commit_beneficiary
    }

    #[must_use]
    pub fn rollback_beneficiary(&self) -> Address {
        self.rollback_beneficiary
    }

    #[must_use]
    pub fn state(&self) -> BasketState {
        self.state
    }

    /// True once rollback has been initiated; commit will always fail.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.is_locked()
    }
}

fn aborted(reason: String) -> TransferError {
    TransferError::Aborted { reason }
}
