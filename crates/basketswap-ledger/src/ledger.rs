//! In-memory ledger: the account/balance table baskets live on.
//!
//! Tracks per-(asset, holder) balances and the registry of asset
//! capabilities. Every transfer is dispatched through the asset's own
//! [`AssetCapability`] implementation, which is untrusted.
//!
//! [`Ledger::atomically`] gives a call the chain's revert semantics: if the
//! closure returns `Err`, every balance written inside it is restored.
//! [`Ledger::atomically_or_abort`] does the same when the closure panics.
//!
//! Reverts are journaled: each open frame records the prior value of every
//! `(asset, holder)` key written while it is open, so the cost of a frame is
//! proportional to the keys it touches, not to the size of the table.

use std::{
    any::Any,
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use basketswap_types::{Address, AssetId, BasketError, Result, TransferError};
use rust_decimal::Decimal;

use crate::asset::{AssetCapability, NativeCurrency};

type Key = (AssetId, Address);

/// Prior values of the keys written inside one open revert frame.
/// `None` means the key did not exist.
type Journal = HashMap<Key, Option<Decimal>>;

/// Full copy of the balance table, restored by [`Ledger::restore`].
#[derive(Debug, Clone)]
pub struct Checkpoint {
    balances: HashMap<Key, Decimal>,
}

/// The shared ledger state: balances plus registered assets.
#[derive(Debug)]
pub struct Ledger {
    /// Per-(asset, holder) balances.
    balances: HashMap<Key, Decimal>,
    /// Asset capabilities by id. Native currency is always present.
    assets: HashMap<AssetId, Arc<dyn AssetCapability>>,
    /// Open revert frames, innermost last.
    journals: Vec<Journal>,
}

impl Ledger {
    /// Create a ledger with only the native currency registered.
    #[must_use]
    pub fn new() -> Self {
        let native: Arc<dyn AssetCapability> = Arc::new(NativeCurrency::new());
        let mut assets = HashMap::new();
        assets.insert(AssetId::native(), native);
        Self {
            balances: HashMap::new(),
            assets,
            journals: Vec::new(),
        }
    }

    /// Register an asset capability.
    ///
    /// # Errors
    /// Returns `AssetAlreadyRegistered` if the id is taken.
    pub fn register(&mut self, asset: Arc<dyn AssetCapability>) -> Result<()> {
        let id = asset.id().clone();
        if self.assets.contains_key(&id) {
            return Err(BasketError::AssetAlreadyRegistered(id));
        }
        tracing::info!(asset = %id, "asset registered");
        self.assets.insert(id, asset);
        Ok(())
    }

    /// Look up the capability for `asset`.
    #[must_use]
    pub fn asset(&self, asset: &AssetId) -> Option<Arc<dyn AssetCapability>> {
        self.assets.get(asset).cloned()
    }

    #[must_use]
    pub fn is_registered(&self, asset: &AssetId) -> bool {
        self.assets.contains_key(asset)
    }

    /// Credit `amount` of `asset` to `holder` from outside the ledger
    /// (faucet, bridge, genesis allocation).
    ///
    /// # Errors
    /// - `UnknownAsset` if the asset is not registered
    /// - `InvalidAmount` if `amount` is negative
    pub fn mint(
        &mut self,
        asset: &AssetId,
        holder: Address,
        amount: Decimal,
    ) -> std::result::Result<(), TransferError> {
        if !self.is_registered(asset) {
            return Err(TransferError::UnknownAsset(asset.clone()));
        }
        if amount < Decimal::ZERO {
            return Err(TransferError::InvalidAmount(amount));
        }
        let key = (asset.clone(), holder);
        let current = self.balances.get(&key).copied().unwrap_or(Decimal::ZERO);
        self.write(key, current + amount);
        Ok(())
    }

    /// Balance of `holder` as reported by the asset's own `balance_of`.
    /// Unregistered assets read as zero.
    #[must_use]
    pub fn balance(&self, asset: &AssetId, holder: Address) -> Decimal {
        self.assets
            .get(asset)
            .map_or(Decimal::ZERO, |capability| {
                capability.balance_of(self, holder)
            })
    }

    /// Transfer through the asset's capability.
    ///
    /// The capability may fail, and may write to the ledger before failing;
    /// callers that need all-or-nothing wrap this in [`Ledger::atomically`].
    ///
    /// # Errors
    /// `UnknownAsset`, or whatever the capability reports.
    pub fn transfer(
        &mut self,
        asset: &AssetId,
        from: Address,
        to: Address,
        amount: Decimal,
    ) -> std::result::Result<(), TransferError> {
        let capability = self
            .asset(asset)
            .ok_or_else(|| TransferError::UnknownAsset(asset.clone()))?;
        capability.transfer(self, from, to, amount)
    }

    // -----------------------------------------------------------------
    // Raw bookkeeping, for capability implementations.
    // -----------------------------------------------------------------

    /// The stored balance, bypassing the asset's `balance_of`.
    #[must_use]
    pub fn raw_balance(&self, asset: &AssetId, holder: Address) -> Decimal {
        self.balances
            .get(&(asset.clone(), holder))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Move stored balance between holders. Either both sides change or neither.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is negative
    /// - `InsufficientBalance` if `from` holds less than `amount`
    pub fn move_balance(
        &mut self,
        asset: &AssetId,
        from: Address,
        to: Address,
        amount: Decimal,
    ) -> std::result::Result<(), TransferError> {
        if amount < Decimal::ZERO {
            return Err(TransferError::InvalidAmount(amount));
        }
        let available = self.raw_balance(asset, from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        if amount.is_zero() || from == to {
            return Ok(());
        }

        self.write((asset.clone(), from), available - amount);
        let credited = self.raw_balance(asset, to) + amount;
        self.write((asset.clone(), to), credited);
        Ok(())
    }

    /// Total supply of an asset across all holders.
    #[must_use]
    pub fn total_supply(&self, asset: &AssetId) -> Decimal {
        self.balances
            .iter()
            .filter(|((a, _), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }

    // -----------------------------------------------------------------
    // Revert support
    // -----------------------------------------------------------------

    /// Copy the whole balance table. O(accounts); prefer [`Ledger::atomically`]
    /// for scoped reverts.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            balances: self.balances.clone(),
        }
    }

    /// Restore every balance to its value at `checkpoint`.
    ///
    /// Not journaled: calling this inside an open [`Ledger::atomically`]
    /// frame leaves that frame unable to undo the restore.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.balances = checkpoint.balances;
    }

    /// Run `f`; if it returns `Err`, undo every balance change it made.
    ///
    /// Frames nest. An inner frame that succeeds hands its journal to the
    /// enclosing one, so the outer frame can still revert it.
    ///
    /// # Errors
    /// Propagates the closure's error after restoring.
    pub fn atomically<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let depth = self.begin_frame();
        let result = f(self);
        self.end_frame(depth, result.is_ok());
        result
    }

    /// Like [`Ledger::atomically`], but a panic inside `f` is caught,
    /// its writes are undone, and `aborted` turns the panic message into
    /// the returned error.
    ///
    /// Asset capabilities are untrusted code; a transfer that aborts must
    /// not unwind through the caller's remaining work.
    ///
    /// # Errors
    /// The closure's error, or `aborted(message)` if it panicked.
    pub fn atomically_or_abort<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
        aborted: impl FnOnce(String) -> E,
    ) -> std::result::Result<T, E> {
        let depth = self.begin_frame();
        let result = match panic::catch_unwind(AssertUnwindSafe(|| f(&mut *self))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(%message, "transfer aborted, reverting");
                Err(aborted(message))
            }
        };
        self.end_frame(depth, result.is_ok());
        result
    }

    /// Number of open revert frames.
    #[must_use]
    pub fn open_frames(&self) -> usize {
        self.journals.len()
    }

    fn write(&mut self, key: Key, value: Decimal) {
        if let Some(journal) = self.journals.last_mut() {
            let prior = self.balances.get(&key).copied();
            journal.entry(key.clone()).or_insert(prior);
        }
        self.balances.insert(key, value);
    }

    fn begin_frame(&mut self) -> usize {
        self.journals.push(Journal::new());
        self.journals.len() - 1
    }

    fn end_frame(&mut self, depth: usize, keep: bool) {
        // Frames above `depth` are only left open by an unwind; revert them.
        while self.journals.len() > depth + 1 {
            if let Some(orphan) = self.journals.pop() {
                self.undo(orphan);
            }
        }
        let Some(journal) = self.journals.pop() else {
            return;
        };
        if !keep {
            self.undo(journal);
        } else if let Some(parent) = self.journals.last_mut() {
            for (key, prior) in journal {
                parent.entry(key).or_insert(prior);
            }
        }
    }

    fn undo(&mut self, journal: Journal) {
        for (key, prior) in journal {
            match prior {
                Some(value) => self.balances.insert(key, value),
                None => self.balances.remove(&key),
            };
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "asset panicked".to_string())
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
