//! The asset capability: the only interface baskets use to move value.
//!
//! Native currency and every fungible token implement [`AssetCapability`].
//! Implementations are independent and untrusted; a transfer may fail, or
//! may write to the ledger (including other balances of the sender) before
//! returning.

use std::fmt;

use basketswap_types::{Address, AssetId, TransferError};
use rust_decimal::Decimal;

use crate::ledger::Ledger;

/// Push-style transfer plus balance query, implemented per asset.
pub trait AssetCapability: fmt::Debug + Send + Sync {
    /// The asset this capability moves.
    fn id(&self) -> &AssetId;

    /// Balance of `holder`. Defaults to the ledger's stored balance.
    fn balance_of(&self, ledger: &Ledger, holder: Address) -> Decimal {
        ledger.raw_balance(self.id(), holder)
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// Implementation-defined; see [`TransferError`].
    fn transfer(
        &self,
        ledger: &mut Ledger,
        from: Address,
        to: Address,
        amount: Decimal,
    ) -> Result<(), TransferError>;
}

/// The ledger's built-in value-transfer mechanism.
#[derive(Debug)]
pub struct NativeCurrency {
    id: AssetId,
}

impl NativeCurrency {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AssetId::native(),
        }
    }
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetCapability for NativeCurrency {
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
        ledger.move_balance(&self.id, from, to, amount)
    }
}

/// A well-behaved fungible token.
#[derive(Debug)]
pub struct StandardToken {
    id: AssetId,
}

impl StandardToken {
    #[must_use]
    pub fn new(id: impl Into<AssetId>) -> Self {
        Self { id: id.into() }
    }
}

impl AssetCapability for StandardToken {
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
        ledger.move_balance(&self.id, from, to, amount)?;
        tracing::debug!(
            asset = %self.id,
            from = %from.short(),
            to = %to.short(),
            %amount,
            "token transfer"
        );
        Ok(())
    }
}
