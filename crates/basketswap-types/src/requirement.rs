//! Funding requirements for a basket.
//!
//! A [`Requirement`] is a scalar native-currency amount plus an ordered list
//! of `(asset, amount)` pairs. It is fixed when a basket is created.
//! [`Requirement::holdings`] flattens both into one ordered sequence (native
//! first) so basket logic can treat every asset the same way.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AssetId, BasketError, Result, ValidationPolicy};

/// One `(asset, amount)` entry of a requirement list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRequirement {
    pub asset: AssetId,
    pub amount: Decimal,
}

impl AssetRequirement {
    #[must_use]
    pub fn new(asset: impl Into<AssetId>, amount: Decimal) -> Self {
        Self {
            asset: asset.into(),
            amount,
        }
    }
}

/// What a basket must hold before it can commit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Requirement {
    /// Required native-currency amount.
    pub native: Decimal,
    /// Required non-native assets, in settlement order.
    pub assets: Vec<AssetRequirement>,
}

impl Requirement {
    /// A requirement for `native` currency and no other assets.
    #[must_use]
    pub fn new(native: Decimal) -> Self {
        Self {
            native,
            assets: Vec::new(),
        }
    }

    /// Builder-style append of one asset entry.
    #[must_use]
    pub fn with(mut self, asset: impl Into<AssetId>, amount: Decimal) -> Self {
        self.assets.push(AssetRequirement::new(asset, amount));
        self
    }

    /// Build from parallel slices, the shape used by deployment tooling.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the slices differ in length.
    pub fn from_parallel(native: Decimal, assets: &[AssetId], amounts: &[Decimal]) -> Result<Self> {
        if assets.len() != amounts.len() {
            return Err(BasketError::invalid(format!(
                "{} assets but {} amounts",
                assets.len(),
                amounts.len()
            )));
        }
        Ok(Self {
            native,
            assets: assets
                .iter()
                .zip(amounts)
                .map(|(asset, amount)| AssetRequirement::new(asset.clone(), *amount))
                .collect(),
        })
    }

    /// Every `(asset, amount)` the basket tracks, native currency first.
    pub fn holdings(&self) -> impl Iterator<Item = (AssetId, Decimal)> + '_ {
        std::iter::once((AssetId::native(), self.native)).chain(
            self.assets
                .iter()
                .map(|entry| (entry.asset.clone(), entry.amount)),
        )
    }

    /// Required amount for `asset`, or `None` if the basket does not track it.
    #[must_use]
    pub fn amount_of(&self, asset: &AssetId) -> Option<Decimal> {
        if asset.is_native() {
            return Some(self.native);
        }
        self.assets
            .iter()
            .find(|entry| &entry.asset == asset)
            .map(|entry| entry.amount)
    }

    /// True if nothing at all is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.native.is_zero() && self.assets.is_empty()
    }

    /// Check this requirement against `policy`.
    ///
    /// Always rejected: negative amounts, duplicate assets, and the native
    /// asset appearing in the asset list. Zero amounts, empty requirements
    /// and oversized lists are rejected unless the policy allows them.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` describing the first violation found.
    pub fn validate(&self, policy: &ValidationPolicy) -> Result<()> {
        if self.native < Decimal::ZERO {
            return Err(BasketError::invalid(format!(
                "negative native requirement {}",
                self.native
            )));
        }
        if self.is_empty() && !policy.allow_empty {
            return Err(BasketError::invalid("requirement is empty"));
        }
        if self.assets.len() > policy.max_assets {
            return Err(BasketError::invalid(format!(
                "{} assets exceeds limit of {}",
                self.assets.len(),
                policy.max_assets
            )));
        }

        let mut seen = HashSet::with_capacity(self.assets.len());
        for entry in &self.assets {
            if entry.asset.is_native() {
                return Err(BasketError::invalid(
                    "native currency must use the native requirement, not the asset list",
                ));
            }
            if !seen.insert(&entry.asset) {
                return Err(BasketError::invalid(format!(
                    "duplicate asset {}",
                    entry.asset
                )));
            }
            if entry.amount < Decimal::ZERO {
                return Err(BasketError::invalid(format!(
                    "negative amount {} for {}",
                    entry.amount, entry.asset
                )));
            }
            if entry.amount.is_zero() && !policy.allow_zero_amounts {
                return Err(BasketError::invalid(format!(
                    "zero amount for {}",
                    entry.asset
                )));
            }
        }
        Ok(())
    }
}
