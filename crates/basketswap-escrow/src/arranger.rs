//! Swap arranger: creates and tracks pairs of cross-wired baskets.
//!
//! For a swap between `left` and `right`:
//!
//! ```text
//!   left deposits ──▶ left basket  ── commit ──▶ right
//!                                  └─ rollback ─▶ left
//!   right deposits ─▶ right basket ── commit ──▶ left
//!                                  └─ rollback ─▶ right
//! ```
//!
//! The arranger only wires and stores. It does not move funds, and the two
//! baskets commit independently: there is no cross-basket atomicity.

use basketswap_types::{
    Address, ArrangerConfig, BasketError, Requirement, Result, Side, SwapIndex, ValidationPolicy,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::basket::Basket;

/// One arranged swap: two baskets owned by the registry.
#[derive(Debug, Serialize)]
pub struct Swap {
    pub index: SwapIndex,
    pub left: Basket,
    pub right: Basket,
    /// Stored as given. Not enforced.
    pub deadline: u64,
    pub created_at: DateTime<Utc>,
}

impl Swap {
    #[must_use]
    pub fn basket(&self, side: Side) -> &Basket {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn basket_mut(&mut self, side: Side) -> &mut Basket {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// The party on `side`: the one who deposits into that side's basket.
    #[must_use]
    pub fn party(&self, side: Side) -> Address {
        self.basket(side).rollback_beneficiary()
    }
}

/// Factory and append-only registry of swaps.
#[derive(Debug)]
pub struct SwapArranger {
    /// Basket addresses are derived from this.
    address: Address,
    /// Applied to both requirements of every swap.
    policy: ValidationPolicy,
    /// Indexed by `SwapIndex`; never shrinks.
    swaps: Vec<Swap>,
    next_index: SwapIndex,
}

impl SwapArranger {
    /// An arranger at a fresh address with default validation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ArrangerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ArrangerConfig) -> Self {
        Self {
            address: config.address.unwrap_or_default(),
            policy: config.validation,
            swaps: Vec::new(),
            next_index: SwapIndex(0),
        }
    }

    /// Create both baskets of a swap and append it to the registry.
    ///
    /// Both baskets are validated before anything is stored, so a rejected
    /// call leaves the registry untouched and consumes no index.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the parties are equal or null, or
    /// either requirement is rejected by the validation policy.
    pub fn arrange(
        &mut self,
        party_left: Address,
        requirement_left: Requirement,
        party_right: Address,
        requirement_right: Requirement,
        deadline: u64,
    ) -> Result<SwapIndex> {
        if party_left == party_right {
            return Err(BasketError::invalid("a swap needs two distinct parties"));
        }
        let index = self.next_index;

        let left = Basket::create_at(
            Address::derive_basket(self.address, index, Side::Left),
            requirement_left,
            party_right,
            party_left,
            &self.policy,
        )?;
        let right = Basket::create_at(
            Address::derive_basket(self.address, index, Side::Right),
            requirement_right,
            party_left,
            party_right,
            &self.policy,
        )?;

        tracing::info!(
            swap = %index,
            left = %left.address().short(),
            right = %right.address().short(),
            deadline,
            "swap arranged"
        );
        self.swaps.push(Swap {
            index,
            left,
            right,
            deadline,
            created_at: Utc::now(),
        });
        self.next_index = index.next();
        Ok(index)
    }

    /// Holding address the left party deposits into.
    ///
    /// # Errors
    /// Returns `UnknownSwap` if no swap has this index.
    pub fn get_left_load_address(&self, index: SwapIndex) -> Result<Address> {
        self.load_address(index, Side::Left)
    }

    /// Holding address the right party deposits into.
    ///
    /// # Errors
    /// Returns `UnknownSwap` if no swap has this index.
    pub fn get_right_load_address(&self, index: SwapIndex) -> Result<Address> {
        self.load_address(index, Side::Right)
    }

    /// # Errors
    /// Returns `UnknownSwap` if no swap has this index.
    pub fn load_address(&self, index: SwapIndex, side: Side) -> Result<Address> {
        Ok(self.swap(index)?.basket(side).address())
    }

    /// # Errors
    /// Returns `UnknownSwap` if no swap has this index.
    pub fn swap(&self, index: SwapIndex) -> Result<&Swap> {
        usize::try_from(index.0)
            .ok()
            .and_then(|i| self.swaps.get(i))
            .ok_or(BasketError::UnknownSwap(index))
    }

    /// # Errors
    /// Returns `UnknownSwap` if no swap has this index.
    pub fn swap_mut(&mut self, index: SwapIndex) -> Result<&mut Swap> {
        usize::try_from(index.0)
            .ok()
            .and_then(|i| self.swaps.get_mut(i))
            .ok_or(BasketError::UnknownSwap(index))
    }

    /// # Errors
    /// Returns `UnknownSwap` if no swap has this index.
    pub fn basket(&self, index: SwapIndex, side: Side) -> Result<&Basket> {
        Ok(self.swap(index)?.basket(side))
    }

    /// Mutable access so callers can commit or roll back an arranged basket.
    ///
    /// # Errors
    /// Returns `UnknownSwap` if no swap has this index.
    pub fn basket_mut(&mut self, index: SwapIndex, side: Side) -> Result<&mut Basket> {
        Ok(self.swap_mut(index)?.basket_mut(side))
    }

    /// All swaps in creation order.
    pub fn swaps(&self) -> impl Iterator<Item = &Swap> {
        self.swaps.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.swaps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.swaps.is_empty()
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }
}

impl Default for SwapArranger {
    fn default() -> Self {
        Self::new()
    }
}
