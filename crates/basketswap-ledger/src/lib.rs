//! # basketswap-ledger
//!
//! The ledger baskets settle against, and the asset capabilities that move
//! value on it.
//!
//! ## Architecture
//!
//! 1. **Ledger**: per-(asset, holder) balance table, asset registry, and
//!    checkpoint/restore for revert semantics
//! 2. **AssetCapability**: `transfer` + `balance_of`, implemented per asset
//! 3. **NativeCurrency** / **StandardToken**: well-behaved implementations
//! 4. **FlakyToken** / **SkimmingToken** (`test-helpers`): misbehaving ones
//!
//! ## Transfer Flow
//!
//! ```text
//! caller → Ledger.transfer(asset) → registry lookup → AssetCapability.transfer()
//!        → Ledger.move_balance()   (or fail / side effects, if untrusted)
//! ```

pub mod asset;
#[cfg(any(test, feature = "test-helpers"))]
pub mod doubles;
pub mod ledger;

pub use asset::{AssetCapability, NativeCurrency, StandardToken};
#[cfg(any(test, feature = "test-helpers"))]
pub use doubles::{FlakyMode, FlakyToken, SkimmingToken};
pub use ledger::{Checkpoint, Ledger};
