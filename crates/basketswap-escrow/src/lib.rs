//! # basketswap-escrow
//!
//! Multi-asset escrow baskets and the arranger that pairs them into swaps.
//!
//! ## Architecture
//!
//! 1. **Basket**: holds native currency and listed assets at a ledger
//!    address; commits exact amounts to one beneficiary or rolls everything
//!    back to another. The first rollback permanently disables commit.
//! 2. **SwapArranger**: creates two baskets per swap with cross-wired
//!    beneficiaries and records them in an append-only registry.
//!
//! ## Swap Flow
//!
//! ```text
//! arrange() → parties deposit to their load addresses (ledger transfers)
//!           → left.commit() / right.commit()   each independent
//!           → or rollback() on either side     refunds its own depositor
//! ```

pub mod arranger;
pub mod basket;

pub use arranger::{Swap, SwapArranger};
pub use basket::Basket;
