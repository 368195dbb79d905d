//! # basketswap-types
//!
//! Shared types, errors, and configuration for **basketswap**.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Address`], [`AssetId`], [`SwapIndex`], [`Side`]
//! - **Requirements**: [`Requirement`], [`AssetRequirement`]
//! - **Basket lifecycle**: [`BasketState`]
//! - **Receipts**: [`CommitReceipt`], [`RollbackReport`], [`TransferOutcome`], [`BasketStatus`]
//! - **Configuration**: [`ValidationPolicy`], [`ArrangerConfig`]
//! - **Errors**: [`BasketError`] with `BK_ERR_` prefix codes, [`TransferError`]
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod receipt;
pub mod requirement;
pub mod state;

pub use config::*;
pub use error::*;
pub use ids::*;
pub use receipt::*;
pub use requirement::*;
pub use state::*;

// Constants are accessed via `basketswap_types::constants::FOO`.
