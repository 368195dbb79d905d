//! Error types for basketswap.
//!
//! All errors use the `BK_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Basket configuration errors
//! - 2xx: Commit errors
//! - 3xx: Swap registry errors
//! - 4xx: Asset / ledger errors
//! - 9xx: General / internal errors
//!
//! [`TransferError`] is the narrower error an asset capability reports for a
//! single transfer. It surfaces as [`BasketError::AssetTransferFailure`] on
//! commit and is swallowed into the report on rollback.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AssetId, SwapIndex};

/// Failure of a single asset transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The asset implementation refused the transfer.
    #[error("transfer rejected by asset: {reason}")]
    Rejected { reason: String },

    /// The asset implementation panicked mid-transfer. Its writes were reverted.
    #[error("transfer aborted by asset: {reason}")]
    Aborted { reason: String },

    /// The sender does not hold enough of the asset.
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// Negative amounts are never transferable.
    #[error("invalid transfer amount: {0}")]
    InvalidAmount(Decimal),

    /// No capability is registered for the asset on this ledger.
    #[error("unknown asset: {0}")]
    UnknownAsset(AssetId),
}

/// Central error enum for all basketswap operations.
#[derive(Debug, Error)]
pub enum BasketError {
    // =================================================================
    // Configuration Errors (1xx)
    // =================================================================
    /// The requirement list or beneficiaries were rejected at creation.
    /// No basket is created.
    #[error("BK_ERR_100: Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    // =================================================================
    // Commit Errors (2xx)
    // =================================================================
    /// Commit attempted while a holding is below its requirement.
    #[error("BK_ERR_200: Not ready to commit: {asset} requires {required}, holds {held}")]
    NotReady {
        asset: AssetId,
        required: Decimal,
        held: Decimal,
    },

    /// Commit attempted after rollback was initiated. Permanent.
    #[error("BK_ERR_201: Basket locked: rollback has been initiated")]
    Locked,

    // =================================================================
    // Swap Registry Errors (3xx)
    // =================================================================
    /// No swap exists at this index.
    #[error("BK_ERR_300: Unknown swap: {0}")]
    UnknownSwap(SwapIndex),

    // =================================================================
    // Asset / Ledger Errors (4xx)
    // =================================================================
    /// A required transfer failed during commit; the whole commit was undone.
    #[error("BK_ERR_400: Asset transfer failed for {asset}: {source}")]
    AssetTransferFailure {
        asset: AssetId,
        #[source]
        source: TransferError,
    },

    /// An asset with this id is already registered on the ledger.
    #[error("BK_ERR_401: Asset already registered: {0}")]
    AssetAlreadyRegistered(AssetId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("BK_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("BK_ERR_902: Serialization error: {0}")]
    Serialization(String),
}

impl BasketError {
    /// Shorthand for [`BasketError::InvalidConfiguration`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Attach the failing asset to a [`TransferError`].
    pub fn transfer(asset: AssetId, source: TransferError) -> Self {
        Self::AssetTransferFailure { asset, source }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BasketError>;

impl From<serde_json::Error> for BasketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
