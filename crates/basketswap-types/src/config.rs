//! Configuration types for baskets and the swap arranger.

use serde::{Deserialize, Serialize};

use crate::{constants, Address, BasketError, Result};

/// Rules applied to a [`Requirement`](crate::Requirement) when a basket is created.
///
/// Duplicate assets, negative amounts, the native asset inside the asset
/// list, and null beneficiaries are rejected regardless of policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Accept a requirement with zero native amount and no assets.
    pub allow_empty: bool,
    /// Accept asset entries whose required amount is zero.
    pub allow_zero_amounts: bool,
    /// Maximum number of entries in the asset list.
    pub max_assets: usize,
}

impl ValidationPolicy {
    /// Accept empty requirements and zero amounts. Hard rules still apply.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allow_empty: true,
            allow_zero_amounts: true,
            max_assets: constants::DEFAULT_MAX_ASSETS,
        }
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            allow_empty: false,
            allow_zero_amounts: false,
            max_assets: constants::DEFAULT_MAX_ASSETS,
        }
    }
}

/// Configuration for a swap arranger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrangerConfig {
    /// The arranger's own address; basket addresses are derived from it.
    /// A fresh address is generated when absent.
    pub address: Option<Address>,
    /// Validation applied to both requirements of every arranged swap.
    pub validation: ValidationPolicy,
}

impl ArrangerConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `Configuration` if the document is malformed or sets
    /// `validation.max_assets` to zero.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| BasketError::Configuration(e.to_string()))?;
        if cfg.validation.max_assets == 0 {
            return Err(BasketError::Configuration(
                "validation.max_assets must be at least 1".to_string(),
            ));
        }
        Ok(cfg)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    /// Returns `Serialization` if encoding fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
