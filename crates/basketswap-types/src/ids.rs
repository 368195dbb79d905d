//! Identifiers used throughout basketswap.
//!
//! Ledger accounts are addressed by a 16-byte [`Address`]. Fresh addresses
//! are UUIDv7; addresses of arranged baskets are derived deterministically
//! from the arranger address, the swap index and the side.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A ledger account address. Parties, baskets and arrangers all hold one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub Uuid);

impl Address {
    /// The null address. Never a valid beneficiary.
    pub const ZERO: Self = Self(Uuid::nil());

    /// A fresh, time-ordered address.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_nil()
    }

    /// Deterministic holding address for one side of an arranged swap.
    ///
    /// The same `(arranger, index, side)` always yields the same address, so
    /// a party can compute where to deposit without asking the arranger.
    #[must_use]
    pub fn derive_basket(arranger: Address, index: SwapIndex, side: Side) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(crate::constants::BASKET_ADDRESS_DOMAIN);
        hasher.update(arranger.as_bytes());
        hasher.update(index.0.to_le_bytes());
        hasher.update([side.tag()]);
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    /// First four bytes as hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.as_bytes()[..4])
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.as_bytes()))
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Identifier of a transferable asset (e.g. "TOK1", "USDT").
///
/// The native currency uses the reserved symbol [`AssetId::NATIVE_SYMBOL`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    /// Reserved symbol of the ledger's built-in currency.
    pub const NATIVE_SYMBOL: &'static str = "NATIVE";

    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// The built-in currency.
    #[must_use]
    pub fn native() -> Self {
        Self(Self::NATIVE_SYMBOL.to_string())
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        self.0 == Self::NATIVE_SYMBOL
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SwapIndex
// ---------------------------------------------------------------------------

/// Sequential index of an arranged swap. Assigned in creation order, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SwapIndex(pub u64);

impl SwapIndex {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SwapIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "swap:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which half of a swap a basket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    fn tag(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "LEFT"),
            Self::Right => write!(f, "RIGHT"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
