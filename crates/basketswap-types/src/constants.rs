//! System-wide constants for basketswap.

/// Default upper bound on distinct assets in one basket's requirement list.
pub const DEFAULT_MAX_ASSETS: usize = 32;

/// Domain separator for derived basket addresses.
pub const BASKET_ADDRESS_DOMAIN: &[u8] = b"basketswap:basket:v1:";
