// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Protocol constants shared across the workspace.

/// Drops per unit of the native asset
pub const DROPS_DECIMAL_FACTOR: u64 = 1_000_000;

/// Total native supply ceiling, in drops
pub const MAX_NATIVE_DROPS: i64 = 100_000_000_000_000_000;

/// Smallest normalized issued-currency mantissa
pub const MIN_MANTISSA: u64 = 1_000_000_000_000_000;

/// Largest normalized issued-currency mantissa
pub const MAX_MANTISSA: u64 = 9_999_999_999_999_999;

/// Smallest issued-currency exponent
pub const MIN_EXPONENT: i32 = -96;

/// Largest issued-currency exponent
pub const MAX_EXPONENT: i32 = 80;

/// Exponent stored for the zero issued amount
pub const ZERO_EXPONENT: i32 = -100;

/// Parts-per-billion representation of a 1.0 rate or quality
pub const QUALITY_ONE: u64 = 1_000_000_000;

/// Size in bytes of ledger object keys and account identifiers
pub const KEY_SIZE_BYTES: usize = 32;

/// Maximum number of entries held by one directory page
pub const DIR_NODE_MAX: usize = 32;

/// Maximum number of pages a directory may grow to
pub const DIR_PAGE_MAX: u64 = 262_144;

/// Default cap on offers examined per matching session
pub const MAX_OFFERS_EXAMINED: u32 = 1_000;
