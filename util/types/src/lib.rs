//! Quarry core chain types.

mod header;

pub use header::{Header, HeaderBuilder, RawHeader, Seal};
pub use numext_fixed_hash::H256;

/// Consecutive block number. The genesis block is number 0.
pub type BlockNumber = u64;

/// Raw 32-bit block version field.
///
/// Versions carrying the reserved top-bit marker encode soft-fork
/// signalling bits; anything else is a plain serial version number.
pub type Version = u32;

/// Block timestamp in seconds since the unix epoch.
pub type Timestamp = u64;
