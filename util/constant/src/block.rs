/// The maximum allowed size for a serialized block before the block-size
/// deployment, in bytes (network rule).
pub const MAX_BLOCK_BYTES_LEGACY: u64 = 2_000_000;

/// The maximum allowed size for a serialized block once the block-size
/// deployment is active, in bytes (network rule).
pub const MAX_BLOCK_BYTES_UPGRADED: u64 = 4_000_000;
