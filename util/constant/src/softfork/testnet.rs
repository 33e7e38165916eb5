/// The Chain Specification name.
pub const CHAIN_SPEC_NAME: &str = "quarry_testnet";

/// Number of blocks in one signalling evaluation window.
pub const MINER_CONFIRMATION_WINDOW: u64 = 3_600;

/// Minimum signalling blocks within one window to lock a deployment in,
/// 75% of the window.
pub const RULE_CHANGE_ACTIVATION_THRESHOLD: u64 = 2_700;
