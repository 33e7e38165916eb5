/// The Chain Specification name.
pub const CHAIN_SPEC_NAME: &str = "quarry_dev";

/// Number of blocks in one signalling evaluation window, shortened so dev
/// chains can exercise activation quickly.
pub const MINER_CONFIRMATION_WINDOW: u64 = 144;

/// Minimum signalling blocks within one window to lock a deployment in,
/// 75% of the window.
pub const RULE_CHANGE_ACTIVATION_THRESHOLD: u64 = 108;
