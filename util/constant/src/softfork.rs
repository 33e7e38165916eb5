/// dev chain soft fork constant
pub mod dev;
/// mainnet soft fork constant
pub mod mainnet;
/// testnet soft fork constant
pub mod testnet;
