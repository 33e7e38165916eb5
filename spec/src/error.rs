use thiserror::Error;

/// The error type for chain spec operations
#[derive(Error, Debug)]
pub enum SpecError {
    /// The file not found
    #[error("FileNotFound: {0}")]
    FileNotFound(String),

    /// The specified chain name is reserved for a built-in network.
    #[error("ChainNameNotAllowed: {0}")]
    ChainNameNotAllowed(String),

    /// The spec file is not valid TOML for a chain spec.
    #[error("Malformed: {0}")]
    Malformed(#[from] toml::de::Error),
}
