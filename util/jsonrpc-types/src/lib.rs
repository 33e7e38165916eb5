//! Types exposed over the quarry JSON-RPC interface.
//!
//! Integers travel as `0x`-prefixed hex strings so that JavaScript clients
//! never silently truncate them.

mod deployment;
mod uint64;

pub use deployment::{
    Deployment, DeploymentInfo, DeploymentPos, DeploymentState, DeploymentsInfo,
};
pub use uint64::Uint64;
