use numext_fixed_hash::H256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Uint64;

/// Deployment name.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentPos {
    /// Dummy deployment reserved for signalling tests.
    Testdummy,
    /// Median-time-past based relative lock-times.
    Timelock,
    /// Raised block-size cap.
    Blocksize,
}

/// The possible states of a deployment.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    /// First state that each softfork starts.
    Defined,
    /// For blocks past the start time.
    Started,
    /// For one period after the first period with threshold reached.
    LockedIn,
    /// For all blocks after the locked-in period.
    Active,
    /// For one period after the first period with threshold not reached.
    Failed,
}

/// Deployment parameters as configured for the network.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Deployment {
    /// Determines which bit in the version field of the block is to be used
    /// to signal the softfork lock-in and activation.
    pub bit: u8,
    /// The start time (seconds) at which the bit gains meaning.
    pub start: Uint64,
    /// The time (seconds) at which the deployment attempt expires.
    pub timeout: Uint64,
    /// The length in blocks of the signalling evaluation window.
    pub period: Uint64,
    /// The number of signalling blocks within one window needed to lock in.
    pub threshold: Uint64,
}

/// An object containing the live activation status of one deployment.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DeploymentInfo {
    /// Signalling bit.
    pub bit: u8,
    /// The start time of the signalling window.
    pub start: Uint64,
    /// The expiry time of the signalling window.
    pub timeout: Uint64,
    /// The length in blocks of the signalling evaluation window.
    pub period: Uint64,
    /// The lock-in threshold within one window.
    pub threshold: Uint64,
    /// The state the deployment is in at the queried tip.
    pub state: DeploymentState,
    /// The first block to which the state applies.
    pub since: Uint64,
}

/// All deployments' status at a chain tip.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DeploymentsInfo {
    /// The hash of the queried tip block.
    pub hash: H256,
    /// Status of every deployment the network defines.
    pub deployments: BTreeMap<DeploymentPos, DeploymentInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deployment_info_wire_format() {
        let info = DeploymentInfo {
            bit: 1,
            start: 100.into(),
            timeout: 200.into(),
            period: 16.into(),
            threshold: 12.into(),
            state: DeploymentState::LockedIn,
            since: 48.into(),
        };

        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({
                "bit": 1,
                "start": "0x64",
                "timeout": "0xc8",
                "period": "0x10",
                "threshold": "0xc",
                "state": "locked_in",
                "since": "0x30",
            })
        );
    }

    #[test]
    fn deployments_info_round_trip() {
        let mut deployments = BTreeMap::new();
        deployments.insert(
            DeploymentPos::Blocksize,
            DeploymentInfo {
                bit: 1,
                start: 0.into(),
                timeout: u64::MAX.into(),
                period: 144.into(),
                threshold: 108.into(),
                state: DeploymentState::Started,
                since: 144.into(),
            },
        );
        let info = DeploymentsInfo {
            hash: H256::from([7u8; 32]),
            deployments,
        };

        let encoded = serde_json::to_string(&info).unwrap();
        let decoded: DeploymentsInfo = serde_json::from_str(&encoded).unwrap();
        assert_eq!(info, decoded);
    }
}
