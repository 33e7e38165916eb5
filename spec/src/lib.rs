//! # The Chain Specification
//!
//! A `ChainSpec` carries everything that distinguishes one quarry network
//! from another: the genesis header, the signalling window defaults and the
//! soft fork deployment table. The two public networks are built in
//! ([`ChainSpec::mainnet`], [`ChainSpec::testnet`]); development chains load
//! from a TOML file, with the public network names reserved.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use quarry_constant::softfork;
use quarry_logger::debug;
use quarry_types::{BlockNumber, Header, HeaderBuilder, Timestamp, Version};

use crate::consensus::{Consensus, ConsensusBuilder};
use crate::versionbits::{ActiveMode, Deployment, DeploymentPos};

pub mod consensus;
pub mod versionbits;

mod error;
#[cfg(test)]
mod tests;

pub use error::SpecError;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ChainSpec {
    pub name: String,
    pub genesis: Genesis,
    pub params: Params,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Genesis {
    pub version: Version,
    pub timestamp: Timestamp,
    pub nonce: u64,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Params {
    pub rule_change_activation_threshold: u64,
    pub miner_confirmation_window: BlockNumber,
    #[serde(default)]
    pub deployments: DeploymentsConfig,
}

/// Per-network soft fork deployment table, one optional entry per known
/// deployment.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testdummy: Option<DeploymentConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timelock: Option<DeploymentConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocksize: Option<DeploymentConfig>,
}

/// One deployment as written in a spec file. Window length and threshold
/// fall back to the network-wide defaults when omitted.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub bit: u8,
    pub start: Timestamp,
    pub timeout: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<BlockNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_mode: Option<ActiveMode>,
}

impl ChainSpec {
    /// The public quarry network.
    pub fn mainnet() -> ChainSpec {
        let deployments = DeploymentsConfig {
            testdummy: Some(DeploymentConfig {
                bit: 28,
                start: 1_199_145_601,   // January 1, 2008
                timeout: 1_230_767_999, // December 31, 2008
                period: None,
                threshold: None,
                active_mode: None,
            }),
            timelock: Some(DeploymentConfig {
                bit: 0,
                start: 1_546_300_800,   // Jan 1st, 2019
                timeout: 1_577_836_800, // Jan 1st, 2020
                period: None,
                threshold: None,
                active_mode: None,
            }),
            blocksize: Some(DeploymentConfig {
                bit: 1,
                start: 1_554_076_800,   // Apr 1st, 2019
                timeout: 1_585_699_200, // Apr 1st, 2020
                period: Some(4_032),
                threshold: Some(3_226), // 80% of 4032
                active_mode: None,
            }),
        };

        ChainSpec {
            name: softfork::mainnet::CHAIN_SPEC_NAME.to_owned(),
            genesis: Genesis {
                version: 1,
                timestamp: 1_546_128_000,
                nonce: 8_747_168,
            },
            params: Params {
                rule_change_activation_threshold:
                    softfork::mainnet::RULE_CHANGE_ACTIVATION_THRESHOLD,
                miner_confirmation_window: softfork::mainnet::MINER_CONFIRMATION_WINDOW,
                deployments,
            },
        }
    }

    /// The public quarry test network.
    pub fn testnet() -> ChainSpec {
        let deployments = DeploymentsConfig {
            testdummy: Some(DeploymentConfig {
                bit: 28,
                start: 1_199_145_601,   // January 1, 2008
                timeout: 1_230_767_999, // December 31, 2008
                period: None,
                threshold: None,
                active_mode: None,
            }),
            timelock: Some(DeploymentConfig {
                bit: 0,
                start: 1_543_622_400,   // Dec 1st, 2018
                timeout: 1_575_158_400, // Dec 1st, 2019
                period: None,
                threshold: None,
                active_mode: None,
            }),
            blocksize: Some(DeploymentConfig {
                bit: 1,
                start: 1_551_398_400,   // Mar 1st, 2019
                timeout: 1_583_020_800, // Mar 1st, 2020
                period: Some(100),
                threshold: Some(50), // 50% of 100
                active_mode: None,
            }),
        };

        ChainSpec {
            name: softfork::testnet::CHAIN_SPEC_NAME.to_owned(),
            genesis: Genesis {
                version: 1,
                timestamp: 1_546_128_001,
                nonce: 2_656_958,
            },
            params: Params {
                rule_change_activation_threshold:
                    softfork::testnet::RULE_CHANGE_ACTIVATION_THRESHOLD,
                miner_confirmation_window: softfork::testnet::MINER_CONFIRMATION_WINDOW,
                deployments,
            },
        }
    }

    /// A local development chain: every deployment starts signalling at
    /// once and never expires.
    pub fn dev() -> ChainSpec {
        let deployments = DeploymentsConfig {
            testdummy: Some(DeploymentConfig {
                bit: 28,
                start: 0,
                timeout: 999_999_999_999,
                period: None,
                threshold: None,
                active_mode: None,
            }),
            timelock: Some(DeploymentConfig {
                bit: 0,
                start: 0,
                timeout: 999_999_999_999,
                period: None,
                threshold: None,
                active_mode: None,
            }),
            blocksize: Some(DeploymentConfig {
                bit: 1,
                start: 0,
                timeout: 999_999_999_999,
                period: None,
                threshold: None,
                active_mode: None,
            }),
        };

        ChainSpec {
            name: softfork::dev::CHAIN_SPEC_NAME.to_owned(),
            genesis: Genesis {
                version: 1,
                timestamp: 1_546_128_002,
                nonce: 0,
            },
            params: Params {
                rule_change_activation_threshold:
                    softfork::dev::RULE_CHANGE_ACTIVATION_THRESHOLD,
                miner_confirmation_window: softfork::dev::MINER_CONFIRMATION_WINDOW,
                deployments,
            },
        }
    }

    /// Loads a development chain spec from a TOML file.
    ///
    /// The public network names are reserved; their specs are compiled in
    /// and cannot be shadowed from disk.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<ChainSpec, SpecError> {
        let bytes = std::fs::read(&path)
            .map_err(|_| SpecError::FileNotFound(path.as_ref().display().to_string()))?;
        let spec: ChainSpec = toml::from_slice(&bytes)?;
        if spec.name == softfork::mainnet::CHAIN_SPEC_NAME
            || spec.name == softfork::testnet::CHAIN_SPEC_NAME
        {
            return Err(SpecError::ChainNameNotAllowed(spec.name));
        }
        debug!("loaded chain spec {}", spec.name);
        Ok(spec)
    }

    /// Builds the consensus context for this spec.
    ///
    /// Deployment table invariants are asserted here, at process start.
    pub fn build_consensus(&self) -> Consensus {
        ConsensusBuilder::new(self.genesis.build_header())
            .id(self.name.clone())
            .rule_change_activation_threshold(self.params.rule_change_activation_threshold)
            .miner_confirmation_window(self.params.miner_confirmation_window)
            .softfork_deployments(self.softfork_deployments())
            .build()
    }

    fn softfork_deployments(&self) -> HashMap<DeploymentPos, Deployment> {
        let table = &self.params.deployments;
        let entries = [
            (DeploymentPos::Testdummy, &table.testdummy),
            (DeploymentPos::Timelock, &table.timelock),
            (DeploymentPos::Blocksize, &table.blocksize),
        ];

        let mut deployments = HashMap::new();
        for (pos, entry) in entries {
            if let Some(config) = entry {
                deployments.insert(
                    pos,
                    Deployment {
                        bit: config.bit,
                        start: config.start,
                        timeout: config.timeout,
                        period: config
                            .period
                            .unwrap_or(self.params.miner_confirmation_window),
                        threshold: config
                            .threshold
                            .unwrap_or(self.params.rule_change_activation_threshold),
                        active_mode: config.active_mode.unwrap_or(ActiveMode::Normal),
                    },
                );
            }
        }
        deployments
    }
}

impl Genesis {
    fn build_header(&self) -> Header {
        HeaderBuilder::default()
            .version(self.version)
            .timestamp(self.timestamp)
            .nonce(self.nonce)
            .build()
    }
}
