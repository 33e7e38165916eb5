use std::collections::HashMap;
use std::io::Write;

use quarry_constant::{block, softfork};
use quarry_types::HeaderBuilder;

use crate::consensus::ConsensusBuilder;
use crate::versionbits::{
    ActiveMode, Deployment, DeploymentPos, VERSIONBITS_TOP_MASK,
};
use crate::{ChainSpec, SpecError};

fn base_deployment() -> Deployment {
    Deployment {
        bit: 1,
        start: 100,
        timeout: 200,
        period: 16,
        threshold: 12,
        active_mode: ActiveMode::Normal,
    }
}

fn build_with(deployments: Vec<(DeploymentPos, Deployment)>) {
    let genesis = HeaderBuilder::default().version(1).build();
    ConsensusBuilder::new(genesis)
        .softfork_deployments(deployments.into_iter().collect())
        .build();
}

#[test]
#[should_panic(expected = "threshold must be within its period")]
fn test_threshold_above_period_rejected() {
    build_with(vec![(
        DeploymentPos::Testdummy,
        Deployment {
            threshold: 17,
            ..base_deployment()
        },
    )]);
}

#[test]
#[should_panic(expected = "signals on reserved bit")]
fn test_reserved_bit_rejected() {
    build_with(vec![(
        DeploymentPos::Testdummy,
        Deployment {
            bit: 29,
            ..base_deployment()
        },
    )]);
}

#[test]
#[should_panic(expected = "start must precede its timeout")]
fn test_inverted_window_rejected() {
    build_with(vec![(
        DeploymentPos::Testdummy,
        Deployment {
            start: 200,
            timeout: 100,
            ..base_deployment()
        },
    )]);
}

#[test]
#[should_panic(expected = "over overlapping windows")]
fn test_shared_bit_with_overlapping_windows_rejected() {
    build_with(vec![
        (DeploymentPos::Testdummy, base_deployment()),
        (
            DeploymentPos::Timelock,
            Deployment {
                start: 150,
                timeout: 250,
                ..base_deployment()
            },
        ),
    ]);
}

#[test]
fn test_shared_bit_with_disjoint_windows_accepted() {
    build_with(vec![
        (DeploymentPos::Testdummy, base_deployment()),
        (
            DeploymentPos::Timelock,
            Deployment {
                start: 300,
                timeout: 400,
                ..base_deployment()
            },
        ),
    ]);
}

#[test]
fn test_builtin_deployment_tables_are_sane() {
    for spec in [ChainSpec::mainnet(), ChainSpec::testnet(), ChainSpec::dev()] {
        let consensus = spec.build_consensus();
        assert_eq!(consensus.id, spec.name);

        let deployments: Vec<_> = consensus.deployments().iter().collect();
        for (pos, deployment) in &deployments {
            let mask = consensus.versionbits_mask(**pos).unwrap();
            // no deployment may spill into the reserved marker bits
            assert_eq!(mask & VERSIONBITS_TOP_MASK, 0, "{pos:?} on {}", spec.name);
            assert!(
                deployment.threshold <= deployment.period,
                "{pos:?} on {}",
                spec.name
            );
        }

        // a reused bit would need disjoint windows
        for (i, (pos_a, a)) in deployments.iter().enumerate() {
            for (pos_b, b) in deployments.iter().skip(i + 1) {
                if a.bit == b.bit {
                    assert!(
                        a.start > b.timeout || b.start > a.timeout,
                        "{pos_a:?} and {pos_b:?} overlap on {}",
                        spec.name
                    );
                }
            }
        }
    }
}

#[test]
fn test_mainnet_consensus_params() {
    let consensus = ChainSpec::mainnet().build_consensus();

    assert_eq!(
        consensus.rule_change_activation_threshold(),
        softfork::mainnet::RULE_CHANGE_ACTIVATION_THRESHOLD
    );
    assert_eq!(
        consensus.miner_confirmation_window(),
        softfork::mainnet::MINER_CONFIRMATION_WINDOW
    );
    assert_eq!(consensus.genesis_block().number(), 0);
    assert_eq!(consensus.genesis_hash(), consensus.genesis_block().hash());

    // the block-size deployment carries its own window and threshold
    let blocksize = consensus.deployments()[&DeploymentPos::Blocksize];
    assert_eq!(blocksize.period, 4_032);
    assert_eq!(blocksize.threshold, 3_226);

    // the others inherit the network defaults
    let timelock = consensus.deployments()[&DeploymentPos::Timelock];
    assert_eq!(timelock.period, softfork::mainnet::MINER_CONFIRMATION_WINDOW);
    assert_eq!(
        timelock.threshold,
        softfork::mainnet::RULE_CHANGE_ACTIVATION_THRESHOLD
    );

    assert_eq!(
        consensus.max_block_bytes(false),
        block::MAX_BLOCK_BYTES_LEGACY
    );
    assert_eq!(
        consensus.max_block_bytes(true),
        block::MAX_BLOCK_BYTES_UPGRADED
    );
}

#[test]
fn test_load_spec_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        br#"
name = "quarry_staging"

[genesis]
version = 1
timestamp = 0
nonce = 0

[params]
rule_change_activation_threshold = 108
miner_confirmation_window = 144

[params.deployments.testdummy]
bit = 28
start = 0
timeout = 999999999999

[params.deployments.blocksize]
bit = 1
start = 0
timeout = 999999999999
period = 10
threshold = 8
"#,
    )
    .unwrap();

    let spec = ChainSpec::load_from(file.path()).unwrap();
    assert_eq!(spec.name, "quarry_staging");
    assert!(spec.params.deployments.testdummy.is_some());
    assert!(spec.params.deployments.timelock.is_none());
    assert!(spec.params.deployments.blocksize.is_some());

    let consensus = spec.build_consensus();
    let testdummy = consensus.deployments()[&DeploymentPos::Testdummy];
    assert_eq!(testdummy.period, 144);
    assert_eq!(testdummy.threshold, 108);
    assert_eq!(testdummy.active_mode, ActiveMode::Normal);

    let blocksize = consensus.deployments()[&DeploymentPos::Blocksize];
    assert_eq!(blocksize.period, 10);
    assert_eq!(blocksize.threshold, 8);
}

#[test]
fn test_reserved_chain_names_rejected() {
    for reserved in [
        softfork::mainnet::CHAIN_SPEC_NAME,
        softfork::testnet::CHAIN_SPEC_NAME,
    ] {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
name = "{reserved}"

[genesis]
version = 1
timestamp = 0
nonce = 0

[params]
rule_change_activation_threshold = 108
miner_confirmation_window = 144
"#
        )
        .unwrap();

        let err = ChainSpec::load_from(file.path()).unwrap_err();
        assert!(matches!(err, SpecError::ChainNameNotAllowed(name) if name == reserved));
    }
}

#[test]
fn test_missing_spec_file() {
    let err = ChainSpec::load_from("no-such-spec.toml").unwrap_err();
    assert!(matches!(err, SpecError::FileNotFound(_)));
}

#[test]
fn test_malformed_spec_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"name = \"quarry_staging\"\n[genesis]\nversion = \"not a number\"\n")
        .unwrap();
    let err = ChainSpec::load_from(file.path()).unwrap_err();
    assert!(matches!(err, SpecError::Malformed(_)));
}

#[test]
fn test_spec_toml_round_trip() {
    let spec = ChainSpec::dev();
    let encoded = toml::to_string(&spec).unwrap();
    let decoded: ChainSpec = toml::from_str(&encoded).unwrap();
    assert_eq!(spec, decoded);
}

#[test]
fn test_consensus_clone() {
    let genesis = HeaderBuilder::default().version(1).build();
    let mut deployments = HashMap::new();
    deployments.insert(DeploymentPos::Testdummy, base_deployment());
    let consensus = ConsensusBuilder::new(genesis)
        .softfork_deployments(deployments)
        .build();

    let cloned = consensus.clone();
    assert_eq!(cloned.id, consensus.id);
    assert_eq!(cloned.genesis_hash(), consensus.genesis_hash());
    assert_eq!(cloned.deployments(), consensus.deployments());
}
