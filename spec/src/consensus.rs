use quarry_constant::{block, softfork};
use quarry_jsonrpc_types::{DeploymentInfo, DeploymentsInfo};
use quarry_types::{BlockNumber, Header, HeaderBuilder, Version, H256};
use std::collections::{BTreeMap, HashMap};

use crate::versionbits::{
    ActiveMode, ConditionChecker, Deployment, DeploymentPos, ThresholdState,
    VersionbitsCache, VersionbitsConditionChecker, VersionbitsIndexer,
    VERSIONBITS_LAST_OLD_BLOCK_VERSION, VERSIONBITS_NUM_BITS, VERSIONBITS_TOP_BITS,
};

// This parameter indicates the count of past blocks used in the median time
// calculation.
const MEDIAN_TIME_BLOCK_COUNT: usize = 11;

/// Builder for [`Consensus`].
///
/// Deployment table invariants are enforced once, in [`build`], so a broken
/// configuration dies at process start instead of mid-chain.
///
/// [`build`]: Self::build
pub struct ConsensusBuilder {
    inner: Consensus,
}

impl Default for ConsensusBuilder {
    fn default() -> Self {
        let genesis_block = HeaderBuilder::default().version(1).build();
        ConsensusBuilder::new(genesis_block)
    }
}

impl ConsensusBuilder {
    pub fn new(genesis_block: Header) -> Self {
        ConsensusBuilder {
            inner: Consensus {
                genesis_hash: genesis_block.hash(),
                genesis_block,
                id: "main".to_owned(),
                block_version: VERSIONBITS_LAST_OLD_BLOCK_VERSION,
                median_time_block_count: MEDIAN_TIME_BLOCK_COUNT,
                rule_change_activation_threshold:
                    softfork::mainnet::RULE_CHANGE_ACTIVATION_THRESHOLD,
                miner_confirmation_window: softfork::mainnet::MINER_CONFIRMATION_WINDOW,
                deployments: HashMap::new(),
                versionbits_caches: VersionbitsCache::default(),
            },
        }
    }

    pub fn id(mut self, id: String) -> Self {
        self.inner.id = id;
        self
    }

    #[must_use]
    pub fn rule_change_activation_threshold(mut self, threshold: u64) -> Self {
        self.inner.rule_change_activation_threshold = threshold;
        self
    }

    #[must_use]
    pub fn miner_confirmation_window(mut self, window: BlockNumber) -> Self {
        self.inner.miner_confirmation_window = window;
        self
    }

    #[must_use]
    pub fn softfork_deployments(
        mut self,
        deployments: HashMap<DeploymentPos, Deployment>,
    ) -> Self {
        self.inner.deployments = deployments;
        self
    }

    pub fn build(mut self) -> Consensus {
        assert!(
            self.inner.rule_change_activation_threshold
                <= self.inner.miner_confirmation_window,
            "activation threshold cannot exceed the confirmation window"
        );

        for (pos, deployment) in &self.inner.deployments {
            assert!(
                u32::from(deployment.bit) < VERSIONBITS_NUM_BITS,
                "deployment {:?} signals on reserved bit {}",
                pos,
                deployment.bit
            );
            assert!(
                deployment.period > 0,
                "deployment {:?} period must be non-zero",
                pos
            );
            assert!(
                deployment.threshold > 0 && deployment.threshold <= deployment.period,
                "deployment {:?} threshold must be within its period",
                pos
            );
            if deployment.active_mode == ActiveMode::Normal {
                assert!(
                    deployment.start < deployment.timeout,
                    "deployment {:?} start must precede its timeout",
                    pos
                );
            }
        }

        // A bit may be reused only across disjoint signalling windows.
        let normal: Vec<_> = self
            .inner
            .deployments
            .iter()
            .filter(|(_, d)| d.active_mode == ActiveMode::Normal)
            .collect();
        for (i, (pos_a, a)) in normal.iter().enumerate() {
            for (pos_b, b) in normal.iter().skip(i + 1) {
                if a.bit == b.bit {
                    assert!(
                        a.start > b.timeout || b.start > a.timeout,
                        "deployments {:?} and {:?} share bit {} over overlapping windows",
                        pos_a,
                        pos_b,
                        a.bit
                    );
                }
            }
        }

        self.inner.genesis_hash = self.inner.genesis_block.hash();
        self.inner.versionbits_caches =
            VersionbitsCache::new(self.inner.deployments.keys());
        self.inner
    }
}

/// Consensus-critical parameters of one network, plus the versionbits state
/// caches.
///
/// This is the explicit context object passed wherever activation decisions
/// are made; nothing here is process-global, so tests and tools construct as
/// many independent instances as they need.
#[derive(Clone, Debug)]
pub struct Consensus {
    /// The network name.
    pub id: String,
    /// The genesis block header.
    pub genesis_block: Header,
    /// The genesis block hash.
    pub genesis_hash: H256,
    /// The version a miner uses while no deployment asks for signalling.
    pub block_version: Version,
    /// Count of past blocks used in the median time calculation.
    pub median_time_block_count: usize,
    /// Default lock-in threshold for deployments without their own.
    pub rule_change_activation_threshold: u64,
    /// Default signalling window length for deployments without their own.
    pub miner_confirmation_window: BlockNumber,
    /// The soft fork deployments this network knows about.
    pub deployments: HashMap<DeploymentPos, Deployment>,
    /// Lazily built per-deployment threshold state caches.
    pub versionbits_caches: VersionbitsCache,
}

impl Default for Consensus {
    fn default() -> Self {
        ConsensusBuilder::default().build()
    }
}

impl Consensus {
    pub fn genesis_block(&self) -> &Header {
        &self.genesis_block
    }

    pub fn genesis_hash(&self) -> H256 {
        self.genesis_hash.clone()
    }

    pub fn block_version(&self) -> Version {
        self.block_version
    }

    pub fn median_time_block_count(&self) -> usize {
        self.median_time_block_count
    }

    pub fn rule_change_activation_threshold(&self) -> u64 {
        self.rule_change_activation_threshold
    }

    pub fn miner_confirmation_window(&self) -> BlockNumber {
        self.miner_confirmation_window
    }

    pub fn deployments(&self) -> &HashMap<DeploymentPos, Deployment> {
        &self.deployments
    }

    /// The block size cap under the current block-size deployment state.
    pub fn max_block_bytes(&self, blocksize_active: bool) -> u64 {
        if blocksize_active {
            block::MAX_BLOCK_BYTES_UPGRADED
        } else {
            block::MAX_BLOCK_BYTES_LEGACY
        }
    }

    /// The version bit mask of a deployment, for testing an observed block
    /// version without consulting the state machine.
    pub fn versionbits_mask(&self, pos: DeploymentPos) -> Option<Version> {
        self.deployments
            .get(&pos)
            .map(|deployment| 1u32 << u32::from(deployment.bit))
    }

    /// Threshold state of `pos` for the block built on top of `tip`.
    ///
    /// Validation calls this once per deployment per connected block to
    /// decide which rules the next block is checked against.
    pub fn versionbits_state<I: VersionbitsIndexer>(
        &self,
        pos: DeploymentPos,
        tip: &Header,
        indexer: &I,
    ) -> Option<ThresholdState> {
        let cache = self.versionbits_caches.cache(&pos)?;
        let checker = VersionbitsConditionChecker::new(pos, self);
        checker.get_state(tip, indexer, cache)
    }

    /// The first block number to which the current state of `pos` applies.
    pub fn versionbits_since<I: VersionbitsIndexer>(
        &self,
        pos: DeploymentPos,
        tip: &Header,
        indexer: &I,
    ) -> Option<BlockNumber> {
        let cache = self.versionbits_caches.cache(&pos)?;
        let checker = VersionbitsConditionChecker::new(pos, self);
        checker.get_state_since(tip, indexer, cache)
    }

    /// The version a miner should put into the block extending `parent`.
    ///
    /// Carries the top marker plus one bit per deployment in `Started` or
    /// `LockedIn`; falls back to the plain legacy version when nothing asks
    /// for signalling.
    pub fn compute_versionbits<I: VersionbitsIndexer>(
        &self,
        parent: &Header,
        indexer: &I,
    ) -> Option<Version> {
        let mut version = VERSIONBITS_TOP_BITS;
        let mut signalling = false;

        for pos in self.deployments.keys() {
            let cache = self.versionbits_caches.cache(pos)?;
            let checker = VersionbitsConditionChecker::new(*pos, self);
            let state = checker.get_state(parent, indexer, cache)?;
            if matches!(state, ThresholdState::LockedIn | ThresholdState::Started) {
                version |= checker.mask();
                signalling = true;
            }
        }

        if signalling {
            Some(version)
        } else {
            Some(self.block_version)
        }
    }

    /// Live status of every deployment at `tip`, for RPC reporting.
    pub fn deployments_info<I: VersionbitsIndexer>(
        &self,
        tip: &Header,
        indexer: &I,
    ) -> Option<DeploymentsInfo> {
        let mut deployments = BTreeMap::new();
        for (pos, deployment) in &self.deployments {
            let state = self.versionbits_state(*pos, tip, indexer)?;
            let since = self.versionbits_since(*pos, tip, indexer)?;
            let mut info: DeploymentInfo = (*deployment).into();
            info.state = state.into();
            info.since = since.into();
            deployments.insert((*pos).into(), info);
        }
        Some(DeploymentsInfo {
            hash: tip.hash(),
            deployments,
        })
    }
}
