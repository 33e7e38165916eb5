//! Soft fork deployment through version bits signalling.
//!
//! Miners signal readiness for a pending consensus rule change by setting a
//! reserved bit in the block version field. Signals are tallied over fixed
//! windows of blocks; a deployment advances between states only at window
//! boundaries, so every node derives the same activation decision from the
//! same chain history, no matter how often (or in which order) it asks.

use quarry_logger::debug;
use quarry_types::{BlockNumber, Header, Timestamp, Version, H256};
use quarry_util::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::consensus::Consensus;

mod convert;

/// Bits reserved to mark a version field as bit-encoded signalling.
pub const VERSIONBITS_TOP_BITS: Version = 0x2000_0000;
/// Mask selecting the reserved marker bits.
pub const VERSIONBITS_TOP_MASK: Version = 0xE000_0000;
/// Total bits available for deployment signalling.
pub const VERSIONBITS_NUM_BITS: u32 = 29;
/// The last version used by plain serial versioning, before bit signalling.
pub const VERSIONBITS_LAST_OLD_BLOCK_VERSION: Version = 4;

/// ThresholdState defines a finite-state-machine to deploy a softfork in
/// multiple stages.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ThresholdState {
    /// First state that each softfork starts out as. The genesis block is by
    /// definition in this state for each deployment.
    Defined,
    /// For blocks past the start time.
    Started,
    /// For one period after the first period with at least `threshold`
    /// blocks signalling the associated bit.
    LockedIn,
    /// For all blocks after the locked-in period (final state).
    Active,
    /// For all blocks once the first period boundary past the timeout is
    /// hit, if lock-in was not reached (final state).
    Failed,
}

/// How a deployment participates in signalling.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveMode {
    /// Activation is decided by miner signalling within the start/timeout
    /// window.
    Normal,
    /// Unconditionally active; start and timeout are ignored.
    Always,
    /// Unconditionally failed; start and timeout are ignored.
    Never,
}

/// Deployment name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum DeploymentPos {
    /// Dummy deployment reserved for signalling tests.
    Testdummy,
    /// Median-time-past based relative lock-times.
    Timelock,
    /// Raised block-size cap.
    Blocksize,
}

/// Parameters for one consensus rule change tracked through version bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Deployment {
    /// Bit position to select the particular bit in version.
    pub bit: u8,
    /// Start time (seconds) for miner confirmation.
    pub start: Timestamp,
    /// Timeout/expiry time (seconds) for the deployment attempt.
    pub timeout: Timestamp,
    /// Number of blocks in one signalling evaluation window.
    pub period: BlockNumber,
    /// Minimum signalling blocks within one window required to lock in.
    pub threshold: u64,
    /// Sentinel override: always active, never active, or normal signalling.
    pub active_mode: ActiveMode,
}

/// Memoized threshold states of one deployment, keyed by the hash of the
/// last block of a completed period.
pub type Cache = Mutex<HashMap<H256, ThresholdState>>;

/// Lazily built per-deployment state caches.
///
/// An entry is a pure function of the previous boundary's entry and the
/// signals inside its own period, so a value computed once stays valid for
/// the lifetime of the chain history, and racing recomputation writes the
/// identical value. Clones share the maps.
#[derive(Clone, Debug, Default)]
pub struct VersionbitsCache {
    caches: Arc<HashMap<DeploymentPos, Cache>>,
}

impl VersionbitsCache {
    /// Creates one empty cache per known deployment.
    pub fn new<'a>(deployments: impl Iterator<Item = &'a DeploymentPos>) -> Self {
        VersionbitsCache {
            caches: Arc::new(
                deployments.map(|pos| (*pos, Cache::default())).collect(),
            ),
        }
    }

    pub(crate) fn cache(&self, pos: &DeploymentPos) -> Option<&Cache> {
        self.caches.get(pos)
    }
}

/// Read-only view of the chain the activation engine traverses.
///
/// Implemented by the block storage layer. The engine only follows parent
/// links backwards; it never mutates chain data and never asks for anything
/// beyond the genesis boundary.
pub trait VersionbitsIndexer {
    /// Number of trailing blocks entering the median time computation.
    fn median_block_count(&self) -> usize;

    /// Header lookup by block hash.
    fn block_header(&self, block_hash: &H256) -> Option<Header>;

    /// Ancestor of `base` at exactly `number`, following parent links.
    fn ancestor(&self, base: &Header, number: BlockNumber) -> Option<Header> {
        if number > base.number() {
            return None;
        }
        let mut header = base.clone();
        while header.number() > number {
            header = self.block_header(header.parent_hash())?;
        }
        Some(header)
    }

    /// Median of the last `median_block_count` timestamps ending at (and
    /// including) the given block.
    ///
    /// This is the manipulation-resistant threshold time compared against a
    /// deployment's start and timeout; a single stamped block time is not.
    fn block_median_time(&self, block_hash: &H256) -> Option<Timestamp> {
        let mut timestamps = Vec::with_capacity(self.median_block_count());
        let mut hash = block_hash.clone();
        for _ in 0..self.median_block_count() {
            let header = self.block_header(&hash)?;
            timestamps.push(header.timestamp());
            if header.is_genesis() {
                break;
            }
            hash = header.parent_hash().clone();
        }

        // return greater one if count is even.
        timestamps.sort_unstable();
        Some(timestamps[timestamps.len() >> 1])
    }
}

/// Per-deployment strategy: descriptor accessors plus the signalling
/// predicate. The threshold state machine itself is shared by all
/// deployments and lives here as provided methods.
pub trait ConditionChecker {
    /// Whether this block's version signals for this deployment.
    fn condition(&self, header: &Header) -> bool;
    /// Start of the signalling window.
    fn begin_time(&self) -> Timestamp;
    /// Expiry of the signalling window.
    fn end_time(&self) -> Timestamp;
    /// Length in blocks of one evaluation window.
    fn period(&self) -> BlockNumber;
    /// Signalling blocks within one window required to lock in.
    fn threshold(&self) -> u64;
    /// Sentinel override for the deployment.
    fn active_mode(&self) -> ActiveMode;

    /// Threshold state for the block built on top of `tip`.
    ///
    /// States change only at period boundaries (`(number + 1) % period ==
    /// 0`); any other position inherits the state of its nearest boundary
    /// ancestor. Boundaries are computed at most once and memoized in
    /// `cache`, so querying after every block or once at the end yields the
    /// same answers. Returns `None` only when the indexer cannot supply a
    /// required header.
    fn get_state<I: VersionbitsIndexer>(
        &self,
        tip: &Header,
        indexer: &I,
        cache: &Cache,
    ) -> Option<ThresholdState> {
        match self.active_mode() {
            ActiveMode::Always => return Some(ThresholdState::Active),
            ActiveMode::Never => return Some(ThresholdState::Failed),
            ActiveMode::Normal => {}
        }

        let period = self.period();
        let begin = self.begin_time();

        // Rewind to the boundary of the period containing `tip`, then jump
        // back one period at a time until a cached boundary or the virtual
        // pre-genesis position is reached.
        let mut to_compute = Vec::new();
        let mut walk = {
            let rem = (tip.number() + 1) % period;
            if rem > tip.number() {
                None
            } else {
                Some(indexer.ancestor(tip, tip.number() - rem)?)
            }
        };

        let mut state = loop {
            let boundary = match walk.take() {
                Some(header) => header,
                None => break ThresholdState::Defined,
            };
            let key = boundary.hash();
            if let Some(cached) = cache.lock().get(&key).copied() {
                break cached;
            }
            // An uncached boundary whose median time is still below the
            // start is Defined, and so is everything before it.
            if indexer.block_median_time(&key)? < begin {
                cache.lock().insert(key, ThresholdState::Defined);
                break ThresholdState::Defined;
            }
            walk = if boundary.number() >= period {
                Some(indexer.ancestor(&boundary, boundary.number() - period)?)
            } else {
                None
            };
            to_compute.push(boundary);
        };

        // Replay transitions from the oldest uncomputed boundary forward,
        // memoizing every result.
        while let Some(boundary) = to_compute.pop() {
            state = match state {
                ThresholdState::Defined => {
                    if indexer.block_median_time(&boundary.hash())? >= begin {
                        ThresholdState::Started
                    } else {
                        ThresholdState::Defined
                    }
                }
                ThresholdState::Started => {
                    // timeout outranks a met threshold within the same period
                    if indexer.block_median_time(&boundary.hash())? > self.end_time() {
                        ThresholdState::Failed
                    } else {
                        let mut count = 0u64;
                        let mut header = boundary.clone();
                        for step in 0..period {
                            if self.condition(&header) {
                                count += 1;
                            }
                            if step + 1 < period {
                                header = indexer.block_header(header.parent_hash())?;
                            }
                        }
                        if count >= self.threshold() {
                            ThresholdState::LockedIn
                        } else {
                            ThresholdState::Started
                        }
                    }
                }
                ThresholdState::LockedIn => ThresholdState::Active,
                ThresholdState::Active => ThresholdState::Active,
                ThresholdState::Failed => ThresholdState::Failed,
            };
            debug!(
                "versionbits boundary {} computed as {:?}",
                boundary.number(),
                state
            );
            cache.lock().insert(boundary.hash(), state);
        }

        Some(state)
    }

    /// The first block number to which the current state applies.
    ///
    /// Walks period boundaries backwards while they share the state of
    /// `tip`; 0 for `Defined` and for sentinel deployments.
    fn get_state_since<I: VersionbitsIndexer>(
        &self,
        tip: &Header,
        indexer: &I,
        cache: &Cache,
    ) -> Option<BlockNumber> {
        if self.active_mode() != ActiveMode::Normal {
            return Some(0);
        }

        let state = self.get_state(tip, indexer, cache)?;
        if state == ThresholdState::Defined {
            return Some(0);
        }

        let period = self.period();
        let rem = (tip.number() + 1) % period;
        if rem > tip.number() {
            return Some(0);
        }
        let mut boundary = indexer.ancestor(tip, tip.number() - rem)?;
        while boundary.number() >= period {
            let previous = indexer.ancestor(&boundary, boundary.number() - period)?;
            if self.get_state(&previous, indexer, cache)? != state {
                break;
            }
            boundary = previous;
        }
        Some(boundary.number() + 1)
    }
}

/// Condition checker for the deployment table carried by a [`Consensus`].
pub struct VersionbitsConditionChecker<'a> {
    id: DeploymentPos,
    consensus: &'a Consensus,
}

impl<'a> VersionbitsConditionChecker<'a> {
    pub(crate) fn new(id: DeploymentPos, consensus: &'a Consensus) -> Self {
        VersionbitsConditionChecker { id, consensus }
    }

    fn deployment(&self) -> &Deployment {
        &self.consensus.deployments[&self.id]
    }

    /// The version bit mask of this deployment.
    pub fn mask(&self) -> Version {
        1u32 << u32::from(self.deployment().bit)
    }
}

impl<'a> ConditionChecker for VersionbitsConditionChecker<'a> {
    fn condition(&self, header: &Header) -> bool {
        let version = header.version();
        (version & VERSIONBITS_TOP_MASK) == VERSIONBITS_TOP_BITS
            && (version & self.mask()) != 0
    }

    fn begin_time(&self) -> Timestamp {
        self.deployment().start
    }

    fn end_time(&self) -> Timestamp {
        self.deployment().timeout
    }

    fn period(&self) -> BlockNumber {
        self.deployment().period
    }

    fn threshold(&self) -> u64 {
        self.deployment().threshold
    }

    fn active_mode(&self) -> ActiveMode {
        self.deployment().active_mode
    }
}
