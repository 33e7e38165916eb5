use bincode::serialize;
use numext_fixed_hash::H256;
use quarry_hash::blake2b_256;
use serde::{Deserialize, Serialize};

use crate::{BlockNumber, Timestamp, Version};

/// Proof-of-work seal, kept apart from the hashed payload so the pow hash
/// can be computed without it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug, Default)]
pub struct Seal {
    nonce: u64,
}

impl Seal {
    pub fn new(nonce: u64) -> Self {
        Seal { nonce }
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug, Default)]
pub struct RawHeader {
    version: Version,
    /// Parent hash.
    parent_hash: H256,
    /// Block timestamp in seconds.
    timestamp: Timestamp,
    /// Genesis number is 0, child block number is parent block number + 1.
    number: BlockNumber,
}

impl RawHeader {
    pub fn pow_hash(&self) -> H256 {
        blake2b_256(serialize(self).expect("RawHeader serializing should be ok")).into()
    }

    pub fn with_seal(self, seal: Seal) -> Header {
        Header { raw: self, seal }
    }

    pub fn number(&self) -> BlockNumber {
        self.number
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, Eq)]
pub struct Header {
    raw: RawHeader,
    /// proof seal
    seal: Seal,
}

impl Header {
    pub fn version(&self) -> Version {
        self.raw.version
    }

    pub fn number(&self) -> BlockNumber {
        self.raw.number
    }

    pub fn timestamp(&self) -> Timestamp {
        self.raw.timestamp
    }

    pub fn parent_hash(&self) -> &H256 {
        &self.raw.parent_hash
    }

    pub fn seal(&self) -> &Seal {
        &self.seal
    }

    pub fn nonce(&self) -> u64 {
        self.seal.nonce
    }

    pub fn hash(&self) -> H256 {
        blake2b_256(serialize(&self).expect("Header serializing should be ok")).into()
    }

    pub fn pow_hash(&self) -> H256 {
        self.raw.pow_hash()
    }

    pub fn is_genesis(&self) -> bool {
        self.number() == 0
    }

    pub fn into_raw(self) -> RawHeader {
        self.raw
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Header) -> bool {
        self.hash() == other.hash()
    }
}

#[derive(Default)]
pub struct HeaderBuilder {
    inner: Header,
}

impl HeaderBuilder {
    pub fn header(mut self, header: Header) -> Self {
        self.inner = header;
        self
    }

    pub fn seal(mut self, seal: Seal) -> Self {
        self.inner.seal = seal;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.inner.raw.version = version;
        self
    }

    pub fn number(mut self, number: BlockNumber) -> Self {
        self.inner.raw.number = number;
        self
    }

    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.inner.raw.timestamp = timestamp;
        self
    }

    pub fn parent_hash(mut self, hash: H256) -> Self {
        self.inner.raw.parent_hash = hash;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.inner.seal.nonce = nonce;
        self
    }

    pub fn build(self) -> Header {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_all_fields() {
        let parent: H256 = [0xab; 32].into();
        let header = HeaderBuilder::default()
            .version(2)
            .number(7)
            .timestamp(1_500_000_000)
            .parent_hash(parent.clone())
            .nonce(99)
            .build();

        assert_eq!(header.version(), 2);
        assert_eq!(header.number(), 7);
        assert_eq!(header.timestamp(), 1_500_000_000);
        assert_eq!(header.parent_hash(), &parent);
        assert_eq!(header.nonce(), 99);
        assert!(!header.is_genesis());
    }

    #[test]
    fn equality_follows_hash() {
        let build = || {
            HeaderBuilder::default()
                .version(1)
                .number(3)
                .timestamp(42)
                .build()
        };
        assert_eq!(build(), build());
        assert_ne!(build(), HeaderBuilder::default().header(build()).nonce(1).build());
    }

    #[test]
    fn pow_hash_ignores_seal() {
        let raw = HeaderBuilder::default().number(5).build().into_raw();
        let sealed = raw.clone().with_seal(Seal::new(77));
        let resealed = raw.with_seal(Seal::new(78));

        assert_eq!(sealed.pow_hash(), resealed.pow_hash());
        assert_ne!(sealed.hash(), resealed.hash());
    }
}
