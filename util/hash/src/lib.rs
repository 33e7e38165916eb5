//! Quarry default hash function.
//!
//! The quarry default hash is blake2b with a 256-bit digest and the
//! personalization `quarry-dflt-hash`.

pub use blake2b_ref::{Blake2b, Blake2bBuilder};

/// Output digest length in bytes.
pub const BLAKE2B_LEN: usize = 32;
/// Personalization distinguishing quarry hashes from plain blake2b.
pub const PERSONALIZATION: &[u8] = b"quarry-dflt-hash";

/// Creates a new hasher with the quarry personalization.
pub fn new_blake2b() -> Blake2b {
    Blake2bBuilder::new(BLAKE2B_LEN)
        .personal(PERSONALIZATION)
        .build()
}

/// Hashes the input with the quarry default hash function.
pub fn blake2b_256<T: AsRef<[u8]>>(s: T) -> [u8; BLAKE2B_LEN] {
    let mut result = [0u8; BLAKE2B_LEN];
    let mut blake2b = new_blake2b();
    blake2b.update(s.as_ref());
    blake2b.finalize(&mut result);
    result
}
