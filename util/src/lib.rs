//! Quarry utilities library.
//!
//! Re-exports the lock types every quarry component is expected to use, so
//! the whole tree agrees on one locking implementation.

pub use parking_lot::{
    self, Condvar, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
