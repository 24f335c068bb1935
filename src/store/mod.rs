//! Shared result store
//!
//! Every fine worker pushes the primes it finds into one store. The store is
//! append-only with a capacity fixed at creation; pushing past it fails with
//! [`StoreError::CapacityExceeded`] instead of overrunning or growing.
//!
//! Two implementations sit behind [`ResultSink`]:
//!
//! - [`SharedResultStore`]: a mutex-guarded vector, for coarse units that are
//!   threads of the coordinator process
//! - [`shm::SharedMemoryStore`]: an anonymous shared mapping with a
//!   process-shared pthread mutex, for coarse units that are forked processes
//!
//! # Example
//!
//! ```
//! use primesplit::store::{ResultSink, SharedResultStore, StoreError};
//!
//! let store = SharedResultStore::with_capacity(2);
//! store.push(2).unwrap();
//! store.push(3).unwrap();
//! assert!(matches!(store.push(5), Err(StoreError::CapacityExceeded { .. })));
//! assert_eq!(store.snapshot().unwrap(), vec![2, 3]);
//! ```

#[cfg(unix)]
pub mod shm;

use std::sync::Mutex;
use thiserror::Error;

/// Capacity used when none is configured
pub const DEFAULT_CAPACITY: usize = 1024;

/// Errors raised by result store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result store is full (capacity {capacity}), cannot store {value}")]
    CapacityExceeded { capacity: usize, value: i64 },

    #[error("result store lock poisoned by a panicking writer")]
    Poisoned,

    #[error("result store lock failed")]
    Lock(#[source] std::io::Error),

    #[error("failed to allocate shared result store")]
    Allocation(#[source] std::io::Error),
}

/// Destination for discovered primes
///
/// Implementations serialise every `push` through a single lock, so a value
/// is either stored exactly once or rejected with an error.
pub trait ResultSink: Sync {
    /// Append `value` under the store lock
    fn push(&self, value: i64) -> Result<(), StoreError>;

    /// Copy of the stored values in arrival order
    fn snapshot(&self) -> Result<Vec<i64>, StoreError>;

    /// Number of stored values
    fn len(&self) -> Result<usize, StoreError>;

    /// Fixed upper bound on stored values
    fn capacity(&self) -> usize;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// In-process result store
#[derive(Debug)]
pub struct SharedResultStore {
    capacity: usize,
    values: Mutex<Vec<i64>>,
}

impl SharedResultStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Store bounded by `capacity`; memory grows with the values pushed
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            values: Mutex::new(Vec::new()),
        }
    }

    /// Consume the store and return its values
    pub fn into_values(self) -> Result<Vec<i64>, StoreError> {
        self.values.into_inner().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for SharedResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for SharedResultStore {
    fn push(&self, value: i64) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        if values.len() >= self.capacity {
            return Err(StoreError::CapacityExceeded {
                capacity: self.capacity,
                value,
            });
        }
        values.push(value);
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<i64>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.clone())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.len())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
