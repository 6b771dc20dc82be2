//! Directory: the process-wide bucket map shared by every session.
//!
//! ## Concurrency Model
//!
//! One `parking_lot::Mutex` guards the whole structure. Every operation
//! takes the lock for its full locate → mutate/read → empty-bucket upkeep
//! sequence, so concurrent get-or-create on one key cannot register two
//! buckets and a delete racing a read never yields a dangling record.
//!
//! The lock is never held across socket I/O: callers read request content
//! off the wire first and pass it in, and reads hand back an owned snapshot.
//!
//! ## Capacity
//!
//! Admission is bounded by a resident-byte budget checked before any
//! mutation, so a refused add leaves the directory exactly as it was.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::{NotekeepError, Result};

use super::{Bucket, BucketKey};

/// The shared set of all buckets, keyed by (size, security level)
#[derive(Debug)]
pub struct Directory {
    inner: Mutex<DirectoryInner>,
    max_resident_bytes: usize,
}

#[derive(Debug)]
struct DirectoryInner {
    buckets: HashMap<BucketKey, Bucket>,
    resident_bytes: usize,
}

impl Directory {
    /// Create an empty directory with the given content budget (in bytes)
    pub fn new(max_resident_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(DirectoryInner {
                buckets: HashMap::new(),
                resident_bytes: 0,
            }),
            max_resident_bytes,
        }
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Add a record under `key`, creating the bucket on first use.
    ///
    /// Content is coerced to exactly `key.size()` bytes and inserted at the
    /// front of the bucket's sequence. Returns the new record's position,
    /// which is always 0.
    pub fn add_record(&self, key: BucketKey, content: &[u8]) -> Result<usize> {
        let mut inner = self.inner.lock();

        // Budget check comes first so a refusal cannot leave a fresh empty
        // bucket behind.
        if inner.resident_bytes + key.size() > self.max_resident_bytes {
            tracing::warn!(
                size = key.size(),
                level = key.level(),
                resident = inner.resident_bytes,
                "store budget exhausted, refusing add"
            );
            return Err(NotekeepError::Capacity);
        }

        let bucket = inner
            .buckets
            .entry(key)
            .or_insert_with(|| Bucket::new(key));
        let position = bucket.add_record(content);
        inner.resident_bytes += key.size();

        Ok(position)
    }

    /// Delete the record at `position` in the bucket for `key`.
    ///
    /// Removing the last record removes the bucket itself; the key is free
    /// to be recreated by a later add.
    pub fn delete_record(&self, key: BucketKey, position: usize) -> Result<()> {
        let mut inner = self.inner.lock();

        let bucket = inner.buckets.get_mut(&key).ok_or(NotekeepError::NoSuchBucket)?;
        bucket.delete_record(position)?;
        inner.resident_bytes -= key.size();

        Self::remove_bucket_if_empty(&mut inner, key);
        Ok(())
    }

    /// Read the record at `position` in the bucket for `key`.
    ///
    /// Returns an owned snapshot of exactly `key.size()` bytes so the lock
    /// drops before the caller touches the network.
    pub fn read_record(&self, key: BucketKey, position: usize) -> Result<Bytes> {
        let inner = self.inner.lock();

        inner
            .buckets
            .get(&key)
            .ok_or(NotekeepError::NoSuchBucket)?
            .read_record(position)
    }

    /// Overwrite the record at `position` in the bucket for `key`
    pub fn write_record(&self, key: BucketKey, position: usize, content: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();

        inner
            .buckets
            .get_mut(&key)
            .ok_or(NotekeepError::NoSuchBucket)?
            .write_record(position, content)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// True when a bucket is currently registered for `key`
    pub fn contains_bucket(&self, key: BucketKey) -> bool {
        self.inner.lock().buckets.contains_key(&key)
    }

    /// Check that `position` names a live record in the bucket for `key`.
    ///
    /// Used by EDIT to decide whether to consume content from the wire.
    /// The answer can go stale the moment the lock drops; the follow-up
    /// `write_record` re-checks and reports `NoSuchRecord` if a concurrent
    /// delete won the race.
    pub fn probe_record(&self, key: BucketKey, position: usize) -> Result<()> {
        let inner = self.inner.lock();

        let bucket = inner.buckets.get(&key).ok_or(NotekeepError::NoSuchBucket)?;
        if bucket.has_record(position) {
            Ok(())
        } else {
            Err(NotekeepError::NoSuchRecord)
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Number of buckets currently registered
    pub fn bucket_count(&self) -> usize {
        self.inner.lock().buckets.len()
    }

    /// Number of records in the bucket for `key`, if it exists
    pub fn record_count(&self, key: BucketKey) -> Option<usize> {
        self.inner.lock().buckets.get(&key).map(Bucket::len)
    }

    /// Total bytes of record content currently resident
    pub fn resident_bytes(&self) -> usize {
        self.inner.lock().resident_bytes
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Drop the bucket for `key` iff its record sequence is empty.
    ///
    /// No-op otherwise, and a no-op for keys with no bucket. Called with the
    /// directory lock held.
    fn remove_bucket_if_empty(inner: &mut DirectoryInner, key: BucketKey) {
        if inner.buckets.get(&key).is_some_and(Bucket::is_empty) {
            inner.buckets.remove(&key);
            tracing::debug!(size = key.size(), level = key.level(), "bucket emptied, removed");
        }
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new(crate::config::Config::default().max_store_bytes)
    }
}
