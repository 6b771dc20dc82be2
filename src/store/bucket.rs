//! Bucket: an ordered group of same-size, same-level records.
//!
//! New records go to the front, so position 0 is always the most recently
//! added and every existing record shifts by one. Positions are indices into
//! the live sequence; deleting a record renumbers everything behind it.

use std::collections::VecDeque;

use bytes::Bytes;

use crate::error::{NotekeepError, Result};

use super::{BucketKey, Record};

/// A (size, security level) group of records
#[derive(Debug)]
pub struct Bucket {
    key: BucketKey,
    records: VecDeque<Record>,
}

impl Bucket {
    /// Create an empty bucket for the given key
    pub(crate) fn new(key: BucketKey) -> Self {
        Self {
            key,
            records: VecDeque::new(),
        }
    }

    /// The key this bucket is registered under
    pub fn key(&self) -> BucketKey {
        self.key
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records remain
    ///
    /// The directory removes a bucket the moment this becomes true; an
    /// empty bucket never stays registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a record at the front, returning its position (always 0)
    pub(crate) fn add_record(&mut self, content: &[u8]) -> usize {
        self.records.push_front(Record::new(self.key.size(), content));
        0
    }

    /// Remove the record at `position`
    pub(crate) fn delete_record(&mut self, position: usize) -> Result<()> {
        self.records
            .remove(position)
            .map(|_| ())
            .ok_or(NotekeepError::NoSuchRecord)
    }

    /// Read the record at `position`, returning its exact-size content
    pub(crate) fn read_record(&self, position: usize) -> Result<Bytes> {
        self.records
            .get(position)
            .map(Record::content)
            .ok_or(NotekeepError::NoSuchRecord)
    }

    /// Overwrite the record at `position`
    pub(crate) fn write_record(&mut self, position: usize, content: &[u8]) -> Result<()> {
        self.records
            .get_mut(position)
            .map(|record| record.overwrite(content))
            .ok_or(NotekeepError::NoSuchRecord)
    }

    /// Check that `position` names a live record
    pub(crate) fn has_record(&self, position: usize) -> bool {
        position < self.records.len()
    }
}
