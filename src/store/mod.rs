//! Store Module
//!
//! The shared in-memory notebook structure.
//!
//! ## Responsibilities
//! - Group fixed-size records into buckets keyed by (size, security level)
//! - Create buckets lazily on first add, drop them when the last record goes
//! - Serialize all structural access across concurrent sessions
//!
//! ## Data Structure Choice
//! A `HashMap` of `VecDeque`s behind one `parking_lot::Mutex`:
//! - Positions are live indices into the deque, recomputed per request
//! - One directory-wide lock keeps create/remove serialized against lookups
//! - Simple and correct first, per-bucket locking only if it ever matters

mod bucket;
mod directory;
mod record;

pub use bucket::Bucket;
pub use directory::Directory;
pub use record::Record;

use crate::error::{NotekeepError, Result};

/// Largest record size a bucket may declare (in bytes)
pub const MAX_RECORD_SIZE: usize = 4096;

/// Record sizes must be a multiple of this granule
pub const RECORD_SIZE_STEP: usize = 256;

/// Highest valid security level
pub const MAX_SECURITY_LEVEL: u8 = 6;

/// Identity of a bucket: its record size class and security level.
///
/// Construction validates both components, so holding a `BucketKey` means
/// holding a well-formed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey {
    size: usize,
    level: u8,
}

impl BucketKey {
    /// Validate a raw (size, level) pair as read off the wire.
    ///
    /// Size must be in (0, 4096] and a multiple of 256; level must be in
    /// [0, 6]. Anything else is `InvalidKey`.
    pub fn new(size: i64, level: i64) -> Result<Self> {
        if !Self::valid_size(size) || !Self::valid_level(level) {
            return Err(NotekeepError::InvalidKey { size, level });
        }

        Ok(Self {
            size: size as usize,
            level: level as u8,
        })
    }

    /// True when `size` is in (0, 4096] and a multiple of 256
    pub fn valid_size(size: i64) -> bool {
        size > 0 && size <= MAX_RECORD_SIZE as i64 && size % RECORD_SIZE_STEP as i64 == 0
    }

    /// True when `level` is in [0, 6]
    pub fn valid_level(level: i64) -> bool {
        (0..=i64::from(MAX_SECURITY_LEVEL)).contains(&level)
    }

    /// Record size declared by this key (in bytes)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Security level tag of this key
    pub fn level(&self) -> u8 {
        self.level
    }
}
