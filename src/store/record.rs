//! Record: one stored content blob.
//!
//! A record's buffer is exactly its bucket's declared size for its whole
//! lifetime. Caller-supplied content is coerced on the way in: truncated at
//! `size` bytes, zero-padded below it.

use bytes::{BufMut, Bytes, BytesMut};

/// A single content blob owned by a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    content: BytesMut,
}

impl Record {
    /// Create a record of exactly `size` bytes from caller content
    pub(crate) fn new(size: usize, content: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(size);
        let take = content.len().min(size);
        buf.put_slice(&content[..take]);
        buf.resize(size, 0);
        Self { content: buf }
    }

    /// Size of the content buffer (the owning bucket's declared size)
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Snapshot of the full content, exactly `size` bytes
    pub fn content(&self) -> Bytes {
        Bytes::copy_from_slice(&self.content)
    }

    /// Overwrite the content in place, with the same coercion as `new`
    pub(crate) fn overwrite(&mut self, content: &[u8]) {
        let size = self.content.len();
        let take = content.len().min(size);
        self.content[..take].copy_from_slice(&content[..take]);
        self.content[take..].fill(0);
    }
}
