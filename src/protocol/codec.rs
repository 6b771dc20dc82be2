//! Protocol codec
//!
//! Reading primitives for the wire protocol. Every read is bounded before
//! any buffer is touched: numeric tokens are capped at [`MAX_TOKEN_LEN`]
//! bytes, credentials at [`MAX_CREDENTIAL_LEN`], and record content is
//! transferred with `read_exact` at precisely the bucket's declared size.
//!
//! Token parsing is strict. A field that is not a well-formed decimal
//! integer is a [`NotekeepError::Protocol`] error, reported to the session
//! rather than silently coerced to zero.

use std::io::{BufRead, Read};

use bytes::BytesMut;

use crate::error::{NotekeepError, Result};

/// Longest numeric token accepted, in bytes (excluding the newline)
pub const MAX_TOKEN_LEN: usize = 15;

/// Longest credential line accepted, in bytes (excluding the newline)
pub const MAX_CREDENTIAL_LEN: usize = 1024;

/// Read one newline-terminated numeric token and parse it as a signed
/// decimal integer.
///
/// Leading/trailing ASCII whitespace and NUL padding are tolerated (legacy
/// clients pad tokens); anything else non-numeric is a protocol error. An
/// overlong token drains the rest of its line so the stream stays aligned,
/// then errors. EOF before any input surfaces as `UnexpectedEof` so the
/// session loop can treat it as a disconnect.
pub fn read_token<R: BufRead>(reader: &mut R) -> Result<i64> {
    let raw = read_bounded_line(reader, MAX_TOKEN_LEN)?;

    let raw = match raw {
        Some(bytes) => bytes,
        None => {
            drain_line(reader)?;
            return Err(NotekeepError::Protocol("numeric token too long".to_string()));
        }
    };

    let text = std::str::from_utf8(&raw)
        .map_err(|_| NotekeepError::Protocol("numeric token is not text".to_string()))?;
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0');

    text.parse::<i64>()
        .map_err(|_| NotekeepError::Protocol(format!("invalid numeric token {text:?}")))
}

/// Read exactly `size` bytes of record content
pub fn read_content<R: Read>(reader: &mut R, size: usize) -> Result<BytesMut> {
    let mut content = BytesMut::zeroed(size);
    reader.read_exact(&mut content)?;
    Ok(content)
}

/// Read the credential line presented at session start.
///
/// The trailing newline (and an optional carriage return before it) is
/// stripped; the bytes are otherwise untouched. A line beyond
/// [`MAX_CREDENTIAL_LEN`] is a protocol error.
pub fn read_credential<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = read_bounded_line(reader, MAX_CREDENTIAL_LEN)?
        .ok_or_else(|| NotekeepError::Protocol("credential line too long".to_string()))?;

    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(line)
}

// =============================================================================
// Internal line reading
// =============================================================================

/// Read bytes up to (and consuming) a newline, refusing to buffer more than
/// `max` bytes of line content.
///
/// Returns `Ok(None)` when the line exceeds `max` (the excess is left
/// unconsumed). EOF with no bytes read is `UnexpectedEof`; EOF mid-line
/// yields what was read, matching a client that sent its token and closed.
fn read_bounded_line<R: BufRead>(reader: &mut R, max: usize) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::with_capacity(max.min(64));
    let mut byte = [0u8; 1];

    loop {
        let n = reader.read(&mut byte)?;
        if n == 0 {
            if line.is_empty() {
                return Err(NotekeepError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stream closed",
                )));
            }
            return Ok(Some(line));
        }
        if byte[0] == b'\n' {
            return Ok(Some(line));
        }
        if line.len() == max {
            return Ok(None);
        }
        line.push(byte[0]);
    }
}

/// Consume the remainder of the current line after an overlong read
fn drain_line<R: BufRead>(reader: &mut R) -> Result<()> {
    let mut byte = [0u8; 1];
    loop {
        let n = reader.read(&mut byte)?;
        if n == 0 || byte[0] == b'\n' {
            return Ok(());
        }
    }
}
