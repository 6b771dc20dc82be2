//! Connection Handler
//!
//! Drives one client session: the credential gate, then the selector loop
//! against the shared directory.
//!
//! The directory lock is never held while this module touches the socket.
//! Request content is read off the wire first and handed to the store;
//! SHOW gets an owned snapshot back before writing.

use std::io::{BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::CredentialGate;
use crate::error::{NotekeepError, Result};
use crate::protocol::{read_content, read_credential, read_token, response, Selector};
use crate::store::{BucketKey, Directory};

/// Handles a single client session
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// The shared bucket directory
    directory: Arc<Directory>,

    /// Admission check run once before the command loop
    gate: Arc<CredentialGate>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O on a cloned stream pair
    pub fn new(
        stream: TcpStream,
        directory: Arc<Directory>,
        gate: Arc<CredentialGate>,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency on the prompt exchange
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            directory,
            gate,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the session (blocking until closed)
    ///
    /// Runs the credential gate, then loops: banner, selector, operation.
    /// Returns when the client disconnects, fails the gate, or sends an
    /// unrecognized selector.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        match self.authenticate() {
            Ok(()) => {}
            Err(NotekeepError::AccessDenied) => {
                tracing::debug!("Credential rejected for {}", self.peer_addr);
                return Ok(());
            }
            Err(NotekeepError::Io(ref e)) if is_disconnect(e.kind()) => {
                tracing::debug!("Client {} left during the credential gate", self.peer_addr);
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        loop {
            if let Err(e) = response::send(&mut self.writer, response::BANNER) {
                if let NotekeepError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!("Client {} disconnected", self.peer_addr);
                        return Ok(());
                    }
                }
                return Err(e);
            }

            let token = match read_token(&mut self.reader) {
                Ok(token) => token,
                Err(NotekeepError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(NotekeepError::Protocol(_)) => {
                    // A selector that does not even parse is an unrecognized
                    // selector; the session is over.
                    tracing::debug!("Unparsable selector from {}, session over", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading selector from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            let selector = match Selector::from_token(token) {
                Some(selector) => selector,
                None => {
                    tracing::debug!("Session {} ended by selector {}", self.peer_addr, token);
                    return Ok(());
                }
            };

            tracing::trace!("Session {} running {:?}", self.peer_addr, selector);

            if let Err(e) = self.execute(selector) {
                if let NotekeepError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!("Client {} disconnected mid-operation", self.peer_addr);
                        return Ok(());
                    }
                }
                tracing::warn!("Error serving {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    // =========================================================================
    // Credential gate
    // =========================================================================

    /// Challenge the client and check the supplied credential.
    ///
    /// A rejected credential closes the session without detail; the reject
    /// path and the disconnect path are indistinguishable on the wire. An
    /// overlong credential line is a rejection too.
    fn authenticate(&mut self) -> Result<()> {
        response::send(&mut self.writer, response::CRED_CHALLENGE)?;

        let supplied = match read_credential(&mut self.reader) {
            Ok(supplied) => supplied,
            Err(NotekeepError::Protocol(_)) => return Err(NotekeepError::AccessDenied),
            Err(e) => return Err(e),
        };

        if self.gate.verify(&supplied) {
            Ok(())
        } else {
            Err(NotekeepError::AccessDenied)
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    fn execute(&mut self, selector: Selector) -> Result<()> {
        match selector {
            Selector::Add => self.op_add(),
            Selector::Delete => self.op_delete(),
            Selector::Show => self.op_show(),
            Selector::Edit => self.op_edit(),
        }
    }

    /// ADD: locate key, consume exactly `size` content bytes, insert front
    fn op_add(&mut self) -> Result<()> {
        let key = match self.locate_key()? {
            Some(key) => key,
            None => return Ok(()),
        };

        // Content crosses the wire before the directory lock is taken.
        let content = read_content(&mut self.reader, key.size())?;

        if let Err(e) = self.directory.add_record(key, &content) {
            self.report(&e)?;
        }
        Ok(())
    }

    /// DELETE: locate key and bucket, then remove the record at a position
    fn op_delete(&mut self) -> Result<()> {
        let key = match self.locate_existing()? {
            Some(key) => key,
            None => return Ok(()),
        };
        let position = match self.read_position(response::PROMPT_DELETE)? {
            Some(position) => position,
            None => return Ok(()),
        };

        if let Err(e) = self.directory.delete_record(key, position) {
            self.report(&e)?;
        }
        Ok(())
    }

    /// SHOW: locate key and bucket, then stream back exactly `size` bytes
    fn op_show(&mut self) -> Result<()> {
        let key = match self.locate_existing()? {
            Some(key) => key,
            None => return Ok(()),
        };
        let position = match self.read_position(response::PROMPT_SHOW)? {
            Some(position) => position,
            None => return Ok(()),
        };

        match self.directory.read_record(key, position) {
            Ok(content) => {
                self.writer.write_all(&content)?;
                self.writer.flush()?;
            }
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    /// EDIT: locate key, bucket and record, then consume exactly `size`
    /// replacement bytes
    fn op_edit(&mut self) -> Result<()> {
        let key = match self.locate_existing()? {
            Some(key) => key,
            None => return Ok(()),
        };
        let position = match self.read_position(response::PROMPT_EDIT)? {
            Some(position) => position,
            None => return Ok(()),
        };

        // Content is only consumed when the target exists, so a client that
        // named a bad position is not left with unread bytes expected of it.
        if let Err(e) = self.directory.probe_record(key, position) {
            self.report(&e)?;
            return Ok(());
        }

        let content = read_content(&mut self.reader, key.size())?;

        // A concurrent delete may have won the race since the probe; the
        // write re-checks and reports rather than touching freed state.
        if let Err(e) = self.directory.write_record(key, position, &content) {
            self.report(&e)?;
        }
        Ok(())
    }

    // =========================================================================
    // Sub-protocol helpers
    // =========================================================================

    /// Bucket-locate sub-protocol: prompt and validate size, then level.
    ///
    /// Size is judged before the level prompt is ever sent. Any violation
    /// reports `[X] INVALID` and returns `None`, putting the session back at
    /// the selector.
    fn locate_key(&mut self) -> Result<Option<BucketKey>> {
        response::send(&mut self.writer, response::PROMPT_SIZE)?;
        let size = match self.read_field()? {
            Some(size) => size,
            None => return Ok(None),
        };
        if !BucketKey::valid_size(size) {
            response::send(&mut self.writer, response::INVALID)?;
            return Ok(None);
        }

        response::send(&mut self.writer, response::PROMPT_LEVEL)?;
        let level = match self.read_field()? {
            Some(level) => level,
            None => return Ok(None),
        };

        match BucketKey::new(size, level) {
            Ok(key) => Ok(Some(key)),
            Err(_) => {
                response::send(&mut self.writer, response::INVALID)?;
                Ok(None)
            }
        }
    }

    /// Locate a key and require its bucket to exist (DELETE/SHOW/EDIT path)
    fn locate_existing(&mut self) -> Result<Option<BucketKey>> {
        let key = match self.locate_key()? {
            Some(key) => key,
            None => return Ok(None),
        };
        if !self.directory.contains_bucket(key) {
            response::send(&mut self.writer, response::NO_BUCKET)?;
            return Ok(None);
        }
        Ok(Some(key))
    }

    /// Read one numeric field; a malformed token reports `[X] INVALID`
    fn read_field(&mut self) -> Result<Option<i64>> {
        match read_token(&mut self.reader) {
            Ok(value) => Ok(Some(value)),
            Err(NotekeepError::Protocol(_)) => {
                response::send(&mut self.writer, response::INVALID)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Prompt for and read a record position (non-negative)
    fn read_position(&mut self, prompt: &str) -> Result<Option<usize>> {
        response::send(&mut self.writer, prompt)?;
        let token = match self.read_field()? {
            Some(token) => token,
            None => return Ok(None),
        };
        match usize::try_from(token) {
            Ok(position) => Ok(Some(position)),
            Err(_) => {
                response::send(&mut self.writer, response::INVALID)?;
                Ok(None)
            }
        }
    }

    /// Report a session-local error on its protocol line
    fn report(&mut self, err: &NotekeepError) -> Result<()> {
        match response::report_line(err) {
            Some(line) => response::send(&mut self.writer, line),
            None => {
                tracing::warn!("No report line for error from {}: {}", self.peer_addr, err);
                Ok(())
            }
        }
    }
}

/// Error kinds meaning the peer went away rather than the server failing
fn is_disconnect(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
    )
}
