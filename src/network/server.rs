//! TCP Server
//!
//! Binds the first free port in the configured range, accepts connections,
//! and spawns one session thread per client. All sessions share the one
//! directory and credential gate.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::auth::CredentialGate;
use crate::config::Config;
use crate::error::{NotekeepError, Result};
use crate::store::Directory;

use super::Connection;

/// Interval between shutdown-flag checks while the listener is idle
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// TCP server for Notekeep
pub struct Server {
    config: Config,
    directory: Arc<Directory>,
    gate: Arc<CredentialGate>,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Create a new server sharing the given directory and credential gate
    pub fn new(config: Config, directory: Arc<Directory>, gate: Arc<CredentialGate>) -> Self {
        Self {
            config,
            directory,
            gate,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind a listener on the first free port in the configured range.
    ///
    /// A `port_start` of 0 asks the OS for an ephemeral port instead.
    pub fn bind(&self) -> Result<TcpListener> {
        let host = self.config.listen_host.as_str();

        if self.config.port_start == 0 {
            let listener = TcpListener::bind((host, 0))?;
            if let Ok(addr) = listener.local_addr() {
                tracing::info!("Listening on {}", addr);
            }
            return Ok(listener);
        }

        for port in self.config.port_start..=self.config.port_end {
            match TcpListener::bind((host, port)) {
                Ok(listener) => {
                    tracing::info!("Listening on {}:{}", host, port);
                    return Ok(listener);
                }
                Err(e) => {
                    tracing::trace!("Port {} unavailable: {}", port, e);
                }
            }
        }

        Err(NotekeepError::Network(format!(
            "no usable port in {}-{}",
            self.config.port_start, self.config.port_end
        )))
    }

    /// Bind and serve (blocking)
    pub fn run(&self) -> Result<()> {
        let listener = self.bind()?;
        self.serve(listener)
    }

    /// Serve connections on an already-bound listener (blocking).
    ///
    /// The listener runs non-blocking so the loop can observe the shutdown
    /// flag while idle.
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        listener.set_nonblocking(true)?;

        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if self.active.load(Ordering::Relaxed) >= self.config.max_connections {
                        tracing::warn!("Connection cap reached, refusing {}", peer);
                        drop(stream);
                        continue;
                    }
                    // The accepted stream inherits non-blocking mode on some
                    // platforms; sessions expect blocking reads.
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Failed to configure stream for {}: {}", peer, e);
                        continue;
                    }
                    tracing::debug!("Accepted connection from {}", peer);
                    self.spawn_session(stream, peer);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    tracing::warn!("Accept error: {}", e);
                }
            }
        }

        tracing::info!("Server stopped accepting connections");
        Ok(())
    }

    /// Signal the server to stop accepting and return from `serve`
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Handle for wiring the shutdown flag to a signal handler
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Number of sessions currently running
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Spawn the worker thread owning one session
    fn spawn_session(&self, stream: TcpStream, peer: SocketAddr) {
        let directory = Arc::clone(&self.directory);
        let gate = Arc::clone(&self.gate);
        let active = Arc::clone(&self.active);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        self.active.fetch_add(1, Ordering::Relaxed);

        let spawned = thread::Builder::new()
            .name(format!("session-{peer}"))
            .spawn(move || {
                match Connection::new(stream, directory, gate) {
                    Ok(mut conn) => {
                        if let Err(e) = conn.set_timeouts(read_ms, write_ms) {
                            tracing::warn!("Failed to set timeouts for {}: {}", peer, e);
                        }
                        if let Err(e) = conn.handle() {
                            tracing::warn!("Session {} ended with error: {}", peer, e);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to set up session for {}: {}", peer, e);
                    }
                }
                active.fetch_sub(1, Ordering::Relaxed);
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn session thread for {}: {}", peer, e);
            self.active.fetch_sub(1, Ordering::Relaxed);
        }
    }
}
