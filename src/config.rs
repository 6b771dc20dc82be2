//! Configuration for Notekeep
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a Notekeep server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Credential Configuration
    // -------------------------------------------------------------------------
    /// Path to the file holding the shared admin secret, read once at startup
    pub cred_file: PathBuf,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Host to bind the listener on
    pub listen_host: String,

    /// First port to try when binding
    pub port_start: u16,

    /// Last port to try when binding (inclusive)
    ///
    /// A `port_start` of 0 asks the OS for an ephemeral port and ignores
    /// `port_end`.
    pub port_end: u16,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    ///
    /// Sessions are interactive; the default leaves reads unbounded so a
    /// client may idle at the menu.
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Total bytes of record content the directory may hold
    ///
    /// Admissions beyond this budget fail with a capacity error instead of
    /// growing without bound.
    pub max_store_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cred_file: PathBuf::from("./notekeep.cred"),
            listen_host: "127.0.0.1".to_string(),
            port_start: 29000,
            port_end: 29999,
            max_connections: 64,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            max_store_bytes: 64 * 1024 * 1024, // 64 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the credential file path
    pub fn cred_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cred_file = path.into();
        self
    }

    /// Set the listen host
    pub fn listen_host(mut self, host: impl Into<String>) -> Self {
        self.config.listen_host = host.into();
        self
    }

    /// Set the port range to scan when binding
    pub fn port_range(mut self, start: u16, end: u16) -> Self {
        self.config.port_start = start;
        self.config.port_end = end;
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds, 0 disables)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds, 0 disables)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the store content budget (in bytes)
    pub fn max_store_bytes(mut self, bytes: usize) -> Self {
        self.config.max_store_bytes = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
