//! Network Module
//!
//! TCP server and per-session handling.
//!
//! ## Architecture
//! - Single acceptor thread scanning a port range at bind time
//! - One worker thread per accepted connection
//! - Every session shares the one directory behind its lock

mod connection;
mod server;

pub use connection::Connection;
pub use server::Server;
