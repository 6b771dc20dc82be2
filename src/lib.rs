//! # Notekeep
//!
//! A concurrent in-memory notebook store with:
//! - Fixed-size records grouped into (size, security-level) buckets
//! - Lazy bucket creation and empty-bucket removal
//! - One worker thread per connection over a single shared directory
//! - A line-oriented TCP protocol behind a shared-secret gate
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │             (one session thread per client)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Credential Gate                              │
//! │          (one-shot check before the loop)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Dispatcher                                │
//! │          (selector → ADD / DELETE / SHOW / EDIT)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │   Directory   │
//!               │    (Mutex)    │
//!               └───────┬───────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │    Buckets    │
//!               │   (Records)   │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod auth;
pub mod network;
pub mod protocol;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use auth::CredentialGate;
pub use config::Config;
pub use error::{NotekeepError, Result};
pub use store::{BucketKey, Directory};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Notekeep
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
