//! Protocol Module
//!
//! The line-oriented wire protocol spoken by sessions.
//!
//! ## Shape
//! - Numeric fields travel as newline-terminated decimal tokens
//! - Record content travels raw, exactly the bucket size in bytes
//! - Server output is prompt/report lines (see [`response`])

pub mod response;

mod codec;
mod command;

pub use codec::{read_content, read_credential, read_token, MAX_CREDENTIAL_LEN, MAX_TOKEN_LEN};
pub use command::Selector;
