//! Command selectors
//!
//! Maps the numeric selector token at the top of each request to an
//! operation. Anything outside 1-4 ends the session.

/// Operation selected by a session's leading numeric token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Selector {
    /// Add a record (creates the bucket on first use)
    Add = 1,

    /// Delete a record by position
    Delete = 2,

    /// Show a record's content by position
    Show = 3,

    /// Overwrite a record's content by position
    Edit = 4,
}

impl Selector {
    /// Map a parsed selector token to an operation, `None` for anything
    /// unrecognized (which terminates the session)
    pub fn from_token(token: i64) -> Option<Self> {
        match token {
            1 => Some(Selector::Add),
            2 => Some(Selector::Delete),
            3 => Some(Selector::Show),
            4 => Some(Selector::Edit),
            _ => None,
        }
    }
}
