//! Session output
//!
//! Every line the server speaks, in one place. The texts are part of the
//! wire contract (existing clients key on the `"> "` prompts and the
//! bracketed report lines), so they are not reworded per call site.

use std::io::Write;

use crate::error::{NotekeepError, Result};

/// Menu banner sent before each selector read
pub const BANNER: &str = "[+] Notebook Manager\n\
                          [+] 1. Add a note\n\
                          [+] 2. Del a note\n\
                          [+] 3. Show a note\n\
                          [+] 4. Edit a note\n";

/// Credential challenge sent once at session start
pub const CRED_CHALLENGE: &str = "ADMIN role required, show me your cred:\n";

/// Prompt for the bucket size token
pub const PROMPT_SIZE: &str = "Enter the size of note\n> ";

/// Prompt for the security level token
pub const PROMPT_LEVEL: &str = "Enter the Security Level of note\n> ";

/// Prompt for the position token of a delete
pub const PROMPT_DELETE: &str = "Which page to delete:\n> ";

/// Prompt for the position token of a show
pub const PROMPT_SHOW: &str = "Which page to read:\n> ";

/// Prompt for the position token of an edit
pub const PROMPT_EDIT: &str = "Which page to edit:\n> ";

/// Report line for an invalid size/level or malformed token
pub const INVALID: &str = "[X] INVALID\n";

/// Report line when no bucket exists for the requested key
pub const NO_BUCKET: &str = "[-] No note list found for such specs.\n";

/// Report line when the position names no record
pub const NO_RECORD: &str = "[-] No such page.\n";

/// Report line when the store budget refuses an add
pub const NO_SPACE: &str = "[X] No more space\n";

/// Map a session-local store/protocol error to its report line.
///
/// I/O errors have no line; they terminate the session instead.
pub fn report_line(err: &NotekeepError) -> Option<&'static str> {
    match err {
        NotekeepError::InvalidKey { .. } | NotekeepError::Protocol(_) => Some(INVALID),
        NotekeepError::NoSuchBucket => Some(NO_BUCKET),
        NotekeepError::NoSuchRecord => Some(NO_RECORD),
        NotekeepError::Capacity => Some(NO_SPACE),
        _ => None,
    }
}

/// Write a protocol text and flush so prompts reach the client before the
/// next blocking read
pub fn send<W: Write>(writer: &mut W, text: &str) -> Result<()> {
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}
