//! ID prefix constants and formatting helpers.
//!
//! Mutation IDs look like `mut-0000002a`: a three-letter prefix, a dash, and
//! eight lowercase hex digits derived from the queue's logical clock.

pub const PREFIX_MUTATION: &str = "mut";

/// Format a prefixed ID from a sequence number.
#[must_use]
pub fn format_id(prefix: &str, seq: u64) -> String {
    format!("{prefix}-{seq:08x}")
}
