//! Human-readable node identifiers.
//!
//! A workspace owns an identifier prefix such as `PJT`. The PROJECT root
//! takes the bare prefix; every other node gets `{prefix}-{seq:03}` from
//! the workspace's node sequence.

use crate::error::CoreError;

/// Maximum length of a workspace identifier prefix.
pub const PREFIX_MAX_LEN: usize = 20;

/// Prefixes are 1-20 ASCII letters, digits or underscores.
pub fn validate_identifier_prefix(prefix: &str) -> Result<(), CoreError> {
    if prefix.is_empty() || prefix.len() > PREFIX_MAX_LEN {
        return Err(CoreError::Validation(format!(
            "Identifier prefix must be 1-{PREFIX_MAX_LEN} characters"
        )));
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(CoreError::Validation(format!(
            "Identifier prefix '{prefix}' may only contain letters, digits and '_'"
        )));
    }
    Ok(())
}

/// Format the identifier for the `seq`-th node of a workspace.
///
/// ```
/// use projectree_core::naming::node_identifier;
///
/// assert_eq!(node_identifier("PJT", 14), "PJT-014");
/// assert_eq!(node_identifier("PJT", 1203), "PJT-1203");
/// ```
pub fn node_identifier(prefix: &str, seq: i64) -> String {
    format!("{prefix}-{seq:03}")
}
