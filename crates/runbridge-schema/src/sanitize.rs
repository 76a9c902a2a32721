//! Tool name sanitization.

use uuid::Uuid;

/// Longest identifier a registered tool may carry.
pub const MAX_NAME_LEN: usize = 64;

/// Turn an arbitrary remote name into `[A-Za-z0-9_-]{1,64}`.
///
/// Leading and trailing whitespace is trimmed and interior whitespace runs
/// become a single `_`. Other characters outside the allowed set are
/// dropped, and the result is truncated to [`MAX_NAME_LEN`].
/// Returns `None` when nothing usable is left. Idempotent on its own output.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let mut result = String::with_capacity(raw.len().min(MAX_NAME_LEN));
    let mut in_whitespace = false;

    for c in raw.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                result.push('_');
                in_whitespace = true;
            }
        } else if is_name_char(c) {
            result.push(c);
            in_whitespace = false;
        }
    }

    // Only ASCII survives, so byte truncation is char-safe.
    result.truncate(MAX_NAME_LEN);

    if result.is_empty() { None } else { Some(result) }
}

/// Deterministic stand-in for names that sanitize to nothing.
pub fn placeholder_name(raw: &str) -> String {
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.as_bytes()).simple().to_string();
    format!("tool_{}", &digest[..8])
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
