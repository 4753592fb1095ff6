//! Content normalization at ingestion.
//!
//! Agents sometimes echo their own display name as a `Name:` prefix at the
//! start of their output. The prefix is stripped once, before the content is
//! stored, so it never reaches the message log.

/// Maximum number of repeated self-prefixes to strip.
const MAX_PREFIX_REPEATS: usize = 3;

/// Strip a leading `sender_name:` self-prefix from `content`.
///
/// Matching is ASCII case-insensitive and tolerates whitespace between the
/// name and the colon. Up to three repetitions are removed; anything beyond
/// that is assumed to be intentional content.
pub fn strip_self_prefix(sender_name: &str, content: &str) -> String {
    if sender_name.is_empty() {
        return content.to_string();
    }

    let mut rest = content;
    for _ in 0..MAX_PREFIX_REPEATS {
        let Some(stripped) = strip_once(sender_name, rest) else {
            break;
        };
        rest = stripped;
    }
    rest.to_string()
}

/// Strip one `name:` prefix, returning the remainder, or `None` if the
/// content does not start with one.
fn strip_once<'a>(name: &str, content: &'a str) -> Option<&'a str> {
    let trimmed = content.trim_start();
    if trimmed.len() < name.len() || !trimmed.is_char_boundary(name.len()) {
        return None;
    }
    let (head, tail) = trimmed.split_at(name.len());
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let tail = tail.trim_start();
    let tail = tail.strip_prefix(':')?;
    Some(tail.trim_start())
}
