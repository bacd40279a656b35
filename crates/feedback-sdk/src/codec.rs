//! Vote counter and metadata sections embedded in a record body
//!
//! A record body is free text followed by marker-delimited sections:
//!
//! ```text
//! <description>
//!
//! ---
//! **Device Information:**
//! <device info>
//!
//! **Contact Email:**
//! <email or N/A>
//!
//! *Submitted via mobile app*
//!
//! ---
//! 👍 Votes: <count>
//! ```
//!
//! Every function here is total: malformed input degrades to a default
//! (count 0, body unchanged) and never errors. Parse and write share the
//! same marker constants; they must never drift apart or existing records
//! stop round-tripping.

use regex::Regex;
use std::sync::OnceLock;

/// Section rule: blank line, horizontal rule, newline
pub const SECTION_RULE: &str = "\n\n---\n";

/// Vote line prefix. U+1F44D, no variation selector.
pub const VOTE_MARKER: &str = "👍 Votes:";

/// Device information header
pub const DEVICE_MARKER: &str = "**Device Information:**";

/// Contact email header
pub const CONTACT_MARKER: &str = "**Contact Email:**";

/// Footer line
pub const FOOTER_MARKER: &str = "*Submitted via mobile app*";

/// Rendered in the contact block when no email was given
pub const NO_CONTACT: &str = "N/A";

/// Markers in body order, which is also strip order
const STRIP_ORDER: [&str; 4] = [VOTE_MARKER, DEVICE_MARKER, CONTACT_MARKER, FOOTER_MARKER];

fn vote_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // ASCII digits only; \d would also match other scripts.
        Regex::new(&format!("{} ([0-9]+)", regex::escape(VOTE_MARKER)))
            .expect("vote pattern is valid")
    })
}

fn vote_line(count: u64) -> String {
    format!("{} {}", VOTE_MARKER, count)
}

/// Parse the embedded vote count.
///
/// Returns the first `👍 Votes: <digits>` match, or 0 when the body is
/// absent, has no match, or the digits overflow.
pub fn parse_vote_count(body: Option<&str>) -> u64 {
    body.and_then(|b| vote_pattern().captures(b))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Remove the vote, device, contact and footer sections.
///
/// Each step cuts from the first occurrence of its marker onward, working
/// on the previous step's output, so duplicated or reordered sections are
/// still removed. The rule in front of a marker goes with it. Missing
/// markers are no-ops.
pub fn strip_sections(body: &str) -> String {
    let mut text = body.to_string();

    for marker in STRIP_ORDER {
        let Some(idx) = text.find(marker) else {
            continue;
        };
        let head = &text[..idx];
        let head = match head.strip_suffix(SECTION_RULE) {
            Some(kept) => kept,
            None => {
                let kept = head.trim_end();
                kept.strip_suffix("---").unwrap_or(kept)
            }
        };
        text = head.to_string();
    }

    text.trim().to_string()
}

/// Set the vote count.
///
/// Rewrites the digits of every vote line in place; with no vote line,
/// appends a ruled vote section. Rewriting with the current count returns
/// the body unchanged.
pub fn rewrite_vote_count(body: Option<&str>, count: u64) -> String {
    let body = body.unwrap_or_default();
    let pattern = vote_pattern();

    if pattern.is_match(body) {
        let replacement = vote_line(count);
        pattern
            .replace_all(body, regex::NoExpand(&replacement))
            .into_owned()
    } else {
        format!("{}{}{}", body, SECTION_RULE, vote_line(count))
    }
}

/// Build the body of a new record with a zero vote count.
pub fn compose_body(description: &str, device_info: &str, contact_email: Option<&str>) -> String {
    let contact = contact_email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(NO_CONTACT);

    format!(
        "{description}{rule}{device}\n{device_info}\n\n{contact_marker}\n{contact}\n\n{footer}{rule}{votes}",
        description = description.trim(),
        rule = SECTION_RULE,
        device = DEVICE_MARKER,
        device_info = device_info.trim(),
        contact_marker = CONTACT_MARKER,
        contact = contact,
        footer = FOOTER_MARKER,
        votes = vote_line(0),
    )
}
