// ABOUTME: Resolves the stable identity key that ties repeated ingestions of one event together.
// ABOUTME: Link-bearing records key on (platform, link); the rest key on a SHA-256 of their descriptive fields.

use sha2::{Digest, Sha256};

use crate::record::RawRecord;

/// Separates the platform prefix from the rest of the identity.
pub const SEPARATOR: &str = "::";

/// Rendered in place of an absent field. An absent field and an empty one
/// hash differently; existing identities depend on that.
pub const ABSENT_MARKER: &str = "None";

fn render(value: Option<&str>) -> &str {
    value.unwrap_or(ABSENT_MARKER)
}

/// Compute the identity of a raw record. Pure and infallible.
///
/// - With a non-blank link: `{platform}::{trimmed link}`
/// - Otherwise: `{platform}::{sha256_hex("{platform}|{name}|{start_date}|{end_date}")}`
pub fn resolve_identity(raw: &RawRecord) -> String {
    let platform = render(raw.platform.as_deref());

    if let Some(link) = raw.trimmed_link() {
        return format!("{platform}{SEPARATOR}{link}");
    }

    let material = format!(
        "{}|{}|{}|{}",
        platform,
        render(raw.name.as_deref()),
        render(raw.start_date.as_deref()),
        render(raw.end_date.as_deref()),
    );
    let digest = Sha256::digest(material.as_bytes());

    format!("{platform}{SEPARATOR}{digest:x}")
}
