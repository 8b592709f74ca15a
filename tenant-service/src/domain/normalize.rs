//! Host normalization shared by resolution, validation and rate-key extraction.

/// Normalizes a raw `Host` value or domain string into its canonical form.
///
/// Strips everything from the first `:` (port), lowercases ASCII, and trims a
/// single trailing FQDN dot. Returns `None` when nothing usable remains, or
/// when a second trailing dot survives the trim (`"a.."` is malformed, and
/// rejecting it keeps the function idempotent).
///
/// No IDNA/punycode handling is attempted; hosts are treated as ASCII.
pub fn normalize(raw: &str) -> Option<String> {
    let host = raw.split(':').next().unwrap_or_default();
    let host = host.strip_suffix('.').unwrap_or(host);

    if host.is_empty() || host.ends_with('.') {
        return None;
    }

    Some(host.to_ascii_lowercase())
}
