use sha2::{Digest, Sha256};
use url::Url;

/// Windows-safe, deterministic filename: `{sanitized_host}--{hash(url)}.txt`
///
/// The hash covers the full serialized URL, so the same URL always maps to
/// the same file and different paths on one host get different files.
pub fn response_filename(url: &Url) -> String {
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    let sanitized = sanitize_component(&host);
    let hash = url_hash(url.as_str());
    format!("{sanitized}--{hash}.txt")
}

fn sanitize_component(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if cleaned.is_empty() {
        return "unknown".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c != '_' || !prev_underscore {
            compacted.push(c);
        }
        prev_underscore = c == '_';
    }
    if compacted.len() > 80 {
        let mut end = 80;
        while !compacted.is_char_boundary(end) {
            end -= 1;
        }
        compacted.truncate(end);
    }
    if is_reserved_windows_name(&compacted) {
        compacted.push('_');
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

// First 8 bytes of SHA-256, hex encoded.
fn url_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_separator_is_replaced() {
        assert_eq!(sanitize_component("localhost:8080"), "localhost_8080");
    }

    #[test]
    fn empty_host_falls_back() {
        assert_eq!(sanitize_component(""), "unknown");
        assert_eq!(sanitize_component("::"), "unknown");
    }

    #[test]
    fn reserved_name_is_patched() {
        assert_eq!(sanitize_component("nul"), "nul_");
    }

    #[test]
    fn hash_is_sixteen_hex_chars() {
        let hash = url_hash("http://x/a");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash, url_hash("http://x/b"));
    }

    #[test]
    fn filename_without_host() {
        let url = Url::parse("data:text/plain,hello").unwrap();
        let name = response_filename(&url);
        assert!(name.starts_with("unknown--"));
        assert!(name.ends_with(".txt"));
    }
}
