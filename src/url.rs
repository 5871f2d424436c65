//! URL string helpers shared by the decision context and the derived-data
//! helpers. These work on plain strings; no full URL parsing is attempted.

use std::net::IpAddr;

/// The forms of a request URL that conditions compare against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    /// The URL exactly as received.
    pub raw: String,
    /// Trimmed, lowercased, protocol stripped.
    pub base: String,
    /// Percent-decoded form of `raw`.
    pub decoded: String,
    /// Lowercased host, without port or credentials.
    pub domain: String,
    /// Whether `domain` is an IP literal.
    pub host_is_ip: bool,
}

impl UrlParts {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let base = strip_protocol(&trimmed.to_ascii_lowercase()).to_owned();
        let domain = hostname(trimmed).to_ascii_lowercase();
        let host_is_ip = is_ip_literal(&domain);
        Self {
            raw: raw.to_owned(),
            base,
            decoded: percent_decode(raw),
            domain,
            host_is_ip,
        }
    }
}

/// Remove a leading `scheme://` (or `scheme:` followed by slashes).
#[must_use]
pub fn strip_protocol(url: &str) -> &str {
    match url.find("://") {
        Some(pos) if is_scheme(&url[..pos]) => &url[pos + 3..],
        _ => url,
    }
}

/// Length of a leading `scheme:` prefix, colon included.
pub(crate) fn scheme_prefix_len(s: &str) -> Option<usize> {
    let pos = s.find(':')?;
    is_scheme(&s[..pos]).then_some(pos + 1)
}

fn is_scheme(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && s.starts_with(|c: char| c.is_ascii_alphabetic())
}

/// Host part of a URL: protocol, credentials, port and path removed.
#[must_use]
pub fn hostname(url: &str) -> &str {
    let rest = strip_protocol(url);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    if let Some(inner) = host.strip_prefix('[') {
        return inner.split_once(']').map_or(inner, |(h, _)| h);
    }
    match host.rsplit_once(':') {
        Some((h, port)) if !h.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => h,
        _ => host,
    }
}

/// Whether a host string is an IPv4 or IPv6 literal.
#[must_use]
pub fn is_ip_literal(host: &str) -> bool {
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host.parse::<IpAddr>().is_ok()
}

/// Path part of a protocol-stripped URL, without the leading `/`.
#[must_use]
pub fn path(base: &str) -> &str {
    base.split_once('/').map_or("", |(_, p)| p)
}

/// File extension of the last path segment, dot included (`".exe"`).
#[must_use]
pub fn file_extension(base: &str) -> Option<&str> {
    let path = path(base);
    let path = path.find(['?', '#']).map_or(path, |end| &path[..end]);
    let segment = path.rsplit('/').next()?;
    let dot = segment.rfind('.')?;
    (dot + 1 < segment.len()).then(|| &segment[dot..])
}

/// Decode `%XX` escapes. Malformed escapes are kept verbatim.
#[must_use]
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decomposes_url() {
        let parts = UrlParts::parse("HTTP://User@WWW.Example.com:8080/Path/a%20b?q=1");
        assert_eq!(parts.base, "user@www.example.com:8080/path/a%20b?q=1");
        assert_eq!(parts.domain, "www.example.com");
        assert_eq!(parts.decoded, "HTTP://User@WWW.Example.com:8080/Path/a b?q=1");
        assert!(!parts.host_is_ip);
    }

    #[test]
    fn ip_hosts_are_detected() {
        assert!(UrlParts::parse("http://10.1.2.3/x").host_is_ip);
        assert!(UrlParts::parse("http://[::1]:443/").host_is_ip);
        assert!(!UrlParts::parse("http://10.1.2.3.example/").host_is_ip);
    }

    #[test]
    fn strip_protocol_only_strips_schemes() {
        assert_eq!(strip_protocol("https://a.example/x"), "a.example/x");
        assert_eq!(strip_protocol("a.example/x?u=http://b"), "a.example/x?u=http://b");
    }

    #[test]
    fn hostname_without_protocol() {
        assert_eq!(hostname("a.example/x:http://b.example/y"), "a.example");
        assert_eq!(hostname("b.example"), "b.example");
    }

    #[test]
    fn extension_of_last_segment() {
        assert_eq!(file_extension("a.example/dl/setup.EXE?x=1"), Some(".EXE"));
        assert_eq!(file_extension("a.example/dir.d/file"), None);
        assert_eq!(file_extension("a.example"), None);
    }

    #[test]
    fn percent_decode_keeps_malformed_escapes() {
        assert_eq!(percent_decode("a%2Fb%zz%4"), "a/b%zz%4");
    }

    #[test]
    fn scheme_prefix() {
        assert_eq!(scheme_prefix_len("http://x"), Some(5));
        assert_eq!(scheme_prefix_len("a.example/x:y"), None);
    }
}
