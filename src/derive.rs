//! Secondary URL candidates derived from a request: URLs embedded inside the
//! request URL, and hostnames recovered by reverse lookup of an IP host.

use std::net::IpAddr;

use crate::types::ReverseResolver;
use crate::url::{self, UrlParts};

/// One candidate URL checked by a multi-target condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlRecord {
    /// Protocol stripped.
    pub base: String,
    pub full: String,
    pub domain: String,
    /// No path beyond the host; URL lists are skipped for these.
    pub site_only: bool,
    /// Host is an IP literal; IP-site lists are only consulted for these.
    pub site_is_ip: bool,
}

impl UrlRecord {
    fn from_candidate(candidate: &str) -> Self {
        let base = url::strip_protocol(candidate).to_owned();
        let domain = url::hostname(candidate).to_ascii_lowercase();
        Self {
            site_only: base.trim_end_matches('/') == domain,
            site_is_ip: url::is_ip_literal(&domain),
            full: candidate.to_owned(),
            base,
            domain,
        }
    }
}

/// Every URL that appears after a `:` in `text`.
///
/// Leading slashes, quotes and colons after the `:` are skipped and the
/// candidate runs to the next whitespace or quote. A candidate carrying its
/// own scheme is reported once, not again for the text after its scheme.
///
/// ```
/// use storyboard::derive::embedded_urls;
///
/// let found = embedded_urls("http://a.example/x:http://b.example/y");
/// let hosts: Vec<_> = found.iter().map(|r| r.domain.as_str()).collect();
/// assert_eq!(hosts, ["a.example", "b.example"]);
/// ```
#[must_use]
pub fn embedded_urls(text: &str) -> Vec<UrlRecord> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find(':') {
        let rest = &text[pos + offset + 1..];
        let trimmed = rest.trim_start_matches(['/', '\'', '"', ':']);
        let start = text.len() - trimmed.len();
        let end = trimmed
            .find(|c: char| c.is_whitespace() || c == '"' || c == '\'')
            .unwrap_or(trimmed.len());
        let candidate = &trimmed[..end];
        if candidate.is_empty() {
            pos = start;
            continue;
        }
        found.push(UrlRecord::from_candidate(candidate));
        pos = start + url::scheme_prefix_len(candidate).unwrap_or(0);
    }
    found
}

/// Hostnames for an IP-literal request host, via `resolver`.
///
/// The path of the decoded request URL is carried over onto each name.
#[must_use]
pub fn reverse_hosts(resolver: &dyn ReverseResolver, parts: &UrlParts) -> Vec<UrlRecord> {
    if !parts.host_is_ip {
        return Vec::new();
    }
    let host = parts.domain.trim_start_matches('[').trim_end_matches(']');
    let Ok(ip) = host.parse::<IpAddr>() else {
        return Vec::new();
    };
    let Some(name) = resolver.reverse_lookup(ip) else {
        return Vec::new();
    };
    let name = name.trim_end_matches('.').to_ascii_lowercase();
    let path = url::path(url::strip_protocol(&parts.decoded));
    let base = format!("{name}/{path}");
    vec![UrlRecord {
        full: format!("http://{base}"),
        site_only: path.is_empty(),
        site_is_ip: false,
        base,
        domain: name,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoReverseLookup;

    fn domains(records: &[UrlRecord]) -> Vec<&str> {
        records.iter().map(|r| r.domain.as_str()).collect()
    }

    #[test]
    fn url_in_query_string() {
        let found = embedded_urls("a.example/r?u=http://b.example/x");
        assert_eq!(domains(&found), ["b.example"]);
        assert_eq!(found[0].base, "b.example/x");
        assert_eq!(found[0].full, "http://b.example/x");
        assert!(!found[0].site_only);
    }

    #[test]
    fn scheme_is_not_reported_twice() {
        let found = embedded_urls("a.example/x:https://b.example");
        assert_eq!(found.len(), 1);
        assert!(found[0].site_only);
    }

    #[test]
    fn candidate_stops_at_whitespace_and_quotes() {
        let found = embedded_urls("x:'b.example/p' tail");
        assert_eq!(found[0].full, "b.example/p");
    }

    #[test]
    fn ip_candidates_are_flagged() {
        let found = embedded_urls("a.example/?u=http://10.0.0.9/");
        assert_eq!(domains(&found), ["10.0.0.9"]);
        assert!(found[0].site_is_ip);
        assert!(found[0].site_only);
    }

    #[test]
    fn no_colon_no_candidates() {
        assert!(embedded_urls("a.example/plain/path").is_empty());
        assert!(embedded_urls("a.example/trailing:").is_empty());
    }

    #[test]
    fn reverse_host_keeps_path() {
        let parts = UrlParts::parse("http://192.0.2.7/dl/file.bin");
        let resolver = |_: IpAddr| Some("Files.Example.".to_owned());
        let found = reverse_hosts(&resolver, &parts);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].domain, "files.example");
        assert_eq!(found[0].base, "files.example/dl/file.bin");
        assert_eq!(found[0].full, "http://files.example/dl/file.bin");
    }

    #[test]
    fn reverse_hosts_skip_named_hosts_and_failures() {
        let named = UrlParts::parse("http://a.example/");
        let resolver = |_: IpAddr| Some("x.example".to_owned());
        assert!(reverse_hosts(&resolver, &named).is_empty());

        let ip = UrlParts::parse("http://192.0.2.7/");
        assert!(reverse_hosts(&NoReverseLookup, &ip).is_empty());
    }
}
