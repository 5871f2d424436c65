use std::cell::OnceCell;

use super::request::RequestHead;
use super::services::ReverseResolver;
use crate::derive::{self, UrlRecord};
use crate::url::UrlParts;

/// Per-request outcome flags read by flag conditions and set by built-in actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    pub exception: bool,
    pub grey: bool,
    pub blocked: bool,
    pub mitm: bool,
    pub done: bool,
    /// Result of the most recently processed instruction.
    pub is_return: bool,
    pub redirect: bool,
    pub no_virus_check: bool,
    pub bypass: bool,
    pub cookie_bypass: bool,
    pub scan_bypass: bool,
    pub virus_bypass: bool,
    pub has_sni: bool,
    pub tls: bool,
    pub connect: bool,
    pub go_mitm: bool,
    pub header_added: bool,
    pub header_modified: bool,
    pub no_check_cert: bool,
    pub go_direct: bool,
    pub no_log: bool,
    pub log_category: bool,
    pub url_modified: bool,
}

/// Search terms extracted from the request, if it is a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub active: bool,
    /// Sorted words, `+` separated.
    pub words: String,
    /// Terms as typed, `+` replaced by spaces.
    pub terms: String,
}

/// What the last successful match reported, and the reasons composed from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub message_id: u32,
    pub log_message_id: u32,
    pub last_category: String,
    pub categories: String,
    pub last_match: String,
    /// Opaque payload from the last match (rewrite target, header, ...).
    pub payload: String,
    pub reason: String,
    pub log_reason: String,
    pub exception_category: String,
}

/// Mutable state for one request, owned by the caller and passed by `&mut`
/// into the interpreter.
///
/// Embedded URLs and reverse-resolved hostnames are derived lazily: each is
/// computed the first time a condition needs it and reused for the rest of
/// the request.
#[derive(Debug, Clone, Default)]
pub struct DecisionContext {
    pub request: RequestHead,
    pub url: UrlParts,
    pub client_ip: String,
    pub client_host: String,
    /// Response content type, for MIME conditions.
    pub mime_type: String,
    pub search: SearchState,
    pub flags: Flags,
    pub annotations: Annotations,
    embedded: OnceCell<Vec<UrlRecord>>,
    reversed: OnceCell<Vec<UrlRecord>>,
}

impl DecisionContext {
    /// Build a context for `request`, decomposing its URL.
    #[must_use]
    pub fn new(request: RequestHead) -> Self {
        let url = UrlParts::parse(&request.url);
        let connect = request.is_method("CONNECT");
        Self {
            request,
            url,
            flags: Flags {
                connect,
                ..Flags::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn client(mut self, ip: &str, host: &str) -> Self {
        self.client_ip = ip.to_owned();
        self.client_host = host.to_ascii_lowercase();
        self
    }

    #[must_use]
    pub fn tls(mut self, tls: bool, has_sni: bool) -> Self {
        self.flags.tls = tls;
        self.flags.has_sni = has_sni;
        self
    }

    /// Mark the request as a search with the given `+`-separated terms.
    #[must_use]
    pub fn search_terms(mut self, raw: &str) -> Self {
        self.set_search_terms(raw);
        self
    }

    #[must_use]
    pub fn mime(mut self, mime_type: &str) -> Self {
        self.mime_type = mime_type.to_ascii_lowercase();
        self
    }

    /// Replace the request URL and every form derived from it.
    ///
    /// Derived caches belong to the old URL and are dropped.
    pub fn set_url(&mut self, url: &str) {
        url.clone_into(&mut self.request.url);
        self.url = UrlParts::parse(url);
        self.embedded = OnceCell::new();
        self.reversed = OnceCell::new();
    }

    pub(crate) fn set_search_terms(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let mut words: Vec<&str> = raw.split('+').filter(|w| !w.is_empty()).collect();
        words.sort_unstable();
        self.search.active = true;
        self.search.words = words.join("+");
        self.search.terms = raw.replace('+', " ");
    }

    /// Whether embedded URLs have been extracted for this request.
    #[must_use]
    pub fn embedded_checked(&self) -> bool {
        self.embedded.get().is_some()
    }

    /// Whether the reverse lookup has been attempted for this request.
    #[must_use]
    pub fn reverse_checked(&self) -> bool {
        self.reversed.get().is_some()
    }

    pub(crate) fn embedded_urls(&self) -> &[UrlRecord] {
        self.embedded
            .get_or_init(|| derive::embedded_urls(&self.url.base))
    }

    pub(crate) fn reverse_hosts(&self, resolver: &dyn ReverseResolver) -> &[UrlRecord] {
        self.reversed
            .get_or_init(|| derive::reverse_hosts(resolver, &self.url))
    }
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn ctx(url: &str) -> DecisionContext {
        DecisionContext::new(RequestHead::new("GET", url))
    }

    #[test]
    fn new_decomposes_request_url() {
        let c = ctx("http://www.example.com/a/b");
        assert_eq!(c.url.domain, "www.example.com");
        assert_eq!(c.url.base, "www.example.com/a/b");
        assert!(!c.flags.connect);
    }

    #[test]
    fn connect_method_sets_flag() {
        let c = DecisionContext::new(RequestHead::new("CONNECT", "a.example:443"));
        assert!(c.flags.connect);
        assert_eq!(c.url.domain, "a.example");
    }

    #[test]
    fn search_terms_are_sorted_and_normalized() {
        let c = ctx("http://s.example/").search_terms("zebra+apple+mango");
        assert!(c.search.active);
        assert_eq!(c.search.words, "apple+mango+zebra");
        assert_eq!(c.search.terms, "zebra apple mango");
    }

    #[test]
    fn empty_search_terms_leave_state_alone() {
        let c = ctx("http://s.example/").search_terms("");
        assert!(!c.search.active);
    }

    #[test]
    fn embedded_urls_computed_once() {
        let c = ctx("http://a.example/r?u=http://b.example/x");
        assert!(!c.embedded_checked());
        let first = c.embedded_urls().len();
        assert!(c.embedded_checked());
        assert_eq!(first, 1);
        assert_eq!(c.embedded_urls()[0].domain, "b.example");
    }

    #[test]
    fn reverse_lookup_runs_once() {
        let calls = AtomicUsize::new(0);
        let resolver = |_: IpAddr| {
            calls.fetch_add(1, Ordering::SeqCst);
            Some("host.example".to_owned())
        };
        let c = ctx("http://10.0.0.1/x");
        assert_eq!(c.reverse_hosts(&resolver).len(), 1);
        assert_eq!(c.reverse_hosts(&resolver).len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_url_resets_derived_caches() {
        let mut c = ctx("http://a.example/r?u=http://b.example/x");
        let _ = c.embedded_urls();
        c.set_url("http://c.example/plain");
        assert!(!c.embedded_checked());
        assert_eq!(c.request.url, "http://c.example/plain");
        assert_eq!(c.url.domain, "c.example");
        assert!(c.embedded_urls().is_empty());
    }
}
