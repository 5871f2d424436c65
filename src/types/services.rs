use std::collections::HashMap;
use std::net::IpAddr;

/// Message-table lookup used to compose user-facing and log reasons.
pub trait Translator: Send + Sync {
    /// Text for `message_id`; empty when the id is unknown.
    fn translate(&self, message_id: u32) -> String;
}

/// A map-backed [`Translator`].
#[derive(Debug, Clone, Default)]
pub struct MessageTable {
    messages: HashMap<u32, String>,
}

impl MessageTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn message(mut self, id: u32, text: &str) -> Self {
        self.insert(id, text);
        self
    }

    pub fn insert(&mut self, id: u32, text: &str) {
        self.messages.insert(id, text.to_owned());
    }
}

impl Translator for MessageTable {
    fn translate(&self, message_id: u32) -> String {
        self.messages.get(&message_id).cloned().unwrap_or_default()
    }
}

/// Reverse DNS for IP-literal request hosts.
///
/// Called at most once per decision context. Implementations should bound the
/// time they block and return `None` on failure or timeout.
pub trait ReverseResolver: Send + Sync {
    fn reverse_lookup(&self, ip: IpAddr) -> Option<String>;
}

impl<F> ReverseResolver for F
where
    F: Fn(IpAddr) -> Option<String> + Send + Sync,
{
    fn reverse_lookup(&self, ip: IpAddr) -> Option<String> {
        self(ip)
    }
}

/// A resolver that never finds a name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReverseLookup;

impl ReverseResolver for NoReverseLookup {
    fn reverse_lookup(&self, _ip: IpAddr) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_table_translates_known_ids() {
        let table = MessageTable::new().message(500, "Banned site: ");
        assert_eq!(table.translate(500), "Banned site: ");
        assert_eq!(table.translate(1), "");
    }

    #[test]
    fn closures_are_resolvers() {
        let resolver = |ip: IpAddr| ip.is_loopback().then(|| "localhost".to_owned());
        assert_eq!(
            resolver.reverse_lookup("127.0.0.1".parse().unwrap()),
            Some("localhost".to_owned())
        );
        assert_eq!(NoReverseLookup.reverse_lookup("127.0.0.1".parse().unwrap()), None);
    }
}
