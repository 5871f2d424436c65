//! Reverse DNS through hickory-resolver, for IP-literal request hosts.

use std::net::IpAddr;
use std::time::Duration;

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::Resolver;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::types::{InterpreterConfig, ReverseResolver};

#[derive(Debug, thiserror::Error)]
pub enum DnsSetupError {
    #[error("cannot start dns runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("cannot read system dns config: {0}")]
    Config(#[from] hickory_resolver::ResolveError),
}

/// A [`ReverseResolver`] using the system name servers.
///
/// Owns a single-threaded tokio runtime and blocks the calling thread for
/// at most the configured timeout. Do not call it from inside another tokio
/// runtime.
pub struct HickoryReverseResolver {
    runtime: Runtime,
    resolver: Resolver<TokioConnectionProvider>,
    timeout: Duration,
}

impl HickoryReverseResolver {
    /// # Errors
    ///
    /// Returns [`DnsSetupError`] if the runtime cannot start or the system
    /// resolver configuration cannot be read.
    pub fn new(timeout: Duration) -> Result<Self, DnsSetupError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let resolver = {
            let _guard = runtime.enter();
            Resolver::builder_tokio()?.build()
        };
        Ok(Self {
            runtime,
            resolver,
            timeout,
        })
    }

    /// Query `servers` on port 53 instead of the system name servers.
    ///
    /// # Errors
    ///
    /// Returns [`DnsSetupError::Runtime`] if the runtime cannot start.
    pub fn with_name_servers(
        servers: &[IpAddr],
        timeout: Duration,
    ) -> Result<Self, DnsSetupError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(servers, 53, true),
        );
        let resolver = {
            let _guard = runtime.enter();
            let mut builder =
                Resolver::builder_with_config(config, TokioConnectionProvider::default());
            builder.options_mut().timeout = timeout;
            builder.options_mut().attempts = 1;
            builder.build()
        };
        Ok(Self {
            runtime,
            resolver,
            timeout,
        })
    }

    /// Build with the timeout from `config`.
    ///
    /// # Errors
    ///
    /// As for [`new`](Self::new).
    pub fn from_config(config: &InterpreterConfig) -> Result<Self, DnsSetupError> {
        Self::new(config.reverse_lookup_timeout())
    }
}

impl ReverseResolver for HickoryReverseResolver {
    fn reverse_lookup(&self, ip: IpAddr) -> Option<String> {
        let lookup = self.runtime.block_on(async {
            tokio::time::timeout(self.timeout, self.resolver.reverse_lookup(ip)).await
        });
        match lookup {
            Ok(Ok(names)) => names.iter().next().map(ToString::to_string),
            Ok(Err(e)) => {
                debug!(%ip, error = %e, "reverse lookup failed");
                None
            }
            Err(_) => {
                debug!(%ip, timeout = ?self.timeout, "reverse lookup timed out");
                None
            }
        }
    }
}

impl std::fmt::Debug for HickoryReverseResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryReverseResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    // TEST-NET-1, never answers.
    const SILENT: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(192, 0, 2, 1));

    #[test]
    fn unanswered_lookup_times_out_to_none() {
        let resolver =
            HickoryReverseResolver::with_name_servers(&[SILENT], Duration::from_millis(1)).unwrap();
        let started = Instant::now();
        assert_eq!(resolver.reverse_lookup("192.0.2.77".parse().unwrap()), None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn timeout_comes_from_config() {
        let config = InterpreterConfig {
            reverse_lookup_timeout_ms: 250,
            ..InterpreterConfig::default()
        };
        // The system resolver config may be absent in minimal environments.
        if let Ok(resolver) = HickoryReverseResolver::from_config(&config) {
            assert_eq!(resolver.timeout, Duration::from_millis(250));
        }
    }

    #[test]
    fn debug_hides_internals() {
        let resolver =
            HickoryReverseResolver::with_name_servers(&[SILENT], Duration::from_millis(5)).unwrap();
        assert!(format!("{resolver:?}").starts_with("HickoryReverseResolver { timeout: 5ms"));
    }
}
