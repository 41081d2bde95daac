// Transport configuration
// The materialized description a reqwest client is built from

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Proxy;
use tracing::debug;
use url::Url;

use crate::error::{HttpcgError, HttpcgResult};
use crate::proxy::ProxyResolver;

/// ALPN identifier for HTTP/2 over TLS
pub const ALPN_H2: &str = "h2";
/// ALPN identifier for HTTP/1.1
pub const ALPN_HTTP1: &str = "http/1.1";
/// Keep-alive interval used when the configured one is zero
pub const DEFAULT_TCP_KEEP_ALIVE: Duration = Duration::from_secs(15);
/// Per-host idle cap used when the configured one is zero
pub const DEFAULT_MAX_IDLE_PER_HOST: usize = 2;

/// TCP dialer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialerConfig {
    /// Bound on TCP connection establishment
    pub timeout: Duration,
    /// Interval between TCP keep-alive probes
    pub keep_alive: Duration,
}

/// Transport-level settings assembled by [`crate::ClientBuilder::build`].
///
/// Some values have no equivalent knob in reqwest (`max_idle_connections`,
/// `expect_continue_timeout`). They are still recorded so callers can
/// inspect exactly what was configured.
#[derive(Clone)]
pub struct TransportConfig {
    pub dialer: DialerConfig,
    pub response_header_timeout: Duration,
    pub expect_continue_timeout: Duration,
    pub idle_conn_timeout: Duration,
    pub tls_handshake_timeout: Duration,
    /// Idle pooled connections across all hosts
    pub max_idle_connections: usize,
    /// Idle pooled connections per host
    pub max_idle_connections_per_host: usize,
    pub force_attempt_http2: bool,
    /// Protocols offered during the TLS handshake
    pub alpn_protocols: Vec<String>,
    proxy: Arc<dyn ProxyResolver>,
}

impl TransportConfig {
    pub(crate) fn new(dialer: DialerConfig, proxy: Arc<dyn ProxyResolver>) -> Self {
        Self {
            dialer,
            response_header_timeout: Duration::ZERO,
            expect_continue_timeout: Duration::ZERO,
            idle_conn_timeout: Duration::ZERO,
            tls_handshake_timeout: Duration::ZERO,
            max_idle_connections: 0,
            max_idle_connections_per_host: 0,
            force_attempt_http2: false,
            alpn_protocols: Vec::new(),
            proxy,
        }
    }

    /// The resolver requests are routed through
    pub fn proxy_resolver(&self) -> &Arc<dyn ProxyResolver> {
        &self.proxy
    }

    /// Proxy that a request to `url` would use
    pub fn proxy_for(&self, url: &Url) -> Option<Url> {
        self.proxy.resolve(url)
    }

    /// Whether HTTP/2 has been registered for ALPN negotiation
    pub fn http2_negotiated(&self) -> bool {
        self.alpn_protocols.iter().any(|p| p == ALPN_H2)
    }

    /// Check that the per-host idle cap does not exceed the global one.
    ///
    /// The builder never calls this as a hard gate; it is for callers that
    /// want the stricter behavior.
    pub fn check_pool_limits(&self) -> HttpcgResult<()> {
        if self.max_idle_connections_per_host > self.max_idle_connections {
            return Err(HttpcgError::InvalidPoolLimits {
                total: self.max_idle_connections,
                per_host: self.max_idle_connections_per_host,
            });
        }
        Ok(())
    }

    /// Timeout handed to reqwest, whose connect phase covers TCP and TLS.
    /// Zero means no timeout.
    pub fn effective_connect_timeout(&self) -> Option<Duration> {
        let total = self.dialer.timeout.saturating_add(self.tls_handshake_timeout);
        (!total.is_zero()).then_some(total)
    }

    /// Keep-alive probe interval; zero falls back to [`DEFAULT_TCP_KEEP_ALIVE`].
    pub fn effective_keep_alive(&self) -> Duration {
        if self.dialer.keep_alive.is_zero() {
            DEFAULT_TCP_KEEP_ALIVE
        } else {
            self.dialer.keep_alive
        }
    }

    /// Per-host idle cap; zero falls back to [`DEFAULT_MAX_IDLE_PER_HOST`].
    pub fn effective_max_idle_per_host(&self) -> usize {
        if self.max_idle_connections_per_host == 0 {
            DEFAULT_MAX_IDLE_PER_HOST
        } else {
            self.max_idle_connections_per_host
        }
    }

    /// Bound on waiting for the response, applied as reqwest's read timeout.
    /// It also bounds stalls between body reads. Zero means no timeout.
    pub fn effective_read_timeout(&self) -> Option<Duration> {
        (!self.response_header_timeout.is_zero()).then_some(self.response_header_timeout)
    }

    pub(crate) fn apply(&self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        let resolver = Arc::clone(&self.proxy);
        let idle_timeout = (!self.idle_conn_timeout.is_zero()).then_some(self.idle_conn_timeout);

        let mut builder = builder
            .tcp_keepalive(self.effective_keep_alive())
            .pool_idle_timeout(idle_timeout)
            .pool_max_idle_per_host(self.effective_max_idle_per_host())
            .proxy(Proxy::custom(move |url| resolver.resolve(url)));

        if let Some(timeout) = self.effective_connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }

        if let Some(timeout) = self.effective_read_timeout() {
            builder = builder.read_timeout(timeout);
        }

        if !self.http2_negotiated() {
            builder = builder.http1_only();
        }

        debug!(
            connect_timeout = ?self.effective_connect_timeout(),
            read_timeout = ?self.effective_read_timeout(),
            keep_alive = ?self.effective_keep_alive(),
            idle_timeout = ?idle_timeout,
            max_idle_per_host = self.effective_max_idle_per_host(),
            http2 = self.http2_negotiated(),
            "Applied transport configuration"
        );

        builder
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("dialer", &self.dialer)
            .field("response_header_timeout", &self.response_header_timeout)
            .field("expect_continue_timeout", &self.expect_continue_timeout)
            .field("idle_conn_timeout", &self.idle_conn_timeout)
            .field("tls_handshake_timeout", &self.tls_handshake_timeout)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("max_idle_connections_per_host", &self.max_idle_connections_per_host)
            .field("force_attempt_http2", &self.force_attempt_http2)
            .field("alpn_protocols", &self.alpn_protocols)
            .finish_non_exhaustive()
    }
}
