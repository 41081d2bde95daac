// HTTP client builder
// Fluent accumulator of transport settings, materialized by `build`

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, debug_span, warn};

use crate::client::Client;
use crate::cookie::{CookieJarFactory, InMemoryCookieJarFactory};
use crate::error::HttpcgResult;
use crate::http2::{AlpnHttp2Upgrader, Http2Upgrader};
use crate::proxy::{EnvProxyResolver, ProxyResolver};
use crate::transport::{DialerConfig, TransportConfig};

pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_EXPECT_CONTINUE_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 100;
pub const DEFAULT_MAX_HOST_IDLE_CONNECTIONS: usize = 10;
pub const DEFAULT_RESPONSE_HEADER_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for a [`Client`] with tuned transport behavior.
///
/// Setters consume the builder and return the updated value, so a builder
/// that has been adjusted can no longer be observed in its old state. Clone
/// it first to fork a common base:
///
/// ```
/// use std::time::Duration;
/// use httpcg_core::ClientBuilder;
///
/// let base = ClientBuilder::new().with_max_idle_connections(50, 5);
/// let fast = base.clone().with_connection_timeout(Duration::from_secs(1));
///
/// assert_eq!(base.connection_timeout(), Duration::from_secs(5));
/// assert_eq!(fast.connection_timeout(), Duration::from_secs(1));
/// ```
///
/// Inputs are not validated. In particular a per-host idle cap larger than
/// the total idle cap is accepted as given; see
/// [`TransportConfig::check_pool_limits`] for an opt-in check.
#[derive(Clone)]
pub struct ClientBuilder {
    connection_timeout: Duration,
    keep_alive: Duration,
    expect_continue_timeout: Duration,
    idle_conn_timeout: Duration,
    max_idle_connections: usize,
    max_host_idle_connections: usize,
    response_header_timeout: Duration,
    tls_handshake_timeout: Duration,
    proxy_resolver: Arc<dyn ProxyResolver>,
    http2_upgrader: Arc<dyn Http2Upgrader>,
    cookie_jar_factory: Arc<dyn CookieJarFactory>,
    http2_enabled: bool,
    cookies_enabled: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            keep_alive: DEFAULT_KEEP_ALIVE,
            expect_continue_timeout: DEFAULT_EXPECT_CONTINUE_TIMEOUT,
            idle_conn_timeout: DEFAULT_IDLE_CONN_TIMEOUT,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
            max_host_idle_connections: DEFAULT_MAX_HOST_IDLE_CONNECTIONS,
            response_header_timeout: DEFAULT_RESPONSE_HEADER_TIMEOUT,
            tls_handshake_timeout: DEFAULT_TLS_HANDSHAKE_TIMEOUT,
            proxy_resolver: Arc::new(EnvProxyResolver::from_env()),
            http2_upgrader: Arc::new(AlpnHttp2Upgrader),
            cookie_jar_factory: Arc::new(InMemoryCookieJarFactory),
            http2_enabled: false,
            cookies_enabled: false,
        }
    }
}

impl ClientBuilder {
    /// Create a builder populated with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many idle connections are kept in total and per host.
    ///
    /// `total` should be at least `per_host`.
    pub fn with_max_idle_connections(mut self, total: usize, per_host: usize) -> Self {
        self.max_idle_connections = total;
        self.max_host_idle_connections = per_host;
        self
    }

    /// Set the max time to wait for the TCP connection to be established
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the max time to wait for the TLS handshake to complete
    pub fn with_tls_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.tls_handshake_timeout = timeout;
        self
    }

    /// Set how long to wait for `100 Continue` before sending the body
    pub fn with_expect_continue_timeout(mut self, timeout: Duration) -> Self {
        self.expect_continue_timeout = timeout;
        self
    }

    /// Set the TCP keep-alive probe interval
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    /// Set how long an idle pooled connection is kept
    pub fn with_idle_conn_timeout(mut self, timeout: Duration) -> Self {
        self.idle_conn_timeout = timeout;
        self
    }

    /// Set the max wait for response headers once the request is written
    pub fn with_response_header_timeout(mut self, timeout: Duration) -> Self {
        self.response_header_timeout = timeout;
        self
    }

    /// Negotiate HTTP/2 when the server supports it
    pub fn with_http2(mut self) -> Self {
        self.http2_enabled = true;
        self
    }

    /// Attach an in-memory cookie jar to the built client
    pub fn with_cookies(mut self) -> Self {
        self.cookies_enabled = true;
        self
    }

    /// Replace the environment-derived proxy resolver
    pub fn with_proxy_resolver(mut self, resolver: impl ProxyResolver + 'static) -> Self {
        self.proxy_resolver = Arc::new(resolver);
        self
    }

    /// Replace the step that enables HTTP/2 on the transport
    pub fn with_http2_upgrader(mut self, upgrader: impl Http2Upgrader + 'static) -> Self {
        self.http2_upgrader = Arc::new(upgrader);
        self
    }

    /// Replace the constructor of the cookie store
    pub fn with_cookie_jar_factory(mut self, factory: impl CookieJarFactory + 'static) -> Self {
        self.cookie_jar_factory = Arc::new(factory);
        self
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    pub fn expect_continue_timeout(&self) -> Duration {
        self.expect_continue_timeout
    }

    pub fn idle_conn_timeout(&self) -> Duration {
        self.idle_conn_timeout
    }

    pub fn max_idle_connections(&self) -> usize {
        self.max_idle_connections
    }

    pub fn max_host_idle_connections(&self) -> usize {
        self.max_host_idle_connections
    }

    pub fn response_header_timeout(&self) -> Duration {
        self.response_header_timeout
    }

    pub fn tls_handshake_timeout(&self) -> Duration {
        self.tls_handshake_timeout
    }

    pub fn proxy_resolver(&self) -> &Arc<dyn ProxyResolver> {
        &self.proxy_resolver
    }

    pub fn http2_enabled(&self) -> bool {
        self.http2_enabled
    }

    pub fn cookies_enabled(&self) -> bool {
        self.cookies_enabled
    }

    /// The transport a `build` would start from, before HTTP/2 is applied
    pub fn transport_config(&self) -> TransportConfig {
        let dialer = DialerConfig {
            timeout: self.connection_timeout,
            keep_alive: self.keep_alive,
        };

        let mut transport = TransportConfig::new(dialer, Arc::clone(&self.proxy_resolver));
        transport.response_header_timeout = self.response_header_timeout;
        transport.expect_continue_timeout = self.expect_continue_timeout;
        transport.idle_conn_timeout = self.idle_conn_timeout;
        transport.tls_handshake_timeout = self.tls_handshake_timeout;
        transport.max_idle_connections = self.max_idle_connections;
        transport.max_idle_connections_per_host = self.max_host_idle_connections;
        transport.force_attempt_http2 = self.http2_enabled;
        transport
    }

    /// Build the client.
    ///
    /// Fails if enabling HTTP/2 on the transport fails or if the cookie store
    /// cannot be created. No network I/O happens here; every call produces a
    /// client with its own connection pool.
    pub fn build(&self) -> HttpcgResult<Client> {
        let span = debug_span!(
            "build_client",
            http2 = self.http2_enabled,
            cookies = self.cookies_enabled
        );
        let _guard = span.enter();

        let mut transport = self.transport_config();
        if let Err(err) = transport.check_pool_limits() {
            warn!("{}", err);
        }

        if self.http2_enabled {
            self.http2_upgrader.upgrade(&mut transport)?;
        }

        let cookie_jar = if self.cookies_enabled {
            Some(self.cookie_jar_factory.create()?)
        } else {
            None
        };

        let client = Client::from_parts(transport, cookie_jar)?;
        debug!("HTTP client built");
        Ok(client)
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("connection_timeout", &self.connection_timeout)
            .field("keep_alive", &self.keep_alive)
            .field("expect_continue_timeout", &self.expect_continue_timeout)
            .field("idle_conn_timeout", &self.idle_conn_timeout)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("max_host_idle_connections", &self.max_host_idle_connections)
            .field("response_header_timeout", &self.response_header_timeout)
            .field("tls_handshake_timeout", &self.tls_handshake_timeout)
            .field("http2_enabled", &self.http2_enabled)
            .field("cookies_enabled", &self.cookies_enabled)
            .finish_non_exhaustive()
    }
}
