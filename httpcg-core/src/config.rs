// Serializable client settings
// Lets a builder be seeded from a config file instead of code

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::builder::{self, ClientBuilder};
use crate::error::HttpcgResult;

/// Plain-data form of the builder options. Durations are in milliseconds.
///
/// ```
/// use httpcg_core::ClientSettings;
///
/// let settings = ClientSettings::from_json_str(r#"{ "http2": true }"#).unwrap();
/// let builder = settings.into_builder();
/// assert!(builder.http2_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
    pub connection_timeout_ms: u64,
    pub keep_alive_ms: u64,
    pub expect_continue_timeout_ms: u64,
    pub idle_conn_timeout_ms: u64,
    pub response_header_timeout_ms: u64,
    pub tls_handshake_timeout_ms: u64,
    pub max_idle_connections: usize,
    pub max_host_idle_connections: usize,
    pub http2: bool,
    pub cookies: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connection_timeout_ms: millis(builder::DEFAULT_CONNECTION_TIMEOUT),
            keep_alive_ms: millis(builder::DEFAULT_KEEP_ALIVE),
            expect_continue_timeout_ms: millis(builder::DEFAULT_EXPECT_CONTINUE_TIMEOUT),
            idle_conn_timeout_ms: millis(builder::DEFAULT_IDLE_CONN_TIMEOUT),
            response_header_timeout_ms: millis(builder::DEFAULT_RESPONSE_HEADER_TIMEOUT),
            tls_handshake_timeout_ms: millis(builder::DEFAULT_TLS_HANDSHAKE_TIMEOUT),
            max_idle_connections: builder::DEFAULT_MAX_IDLE_CONNECTIONS,
            max_host_idle_connections: builder::DEFAULT_MAX_HOST_IDLE_CONNECTIONS,
            http2: false,
            cookies: false,
        }
    }
}

impl ClientSettings {
    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> HttpcgResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> HttpcgResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Apply the settings on top of a fresh builder
    pub fn into_builder(self) -> ClientBuilder {
        self.apply(ClientBuilder::new())
    }

    /// Apply the settings on top of `builder`, keeping its collaborators
    pub fn apply(&self, builder: ClientBuilder) -> ClientBuilder {
        let mut builder = builder
            .with_connection_timeout(Duration::from_millis(self.connection_timeout_ms))
            .with_keep_alive(Duration::from_millis(self.keep_alive_ms))
            .with_expect_continue_timeout(Duration::from_millis(self.expect_continue_timeout_ms))
            .with_idle_conn_timeout(Duration::from_millis(self.idle_conn_timeout_ms))
            .with_response_header_timeout(Duration::from_millis(self.response_header_timeout_ms))
            .with_tls_handshake_timeout(Duration::from_millis(self.tls_handshake_timeout_ms))
            .with_max_idle_connections(self.max_idle_connections, self.max_host_idle_connections);

        if self.http2 {
            builder = builder.with_http2();
        }
        if self.cookies {
            builder = builder.with_cookies();
        }
        builder
    }
}

impl From<&ClientBuilder> for ClientSettings {
    fn from(b: &ClientBuilder) -> Self {
        Self {
            connection_timeout_ms: millis(b.connection_timeout()),
            keep_alive_ms: millis(b.keep_alive()),
            expect_continue_timeout_ms: millis(b.expect_continue_timeout()),
            idle_conn_timeout_ms: millis(b.idle_conn_timeout()),
            response_header_timeout_ms: millis(b.response_header_timeout()),
            tls_handshake_timeout_ms: millis(b.tls_handshake_timeout()),
            max_idle_connections: b.max_idle_connections(),
            max_host_idle_connections: b.max_host_idle_connections(),
            http2: b.http2_enabled(),
            cookies: b.cookies_enabled(),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
