// HTTP/2 support for a transport

use tracing::debug;

use crate::error::{HttpcgError, HttpcgResult};
use crate::transport::{TransportConfig, ALPN_H2, ALPN_HTTP1};

/// Enables HTTP/2 on a transport before the client is built.
pub trait Http2Upgrader: Send + Sync {
    fn upgrade(&self, transport: &mut TransportConfig) -> HttpcgResult<()>;
}

impl<F> Http2Upgrader for F
where
    F: Fn(&mut TransportConfig) -> HttpcgResult<()> + Send + Sync,
{
    fn upgrade(&self, transport: &mut TransportConfig) -> HttpcgResult<()> {
        self(transport)
    }
}

/// Registers `h2` for ALPN negotiation, keeping `http/1.1` as fallback.
///
/// Fails if `h2` is already registered on the transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlpnHttp2Upgrader;

impl Http2Upgrader for AlpnHttp2Upgrader {
    fn upgrade(&self, transport: &mut TransportConfig) -> HttpcgResult<()> {
        if transport.http2_negotiated() {
            return Err(HttpcgError::http2(format!(
                "protocol {} already registered",
                ALPN_H2
            )));
        }

        transport.alpn_protocols.insert(0, ALPN_H2.to_string());
        if !transport.alpn_protocols.iter().any(|p| p == ALPN_HTTP1) {
            transport.alpn_protocols.push(ALPN_HTTP1.to_string());
        }

        debug!(alpn = ?transport.alpn_protocols, "Registered HTTP/2 for negotiation");
        Ok(())
    }
}
