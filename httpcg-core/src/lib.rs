//! httpcg core library
//!
//! Builds `reqwest`-backed HTTP clients with tuned transport behavior:
//! connection and TLS handshake timeouts, idle pool limits, optional HTTP/2
//! negotiation and an optional in-memory cookie jar.
//!
//! ```
//! use std::time::Duration;
//! use httpcg_core::ClientBuilder;
//!
//! let client = ClientBuilder::new()
//!     .with_connection_timeout(Duration::from_secs(2))
//!     .with_max_idle_connections(50, 5)
//!     .with_cookies()
//!     .build()
//!     .unwrap();
//!
//! assert!(client.has_cookie_jar());
//! assert_eq!(client.transport().max_idle_connections_per_host, 5);
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod cookie;
pub mod error;
pub mod http2;
pub mod logging;
pub mod proxy;
pub mod transport;

pub use builder::ClientBuilder;
pub use client::Client;
pub use config::ClientSettings;
pub use error::{HttpcgError, HttpcgResult};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
