// Built HTTP client
// Owns its transport description, optional cookie jar and reqwest client

use std::sync::Arc;

use reqwest::{IntoUrl, Method, RequestBuilder};

use crate::cookie::Jar;
use crate::error::{HttpcgError, HttpcgResult};
use crate::transport::TransportConfig;

/// Client produced by [`crate::ClientBuilder::build`].
///
/// Cloning is cheap and shares the connection pool; separate `build` calls
/// never share one. Dropping the last clone closes pooled connections.
#[derive(Debug, Clone)]
pub struct Client {
    inner: reqwest::Client,
    transport: TransportConfig,
    cookie_jar: Option<Arc<Jar>>,
}

impl Client {
    pub(crate) fn from_parts(
        transport: TransportConfig,
        cookie_jar: Option<Arc<Jar>>,
    ) -> HttpcgResult<Self> {
        let mut builder = transport.apply(reqwest::Client::builder());
        if let Some(jar) = &cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        let inner = builder
            .build()
            .map_err(|e| HttpcgError::transport("Failed to build HTTP client", e))?;

        Ok(Self {
            inner,
            transport,
            cookie_jar,
        })
    }

    /// Transport settings the client was built with
    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    /// Cookie jar, present when the builder had cookies enabled
    pub fn cookie_jar(&self) -> Option<&Arc<Jar>> {
        self.cookie_jar.as_ref()
    }

    pub fn has_cookie_jar(&self) -> bool {
        self.cookie_jar.is_some()
    }

    pub fn http2_enabled(&self) -> bool {
        self.transport.http2_negotiated()
    }

    /// The underlying reqwest client
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    pub fn into_inner(self) -> reqwest::Client {
        self.inner
    }

    /// Start a request with the given method
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.inner.request(method, url)
    }

    /// Start a GET request
    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.inner.get(url)
    }

    /// Start a POST request
    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.inner.post(url)
    }
}

impl From<Client> for reqwest::Client {
    fn from(client: Client) -> Self {
        client.into_inner()
    }
}
