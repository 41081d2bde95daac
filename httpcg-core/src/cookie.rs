// Cookie storage for built clients

use std::sync::Arc;

pub use reqwest::cookie::Jar;

use crate::error::HttpcgResult;

/// Creates the cookie store attached to a client built with cookies enabled.
pub trait CookieJarFactory: Send + Sync {
    fn create(&self) -> HttpcgResult<Arc<Jar>>;
}

impl<F> CookieJarFactory for F
where
    F: Fn() -> HttpcgResult<Arc<Jar>> + Send + Sync,
{
    fn create(&self) -> HttpcgResult<Arc<Jar>> {
        self()
    }
}

/// Fresh, empty, in-memory jar per client.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryCookieJarFactory;

impl CookieJarFactory for InMemoryCookieJarFactory {
    fn create(&self) -> HttpcgResult<Arc<Jar>> {
        Ok(Arc::new(Jar::default()))
    }
}
