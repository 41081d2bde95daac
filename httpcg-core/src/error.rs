// Error handling for client construction
// Every failure is terminal: a failed build yields no client

use thiserror::Error;

/// Type alias for httpcg results
pub type HttpcgResult<T> = Result<T, HttpcgError>;

#[derive(Debug, Error)]
pub enum HttpcgError {
    #[error("HTTP/2 configuration failed: {message}")]
    Http2Configuration {
        message: String,
    },

    #[error("Cookie store initialization failed: {message}")]
    CookieStoreInitialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid pool limits: per-host idle cap {per_host} exceeds total idle cap {total}")]
    InvalidPoolLimits {
        total: usize,
        per_host: usize,
    },
}

impl HttpcgError {
    /// Create an HTTP/2 configuration error
    pub fn http2(message: impl Into<String>) -> Self {
        Self::Http2Configuration {
            message: message.into(),
        }
    }

    /// Create a cookie store initialization error
    pub fn cookie_store(message: impl Into<String>) -> Self {
        Self::CookieStoreInitialization {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error wrapping the reqwest failure
    pub fn transport(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            HttpcgError::Http2Configuration { .. } => ErrorCategory::Http2,
            HttpcgError::CookieStoreInitialization { .. } => ErrorCategory::CookieStore,
            HttpcgError::Transport { .. } => ErrorCategory::Transport,
            HttpcgError::Config { .. } | HttpcgError::InvalidPoolLimits { .. } => {
                ErrorCategory::Config
            }
        }
    }

    pub fn context(&self) -> String {
        match self {
            HttpcgError::Http2Configuration { message }
            | HttpcgError::CookieStoreInitialization { message, .. }
            | HttpcgError::Transport { message, .. }
            | HttpcgError::Config { message, .. } => message.clone(),
            HttpcgError::InvalidPoolLimits { .. } => self.to_string(),
        }
    }
}

impl From<serde_json::Error> for HttpcgError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            message: format!("Failed to parse client settings: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Http2,
    CookieStore,
    Transport,
    Config,
}
