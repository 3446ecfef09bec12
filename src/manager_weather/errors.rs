use std::fmt;

/// Coarse classification used when errors cross the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    UpstreamUnavailable,
    InvalidUpstreamResponse,
}

#[derive(Debug)]
pub enum WeatherError {
    Validation(String),
    NotFound(String),
    RateLimited(String),
    Network(String),
    Upstream { status: u16, message: String },
    Document(String),
}

impl WeatherError {
    /// Maps a non-success upstream status code to an error
    ///
    /// # Arguments
    ///
    /// * 'status' - http status code returned by the provider
    /// * 'message' - provider message, if any
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => WeatherError::Validation(message),
            404 => WeatherError::NotFound(message),
            429 => WeatherError::RateLimited(message),
            _ => WeatherError::Upstream { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::Validation(_) => ErrorKind::Validation,
            WeatherError::NotFound(_) => ErrorKind::NotFound,
            WeatherError::RateLimited(_) | WeatherError::Network(_) | WeatherError::Upstream { .. } => {
                ErrorKind::UpstreamUnavailable
            }
            WeatherError::Document(_) => ErrorKind::InvalidUpstreamResponse,
        }
    }

    /// True for failures worth one more attempt: timeouts, connection problems, 408, 429 and 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            WeatherError::RateLimited(_) | WeatherError::Network(_) => true,
            WeatherError::Upstream { status, .. } => *status >= 500 || *status == 408,
            _ => false,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            WeatherError::Validation(m)
            | WeatherError::NotFound(m)
            | WeatherError::RateLimited(m)
            | WeatherError::Network(m)
            | WeatherError::Document(m) => m,
            WeatherError::Upstream { message, .. } => message,
        }
    }
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WeatherError::Validation(e) => write!(f, "WeatherError::Validation: {}", e),
            WeatherError::NotFound(e) => write!(f, "WeatherError::NotFound: {}", e),
            WeatherError::RateLimited(e) => write!(f, "WeatherError::RateLimited: {}", e),
            WeatherError::Network(e) => write!(f, "WeatherError::Network: {}", e),
            WeatherError::Upstream { status, message } => {
                write!(f, "WeatherError::Upstream: status {}: {}", status, message)
            }
            WeatherError::Document(e) => write!(f, "WeatherError::Document: {}", e),
        }
    }
}

// The request url carries the api key, so it is stripped before the error is kept
impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            WeatherError::Document(e.without_url().to_string())
        } else {
            WeatherError::Network(e.without_url().to_string())
        }
    }
}
impl From<serde_json::Error> for WeatherError {
    fn from(e: serde_json::Error) -> Self {
        WeatherError::Document(e.to_string())
    }
}
