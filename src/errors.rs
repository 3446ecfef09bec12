use std::fmt;
use std::fmt::Formatter;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::SetLoggerError;
use log4rs::config::runtime::ConfigErrors;
use serde::Serialize;
use crate::manager_ai::errors::AIError;
use crate::manager_weather::errors::{ErrorKind, WeatherError};

/// Error representing an unrecoverable error that will halt the application
///
#[derive(Debug)]
pub struct UnrecoverableError(pub String);
impl fmt::Display for UnrecoverableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "UnrecoverableError: {}", self.0)
    }
}
impl From<std::io::Error> for UnrecoverableError {
    fn from(e: std::io::Error) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<ConfigError> for UnrecoverableError {
    fn from(e: ConfigError) -> Self {
        UnrecoverableError(e.to_string())
    }
}
impl From<WeatherError> for UnrecoverableError {
    fn from(e: WeatherError) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<AIError> for UnrecoverableError {
    fn from(e: AIError) -> Self { UnrecoverableError(e.to_string()) }
}

/// Errors while managing configuration
///
#[derive(Debug)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<SetLoggerError> for ConfigError {
    fn from(e: SetLoggerError) -> Self {
        ConfigError(e.to_string())
    }
}
impl From<ConfigErrors> for ConfigError {
    fn from(e: ConfigErrors) -> Self {
        ConfigError(e.to_string())
    }
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError(e.to_string())
    }
}

/// Errors returned to HTTP callers, rendered as `{"error": true, "message": ...}`
///
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    UpstreamUnavailable(String),
    InvalidUpstreamResponse(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: bool,
    message: &'a str,
}

impl ApiError {
    fn message(&self) -> &str {
        match self {
            ApiError::Validation(m) => m,
            ApiError::NotFound(m) => m,
            ApiError::UpstreamUnavailable(m) => m,
            ApiError::InvalidUpstreamResponse(m) => m,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(e) => write!(f, "ApiError::Validation: {}", e),
            ApiError::NotFound(e) => write!(f, "ApiError::NotFound: {}", e),
            ApiError::UpstreamUnavailable(e) => write!(f, "ApiError::UpstreamUnavailable: {}", e),
            ApiError::InvalidUpstreamResponse(e) => write!(f, "ApiError::InvalidUpstreamResponse: {}", e),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidUpstreamResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody { error: true, message: self.message() })
    }
}

impl From<WeatherError> for ApiError {
    fn from(e: WeatherError) -> Self {
        match e.kind() {
            ErrorKind::Validation => ApiError::Validation(e.message().to_string()),
            ErrorKind::NotFound => ApiError::NotFound("City not found".to_string()),
            ErrorKind::UpstreamUnavailable => {
                ApiError::UpstreamUnavailable("Weather service temporarily unavailable".to_string())
            }
            ErrorKind::InvalidUpstreamResponse => {
                ApiError::InvalidUpstreamResponse("Invalid response from weather service".to_string())
            }
        }
    }
}
