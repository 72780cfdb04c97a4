//! Error types for scope-extract
//!
//! Errors fall into two classes. Fatal errors (configuration, dependency
//! cycles, missing credentials) abort a run before any endpoint executes.
//! Everything else is caught at the endpoint boundary by the orchestrator and
//! recorded as a failed endpoint.

use thiserror::Error;

/// The main error type for scope-extract
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Dependency Resolution
    // ============================================================================
    #[error("Circular dependency detected among endpoints: {}", remaining.join(", "))]
    CycleDetected { remaining: Vec<String> },

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("No API token available: {message}")]
    AuthUnavailable { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transient HTTP {status} persisted after {attempts} attempts")]
    TransientHttp { status: u16, attempts: u32 },

    #[error("HTTP {status}: {body}")]
    NonTransientHttp { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Failed to publish {path}: {message}")]
    Publish { path: String, message: String },

    #[error("State error: {message}")]
    State { message: String },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    // ============================================================================
    // Endpoint Errors
    // ============================================================================
    #[error("Endpoint '{endpoint}' failed: {source}")]
    EndpointFailed {
        endpoint: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Endpoint '{endpoint}' exceeded the page ceiling of {max_pages}")]
    PageLimitExceeded { endpoint: String, max_pages: u32 },

    #[error("Run cancelled")]
    Cancelled,

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth_unavailable(message: impl Into<String>) -> Self {
        Self::AuthUnavailable {
            message: message.into(),
        }
    }

    /// Create a non-transient HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::NonTransientHttp {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a publish error
    pub fn publish(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Wrap an error as the failure of one endpoint
    pub fn endpoint_failed(endpoint: impl Into<String>, source: Error) -> Self {
        Self::EndpointFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// The underlying cause, looking through endpoint wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::EndpointFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error is worth retrying after a delay
    pub fn is_transient(&self) -> bool {
        match self {
            Error::TransientHttp { .. } | Error::Timeout { .. } => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Check if this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::YamlParse(_)
                | Error::CycleDetected { .. }
                | Error::AuthUnavailable { .. }
        )
    }
}

/// Check if an HTTP status code belongs to the transient class
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503)
}

/// Result type alias for scope-extract
pub type Result<T> = std::result::Result<T, Error>;
