use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Nothing to analyze: {reason}")]
    EmptyInput { reason: String },
}

impl CoreError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Profile not found: u/{username}")]
    ProfileNotFound { username: String },

    #[error("Access denied to u/{username}: {reason}")]
    AccessDenied { username: String, reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Resource not found: {endpoint}")]
    NotFound { endpoint: String },

    #[error("Forbidden access to resource: {endpoint}")]
    Forbidden { endpoint: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("Unsupported model: {model}")]
    InvalidModel { model: String },

    #[error("Provider authentication failed: {provider}")]
    AuthenticationFailed { provider: String },

    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        provider: String,
        retry_after: Option<u64>,
    },

    #[error("Provider service unavailable: {provider} ({details})")]
    ServiceUnavailable { provider: String, details: String },

    #[error("Request timeout for {provider}")]
    RequestTimeout { provider: String },

    #[error("Invalid response format from {provider}: {details}")]
    InvalidResponseFormat { provider: String, details: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration file unreadable: {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Coarse classification shared by every entry point when reporting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ProfileNotFound,
    AccessDenied,
    EmptyInput,
    InvalidModel,
    RateLimited,
    UpstreamUnavailable,
    InvalidInput,
    Configuration,
    Output,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ProfileNotFound => "ProfileNotFoundError",
            ErrorKind::AccessDenied => "AccessDeniedError",
            ErrorKind::EmptyInput => "EmptyInputError",
            ErrorKind::InvalidModel => "InvalidModelError",
            ErrorKind::RateLimited => "RateLimitedError",
            ErrorKind::UpstreamUnavailable => "UpstreamUnavailableError",
            ErrorKind::InvalidInput => "InvalidInputError",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Output => "OutputError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
