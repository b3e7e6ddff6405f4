use crate::error::*;
use std::time::Duration;
use tracing::{error, info};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn kind(&self) -> ErrorKind;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Llm(e) => {
                error!("LLM error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn kind(&self) -> ErrorKind {
        match self {
            CoreError::RedditApi(e) => e.kind(),
            CoreError::Llm(e) => e.kind(),
            CoreError::Config(e) => e.kind(),
            CoreError::Io(_) | CoreError::Serialization(_) => ErrorKind::Output,
            CoreError::Network(_) => ErrorKind::UpstreamUnavailable,
            CoreError::InvalidInput { .. } => ErrorKind::InvalidInput,
            CoreError::EmptyInput { .. } => ErrorKind::EmptyInput,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RedditApi(e) => e.retry_after(),
            CoreError::Llm(e) => e.retry_after(),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Io(e) => format!("Could not write the report files: {}", e),
            CoreError::Serialization(_) => "Could not serialize the profile report.".to_string(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            CoreError::EmptyInput { .. } => {
                "No usable posts or comments were found for this profile.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.error_code(),
            CoreError::Llm(e) => e.error_code(),
            CoreError::Config(e) => e.error_code(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::EmptyInput { .. } => "EMPTY_INPUT".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn kind(&self) -> ErrorKind {
        match self {
            RedditApiError::ProfileNotFound { .. } => ErrorKind::ProfileNotFound,
            RedditApiError::AccessDenied { .. } | RedditApiError::Forbidden { .. } => {
                ErrorKind::AccessDenied
            }
            RedditApiError::RateLimitExceeded { .. } => ErrorKind::RateLimited,
            _ => ErrorKind::UpstreamUnavailable,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } | RedditApiError::InvalidToken => {
                "Reddit authentication failed. Please check your client id and secret.".to_string()
            }
            RedditApiError::ProfileNotFound { username } => {
                format!("Reddit user '{}' was not found.", username)
            }
            RedditApiError::AccessDenied { username, reason } => {
                format!("Profile u/{} is not accessible ({}).", username, reason)
            }
            RedditApiError::Forbidden { endpoint } => format!(
                "Access denied to {}. The profile may be private or suspended.",
                endpoint
            ),
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests to Reddit. Please wait {} seconds before trying again.",
                retry_after
            ),
            RedditApiError::RequestTimeout => {
                "Request to Reddit timed out. Please try again.".to_string()
            }
            _ => "Reddit API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::ProfileNotFound { .. } => "REDDIT_PROFILE_NOT_FOUND".to_string(),
            RedditApiError::AccessDenied { .. } => "REDDIT_ACCESS_DENIED".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::NotFound { .. } => "REDDIT_NOT_FOUND".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for LlmError {
    fn log_error(&self) -> &Self {
        error!("LlmError: {}", self);
        self
    }

    fn kind(&self) -> ErrorKind {
        match self {
            LlmError::InvalidModel { .. } => ErrorKind::InvalidModel,
            LlmError::RateLimitExceeded { .. } => ErrorKind::RateLimited,
            _ => ErrorKind::UpstreamUnavailable,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimitExceeded {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            LlmError::InvalidModel { model } => format!(
                "Model '{}' is not supported. Choose one of: {}.",
                model,
                crate::types::ModelName::supported_list()
            ),
            LlmError::AuthenticationFailed { provider } => format!(
                "Authentication failed for {}. Please check your API key.",
                provider
            ),
            LlmError::RateLimitExceeded {
                provider,
                retry_after: Some(secs),
            } => format!(
                "Rate limit reached for {}. Please wait {} seconds before retrying.",
                provider, secs
            ),
            LlmError::RateLimitExceeded { provider, .. } => format!(
                "Rate limit reached for {}. Please wait before retrying.",
                provider
            ),
            LlmError::ServiceUnavailable { provider, .. } => format!(
                "{} service is temporarily unavailable. Please try again later.",
                provider
            ),
            LlmError::RequestTimeout { provider } => {
                format!("Request to {} timed out. Please try again.", provider)
            }
            LlmError::InvalidResponseFormat { provider, .. } => {
                format!("{} returned a response that could not be read.", provider)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            LlmError::InvalidModel { .. } => "LLM_INVALID_MODEL".to_string(),
            LlmError::AuthenticationFailed { .. } => "LLM_AUTH_FAILED".to_string(),
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT".to_string(),
            LlmError::ServiceUnavailable { .. } => "LLM_SERVICE_UNAVAILABLE".to_string(),
            LlmError::RequestTimeout { .. } => "LLM_TIMEOUT".to_string(),
            LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::Unreadable { path, .. } => {
                format!("Configuration file '{}' could not be read.", path)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::Unreadable { .. } => "CONFIG_UNREADABLE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

/// Logs a failure and renders the one-line message shown by both entry points.
pub struct ErrorReporter {
    report_errors: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) -> String {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            if let Some(retry_after) = error.retry_after() {
                info!("Upstream asked to back off for {:?}", retry_after);
            }
        }
        format!("{}: {}", error.kind(), error.user_friendly_message())
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
