use persona_core::{
    ConfigError, CoreError, ErrorExt, ErrorKind, ErrorReporter, LlmError, RedditApiError,
};
use std::time::Duration;

#[test]
fn test_error_kinds() {
    let cases = vec![
        (
            CoreError::RedditApi(RedditApiError::ProfileNotFound {
                username: "ghost".to_string(),
            }),
            ErrorKind::ProfileNotFound,
        ),
        (
            CoreError::RedditApi(RedditApiError::AccessDenied {
                username: "banned".to_string(),
                reason: "suspended".to_string(),
            }),
            ErrorKind::AccessDenied,
        ),
        (
            CoreError::RedditApi(RedditApiError::InvalidToken),
            ErrorKind::UpstreamUnavailable,
        ),
        (
            CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 }),
            ErrorKind::UpstreamUnavailable,
        ),
        (
            CoreError::Llm(LlmError::InvalidModel {
                model: "gpt-4".to_string(),
            }),
            ErrorKind::InvalidModel,
        ),
        (
            CoreError::Llm(LlmError::RateLimitExceeded {
                provider: "Groq".to_string(),
                retry_after: None,
            }),
            ErrorKind::RateLimited,
        ),
        (
            CoreError::EmptyInput {
                reason: "no items".to_string(),
            },
            ErrorKind::EmptyInput,
        ),
        (
            CoreError::Config(ConfigError::MissingEnvironmentVariable {
                var_name: "GROQ_API_KEY".to_string(),
            }),
            ErrorKind::Configuration,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error.kind(), expected, "wrong kind for {}", error);
    }
}

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_INVALID_TOKEN");

    let llm_error = CoreError::Llm(LlmError::AuthenticationFailed {
        provider: "Groq".to_string(),
    });
    assert_eq!(llm_error.error_code(), "LLM_AUTH_FAILED");

    let input_error = CoreError::invalid_input("depth must be positive");
    assert_eq!(input_error.error_code(), "INVALID_INPUT");
}

#[test]
fn test_retry_after() {
    let rate_limit_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(60))
    );

    let llm_rate_limit = CoreError::Llm(LlmError::RateLimitExceeded {
        provider: "Groq".to_string(),
        retry_after: Some(12),
    });
    assert_eq!(llm_rate_limit.retry_after(), Some(Duration::from_secs(12)));

    let not_found = CoreError::RedditApi(RedditApiError::ProfileNotFound {
        username: "ghost".to_string(),
    });
    assert_eq!(not_found.retry_after(), None);
}

#[test]
fn test_user_friendly_messages() {
    let not_found = CoreError::RedditApi(RedditApiError::ProfileNotFound {
        username: "ghost".to_string(),
    });
    assert!(not_found.user_friendly_message().contains("'ghost' was not found"));

    let bad_model = CoreError::Llm(LlmError::InvalidModel {
        model: "gpt-4".to_string(),
    });
    let message = bad_model.user_friendly_message();
    assert!(message.contains("gpt-4"));
    assert!(message.contains("llama3-8b-8192"));

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "REDDIT_CLIENT_ID".to_string(),
    });
    assert!(config_error
        .user_friendly_message()
        .contains("REDDIT_CLIENT_ID"));

    for error in [not_found, bad_model, config_error] {
        assert!(!error.user_friendly_message().contains('\n'));
    }
}

#[test]
fn test_error_reporter_line() {
    let reporter = ErrorReporter::new().with_error_reporting(false);
    let error = CoreError::RedditApi(RedditApiError::AccessDenied {
        username: "banned".to_string(),
        reason: "suspended".to_string(),
    });

    let line = reporter.report_error(&error);
    assert!(line.starts_with("AccessDeniedError: "));
    assert!(line.contains("u/banned"));
}
