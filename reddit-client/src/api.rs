use chrono::{DateTime, Utc};
use persona_core::{ContentItem, CoreError, ItemKind, RedditApiError, RedditConfig};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const REDDIT_WEB_BASE: &str = "https://reddit.com";
const DELETED_MARKERS: [&str; 2] = ["[deleted]", "[removed]"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub link_title: Option<String>,
}

/// `/user/{name}/about` payload. Suspended accounts come back with little
/// more than `name` and `is_suspended`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditUserData {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_suspended: bool,
    #[serde(default)]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub link_karma: Option<i64>,
    #[serde(default)]
    pub comment_karma: Option<i64>,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    api_base: String,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(config: &RedditConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let error = match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            StatusCode::UNAUTHORIZED => RedditApiError::InvalidToken,
            StatusCode::FORBIDDEN => RedditApiError::Forbidden {
                endpoint: endpoint.to_string(),
            },
            StatusCode::NOT_FOUND => RedditApiError::NotFound {
                endpoint: endpoint.to_string(),
            },
            s if s.is_server_error() => RedditApiError::ServerError {
                status_code: s.as_u16(),
            },
            s => RedditApiError::InvalidResponse {
                details: format!("unexpected status {}", s),
            },
        };
        Err(CoreError::RedditApi(error))
    }

    pub async fn get_user_about(
        &self,
        access_token: &str,
        username: &str,
    ) -> Result<RedditUserData, CoreError> {
        let endpoint = format!("/user/{}/about", username);

        let response = self
            .make_request(Method::GET, &endpoint, access_token, None)
            .await
            .map_err(|e| for_profile(e, username))?;

        let about: RedditListingChild<RedditUserData> = response.json().await.map_err(|e| {
            error!("Failed to parse user data: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse profile of u/{}", username),
            })
        })?;

        debug!("Retrieved profile for u/{}", about.data.name);
        Ok(about.data)
    }

    pub async fn get_user_submissions(
        &self,
        access_token: &str,
        username: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/user/{}/submitted", username);
        self.get_user_listing(access_token, username, &endpoint, limit, after)
            .await
    }

    pub async fn get_user_comments(
        &self,
        access_token: &str,
        username: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditCommentData>, CoreError> {
        let endpoint = format!("/user/{}/comments", username);
        self.get_user_listing(access_token, username, &endpoint, limit, after)
            .await
    }

    async fn get_user_listing<T>(
        &self,
        access_token: &str,
        username: &str,
        endpoint: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<T>, CoreError>
    where
        T: serde::de::DeserializeOwned,
    {
        let limit_str = limit.to_string();
        let mut params = vec![
            ("sort", "new"),
            ("limit", limit_str.as_str()),
            ("raw_json", "1"),
        ];
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let response = self
            .make_request(Method::GET, endpoint, access_token, Some(params.as_slice()))
            .await
            .map_err(|e| for_profile(e, username))?;

        let listing: RedditListing<T> = response.json().await.map_err(|e| {
            error!("Failed to parse listing {}: {}", endpoint, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse {}", endpoint),
            })
        })?;

        info!(
            "Retrieved {} entries from {}",
            listing.data.children.len(),
            endpoint
        );
        Ok(listing)
    }
}

/// Resource-level failures on a `/user/{name}/...` endpoint describe the profile.
fn for_profile(error: CoreError, username: &str) -> CoreError {
    match error {
        CoreError::RedditApi(RedditApiError::NotFound { .. }) => {
            CoreError::RedditApi(RedditApiError::ProfileNotFound {
                username: username.to_string(),
            })
        }
        CoreError::RedditApi(RedditApiError::Forbidden { .. }) => {
            CoreError::RedditApi(RedditApiError::AccessDenied {
                username: username.to_string(),
                reason: "profile is private or suspended".to_string(),
            })
        }
        other => other,
    }
}

fn usable_body(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.is_empty() || DELETED_MARKERS.contains(&text) {
        None
    } else {
        Some(text)
    }
}

fn absolute_permalink(permalink: &str) -> String {
    if permalink.starts_with('/') {
        format!("{}{}", REDDIT_WEB_BASE, permalink)
    } else {
        permalink.to_string()
    }
}

fn timestamp(created_utc: f64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(created_utc as i64, 0).unwrap_or_default()
}

impl RedditPostData {
    /// Normalize into a content item; `None` when the post has no usable text.
    pub fn into_content_item(self) -> Option<ContentItem> {
        let title = usable_body(&self.title);
        let body = usable_body(&self.selftext);
        let text = match (title, body) {
            (Some(title), Some(body)) => format!("{}\n\n{}", title, body),
            (Some(title), None) => title.to_string(),
            (None, Some(body)) => body.to_string(),
            (None, None) => return None,
        };

        Some(ContentItem {
            kind: ItemKind::Post,
            id: self.id,
            text,
            subreddit: self.subreddit,
            timestamp: timestamp(self.created_utc),
            permalink: absolute_permalink(&self.permalink),
            score: self.score,
        })
    }
}

impl RedditCommentData {
    pub fn into_content_item(self) -> Option<ContentItem> {
        let text = usable_body(&self.body)?.to_string();

        Some(ContentItem {
            kind: ItemKind::Comment,
            id: self.id,
            text,
            subreddit: self.subreddit,
            timestamp: timestamp(self.created_utc),
            permalink: absolute_permalink(&self.permalink),
            score: self.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, selftext: &str) -> RedditPostData {
        RedditPostData {
            id: "test123".to_string(),
            title: title.to_string(),
            selftext: selftext.to_string(),
            author: "test_user".to_string(),
            subreddit: "test".to_string(),
            permalink: "/r/test/comments/test123/test_post/".to_string(),
            created_utc: 1640995200.0,
            score: 42,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = RedditApiClient::new(&RedditConfig {
            api_base: "https://oauth.reddit.com/".to_string(),
            ..RedditConfig::default()
        })
        .unwrap();
        assert_eq!(client.api_base, "https://oauth.reddit.com");
        assert!(client.user_agent.starts_with("persona-digest"));
    }

    #[test]
    fn test_post_conversion() {
        let item = post("Test Post", "This is test content")
            .into_content_item()
            .unwrap();
        assert_eq!(item.kind, ItemKind::Post);
        assert_eq!(item.id, "test123");
        assert_eq!(item.text, "Test Post\n\nThis is test content");
        assert_eq!(
            item.permalink,
            "https://reddit.com/r/test/comments/test123/test_post/"
        );
        assert_eq!(item.timestamp.timestamp(), 1640995200);
        assert_eq!(item.score, 42);
    }

    #[test]
    fn test_removed_post_body_keeps_title() {
        let item = post("Link post", "[removed]").into_content_item().unwrap();
        assert_eq!(item.text, "Link post");

        assert!(post("  ", "[deleted]").into_content_item().is_none());
    }

    #[test]
    fn test_comment_conversion() {
        let comment = |body: &str| RedditCommentData {
            id: "c1".to_string(),
            body: body.to_string(),
            author: "test_user".to_string(),
            subreddit: "rust".to_string(),
            permalink: "/r/rust/comments/abc/x/c1/".to_string(),
            created_utc: 1700000000.0,
            score: 3,
            link_title: None,
        };

        let item = comment("  borrowck is my friend ").into_content_item().unwrap();
        assert_eq!(item.kind, ItemKind::Comment);
        assert_eq!(item.text, "borrowck is my friend");

        assert!(comment("").into_content_item().is_none());
        assert!(comment("[deleted]").into_content_item().is_none());
        assert!(comment("[removed]").into_content_item().is_none());
    }

    #[test]
    fn test_profile_error_mapping() {
        let mapped = for_profile(
            CoreError::RedditApi(RedditApiError::NotFound {
                endpoint: "/user/ghost/about".to_string(),
            }),
            "ghost",
        );
        assert!(matches!(
            mapped,
            CoreError::RedditApi(RedditApiError::ProfileNotFound { ref username }) if username == "ghost"
        ));

        let mapped = for_profile(
            CoreError::RedditApi(RedditApiError::Forbidden {
                endpoint: "/user/banned/about".to_string(),
            }),
            "banned",
        );
        assert!(matches!(
            mapped,
            CoreError::RedditApi(RedditApiError::AccessDenied { .. })
        ));

        let untouched = for_profile(CoreError::RedditApi(RedditApiError::InvalidToken), "x");
        assert!(matches!(
            untouched,
            CoreError::RedditApi(RedditApiError::InvalidToken)
        ));
    }
}
