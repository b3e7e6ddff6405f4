//! Application-only OAuth2 for Reddit (client-credentials grant).

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, TokenResponse, TokenUrl,
};
use persona_core::{ConfigError, CoreError, RedditApiError, Secret};
use tracing::{debug, error, info};

const REDDIT_AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";

pub struct RedditAuth {
    oauth_client: BasicClient,
    http_client: reqwest::Client,
}

impl RedditAuth {
    pub fn new(
        client_id: &str,
        client_secret: &Secret,
        token_url: &str,
        http_client: reqwest::Client,
    ) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTHORIZE_URL.to_string()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "reddit.authorize_url".to_string(),
                value: e.to_string(),
            }
        })?;
        let token_url =
            TokenUrl::new(token_url.to_string()).map_err(|e| ConfigError::InvalidValue {
                field: "reddit.token_url".to_string(),
                value: e.to_string(),
            })?;

        let oauth_client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.expose().to_string())),
            auth_url,
            Some(token_url),
        );

        Ok(Self {
            oauth_client,
            http_client,
        })
    }

    /// Exchange the app credentials for a bearer token.
    pub async fn request_token(&self) -> Result<String, CoreError> {
        debug!("Requesting Reddit application token");
        let http_client = self.http_client.clone();

        let token = self
            .oauth_client
            .exchange_client_credentials()
            .request_async(|request| send_token_request(http_client, request))
            .await
            .map_err(|e| {
                error!("Reddit token exchange failed: {}", e);
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                })
            })?;

        info!("Obtained Reddit application token");
        Ok(token.access_token().secret().clone())
    }
}

/// Sends the token request through our own client so the configured
/// `User-Agent` and timeout apply.
async fn send_token_request(
    client: reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
