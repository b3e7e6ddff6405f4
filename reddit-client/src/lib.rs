pub mod api;
pub mod auth;
pub mod fetcher;
pub mod profile;


pub use api::{
    RedditApiClient, RedditCommentData, RedditListing, RedditListingChild, RedditListingData,
    RedditPostData, RedditUserData,
};
pub use auth::RedditAuth;
pub use fetcher::{fetch_content, sort_most_recent_first, ContentSource, PAGE_SIZE};
pub use profile::parse_profile_identifier;

use persona_core::{AppConfig, CoreError, RedditConfig, Secret};
use tokio::sync::OnceCell;
use tracing::info;

/// Authenticated Reddit client. The application token is requested on the
/// first call and reused for the lifetime of the client.
pub struct RedditClient {
    api: RedditApiClient,
    auth: RedditAuth,
    access_token: OnceCell<String>,
}

impl RedditClient {
    pub fn new(
        config: &RedditConfig,
        client_id: &str,
        client_secret: &Secret,
    ) -> Result<Self, CoreError> {
        let api = RedditApiClient::new(config)?;
        let auth = RedditAuth::new(
            client_id,
            client_secret,
            &config.token_url,
            api.http_client().clone(),
        )?;

        Ok(Self {
            api,
            auth,
            access_token: OnceCell::new(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let (client_id, client_secret) = config.reddit_credentials()?;
        Self::new(&config.reddit, client_id, client_secret)
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.initialized()
    }

    pub async fn authenticate(&self) -> Result<&str, CoreError> {
        let token = self
            .access_token
            .get_or_try_init(|| async {
                let token = self.auth.request_token().await?;
                info!("Reddit client authenticated");
                Ok::<_, CoreError>(token)
            })
            .await?;
        Ok(token.as_str())
    }
}

impl ContentSource for RedditClient {
    async fn user_about(&self, username: &str) -> Result<RedditUserData, CoreError> {
        let token = self.authenticate().await?;
        self.api.get_user_about(token, username).await
    }

    async fn submissions(
        &self,
        username: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let token = self.authenticate().await?;
        self.api
            .get_user_submissions(token, username, limit, after)
            .await
    }

    async fn comments(
        &self,
        username: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditCommentData>, CoreError> {
        let token = self.authenticate().await?;
        self.api
            .get_user_comments(token, username, limit, after)
            .await
    }
}
