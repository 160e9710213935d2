pub mod error;
pub mod types;

pub use error::{RedditError, Result};
pub use types::{
    epoch_to_datetime, AccessToken, Listing, RedditComment, RedditPost, RedditUser, Thing,
};

use std::sync::Mutex;

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE_URL: &str = "https://oauth.reddit.com";

pub struct RedditClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    user_agent: String,
    token: Mutex<Option<String>>,
}

impl RedditClient {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            user_agent,
            token: Mutex::new(None),
        }
    }

    /// Obtain an application-only access token via the client-credentials
    /// grant and cache it for subsequent calls.
    pub async fn authenticate(&self) -> Result<AccessToken> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(RedditError::MissingCredentials);
        }

        let resp = self
            .client
            .post(AUTH_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RedditError::Auth(format!("status {status}: {body}")));
        }

        let token: AccessToken = resp.json().await?;
        tracing::info!(expires_in = token.expires_in, "Reddit access token obtained");

        *self.token.lock().expect("token lock poisoned") = Some(token.access_token.clone());
        Ok(token)
    }

    fn bearer(&self) -> Result<String> {
        self.token
            .lock()
            .expect("token lock poisoned")
            .clone()
            .ok_or(RedditError::NotAuthenticated)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(self.bearer()?)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RedditError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Fetch one page of the newest posts in a subreddit.
    pub async fn subreddit_new(&self, subreddit: &str, limit: u32) -> Result<Vec<RedditPost>> {
        let url = format!("{API_BASE_URL}/r/{subreddit}/new?limit={limit}");
        let listing: Thing<Listing<RedditPost>> = self.get_json(&url).await?;
        let posts: Vec<RedditPost> = listing.data.children.into_iter().map(|t| t.data).collect();
        tracing::info!(subreddit, count = posts.len(), "Fetched subreddit posts");
        Ok(posts)
    }

    /// Fetch one page of the newest comments across a subreddit.
    pub async fn subreddit_comments(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<RedditComment>> {
        let url = format!("{API_BASE_URL}/r/{subreddit}/comments?limit={limit}");
        let listing: Thing<Listing<RedditComment>> = self.get_json(&url).await?;
        let comments: Vec<RedditComment> =
            listing.data.children.into_iter().map(|t| t.data).collect();
        tracing::info!(subreddit, count = comments.len(), "Fetched subreddit comments");
        Ok(comments)
    }

    /// Fetch a user's profile. Returns `None` for deleted/suspended accounts
    /// (the API answers 404).
    pub async fn user_about(&self, username: &str) -> Result<Option<RedditUser>> {
        let url = format!("{API_BASE_URL}/user/{username}/about");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.bearer()?)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 404 {
            tracing::debug!(username, "User not found");
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RedditError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let thing: Thing<RedditUser> = resp.json().await?;
        Ok(Some(thing.data))
    }
}
