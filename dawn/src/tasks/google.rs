//! Google Tasks API client implementation
//!
//! Implements [`TaskService`] over the Tasks REST API (v1), authenticating
//! with an OAuth refresh token. The access token is fetched on first use and
//! kept for the life of the client.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{TaskQuery, TaskService, TasksError};
use crate::config::{GoogleConfig, GoogleSecrets};

/// Google Tasks API client
pub struct GoogleTasksClient {
    http: Client,
    api_base_url: String,
    token_url: String,
    secrets: GoogleSecrets,
    access_token: Mutex<Option<String>>,
}

impl GoogleTasksClient {
    /// Create a new client from configuration and resolved secrets
    pub fn from_config(config: &GoogleConfig, secrets: GoogleSecrets) -> Result<Self, TasksError> {
        debug!(api_base_url = %config.api_base_url, "from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("taskdawn/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TasksError::Network)?;

        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
            secrets,
            access_token: Mutex::new(None),
        })
    }

    /// Current access token, refreshing it if none is cached yet
    async fn access_token(&self) -> Result<String, TasksError> {
        let mut cached = self.access_token.lock().await;
        if let Some(token) = cached.as_ref() {
            debug!("access_token: using cached token");
            return Ok(token.clone());
        }

        debug!(token_url = %self.token_url, "access_token: refreshing");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("refresh_token", self.secrets.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let token: TokenResponse = check_status(response).await?.json().await?;
        if token.access_token.is_empty() {
            debug!("access_token: empty token in response");
            return Err(TasksError::Auth("token endpoint returned an empty access token".to_string()));
        }

        *cached = Some(token.access_token.clone());
        Ok(token.access_token)
    }

    /// Build an API URL from path segments, percent-encoding each one
    fn url(&self, segments: &[&str]) -> Result<Url, TasksError> {
        let mut url = Url::parse(&self.api_base_url)
            .map_err(|e| TasksError::InvalidResponse(format!("Invalid API base URL '{}': {}", self.api_base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| TasksError::InvalidResponse(format!("API base URL cannot have a path: {}", self.api_base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_items(&self, url: Url, query: &[(&str, String)]) -> Result<Vec<Value>, TasksError> {
        debug!(%url, "get_items: called");
        let token = self.access_token().await?;
        let response = self.http.get(url).bearer_auth(token).query(query).send().await?;
        let page: ItemsPage = check_status(response).await?.json().await?;
        // Empty collections come back with `items` absent or null
        let items = page.items.unwrap_or_default();
        debug!(count = items.len(), "get_items: done");
        Ok(items)
    }
}

#[async_trait]
impl TaskService for GoogleTasksClient {
    async fn list_task_lists(&self) -> Result<Vec<Value>, TasksError> {
        debug!("list_task_lists: called");
        let url = self.url(&["tasks", "v1", "users", "@me", "lists"])?;
        self.get_items(url, &[]).await
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Value>, TasksError> {
        debug!(list_id = %query.list_id, "list_tasks: called");
        let url = self.url(&["tasks", "v1", "lists", &query.list_id, "tasks"])?;
        let params = [
            ("showCompleted", query.show_completed.to_string()),
            ("showHidden", query.show_hidden.to_string()),
            ("maxResults", query.max_results.to_string()),
        ];
        self.get_items(url, &params).await
    }
}

/// Turn a non-2xx response into [`TasksError::Api`]
async fn check_status(response: Response) -> Result<Response, TasksError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "check_status: API error");
    Err(TasksError::Api {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ItemsPage {
    #[serde(default)]
    items: Option<Vec<Value>>,
}
