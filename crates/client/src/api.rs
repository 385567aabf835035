//! HTTP client for the remote auth/user API.
//!
//! The session credential is passed in by the caller on every authenticated
//! call; this client holds no session of its own. The API reads the raw token
//! from the `Authorization` header, with no scheme prefix.

use igaku_core::Page;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::types::{LoginCredentials, RegistrationFields, UserData, UserListQuery};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange credentials for a session token.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<String, ApiError> {
        tracing::info!(username = %credentials.username, "logging in");

        let resp = self
            .http
            .post(self.url("/auth/login/"))
            .json(credentials)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        match resp.status() {
            StatusCode::OK => read_token(resp).await,
            StatusCode::UNAUTHORIZED => Err(ApiError::InvalidCredentials),
            status => Err(failed_auth_exchange(status, resp).await),
        }
    }

    /// Create an account; the API answers with a session token.
    pub async fn register(&self, fields: &RegistrationFields) -> Result<String, ApiError> {
        tracing::info!(username = %fields.username, "registering account");

        let resp = self
            .http
            .post(self.url("/auth/register/"))
            .json(fields)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        match resp.status() {
            StatusCode::OK => read_token(resp).await,
            StatusCode::CONFLICT => Err(ApiError::AccountTaken),
            status => Err(failed_auth_exchange(status, resp).await),
        }
    }

    /// Profile of the session's own account.
    pub async fn fetch_self(&self, token: &str) -> Result<UserData, ApiError> {
        let resp = self
            .http
            .get(self.url("/user/self/"))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        read_json(resp).await
    }

    /// One page of the (admin-only) user list.
    pub async fn list_users(
        &self,
        token: &str,
        query: &UserListQuery,
    ) -> Result<Page<UserData>, ApiError> {
        tracing::debug!(
            page = query.page.page(),
            page_size = query.page.page_size(),
            order_by = query.order_by.as_str(),
            order_method = query.order_method.as_str(),
            "listing users"
        );

        let resp = self
            .http
            .get(self.url("/user/list/"))
            .query(&query.to_query_pairs())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        read_json(resp).await
    }
}

async fn read_token(resp: reqwest::Response) -> Result<String, ApiError> {
    let body = resp.text().await.map_err(ApiError::from_transport)?;
    let token = body.trim();
    if token.is_empty() {
        return Err(ApiError::Parse("empty token in response".to_string()));
    }
    Ok(token.to_string())
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(unexpected_status(status, resp).await);
    }
    resp.json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

async fn unexpected_status(status: StatusCode, resp: reqwest::Response) -> ApiError {
    let body = resp.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "API request failed");
    ApiError::from_status(status.as_u16(), &body)
}

// Login and registration only distinguish their one expected failure.
async fn failed_auth_exchange(status: StatusCode, resp: reqwest::Response) -> ApiError {
    let message = resp.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "auth exchange failed");
    ApiError::Status {
        status: status.as_u16(),
        message: message.trim().to_string(),
    }
}
