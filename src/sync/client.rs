//! HTTP transport for the sync engine.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::SyncError;
use crate::models::{Group, Member, MemberUpdate};
use crate::server::{ErrorBody, OkResponse};

/// Calls the engine makes against the server.
///
/// Implemented over HTTP by [`HttpClient`]; tests substitute an in-memory
/// fake.
#[async_trait]
pub trait RosterApi: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Group>, SyncError>;
    async fn create_group(&self, name: Option<&str>) -> Result<Group, SyncError>;
    async fn rename_group(&self, id: i64, name: &str) -> Result<Group, SyncError>;
    async fn delete_group(&self, id: i64) -> Result<(), SyncError>;
    async fn create_member(&self, group_id: i64, name: Option<&str>) -> Result<Member, SyncError>;
    async fn update_member(&self, id: i64, update: &MemberUpdate) -> Result<Member, SyncError>;
    async fn delete_member(&self, id: i64) -> Result<(), SyncError>;
}

#[derive(Serialize)]
struct CreateGroupBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct RenameGroupBody<'a> {
    id: i64,
    name: &'a str,
}

#[derive(Serialize)]
struct CreateMemberBody<'a> {
    group_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct UpdateMemberBody<'a> {
    id: i64,
    #[serde(flatten)]
    update: &'a MemberUpdate,
}

/// Client for the roastcheck HTTP API.
#[derive(Debug, Clone)]
pub struct HttpClient {
    server_url: String,
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(server_url, reqwest::Client::new())
    }

    pub fn with_client(server_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            server_url: server_url.into(),
            http,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Builds an endpoint URL, accepting a server URL with or without a
    /// trailing slash or scheme.
    fn url(&self, path: &str) -> String {
        let base = self.server_url.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{}{}", base, path)
        } else {
            format!("http://{}{}", base, path)
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SyncError> {
        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            return Err(SyncError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RosterApi for HttpClient {
    async fn fetch_all(&self) -> Result<Vec<Group>, SyncError> {
        self.send(self.http.get(self.url("/groups"))).await
    }

    async fn create_group(&self, name: Option<&str>) -> Result<Group, SyncError> {
        self.send(
            self.http
                .post(self.url("/groups"))
                .json(&CreateGroupBody { name }),
        )
        .await
    }

    async fn rename_group(&self, id: i64, name: &str) -> Result<Group, SyncError> {
        self.send(
            self.http
                .put(self.url("/groups"))
                .json(&RenameGroupBody { id, name }),
        )
        .await
    }

    async fn delete_group(&self, id: i64) -> Result<(), SyncError> {
        let _: OkResponse = self
            .send(self.http.delete(self.url(&format!("/groups?id={}", id))))
            .await?;
        Ok(())
    }

    async fn create_member(&self, group_id: i64, name: Option<&str>) -> Result<Member, SyncError> {
        self.send(
            self.http
                .post(self.url("/members"))
                .json(&CreateMemberBody { group_id, name }),
        )
        .await
    }

    async fn update_member(&self, id: i64, update: &MemberUpdate) -> Result<Member, SyncError> {
        self.send(
            self.http
                .put(self.url("/members"))
                .json(&UpdateMemberBody { id, update }),
        )
        .await
    }

    async fn delete_member(&self, id: i64) -> Result<(), SyncError> {
        let _: OkResponse = self
            .send(self.http.delete(self.url(&format!("/members?id={}", id))))
            .await?;
        Ok(())
    }
}
