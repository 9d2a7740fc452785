//! HTTP client for a hosted Supabase project.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/auth/v1/signup` | `sign_up` |
//! | POST   | `/auth/v1/token?grant_type=password` | `sign_in_with_password` |
//! | GET    | `/auth/v1/user` | `get_user` |
//! | POST   | `/rest/v1/tasks` | `insert` |
//! | GET    | `/rest/v1/tasks?user_id=eq.{owner}&order=created_at.desc` | `select_owned` |
//! | PATCH  | `/rest/v1/tasks?id=eq.{id}&user_id=eq.{owner}` | `update_owned` |
//! | DELETE | `/rest/v1/tasks?id=eq.{id}&user_id=eq.{owner}` | `delete_owned` |
//!
//! Every request carries the project's anon key in the `apikey` header. Table
//! requests are authorized with the caller's own token so the project's row
//! level security policies run as that user.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use uuid::Uuid;

use super::{AuthService, BackendError, TaskStore};
use crate::auth::token::AccessToken;
use crate::models::{Credentials, NewTask, Session, Task, TaskId, TaskPatch, UserProfile};

const AUTH_PREFIX: &str = "auth/v1";
const REST_PREFIX: &str = "rest/v1";
const TASKS_TABLE: &str = "tasks";

/// Asks PostgREST to answer writes with the affected rows.
const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserProfile,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(anon_key).map_err(|_| {
                BackendError::Unavailable("anon key is not a valid header value".into())
            })?,
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("client_init: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, AUTH_PREFIX, path)
    }

    fn table_url(&self) -> String {
        format!("{}/{}/{}", self.base_url, REST_PREFIX, TASKS_TABLE)
    }

    fn owned_row_filter(owner: Uuid, id: &TaskId) -> [(&'static str, String); 2] {
        [("id", format!("eq.{}", id)), ("user_id", format!("eq.{}", owner))]
    }
}

/// Sends a request and sorts the outcome into success, rejection or outage.
async fn dispatch(endpoint: &str, request: RequestBuilder) -> Result<Response, BackendError> {
    let resp = request
        .send()
        .await
        .map_err(|e| BackendError::Unavailable(format!("{}: {}", endpoint, e)))?;

    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    if status.is_server_error() {
        Err(BackendError::Unavailable(format!(
            "{} returned {}: {}",
            endpoint, status, message
        )))
    } else {
        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, resp: Response) -> Result<T, BackendError> {
    resp.json()
        .await
        .map_err(|e| BackendError::Unavailable(format!("{}: invalid response body: {}", endpoint, e)))
}

/// Pulls a human readable message out of a GoTrue or PostgREST error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl AuthService for SupabaseClient {
    async fn sign_up(&self, credentials: &Credentials) -> Result<UserProfile, BackendError> {
        let endpoint = "POST /auth/v1/signup";
        let request = self
            .http
            .post(self.auth_url("signup"))
            .bearer_auth(&self.anon_key)
            .json(credentials);

        let body: Value = decode(endpoint, dispatch(endpoint, request).await?).await?;
        // With auto-confirm on the user is wrapped in a session, otherwise it is the whole body.
        let user = match body.get("user") {
            Some(user) if user.is_object() => user.clone(),
            _ => body,
        };
        serde_json::from_value(user)
            .map_err(|e| BackendError::Unavailable(format!("{}: invalid user: {}", endpoint, e)))
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, BackendError> {
        let endpoint = "POST /auth/v1/token";
        let request = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .bearer_auth(&self.anon_key)
            .json(credentials);

        let token: TokenResponse = decode(endpoint, dispatch(endpoint, request).await?).await?;
        Ok(Session {
            access_token: token.access_token,
            user: token.user,
        })
    }

    async fn get_user(&self, token: &AccessToken) -> Result<Option<UserProfile>, BackendError> {
        let endpoint = "GET /auth/v1/user";
        let request = self
            .http
            .get(self.auth_url("user"))
            .bearer_auth(token.as_str());

        match dispatch(endpoint, request).await {
            Ok(resp) => decode(endpoint, resp).await.map(Some),
            Err(BackendError::Rejected { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16()
                    || status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl TaskStore for SupabaseClient {
    async fn insert(&self, token: &AccessToken, row: &NewTask) -> Result<Vec<Task>, BackendError> {
        let endpoint = "POST /rest/v1/tasks";
        let request = self
            .http
            .post(self.table_url())
            .bearer_auth(token.as_str())
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[row]);

        decode(endpoint, dispatch(endpoint, request).await?).await
    }

    async fn select_owned(
        &self,
        token: &AccessToken,
        owner: Uuid,
    ) -> Result<Vec<Task>, BackendError> {
        let endpoint = "GET /rest/v1/tasks";
        let request = self
            .http
            .get(self.table_url())
            .bearer_auth(token.as_str())
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", owner)),
                ("order", "created_at.desc".to_string()),
            ]);

        decode(endpoint, dispatch(endpoint, request).await?).await
    }

    async fn update_owned(
        &self,
        token: &AccessToken,
        owner: Uuid,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Vec<Task>, BackendError> {
        let endpoint = "PATCH /rest/v1/tasks";
        let request = self
            .http
            .patch(self.table_url())
            .bearer_auth(token.as_str())
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&Self::owned_row_filter(owner, id))
            .json(patch);

        decode(endpoint, dispatch(endpoint, request).await?).await
    }

    async fn delete_owned(
        &self,
        token: &AccessToken,
        owner: Uuid,
        id: &TaskId,
    ) -> Result<Vec<Task>, BackendError> {
        let endpoint = "DELETE /rest/v1/tasks";
        let request = self
            .http
            .delete(self.table_url())
            .bearer_auth(token.as_str())
            .header("Prefer", RETURN_REPRESENTATION)
            .query(&Self::owned_row_filter(owner, id));

        decode(endpoint, dispatch(endpoint, request).await?).await
    }
}
