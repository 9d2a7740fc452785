//! Interfaces to the external auth/data service.
//!
//! The service owns user accounts, password checks, token issuance and row
//! ownership policies. This crate only consumes it, through the `AuthService`
//! and `TaskStore` traits. `SupabaseClient` talks to a hosted project over HTTP;
//! `MemoryBackend` is an in-process stand-in for local runs and tests.

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use std::{fmt, sync::Arc};
use uuid::Uuid;

use crate::auth::token::AccessToken;
use crate::config::BackendConfig;
use crate::models::{Credentials, Identity, NewTask, Session, Task, TaskId, TaskPatch, UserProfile};

pub use memory::MemoryBackend;
pub use supabase::SupabaseClient;

/// A failure reported by, or while reaching, the external service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The service answered and refused the request (4xx).
    Rejected { status: u16, message: String },
    /// The service could not be reached, failed (5xx), or answered with garbage.
    Unavailable(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BackendError::Rejected { status, message } => {
                write!(f, "rejected by service ({}): {}", status, message)
            }
            BackendError::Unavailable(detail) => write!(f, "service unavailable: {}", detail),
        }
    }
}

impl std::error::Error for BackendError {}

/// Sign-up, password sign-in and token introspection.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<UserProfile, BackendError>;

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, BackendError>;

    /// Resolves a bearer token to its user. `Ok(None)` means the token names nobody.
    async fn get_user(&self, token: &AccessToken) -> Result<Option<UserProfile>, BackendError>;
}

/// Filtered access to the `tasks` table.
///
/// The token is forwarded so the store applies its own ownership policy; the
/// `owner` argument is the filter the caller applies on top of it.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, token: &AccessToken, row: &NewTask) -> Result<Vec<Task>, BackendError>;

    /// All rows owned by `owner`, newest first.
    async fn select_owned(
        &self,
        token: &AccessToken,
        owner: Uuid,
    ) -> Result<Vec<Task>, BackendError>;

    /// Returns the rows that were changed; empty when nothing matched.
    async fn update_owned(
        &self,
        token: &AccessToken,
        owner: Uuid,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Vec<Task>, BackendError>;

    /// Returns the rows that were removed; empty when nothing matched.
    async fn delete_owned(
        &self,
        token: &AccessToken,
        owner: Uuid,
        id: &TaskId,
    ) -> Result<Vec<Task>, BackendError>;
}

/// The pair of service handles shared by all workers.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthService>,
    pub store: Arc<dyn TaskStore>,
    kind: &'static str,
}

impl Backend {
    pub fn new(auth: Arc<dyn AuthService>, store: Arc<dyn TaskStore>, kind: &'static str) -> Self {
        Self { auth, store, kind }
    }

    /// A backend where both traits are served by the same `MemoryBackend`.
    pub fn memory(memory: Arc<MemoryBackend>) -> Self {
        Self::new(memory.clone(), memory, "memory")
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        match config {
            BackendConfig::Supabase { url, anon_key } => {
                let client = Arc::new(SupabaseClient::new(url, anon_key)?);
                Ok(Self::new(client.clone(), client, "supabase"))
            }
            BackendConfig::Memory { jwt_secret } => {
                Ok(Self::memory(Arc::new(MemoryBackend::new(jwt_secret))))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Binds the task store to one request's token.
    pub fn scoped(&self, token: AccessToken) -> ScopedStore {
        ScopedStore {
            store: Arc::clone(&self.store),
            token,
        }
    }
}

/// A task store bound to the token of a single request.
///
/// Deliberately not `Clone`: it is created by the identity middleware, moved
/// into exactly one handler and dropped with the request.
pub struct ScopedStore {
    store: Arc<dyn TaskStore>,
    token: AccessToken,
}

impl ScopedStore {
    pub async fn insert(&self, row: &NewTask) -> Result<Vec<Task>, BackendError> {
        self.store.insert(&self.token, row).await
    }

    pub async fn list(&self, caller: &Identity) -> Result<Vec<Task>, BackendError> {
        self.store.select_owned(&self.token, caller.id).await
    }

    pub async fn update(
        &self,
        caller: &Identity,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Vec<Task>, BackendError> {
        self.store
            .update_owned(&self.token, caller.id, id, patch)
            .await
    }

    pub async fn delete(&self, caller: &Identity, id: &TaskId) -> Result<Vec<Task>, BackendError> {
        self.store.delete_owned(&self.token, caller.id, id).await
    }
}

impl fmt::Debug for ScopedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedStore")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
