//! In-process stand-in for the hosted auth/data service.
//!
//! Accounts keep bcrypt hashes and access tokens are HS256 JWTs whose `sub` is
//! the user id, mirroring what the hosted service issues. The task table applies
//! its own ownership policy from the token subject, independently of the owner
//! filter passed by the caller.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthService, BackendError, TaskStore};
use crate::auth::token::AccessToken;
use crate::models::{Credentials, NewTask, Session, Task, TaskId, TaskPatch, UserProfile};

const TOKEN_LIFETIME_MINUTES: i64 = 60;
const MIN_PASSWORD_LENGTH: usize = 6;

/// Claims carried by tokens issued by `MemoryBackend`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The user's id.
    pub sub: Uuid,
    pub email: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

struct Account {
    profile: UserProfile,
    password_hash: String,
}

#[derive(Default)]
struct State {
    /// Keyed by lower-cased email.
    accounts: HashMap<String, Account>,
    tasks: Vec<Task>,
    next_task_id: i64,
}

pub struct MemoryBackend {
    secret: String,
    hash_cost: u32,
    state: RwLock<State>,
}

fn rejected(status: u16, message: &str) -> BackendError {
    BackendError::Rejected {
        status,
        message: message.to_string(),
    }
}

/// The table's `id` column is a bigint; other ids fail the way Postgres casts do.
fn bigint_id(id: &TaskId) -> Result<i64, BackendError> {
    id.as_i64().ok_or_else(|| BackendError::Rejected {
        status: 400,
        message: format!("invalid input syntax for type bigint: \"{}\"", id),
    })
}

fn row_level_violation() -> BackendError {
    rejected(
        403,
        "new row violates row-level security policy for table \"tasks\"",
    )
}

impl MemoryBackend {
    pub fn new(secret: &str) -> Self {
        Self::with_hash_cost(secret, bcrypt::DEFAULT_COST)
    }

    /// Same as `new` with a custom bcrypt cost; tests use the minimum (4).
    pub fn with_hash_cost(secret: &str, hash_cost: u32) -> Self {
        Self {
            secret: secret.to_string(),
            hash_cost,
            state: RwLock::new(State {
                next_task_id: 1,
                ..State::default()
            }),
        }
    }

    /// Number of stored tasks across all users.
    pub async fn task_count(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    fn issue_token(&self, profile: &UserProfile) -> Result<String, BackendError> {
        let exp = (Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES)).timestamp() as usize;
        let claims = Claims {
            sub: profile.id,
            email: profile.email.clone().unwrap_or_default(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| BackendError::Unavailable(format!("failed to issue token: {}", e)))
    }

    fn verify_token(&self, token: &AccessToken) -> Option<Claims> {
        decode::<Claims>(
            token.as_str(),
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .ok()
    }

    /// The identity the ownership policy runs as.
    fn policy_subject(&self, token: &AccessToken) -> Result<Uuid, BackendError> {
        self.verify_token(token)
            .map(|claims| claims.sub)
            .ok_or_else(|| rejected(401, "JWT expired or invalid"))
    }
}

#[async_trait]
impl AuthService for MemoryBackend {
    async fn sign_up(&self, credentials: &Credentials) -> Result<UserProfile, BackendError> {
        let email = credentials.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(rejected(
                400,
                "Unable to validate email address: invalid format",
            ));
        }
        if credentials.password.is_empty() {
            return Err(rejected(422, "Signup requires a valid password"));
        }
        if credentials.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(rejected(422, "Password should be at least 6 characters."));
        }

        let password_hash = bcrypt::hash(&credentials.password, self.hash_cost)
            .map_err(|e| BackendError::Unavailable(format!("failed to hash password: {}", e)))?;

        let mut state = self.state.write().await;
        if state.accounts.contains_key(&email) {
            return Err(rejected(422, "User already registered"));
        }

        let mut attributes = serde_json::Map::new();
        attributes.insert("aud".into(), json!("authenticated"));
        attributes.insert("role".into(), json!("authenticated"));
        attributes.insert("created_at".into(), json!(Utc::now()));
        let profile = UserProfile {
            id: Uuid::new_v4(),
            email: Some(email.clone()),
            attributes,
        };

        state.accounts.insert(
            email,
            Account {
                profile: profile.clone(),
                password_hash,
            },
        );
        log::debug!("registered user {}", profile.id);
        Ok(profile)
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, BackendError> {
        let email = credentials.email.trim().to_lowercase();
        let (profile, password_hash) = {
            let state = self.state.read().await;
            match state.accounts.get(&email) {
                Some(account) => (account.profile.clone(), account.password_hash.clone()),
                None => return Err(rejected(400, "Invalid login credentials")),
            }
        };

        let matches = bcrypt::verify(&credentials.password, &password_hash)
            .map_err(|e| BackendError::Unavailable(format!("failed to verify password: {}", e)))?;
        if !matches {
            return Err(rejected(400, "Invalid login credentials"));
        }

        Ok(Session {
            access_token: self.issue_token(&profile)?,
            user: profile,
        })
    }

    async fn get_user(&self, token: &AccessToken) -> Result<Option<UserProfile>, BackendError> {
        let claims = match self.verify_token(token) {
            Some(claims) => claims,
            None => return Ok(None),
        };
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|account| account.profile.id == claims.sub)
            .map(|account| account.profile.clone()))
    }
}

#[async_trait]
impl TaskStore for MemoryBackend {
    async fn insert(&self, token: &AccessToken, row: &NewTask) -> Result<Vec<Task>, BackendError> {
        let subject = self.policy_subject(token)?;
        if row.user_id != subject {
            return Err(row_level_violation());
        }

        let mut state = self.state.write().await;
        let task = Task {
            id: TaskId::from(state.next_task_id),
            title: row.title.clone(),
            description: Some(row.description.clone()),
            completed: row.completed,
            user_id: row.user_id,
            created_at: Utc::now(),
        };
        state.next_task_id += 1;
        state.tasks.push(task.clone());
        Ok(vec![task])
    }

    async fn select_owned(
        &self,
        token: &AccessToken,
        owner: Uuid,
    ) -> Result<Vec<Task>, BackendError> {
        let subject = self.policy_subject(token)?;
        let state = self.state.read().await;
        // Rows are kept in insertion order; walking them backwards breaks
        // `created_at` ties newest first under the stable sort.
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .rev()
            .filter(|task| task.user_id == subject && task.user_id == owner)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn update_owned(
        &self,
        token: &AccessToken,
        owner: Uuid,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Vec<Task>, BackendError> {
        let subject = self.policy_subject(token)?;
        let id = TaskId::from(bigint_id(id)?);
        let mut state = self.state.write().await;
        let updated = state
            .tasks
            .iter_mut()
            .filter(|task| task.id == id && task.user_id == owner && task.user_id == subject)
            .map(|task| {
                patch.apply(task);
                task.clone()
            })
            .collect();
        Ok(updated)
    }

    async fn delete_owned(
        &self,
        token: &AccessToken,
        owner: Uuid,
        id: &TaskId,
    ) -> Result<Vec<Task>, BackendError> {
        let subject = self.policy_subject(token)?;
        let id = TaskId::from(bigint_id(id)?);
        let mut state = self.state.write().await;
        let (removed, kept): (Vec<Task>, Vec<Task>) = state
            .tasks
            .drain(..)
            .partition(|task| task.id == id && task.user_id == owner && task.user_id == subject);
        state.tasks = kept;
        Ok(removed)
    }
}
