//! Persistence for users, tasks and sessions.
//!
//! Handlers talk to the three store traits only. Two backends implement all of
//! them: [`PgStore`] on a Postgres pool, and [`MemoryStore`] which keeps
//! everything in process and backs the test suite and database-less development.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Credential storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails if the email is already taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Exact match on the normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

/// Task storage.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: &Task) -> Result<(), AppError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    /// Tasks owned by `owner_id` or listing `email` as a collaborator, each at
    /// most once, oldest first.
    async fn find_visible_tasks(&self, owner_id: Uuid, email: &str)
        -> Result<Vec<Task>, AppError>;

    /// Writes the completion flag. Returns `false` if the task no longer exists.
    async fn set_task_complete(&self, id: Uuid, is_complete: bool) -> Result<bool, AppError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete_task(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Server-side session records keyed by opaque token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// The user bound to `token`, unless the session is missing or expired at `now`.
    async fn find_session_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, AppError>;

    /// Removing an unknown token is not an error.
    async fn destroy_session(&self, token: &str) -> Result<(), AppError>;
}

/// The set of stores shared by every request.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Store {
    /// All three stores on one Postgres pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::from_backend(PgStore::new(pool))
    }

    /// All three stores in process memory.
    pub fn memory() -> Self {
        Self::from_backend(MemoryStore::new())
    }

    /// Wraps a single value implementing every store trait.
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: UserStore + TaskStore + SessionStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            users: backend.clone(),
            tasks: backend.clone(),
            sessions: backend,
        }
    }
}
