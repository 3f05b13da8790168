use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User, UserProfile, DEFAULT_ROLE},
    db::Database,
    error::StoreError,
};

/// Persistent record of accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by (normalized) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Load the public profile of a user.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError>;

    /// Insert a user, rejecting an email or username that is already taken.
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
}

/// Postgres-backed store.
pub struct PgUserStore {
    db: Arc<Database>,
}

impl PgUserStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn username_taken(&self, username: &str) -> Result<bool, StoreError> {
        let pool = self.db.connect().await?;
        let taken: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)"#)
                .bind(username)
                .fetch_one(pool)
                .await?;
        Ok(taken)
    }
}

/// Maps a unique violation on insert to the duplicate it reports.
fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some(c) if c.contains("username") => StoreError::DuplicateUsername,
                _ => StoreError::DuplicateEmail,
            };
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let pool = self.db.connect().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, bio, skills, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let pool = self.db.connect().await?;
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, username, email, bio, skills, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(profile)
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        if self.find_by_email(&new.email).await?.is_some() {
            return Err(StoreError::DuplicateEmail);
        }
        if self.username_taken(&new.username).await? {
            return Err(StoreError::DuplicateUsername);
        }

        let pool = self.db.connect().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, role, bio, skills, created_at
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(DEFAULT_ROLE)
        .fetch_one(pool)
        .await
        .map_err(map_insert_error)?;
        Ok(user)
    }
}

/// In-process store keyed by id.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Drops a user, as an administrator might outside the auth flow.
    pub async fn remove(&self, id: Uuid) -> Option<User> {
        self.users.write().await.remove(&id)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned().map(UserProfile::from))
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        // check and insert under one write lock
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if users.values().any(|u| u.username == new.username) {
            return Err(StoreError::DuplicateUsername);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: DEFAULT_ROLE.to_string(),
            bio: None,
            skills: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        debug!(user_id = %user.id, "user stored in memory");
        Ok(user)
    }
}
