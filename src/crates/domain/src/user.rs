use super::value::UserId;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

/// 用户领域错误
#[derive(Error, Debug)]
pub enum UserError {
    #[error("invalid user or password!{0}")]
    InvalidUserOrPassword(String),
    #[error("user already exists: {0}")]
    UserExists(String),
    #[error("{0}")]
    DbErr(String),
}

/// 用户聚合根，仅用于后台写操作的鉴权
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: String, // bcrypt hash
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn new(
        id: UserId,
        username: &str,
        hashed_password: &str,
        is_admin: bool,
        now: NaiveDateTime,
    ) -> Result<Self, UserError> {
        if username.trim().is_empty() {
            return Err(UserError::InvalidUserOrPassword(
                "username must not be empty".to_string(),
            ));
        }
        Ok(User {
            id,
            username: username.trim().to_string(),
            password: hashed_password.to_string(),
            is_admin,
            created_at: now,
        })
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn count(&self) -> Result<u64, UserError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError>;
    async fn save(&self, user: &User) -> Result<(), UserError>;
}
