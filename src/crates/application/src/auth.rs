use std::sync::Arc;

use crate::command::shared::IdGenerator;
use crate::error::AppError;
use crate::shared::SystemConfigStore;
use chrono::Utc;
use domain::user::{User, UserRepository};
use domain::value::UserId;
use log::{info, warn};

/// system_config 中标记管理员已初始化的键
pub const ADMIN_BOOTSTRAPPED_KEY: &str = "first_time";

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, AppError>;
    fn verify(&self, plain: &str, hashed: &str) -> Result<(), AppError>;
}

/// JWT 中携带的身份信息
#[derive(Debug, Clone, PartialEq)]
pub struct UserClaims {
    pub user_name: String,
    pub is_admin: bool,
}

impl From<&User> for UserClaims {
    fn from(user: &User) -> Self {
        Self {
            user_name: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

pub trait TokenService: Send + Sync {
    fn issue(&self, claims: &UserClaims) -> Result<String, AppError>;
    fn verify(&self, token: &str) -> Result<UserClaims, AppError>;
}

/// Credentials of an admin account created on first start.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// 后台鉴权：只有管理员账号，用于保护照片写接口
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    id_generator: Arc<dyn IdGenerator>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            id_generator,
        }
    }

    /// 用户名或密码错误时返回同一个错误，不暴露账号是否存在
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        let rejected = || AppError::AuthError("invalid username or password".to_string());
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or_else(rejected)?;
        self.hasher
            .verify(password, &user.password)
            .map_err(|_| rejected())?;
        info!("user {} logged in", user.username);
        self.tokens.issue(&UserClaims::from(&user))
    }

    /// 首次启动时创建管理员账号
    ///
    /// Returns `None` when the bootstrap marker is already present. The
    /// marker is written only after the admin row exists, so a failed
    /// bootstrap is retried on the next start.
    pub async fn bootstrap_admin(
        &self,
        markers: &dyn SystemConfigStore,
        username: &str,
        password: String,
    ) -> Result<Option<AdminCredentials>, AppError> {
        let marker = markers
            .get_string(ADMIN_BOOTSTRAPPED_KEY)
            .await
            .map_err(|e| AppError::UnknownError(e.to_string()))?;
        if let Some(value) = marker {
            info!("admin already bootstrapped ({}={})", ADMIN_BOOTSTRAPPED_KEY, value);
            return Ok(None);
        }
        if password.is_empty() {
            return Err(AppError::InvalidInput("password must not be empty".to_string()));
        }
        if self.users.count().await? > 0 {
            warn!("users exist without the bootstrap marker, skipping admin creation");
            self.mark_bootstrapped(markers).await;
            return Ok(None);
        }

        let id = UserId::from(self.id_generator.next_id().await?);
        let hashed = self.hasher.hash(&password)?;
        let admin = User::new(id, username, &hashed, true, Utc::now().naive_utc())?;
        self.users.save(&admin).await?;
        self.mark_bootstrapped(markers).await;

        Ok(Some(AdminCredentials {
            username: admin.username,
            password,
        }))
    }

    async fn mark_bootstrapped(&self, markers: &dyn SystemConfigStore) {
        if let Err(e) = markers.insert_if_absent(ADMIN_BOOTSTRAPPED_KEY, "false").await {
            warn!("failed to record {}: {}", ADMIN_BOOTSTRAPPED_KEY, e);
        }
    }
}
