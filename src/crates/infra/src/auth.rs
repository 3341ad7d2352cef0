use application::auth::{TokenService, UserClaims};
use application::error::AppError;
use bcrypt::hash as bcrypt_hash;
use bcrypt::verify as bcrypt_verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use serde::{Deserialize, Serialize};

pub trait AuthConfig {
    fn jwt_secret(&self) -> &str;
    fn jwt_expire_secs(&self) -> i64;
    fn salt_cost(&self) -> u32;
}

#[derive(Debug, Clone)]
pub struct BcryptPasswordHasher {
    salt_cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(salt_cost: u32) -> Self {
        Self { salt_cost }
    }

    pub fn from_config(cfg: &impl AuthConfig) -> Self {
        Self::new(cfg.salt_cost())
    }
}

impl application::auth::PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, plain: &str) -> Result<String, AppError> {
        bcrypt_hash(plain, self.salt_cost).map_err(|e| AppError::AuthError(e.to_string()))
    }

    fn verify(&self, pwd: &str, hashed_pwd: &str) -> Result<(), AppError> {
        if bcrypt_verify(pwd, hashed_pwd).unwrap_or(false) {
            Ok(())
        } else {
            Err(AppError::AuthError("invalid password".to_string()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtTokenService {
    jwt_secret: String,
    exp_secs: i64,
}

impl JwtTokenService {
    pub fn new(jwt_secret: &str, exp_secs: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.to_string(),
            exp_secs,
        }
    }

    pub fn from_config(cfg: &impl AuthConfig) -> Self {
        Self::new(cfg.jwt_secret(), cfg.jwt_expire_secs())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub adm: bool,
    pub exp: i64,
    pub iat: i64,
}

impl JwtClaims {
    fn new(claims: &UserClaims, exp_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: claims.user_name.clone(),
            adm: claims.is_admin,
            exp: now + exp_secs,
            iat: now,
        }
    }
}

impl From<JwtClaims> for UserClaims {
    fn from(claims: JwtClaims) -> Self {
        Self {
            user_name: claims.sub,
            is_admin: claims.adm,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, claims: &UserClaims) -> Result<String, AppError> {
        let claims: JwtClaims = JwtClaims::new(claims, self.exp_secs);
        let key = EncodingKey::from_secret(self.jwt_secret.as_bytes());
        let header = Header::new(Algorithm::HS256);
        let token =
            encode(&header, &claims, &key).map_err(|e| AppError::AuthError(e.to_string()))?;
        Ok(token)
    }

    fn verify(&self, token: &str) -> Result<UserClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let token_data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AppError::AuthError(e.to_string()))?;

        Ok(token_data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_generator::SnowflakeIdGenerator;
    use crate::repository::in_memory::system_config::InMemorySystemConfigStore;
    use crate::repository::in_memory::user::InMemoryUserRepository;
    use application::auth::{AuthService, PasswordHasher, ADMIN_BOOTSTRAPPED_KEY};
    use application::shared::SystemConfigStore;
    use domain::user::{User, UserRepository};
    use domain::value::UserId;
    use std::sync::Arc;

    fn auth_service(users: Arc<InMemoryUserRepository>) -> AuthService {
        AuthService::new(
            users,
            Arc::new(BcryptPasswordHasher::new(4)),
            Arc::new(JwtTokenService::new("test_secret", 3600)),
            Arc::new(SnowflakeIdGenerator::new(3).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_bootstrap_admin_runs_once() {
        let users = Arc::new(InMemoryUserRepository::new());
        let markers = InMemorySystemConfigStore::new();
        let svc = auth_service(users.clone());

        let admin = svc
            .bootstrap_admin(&markers, "admin", "pa55word".to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.username, "admin");
        assert!(markers.get_string(ADMIN_BOOTSTRAPPED_KEY).await.unwrap().is_some());

        let again = svc
            .bootstrap_admin(&markers, "admin", "other".to_string())
            .await
            .unwrap();
        assert!(again.is_none());
        assert_eq!(users.count().await.unwrap(), 1);

        let token = svc.login("admin", "pa55word").await.unwrap();
        assert!(JwtTokenService::new("test_secret", 3600).verify(&token).unwrap().is_admin);
    }

    #[tokio::test]
    async fn test_bootstrap_skips_when_users_exist_without_marker() {
        let users = Arc::new(InMemoryUserRepository::new());
        let existing = User::new(UserId::from(1), "owner", "hash", true, Utc::now().naive_utc()).unwrap();
        users.save(&existing).await.unwrap();
        let markers = InMemorySystemConfigStore::new();

        let created = auth_service(users.clone())
            .bootstrap_admin(&markers, "admin", "pa55word".to_string())
            .await
            .unwrap();
        assert!(created.is_none());
        assert_eq!(users.count().await.unwrap(), 1);
        assert!(markers.get_string(ADMIN_BOOTSTRAPPED_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_errors_do_not_reveal_unknown_users() {
        let users = Arc::new(InMemoryUserRepository::new());
        let svc = auth_service(users);
        svc.bootstrap_admin(&InMemorySystemConfigStore::new(), "admin", "pa55word".to_string())
            .await
            .unwrap();

        let unknown = svc.login("ghost", "pa55word").await.unwrap_err().to_string();
        let wrong = svc.login("admin", "nope").await.unwrap_err().to_string();
        assert_eq!(unknown, wrong);
    }

    fn claims() -> UserClaims {
        UserClaims {
            user_name: "admin".to_string(),
            is_admin: true,
        }
    }

    #[test]
    fn test_issue_and_verify_token() {
        let svc = JwtTokenService::new("test_secret", 3600);
        let token = svc.issue(&claims()).unwrap();
        assert_eq!(svc.verify(&token).unwrap(), claims());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = JwtTokenService::new("other_secret", 3600)
            .issue(&claims())
            .unwrap();
        let svc = JwtTokenService::new("test_secret", 3600);
        assert!(svc.verify(&token).is_err());
        assert!(svc.verify("not.a.token").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // 超过 jsonwebtoken 默认 60 秒的 leeway
        let svc = JwtTokenService::new("test_secret", -120);
        let token = svc.issue(&claims()).unwrap();
        assert!(svc.verify(&token).is_err());
    }

    struct Cfg;

    impl AuthConfig for Cfg {
        fn jwt_secret(&self) -> &str {
            "cfg_secret"
        }

        fn jwt_expire_secs(&self) -> i64 {
            600
        }

        fn salt_cost(&self) -> u32 {
            5
        }
    }

    #[test]
    fn test_services_built_from_config() {
        let hasher = BcryptPasswordHasher::from_config(&Cfg);
        let hashed = hasher.hash("pw").unwrap();
        assert!(hashed.starts_with("$2b$05$"));

        let svc = JwtTokenService::from_config(&Cfg);
        let token = JwtTokenService::new("cfg_secret", 600).issue(&claims()).unwrap();
        assert_eq!(svc.verify(&token).unwrap(), claims());
    }

    #[test]
    fn test_bcrypt_hash_and_verify() {
        let hasher = BcryptPasswordHasher::new(4);
        let hashed = hasher.hash("s3cret").unwrap();
        assert!(hasher.verify("s3cret", &hashed).is_ok());
        assert!(hasher.verify("wrong", &hashed).is_err());
    }
}
