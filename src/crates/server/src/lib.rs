pub mod auth;
pub mod consts;
pub mod middleware;
pub mod native_api;

use application::auth::{AuthService, PasswordHasher, TokenService};
use application::command::photo::PhotoService;
use application::command::shared::IdGenerator;
use application::error::AppError;
use application::projector::city_set::CitySetProjector;
use application::query::dao::{CitySetDao, PhotoDao};
use application::shared::SystemConfigStore;
use domain::unit_of_work::UnitOfWorkFactory;
use domain::user::UserRepository;
use infra::auth::{BcryptPasswordHasher, JwtTokenService};
use infra::config::{AppConfigImpl, DatabaseConfig};
use infra::id_generator::SnowflakeIdGenerator;
use infra::repository::in_memory::photo_store::InMemoryPhotoStore;
use infra::repository::in_memory::system_config::InMemorySystemConfigStore;
use infra::repository::in_memory::user::InMemoryUserRepository;
use infra::repository::postgres::command::system_config::SystemConfigStoreImpl;
use infra::repository::postgres::command::unit_of_work::PostgresUnitOfWorkFactory;
use infra::repository::postgres::command::user::UserRepositoryImpl;
use infra::repository::postgres::query::city_set::CitySetDaoImpl;
use infra::repository::postgres::query::photo::PhotoDaoImpl;
use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement};
use std::sync::Arc;
use std::time::Duration;

pub use native_api::configure_app;

pub struct AppState {
    pub app_cfg: AppConfigImpl,
    pub id_generator: Arc<dyn IdGenerator>,
    pub uow_factory: Arc<dyn UnitOfWorkFactory>,
    pub photo_dao: Arc<dyn PhotoDao + Send + Sync>,
    pub city_set_dao: Arc<dyn CitySetDao + Send + Sync>,
    pub user_repo: Arc<dyn UserRepository>,
    pub system_config: Arc<dyn SystemConfigStore>,
}

impl AppState {
    pub async fn init_db(cfg: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
        let mut opt = ConnectOptions::new(cfg.url.clone());
        opt.max_connections(cfg.max_connections)
            .min_connections(cfg.min_connections)
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(60))
            .max_lifetime(Duration::from_secs(300))
            .sqlx_logging(false)
            .sqlx_logging_level(log::LevelFilter::Info);

        let db = Database::connect(opt).await?;

        let backend = DbBackend::Postgres;
        db.execute(Statement::from_string(backend, "SELECT 1".to_owned()))
            .await?;

        info!("Database connection pool initialized successfully");
        Ok(db)
    }

    pub fn new(db: DatabaseConnection, app_cfg: AppConfigImpl) -> Result<Self, AppError> {
        let id_generator: Arc<dyn IdGenerator> =
            Arc::new(SnowflakeIdGenerator::new(app_cfg.node_id)?);
        Ok(Self {
            app_cfg,
            id_generator,
            uow_factory: Arc::new(PostgresUnitOfWorkFactory::new(db.clone())),
            photo_dao: Arc::new(PhotoDaoImpl::new(db.clone())),
            city_set_dao: Arc::new(CitySetDaoImpl::new(db.clone())),
            user_repo: Arc::new(UserRepositoryImpl::new(db.clone())),
            system_config: Arc::new(SystemConfigStoreImpl::new(db)),
        })
    }

    /// 不依赖数据库的装配，数据只保存在进程内
    pub fn in_memory(app_cfg: AppConfigImpl) -> Result<Self, AppError> {
        let id_generator: Arc<dyn IdGenerator> =
            Arc::new(SnowflakeIdGenerator::new(app_cfg.node_id)?);
        let store = InMemoryPhotoStore::new();
        Ok(Self {
            app_cfg,
            id_generator,
            uow_factory: Arc::new(store.clone()),
            photo_dao: Arc::new(store.clone()),
            city_set_dao: Arc::new(store),
            user_repo: Arc::new(InMemoryUserRepository::new()),
            system_config: Arc::new(InMemorySystemConfigStore::new()),
        })
    }

    pub fn photo_service(&self) -> PhotoService {
        PhotoService::new(
            self.id_generator.clone(),
            self.uow_factory.clone(),
            CitySetProjector::new(self.app_cfg.grouping_policy()),
        )
    }

    pub fn token_service(&self) -> JwtTokenService {
        JwtTokenService::from_config(&self.app_cfg)
    }

    pub fn auth_service(&self) -> AuthService {
        let hasher: Arc<dyn PasswordHasher> =
            Arc::new(BcryptPasswordHasher::from_config(&self.app_cfg));
        let token_svc: Arc<dyn TokenService> = Arc::new(self.token_service());
        AuthService::new(
            self.user_repo.clone(),
            hasher,
            token_svc,
            self.id_generator.clone(),
        )
    }
}

/// 首次启动时创建 admin 用户并返回随机密码；已初始化过则返回 `None`
pub async fn init_admin_user(state: &AppState) -> Result<Option<String>, AppError> {
    use rand::Rng;

    let password: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(consts::ADMIN_PASSWORD_LEN)
        .map(char::from)
        .collect();

    let created = state
        .auth_service()
        .bootstrap_admin(state.system_config.as_ref(), consts::ADMIN_USERNAME, password)
        .await?;
    let Some(admin) = created else {
        return Ok(None);
    };

    info!("===========================================");
    info!("  Admin user created successfully!");
    info!("  Username: {}", admin.username);
    info!("  Password: {}", admin.password);
    info!("  Please keep this password safe!");
    info!("===========================================");
    Ok(Some(admin.password))
}
