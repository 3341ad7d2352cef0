use crate::auth::AuthConfig;
use config::{Config, Environment, File};
use domain::city_set::GroupingPolicy;
use dotenvy::dotenv;
use serde::Deserialize;
use std::error::Error;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawConfig {
    jwt_expire_secs: i64,
    jwt_secret_key: String,
    salt_cost: u32,
    database_url: String,
    /// 雪花算法节点ID
    node_id: i64,
    /// 服务器配置
    server: RawServerConfig,
    /// 数据库连接池配置
    database: RawDatabaseConfig,
    /// 城市集合配置
    city_set: RawCitySetConfig,
}

/// 服务器配置（原始配置）
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawServerConfig {
    /// 监听地址
    host: String,
    /// 监听端口
    port: u16,
    /// 部署在反向代理之后时才信任 X-Forwarded-For / X-Real-IP
    trust_proxy_headers: bool,
}

impl Default for RawServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5533,
            trust_proxy_headers: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawDatabaseConfig {
    max_connections: u32,
    min_connections: u32,
    connect_timeout_secs: u64,
    acquire_timeout_secs: u64,
}

impl Default for RawDatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 32,
            min_connections: 4,
            connect_timeout_secs: 3,
            acquire_timeout_secs: 8,
        }
    }
}

/// 城市集合配置（原始配置）
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawCitySetConfig {
    /// 这些国家的照片按 region 而不是 city 归组
    region_grouped_country_codes: Vec<String>,
}

impl Default for RawCitySetConfig {
    fn default() -> Self {
        Self {
            region_grouped_country_codes: vec!["JP".to_string(), "TW".to_string()],
        }
    }
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            jwt_expire_secs: 3600,
            salt_cost: 10,
            jwt_secret_key: "secret".to_string(),
            database_url: "".to_string(),
            node_id: 1,
            server: RawServerConfig::default(),
            database: RawDatabaseConfig::default(),
            city_set: RawCitySetConfig::default(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    pub trust_proxy_headers: bool,
}

/// 数据库连接池配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfigImpl {
    pub jwt_expire_secs: i64,
    pub jwt_secret_key: String,
    pub salt_cost: u32,
    pub node_id: i64,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub grouping_policy: GroupingPolicy,
}

impl Default for AppConfigImpl {
    fn default() -> Self {
        Self::new(RawConfig::default())
    }
}

impl AppConfigImpl {
    fn new(data: RawConfig) -> Self {
        AppConfigImpl {
            jwt_expire_secs: data.jwt_expire_secs,
            jwt_secret_key: data.jwt_secret_key,
            salt_cost: data.salt_cost,
            node_id: data.node_id,
            server: ServerConfig {
                host: data.server.host,
                port: data.server.port,
                trust_proxy_headers: data.server.trust_proxy_headers,
            },
            database: DatabaseConfig {
                url: data.database_url,
                max_connections: data.database.max_connections,
                min_connections: data.database.min_connections,
                connect_timeout_secs: data.database.connect_timeout_secs,
                acquire_timeout_secs: data.database.acquire_timeout_secs,
            },
            grouping_policy: GroupingPolicy::new(&data.city_set.region_grouped_country_codes),
        }
    }

    /// 配置来源：config.* 文件 < APP__ 前缀环境变量（.env 会先被加载）
    pub fn load() -> Result<AppConfigImpl, Box<dyn Error>> {
        dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        let raw: RawConfig = config.try_deserialize()?; // serde 自动填充默认值
        Ok(AppConfigImpl::new(raw))
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone()
    }

    pub fn database(&self) -> DatabaseConfig {
        self.database.clone()
    }

    pub fn grouping_policy(&self) -> GroupingPolicy {
        self.grouping_policy.clone()
    }
}

impl AuthConfig for AppConfigImpl {
    fn jwt_secret(&self) -> &str {
        &self.jwt_secret_key
    }

    fn jwt_expire_secs(&self) -> i64 {
        self.jwt_expire_secs
    }

    fn salt_cost(&self) -> u32 {
        self.salt_cost
    }
}
