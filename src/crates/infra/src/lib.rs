pub mod repository;

pub mod id_generator;

pub mod config;
pub use config::{AppConfigImpl, DatabaseConfig, ServerConfig};

pub mod auth;
