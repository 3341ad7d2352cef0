pub mod photo_store;
pub mod system_config;
pub mod user;
