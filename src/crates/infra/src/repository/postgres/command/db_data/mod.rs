pub mod city_set;
pub mod photo;
pub mod system_config;
pub mod user;
