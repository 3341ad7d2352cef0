pub mod db_data;
pub mod system_config;
pub mod unit_of_work;
pub mod user;
