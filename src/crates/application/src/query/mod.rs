use thiserror::Error;

pub mod dao;
pub mod get_city_sets;
pub mod get_photos;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    DbError(String),
}
