use domain::city_set::CitySetError;
use domain::photo::PhotoError;
use domain::user::UserError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Photo error: {0}")]
    PhotoError(#[from] PhotoError),
    #[error("City set error: {0}")]
    CitySetError(#[from] CitySetError),
    #[error("User error: {0}")]
    UserError(#[from] UserError),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}
