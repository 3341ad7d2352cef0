pub mod city_sets;
pub mod photos;
pub mod response;

use crate::auth;
use crate::middleware::jwt_verify::JwtVerifier;
use actix_web::web;
use response::ApiError;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()),
    )
    .service(auth::configure_service())
    .service(photos::configure_service().wrap(JwtVerifier))
    .service(city_sets::configure_service().wrap(JwtVerifier));
}
