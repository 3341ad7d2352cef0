use actix_cors::Cors;

pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "HEAD", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
