use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use std::fmt::Display;
use std::io;

use infra::config::AppConfigImpl;
use log::info;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

use server::middleware::other;

fn startup_error(stage: &str, e: impl Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", stage, e))
}

fn init_logging() -> io::Result<()> {
    // 配置日志同时输出到控制台和文件
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let pattern = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {m}{n}";

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build("app.log")?;
    let console_appender = log4rs::append::console::ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .appender(Appender::builder().build("stdout", Box::new(console_appender)))
        .build(
            Root::builder()
                .appender("file")
                .appender("stdout")
                .build(log_level.parse().unwrap_or(log::LevelFilter::Info)),
        )
        .map_err(|e| startup_error("logging", e))?;

    log4rs::init_config(config).map_err(|e| startup_error("logging", e))?;
    Ok(())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    init_logging()?;

    let cfg = AppConfigImpl::load().map_err(|e| startup_error("config", e))?;
    let server_cfg = cfg.server();
    let db = server::AppState::init_db(&cfg.database())
        .await
        .map_err(|e| startup_error("database", e))?;

    let app_state = server::AppState::new(db, cfg).map_err(|e| startup_error("app state", e))?;
    server::init_admin_user(&app_state)
        .await
        .map_err(|e| startup_error("admin user", e))?;
    let app_state = web::Data::new(app_state);

    info!("listening on {}:{}", server_cfg.host, server_cfg.port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .configure(server::configure_app)
            .wrap(other::cors())
    })
    .bind((server_cfg.host.as_str(), server_cfg.port))?
    .run()
    .await
}
