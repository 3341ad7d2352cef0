use actix_web::{web, HttpRequest, HttpResponse, Scope};
use log::warn;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::consts;
use crate::native_api::response::ApiError;
use crate::AppState;

/// Rate limiter for login attempts by IP
struct RateLimiter {
    attempts: HashMap<String, Vec<Instant>>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_attempts: usize, window_secs: u64) -> Self {
        Self {
            attempts: HashMap::new(),
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }

    fn is_allowed(&mut self, ip: &str) -> bool {
        let now = Instant::now();
        let window = self.window;
        // 顺带清理其它 IP 的过期记录，避免表无限增长
        self.attempts.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < window);
            !attempts.is_empty()
        });

        let attempts = self.attempts.entry(ip.to_string()).or_default();
        if attempts.len() >= self.max_attempts {
            false
        } else {
            attempts.push(now);
            true
        }
    }
}

static LOGIN_LIMITER: Lazy<Mutex<RateLimiter>> = Lazy::new(|| {
    Mutex::new(RateLimiter::new(
        consts::LOGIN_MAX_ATTEMPTS,
        consts::LOGIN_WINDOW_SECS,
    ))
});

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// 客户端 IP：默认取对端地址，只有配置了可信代理时才读取转发头
fn get_client_ip(req: &HttpRequest, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(req) {
            return ip;
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(req: &HttpRequest) -> Option<String> {
    // Try X-Forwarded-For header first (for reverse proxy)
    if let Some(forwarded) = req.headers().get("X-Forwarded-For") {
        if let Some(ip) = forwarded.to_str().ok().and_then(|s| s.split(',').next()) {
            return Some(ip.trim().to_string());
        }
    }

    req.headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
}

pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let client_ip = get_client_ip(&req, state.app_cfg.server.trust_proxy_headers);

    if !LOGIN_LIMITER.lock().is_allowed(&client_ip) {
        warn!("too many login attempts from {}", client_ip);
        return Err(ApiError::TooManyRequests(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    match state.auth_service().login(&body.username, &body.password).await {
        Ok(token) => Ok(HttpResponse::Ok().json(LoginResponse { token })),
        Err(e) => {
            warn!("login failed for {} from {}: {}", body.username, client_ip, e);
            Err(ApiError::Unauthorized)
        }
    }
}

pub fn configure_service() -> Scope {
    web::scope(consts::URL_PATH_AUTH).route("/login", web::post().to(login))
}
