use crate::native_api::response::ApiError;
use crate::AppState;
use actix_service::{forward_ready, Service, Transform};
use actix_web::{
    body::EitherBody, dev::ServiceRequest, dev::ServiceResponse, error::ResponseError,
    http::Method, web, Error, HttpMessage, HttpRequest,
};
use application::auth::{TokenService, UserClaims};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::debug;
use std::rc::Rc;
use url::Url;

use thiserror::Error;
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("no token found")]
    NoTokenFound,
    #[error("token is unauthorized: {0}")]
    Unauthorized(String),
    #[error("app state is not configured")]
    MissingState,
}

// There are two steps in middleware processing.
// 1. Middleware initialization, middleware factory gets called with
//    next service in chain as parameter.
// 2. Middleware's call method gets called with normal request.
//
// 读请求可以不带令牌；带了有效令牌时同样把 claims 放进请求扩展。
// 写请求必须带有效令牌，否则直接 401，不会进入 handler。
pub struct JwtVerifier;

impl<S, B> Transform<S, ServiceRequest> for JwtVerifier
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtVerifyMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtVerifyMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct JwtVerifyMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtVerifyMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);
    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let (http_request, payload) = req.into_parts();
        let fut = async move {
            let token_finders: Vec<TokenFinder> = vec![token_from_header, token_from_query];
            let verified = verify_jwt(&http_request, &token_finders);
            let req = ServiceRequest::from_parts(http_request, payload);
            match verified {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                }
                Err(e) if requires_token(req.method()) => {
                    debug!("rejected {} {}: {}", req.method(), req.path(), e);
                    let rsp = ApiError::Unauthorized.error_response();
                    return Ok(req.into_response(rsp).map_into_right_body());
                }
                Err(_) => {}
            }
            service.call(req).await.map(ServiceResponse::map_into_left_body)
        };
        Box::pin(fut)
    }
}

fn requires_token(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

// 提取令牌的函数类型
type TokenFinder = fn(req: &HttpRequest) -> Option<String>;

fn token_from_header(req: &HttpRequest) -> Option<String> {
    let auth_str = req.headers().get("Authorization")?.to_str().ok()?;
    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn token_from_query(req: &HttpRequest) -> Option<String> {
    let query_string = req.query_string();

    // 解析查询字符串
    let url = Url::parse(&format!("http://localhost/?{}", query_string)).ok()?;

    url.query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.to_string())
}

fn verify_jwt(req: &HttpRequest, token_finders: &[TokenFinder]) -> Result<UserClaims, JwtError> {
    let token_str = token_finders
        .iter()
        .find_map(|finder| finder(req))
        .ok_or(JwtError::NoTokenFound)?;
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or(JwtError::MissingState)?;
    state
        .token_service()
        .verify(&token_str)
        .map_err(|e| JwtError::Unauthorized(e.to_string()))
}
