use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use application::error::AppError;
use application::query::QueryError;
use chrono::NaiveDateTime;
use domain::city_set::CitySet;
use domain::photo::{Photo, PhotoError};
use model::city_set::{CitySetView, CoverPhoto};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    BadRequest { message: String, details: String },
    #[error("{0}")]
    TooManyRequests(String),
    #[error("{message}")]
    Internal { message: String, details: String },
}

impl ApiError {
    pub fn bad_request(details: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: "Invalid request".to_string(),
            details: details.into(),
        }
    }

    /// 把命令层错误映射成 HTTP 错误，`action` 作为 500 时的提示
    pub fn from_app(err: AppError, action: &str) -> Self {
        match err {
            AppError::PhotoError(PhotoError::NotFound(_)) => {
                ApiError::NotFound("Photo not found".to_string())
            }
            AppError::PhotoError(PhotoError::ValidationErr(msg)) | AppError::InvalidInput(msg) => {
                ApiError::bad_request(msg)
            }
            AppError::AuthError(_) => ApiError::Unauthorized,
            other => ApiError::Internal {
                message: action.to_string(),
                details: other.to_string(),
            },
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest { details, .. } | ApiError::Internal { details, .. } => {
                Some(details)
            }
            _ => None,
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound(msg) => ApiError::NotFound(msg),
            QueryError::InvalidParameter(msg) => ApiError::bad_request(msg),
            QueryError::DbError(msg) => ApiError::Internal {
                message: "Failed to load data".to_string(),
                details: msg,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a str>,
}

impl actix_web::error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        if let ApiError::Internal { details, .. } = self {
            log::error!("{}: {}", self, details);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            error: self.to_string(),
            details: self.details(),
        })
    }
}

/// 读接口的响应 `{data}`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// 写接口的响应 `{success: true, data}`
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok_data<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(DataResponse { data })
}

pub fn ok_success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(SuccessResponse {
        success: true,
        data,
    })
}

// 64 位 id 以字符串输出，避免 JavaScript 客户端丢失精度

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub blur_data: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub aspect_ratio: Option<f64>,
    pub date_time_original: Option<NaiveDateTime>,

    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub full_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,

    pub make: Option<String>,
    pub model: Option<String>,
    pub lens_model: Option<String>,
    pub focal_length: Option<f64>,
    pub focal_length_in_35mm_film: Option<i32>,
    pub f_number: Option<f64>,
    pub iso: Option<i32>,
    pub exposure_time: Option<f64>,
    pub exposure_compensation: Option<f64>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Photo> for PhotoResponse {
    fn from(photo: Photo) -> Self {
        let location = photo.location;
        let exif = photo.exif;
        Self {
            id: photo.id.to_string(),
            title: photo.title,
            description: photo.description,
            image_url: photo.image_url,
            blur_data: photo.blur_data,
            width: photo.width,
            height: photo.height,
            aspect_ratio: photo.aspect_ratio,
            date_time_original: photo.date_time_original,
            country: location.country,
            country_code: location.country_code,
            region: location.region,
            city: location.city,
            district: location.district,
            full_address: location.full_address,
            latitude: location.latitude,
            longitude: location.longitude,
            altitude: location.altitude,
            make: exif.camera_make,
            model: exif.camera_model,
            lens_model: exif.lens_model,
            focal_length: exif.focal_length,
            focal_length_in_35mm_film: exif.focal_length_in_35mm_film,
            f_number: exif.f_number,
            iso: exif.iso,
            exposure_time: exif.exposure_time,
            exposure_compensation: exif.exposure_compensation,
            created_at: photo.created_at,
            updated_at: photo.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverPhotoResponse {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub blur_data: Option<String>,
    pub aspect_ratio: Option<f64>,
}

impl From<CoverPhoto> for CoverPhotoResponse {
    fn from(cover: CoverPhoto) -> Self {
        Self {
            id: cover.id.to_string(),
            title: cover.title,
            image_url: cover.image_url,
            blur_data: cover.blur_data,
            aspect_ratio: cover.aspect_ratio,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitySetResponse {
    pub id: String,
    pub country: String,
    pub country_code: Option<String>,
    pub city: String,
    pub photo_count: i32,
    pub cover_photo_id: Option<String>,
    pub updated_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_photo: Option<CoverPhotoResponse>,
}

impl From<CitySet> for CitySetResponse {
    fn from(city_set: CitySet) -> Self {
        Self {
            id: city_set.id.to_string(),
            country: city_set.key.country,
            country_code: city_set.country_code,
            city: city_set.key.city,
            photo_count: city_set.photo_count,
            cover_photo_id: city_set.cover_photo_id.map(|id| id.to_string()),
            updated_at: city_set.updated_at,
            cover_photo: None,
        }
    }
}

impl From<CitySetView> for CitySetResponse {
    fn from(view: CitySetView) -> Self {
        let mut response = CitySetResponse::from(view.city_set);
        response.cover_photo = view.cover_photo.map(CoverPhotoResponse::from);
        response
    }
}
