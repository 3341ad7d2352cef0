use crate::consts;
use crate::native_api::response::{ok_data, ok_success, ApiError, PhotoResponse};
use crate::AppState;
use actix_web::{web, HttpResponse, Scope};
use application::command::photo::{CreatePhotoCmd, UpdatePhotoCmd};
use application::query::get_photos::{GetPhoto, GetPhotos};
use chrono::{DateTime, NaiveDateTime};
use domain::photo::{Exif, GeoLocation, NewPhoto, PhotoPatch};
use domain::value::PhotoId;
use model::photo::PhotoPage;
use serde::Deserialize;

/// 创建与局部更新共用的请求体，字段名与前端一致
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub blur_data: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub aspect_ratio: Option<f64>,
    pub date_time_original: Option<String>,

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
}

/// 接受 RFC 3339（带时区，转成 UTC）或不带时区的 ISO 8601 时间
fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ApiError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| ApiError::bad_request(format!("invalid dateTimeOriginal: {}", value)))
}

impl PhotoPayload {
    fn date_time_original(&self) -> Result<Option<NaiveDateTime>, ApiError> {
        match self.date_time_original.as_deref() {
            Some(v) if !v.trim().is_empty() => parse_timestamp(v).map(Some),
            _ => Ok(None),
        }
    }

    pub fn into_new_photo(self) -> Result<NewPhoto, ApiError> {
        let date_time_original = self.date_time_original()?;
        Ok(NewPhoto {
            title: self.title.unwrap_or_default(),
            description: self.description,
            image_url: self.image_url.unwrap_or_default(),
            blur_data: self.blur_data,
            width: self.width,
            height: self.height,
            aspect_ratio: self.aspect_ratio,
            date_time_original,
            location: GeoLocation {
                country: self.country,
                country_code: self.country_code,
                region: self.region,
                city: self.city,
                district: self.district,
                full_address: self.full_address,
                latitude: self.latitude,
                longitude: self.longitude,
                altitude: self.altitude,
            },
            exif: Exif {
                camera_make: self.make,
                camera_model: self.model,
                lens_model: self.lens_model,
                focal_length: self.focal_length,
                focal_length_in_35mm_film: self.focal_length_in_35mm_film,
                f_number: self.f_number,
                iso: self.iso,
                exposure_time: self.exposure_time,
                exposure_compensation: self.exposure_compensation,
            },
        })
    }

    pub fn into_patch(self) -> Result<PhotoPatch, ApiError> {
        let date_time_original = self.date_time_original()?;
        Ok(PhotoPatch {
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            blur_data: self.blur_data,
            width: self.width,
            height: self.height,
            aspect_ratio: self.aspect_ratio,
            date_time_original,
            country: self.country,
            country_code: self.country_code,
            region: self.region,
            city: self.city,
            district: self.district,
            full_address: self.full_address,
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            camera_make: self.make,
            camera_model: self.model,
            lens_model: self.lens_model,
            focal_length: self.focal_length,
            focal_length_in_35mm_film: self.focal_length_in_35mm_film,
            f_number: self.f_number,
            iso: self.iso,
            exposure_time: self.exposure_time,
            exposure_compensation: self.exposure_compensation,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page_size: Option<u64>,
    pub page_num: Option<u64>,
}

impl From<PageQuery> for PhotoPage {
    fn from(query: PageQuery) -> Self {
        match query.page_size {
            Some(size) if size > 0 => PhotoPage::new(size, query.page_num.unwrap_or(0)),
            _ => PhotoPage::all(),
        }
    }
}

// 非数字 id 不可能存在，直接按 404 处理
fn photo_id(raw: &str) -> Result<PhotoId, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map(PhotoId::from)
        .map_err(|_| ApiError::NotFound("Photo not found".to_string()))
}

pub async fn list_photos(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let usecase = GetPhotos::new(state.photo_dao.clone());
    let photos = usecase.handle(query.into_inner().into()).await?;
    Ok(ok_data(
        photos
            .into_iter()
            .map(PhotoResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn get_photo(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = photo_id(&path)?;
    let usecase = GetPhoto::new(state.photo_dao.clone());
    let photo = usecase.handle(id.as_i64()).await?;
    Ok(ok_data(PhotoResponse::from(photo)))
}

pub async fn create_photo(
    state: web::Data<AppState>,
    payload: web::Json<PhotoPayload>,
) -> Result<HttpResponse, ApiError> {
    let cmd = CreatePhotoCmd {
        photo: payload.into_inner().into_new_photo()?,
    };
    let photo = state
        .photo_service()
        .create_photo(cmd)
        .await
        .map_err(|e| ApiError::from_app(e, "Failed to create photo"))?;
    Ok(ok_success(PhotoResponse::from(photo)))
}

pub async fn update_photo(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<PhotoPayload>,
) -> Result<HttpResponse, ApiError> {
    let cmd = UpdatePhotoCmd {
        id: photo_id(&path)?,
        patch: payload.into_inner().into_patch()?,
    };
    let photo = state
        .photo_service()
        .update_photo(cmd)
        .await
        .map_err(|e| ApiError::from_app(e, "Failed to update photo"))?;
    Ok(ok_success(PhotoResponse::from(photo)))
}

pub async fn delete_photo(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = photo_id(&path)?;
    let photo = state
        .photo_service()
        .delete_photo(id)
        .await
        .map_err(|e| ApiError::from_app(e, "Failed to delete photo"))?;
    Ok(ok_success(PhotoResponse::from(photo)))
}

pub fn configure_service() -> Scope {
    web::scope(consts::URL_PATH_PHOTOS)
        .service(
            web::resource("")
                .route(web::get().to(list_photos))
                .route(web::post().to(create_photo)),
        )
        .service(
            web::resource("/{id}")
                .route(web::get().to(get_photo))
                .route(web::patch().to(update_photo))
                .route(web::delete().to(delete_photo)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_timestamp_shapes() {
        let expected = NaiveDateTime::parse_from_str("2024-03-01 09:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-01T09:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T18:30:00+09:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T09:30:00.000").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn page_query_without_size_lists_everything() {
        assert_eq!(PhotoPage::from(PageQuery::default()), PhotoPage::all());
        let query = PageQuery {
            page_size: Some(10),
            page_num: Some(2),
        };
        assert_eq!(PhotoPage::from(query), PhotoPage::new(10, 2));
    }
}
