use crate::value::PhotoId;
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use thiserror::Error;

/// 照片领域错误
#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("database error: {0}")]
    DbErr(String),
    #[error("photo not found: {0}")]
    NotFound(PhotoId),
    #[error("validation error: {0}")]
    ValidationErr(String),
}

/// 拍摄地点（由客户端反向地理编码后上传）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub full_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

impl GeoLocation {
    fn normalized(self) -> Self {
        Self {
            country: clean(self.country),
            country_code: clean(self.country_code).map(|c| c.to_ascii_uppercase()),
            region: clean(self.region),
            city: clean(self.city),
            district: clean(self.district),
            full_address: clean(self.full_address),
            ..self
        }
    }
}

/// 相机 EXIF 信息
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Exif {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_model: Option<String>,
    pub focal_length: Option<f64>,
    pub focal_length_in_35mm_film: Option<i32>,
    pub f_number: Option<f64>,
    pub iso: Option<i32>,
    pub exposure_time: Option<f64>,
    pub exposure_compensation: Option<f64>,
}

impl Exif {
    fn normalized(self) -> Self {
        Self {
            camera_make: clean(self.camera_make),
            camera_model: clean(self.camera_model),
            lens_model: clean(self.lens_model),
            ..self
        }
    }
}

/// 新照片的输入数据，图片二进制已经由外部存储保存
#[derive(Debug, Clone, Default)]
pub struct NewPhoto {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub blur_data: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub aspect_ratio: Option<f64>,
    pub date_time_original: Option<NaiveDateTime>,
    pub location: GeoLocation,
    pub exif: Exif,
}

/// Partial update. `None` leaves a field untouched; a blank string clears an
/// optional text field.
#[derive(Debug, Clone, Default)]
pub struct PhotoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
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
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_model: Option<String>,
    pub focal_length: Option<f64>,
    pub focal_length_in_35mm_film: Option<i32>,
    pub f_number: Option<f64>,
    pub iso: Option<i32>,
    pub exposure_time: Option<f64>,
    pub exposure_compensation: Option<f64>,
}

/// 照片聚合根
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: PhotoId,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub blur_data: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub aspect_ratio: Option<f64>,
    pub date_time_original: Option<NaiveDateTime>,
    pub location: GeoLocation,
    pub exif: Exif,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Photo {
    pub fn create(id: PhotoId, new_photo: NewPhoto, now: NaiveDateTime) -> Result<Self, PhotoError> {
        let title = required("title", new_photo.title)?;
        let image_url = required("imageUrl", new_photo.image_url)?;
        let photo = Self {
            id,
            title,
            description: clean(new_photo.description),
            image_url,
            blur_data: clean(new_photo.blur_data),
            width: new_photo.width,
            height: new_photo.height,
            aspect_ratio: new_photo.aspect_ratio.or_else(|| aspect_ratio_of(new_photo.width, new_photo.height)),
            date_time_original: new_photo.date_time_original,
            location: new_photo.location.normalized(),
            exif: new_photo.exif.normalized(),
            created_at: now,
            updated_at: now,
        };
        photo.check_ranges()?;
        Ok(photo)
    }

    pub fn apply(&mut self, patch: PhotoPatch, now: NaiveDateTime) -> Result<&mut Self, PhotoError> {
        if let Some(title) = patch.title {
            self.title = required("title", title)?;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = required("imageUrl", image_url)?;
        }
        if patch.description.is_some() {
            self.description = clean(patch.description);
        }
        if patch.blur_data.is_some() {
            self.blur_data = clean(patch.blur_data);
        }
        replace(&mut self.width, patch.width);
        replace(&mut self.height, patch.height);
        replace(&mut self.aspect_ratio, patch.aspect_ratio);
        replace(&mut self.date_time_original, patch.date_time_original);

        let location = &mut self.location;
        replace_text(&mut location.country, patch.country);
        replace_text(&mut location.country_code, patch.country_code);
        location.country_code = location.country_code.take().map(|c| c.to_ascii_uppercase());
        replace_text(&mut location.region, patch.region);
        replace_text(&mut location.city, patch.city);
        replace_text(&mut location.district, patch.district);
        replace_text(&mut location.full_address, patch.full_address);
        replace(&mut location.latitude, patch.latitude);
        replace(&mut location.longitude, patch.longitude);
        replace(&mut location.altitude, patch.altitude);

        let exif = &mut self.exif;
        replace_text(&mut exif.camera_make, patch.camera_make);
        replace_text(&mut exif.camera_model, patch.camera_model);
        replace_text(&mut exif.lens_model, patch.lens_model);
        replace(&mut exif.focal_length, patch.focal_length);
        replace(&mut exif.focal_length_in_35mm_film, patch.focal_length_in_35mm_film);
        replace(&mut exif.f_number, patch.f_number);
        replace(&mut exif.iso, patch.iso);
        replace(&mut exif.exposure_time, patch.exposure_time);
        replace(&mut exif.exposure_compensation, patch.exposure_compensation);

        self.check_ranges()?;
        self.updated_at = now;
        Ok(self)
    }

    fn check_ranges(&self) -> Result<(), PhotoError> {
        in_range("latitude", self.location.latitude, -90.0, 90.0)?;
        in_range("longitude", self.location.longitude, -180.0, 180.0)?;
        if let Some(ratio) = self.aspect_ratio {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(PhotoError::ValidationErr(format!(
                    "aspectRatio must be positive, got {}",
                    ratio
                )));
            }
        }
        Ok(())
    }
}

/// Cover precedence: most recently captured first, photos without a capture
/// time last, then lowest id.
pub fn newest_first(a: &Photo, b: &Photo) -> Ordering {
    match (&a.date_time_original, &b.date_time_original) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(field: &str, value: String) -> Result<String, PhotoError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PhotoError::ValidationErr(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn in_range(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<(), PhotoError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(PhotoError::ValidationErr(format!(
            "{} must be within [{}, {}], got {}",
            field, min, max, v
        ))),
        _ => Ok(()),
    }
}

fn replace<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn replace_text(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = clean(value);
    }
}

fn aspect_ratio_of(width: Option<i32>, height: Option<i32>) -> Option<f64> {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(w as f64 / h as f64),
        _ => None,
    }
}
