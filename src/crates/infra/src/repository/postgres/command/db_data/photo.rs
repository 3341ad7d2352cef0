//! `SeaORM` Entity for photos table

use chrono::NaiveDateTime;
use domain::photo::{Exif, GeoLocation, Photo};
use domain::value::PhotoId;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "photos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub image_url: String,
    #[sea_orm(column_type = "Text", nullable)]
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
    #[sea_orm(column_type = "Text", nullable)]
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

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Photo {
    fn from(model: Model) -> Self {
        Photo {
            id: PhotoId::from(model.id),
            title: model.title,
            description: model.description,
            image_url: model.image_url,
            blur_data: model.blur_data,
            width: model.width,
            height: model.height,
            aspect_ratio: model.aspect_ratio,
            date_time_original: model.date_time_original,
            location: GeoLocation {
                country: model.country,
                country_code: model.country_code,
                region: model.region,
                city: model.city,
                district: model.district,
                full_address: model.full_address,
                latitude: model.latitude,
                longitude: model.longitude,
                altitude: model.altitude,
            },
            exif: Exif {
                camera_make: model.camera_make,
                camera_model: model.camera_model,
                lens_model: model.lens_model,
                focal_length: model.focal_length,
                focal_length_in_35mm_film: model.focal_length_in_35mm_film,
                f_number: model.f_number,
                iso: model.iso,
                exposure_time: model.exposure_time,
                exposure_compensation: model.exposure_compensation,
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Photo> for ActiveModel {
    fn from(photo: &Photo) -> Self {
        let location = photo.location.clone();
        let exif = photo.exif.clone();
        Self {
            id: Set(photo.id.as_i64()),
            title: Set(photo.title.clone()),
            description: Set(photo.description.clone()),
            image_url: Set(photo.image_url.clone()),
            blur_data: Set(photo.blur_data.clone()),
            width: Set(photo.width),
            height: Set(photo.height),
            aspect_ratio: Set(photo.aspect_ratio),
            date_time_original: Set(photo.date_time_original),
            country: Set(location.country),
            country_code: Set(location.country_code),
            region: Set(location.region),
            city: Set(location.city),
            district: Set(location.district),
            full_address: Set(location.full_address),
            latitude: Set(location.latitude),
            longitude: Set(location.longitude),
            altitude: Set(location.altitude),
            camera_make: Set(exif.camera_make),
            camera_model: Set(exif.camera_model),
            lens_model: Set(exif.lens_model),
            focal_length: Set(exif.focal_length),
            focal_length_in_35mm_film: Set(exif.focal_length_in_35mm_film),
            f_number: Set(exif.f_number),
            iso: Set(exif.iso),
            exposure_time: Set(exif.exposure_time),
            exposure_compensation: Set(exif.exposure_compensation),
            created_at: Set(photo.created_at),
            updated_at: Set(photo.updated_at),
        }
    }
}
