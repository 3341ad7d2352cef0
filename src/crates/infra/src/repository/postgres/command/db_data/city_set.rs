//! `SeaORM` Entity for city_sets table

use chrono::NaiveDateTime;
use domain::city_set::{CitySet, CitySetKey};
use domain::value::{CitySetId, PhotoId};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

use super::photo;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "city_sets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub country: String,
    pub country_code: Option<String>,
    pub city: String,
    pub photo_count: i32,
    pub cover_photo_id: Option<i64>,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "photo::Entity",
        from = "Column::CoverPhotoId",
        to = "photo::Column::Id",
        on_delete = "SetNull"
    )]
    CoverPhoto,
}

impl Related<photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CoverPhoto.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CitySet {
    fn from(model: Model) -> Self {
        CitySet {
            id: CitySetId::from(model.id),
            key: CitySetKey::new(model.country, model.city),
            country_code: model.country_code,
            photo_count: model.photo_count,
            cover_photo_id: model.cover_photo_id.map(PhotoId::from),
            updated_at: model.updated_at,
        }
    }
}

impl From<&CitySet> for ActiveModel {
    fn from(city_set: &CitySet) -> Self {
        Self {
            id: Set(city_set.id.as_i64()),
            country: Set(city_set.key.country.clone()),
            country_code: Set(city_set.country_code.clone()),
            city: Set(city_set.key.city.clone()),
            photo_count: Set(city_set.photo_count),
            cover_photo_id: Set(city_set.cover_photo_id.as_ref().map(PhotoId::as_i64)),
            updated_at: Set(city_set.updated_at),
        }
    }
}
