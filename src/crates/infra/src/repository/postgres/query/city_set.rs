use crate::repository::postgres::command::db_data::{city_set, photo};
use application::query::dao::CitySetDao;
use application::query::QueryError;
use async_trait::async_trait;
use domain::city_set::{CitySet, CitySetKey};
use domain::photo::Photo;
use model::city_set::{CitySetView, CoverPhoto};
use sea_orm::*;

#[derive(Clone)]
pub struct CitySetDaoImpl {
    db: DatabaseConnection,
}

impl CitySetDaoImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_view((city_set, cover): (city_set::Model, Option<photo::Model>)) -> CitySetView {
    CitySetView {
        city_set: CitySet::from(city_set),
        cover_photo: cover.map(|m| CoverPhoto::from(&Photo::from(m))),
    }
}

#[async_trait]
impl CitySetDao for CitySetDaoImpl {
    async fn get_all(&self) -> Result<Vec<CitySetView>, QueryError> {
        let rows = city_set::Entity::find()
            .find_also_related(photo::Entity)
            .order_by_asc(city_set::Column::Country)
            .order_by_asc(city_set::Column::City)
            .all(&self.db)
            .await
            .map_err(|e| QueryError::DbError(e.to_string()))?;
        Ok(rows.into_iter().map(to_view).collect())
    }

    async fn get_by_key(&self, key: &CitySetKey) -> Result<Option<CitySetView>, QueryError> {
        let row = city_set::Entity::find()
            .filter(city_set::Column::Country.eq(key.country.as_str()))
            .filter(city_set::Column::City.eq(key.city.as_str()))
            .find_also_related(photo::Entity)
            .one(&self.db)
            .await
            .map_err(|e| QueryError::DbError(e.to_string()))?;
        Ok(row.map(to_view))
    }
}
