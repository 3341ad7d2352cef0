use crate::query::dao::CitySetDao;
use crate::query::QueryError;
use domain::city_set::CitySetKey;
use model::city_set::CitySetView;
use std::sync::Arc;

#[derive(Clone)]
pub struct GetCitySets {
    dao: Arc<dyn CitySetDao + Send + Sync>,
}

impl GetCitySets {
    pub fn new(dao: Arc<dyn CitySetDao + Send + Sync>) -> Self {
        Self { dao }
    }

    pub async fn handle(&self) -> Result<Vec<CitySetView>, QueryError> {
        self.dao.get_all().await
    }
}

#[derive(Clone)]
pub struct GetCitySet {
    dao: Arc<dyn CitySetDao + Send + Sync>,
}

impl GetCitySet {
    pub fn new(dao: Arc<dyn CitySetDao + Send + Sync>) -> Self {
        Self { dao }
    }

    pub async fn handle(&self, country: &str, city: &str) -> Result<CitySetView, QueryError> {
        let (country, city) = (country.trim(), city.trim());
        if country.is_empty() || city.is_empty() {
            return Err(QueryError::InvalidParameter(
                "country and city are required".to_string(),
            ));
        }
        self.dao
            .get_by_key(&CitySetKey::new(country, city))
            .await?
            .ok_or_else(|| QueryError::NotFound("City set not found".to_string()))
    }
}
