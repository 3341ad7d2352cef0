use crate::query::QueryError;
use async_trait::async_trait;
use domain::city_set::CitySetKey;
use domain::photo::Photo;
use model::city_set::CitySetView;
use model::photo::PhotoPage;

#[async_trait]
pub trait PhotoDao {
    /// 按拍摄时间倒序（无拍摄时间的排在最后，再按 id 升序）
    async fn get_page(&self, page: PhotoPage) -> Result<Vec<Photo>, QueryError>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Photo>, QueryError>;
}

#[async_trait]
pub trait CitySetDao {
    /// Ordered by country, then city.
    async fn get_all(&self) -> Result<Vec<CitySetView>, QueryError>;
    async fn get_by_key(&self, key: &CitySetKey) -> Result<Option<CitySetView>, QueryError>;
}
