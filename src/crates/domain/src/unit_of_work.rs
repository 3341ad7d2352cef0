use crate::city_set::{CitySet, CitySetError, CitySetKey, GroupingPolicy};
use crate::photo::{Photo, PhotoError};
use crate::value::PhotoId;
use async_trait::async_trait;

/// 照片写操作的事务边界。
///
/// A photo mutation and the city set rows it touches are written through one
/// unit of work. Dropping it without `commit` discards every change.
/// Implementations lock rows in the order photo -> city set.
#[async_trait]
pub trait PhotoUnitOfWork: Send {
    async fn insert_photo(&mut self, photo: &Photo) -> Result<(), PhotoError>;

    /// 读取照片并持有行锁直到事务结束
    async fn find_photo_for_update(&mut self, id: &PhotoId) -> Result<Option<Photo>, PhotoError>;

    async fn update_photo(&mut self, photo: &Photo) -> Result<(), PhotoError>;

    async fn delete_photo(&mut self, id: &PhotoId) -> Result<(), PhotoError>;

    async fn all_photos(&mut self) -> Result<Vec<Photo>, PhotoError>;

    /// Newest photo grouped under `key`, skipping `exclude`. Ordering follows
    /// [`crate::photo::newest_first`].
    async fn newest_photo_in(
        &mut self,
        key: &CitySetKey,
        policy: &GroupingPolicy,
        exclude: &PhotoId,
    ) -> Result<Option<PhotoId>, PhotoError>;

    async fn find_city_set_for_update(
        &mut self,
        key: &CitySetKey,
    ) -> Result<Option<CitySet>, CitySetError>;

    /// 不存在时先插入一个空集合（photo_count = 0），然后加锁返回
    async fn lock_or_create_city_set(
        &mut self,
        key: &CitySetKey,
        country_code: Option<&str>,
    ) -> Result<CitySet, CitySetError>;

    async fn lock_all_city_sets(&mut self) -> Result<Vec<CitySet>, CitySetError>;

    async fn save_city_set(&mut self, city_set: &CitySet) -> Result<(), CitySetError>;

    async fn commit(self: Box<Self>) -> Result<(), PhotoError>;
}

#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn PhotoUnitOfWork>, PhotoError>;
}
