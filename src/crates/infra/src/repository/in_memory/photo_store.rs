use application::query::dao::{CitySetDao, PhotoDao};
use application::query::QueryError;
use async_trait::async_trait;
use chrono::Utc;
use domain::city_set::{CitySet, CitySetError, CitySetKey, GroupingPolicy};
use domain::photo::{newest_first, Photo, PhotoError};
use domain::unit_of_work::{PhotoUnitOfWork, UnitOfWorkFactory};
use domain::value::{CitySetId, PhotoId};
use model::city_set::{CitySetView, CoverPhoto};
use model::photo::PhotoPage;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct StoreState {
    photos: BTreeMap<i64, Photo>,
    city_sets: BTreeMap<CitySetKey, CitySet>,
    next_city_set_id: i64,
}

/// 内存版照片库，供测试和无数据库运行使用
///
/// A unit of work holds the store lock for its whole lifetime and edits a
/// private copy, so uncommitted changes are never visible and writers are
/// serialized.
#[derive(Clone, Default)]
pub struct InMemoryPhotoStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn photo_count(&self) -> usize {
        self.state.lock().await.photos.len()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryPhotoStore {
    async fn begin(&self) -> Result<Box<dyn PhotoUnitOfWork>, PhotoError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork { guard, working }))
    }
}

pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

#[async_trait]
impl PhotoUnitOfWork for InMemoryUnitOfWork {
    async fn insert_photo(&mut self, photo: &Photo) -> Result<(), PhotoError> {
        let id = photo.id.as_i64();
        if self.working.photos.contains_key(&id) {
            return Err(PhotoError::DbErr(format!("duplicate photo id {}", id)));
        }
        self.working.photos.insert(id, photo.clone());
        Ok(())
    }

    async fn find_photo_for_update(&mut self, id: &PhotoId) -> Result<Option<Photo>, PhotoError> {
        Ok(self.working.photos.get(&id.as_i64()).cloned())
    }

    async fn update_photo(&mut self, photo: &Photo) -> Result<(), PhotoError> {
        match self.working.photos.get_mut(&photo.id.as_i64()) {
            Some(stored) => {
                *stored = photo.clone();
                Ok(())
            }
            None => Err(PhotoError::NotFound(photo.id.clone())),
        }
    }

    async fn delete_photo(&mut self, id: &PhotoId) -> Result<(), PhotoError> {
        self.working
            .photos
            .remove(&id.as_i64())
            .ok_or_else(|| PhotoError::NotFound(id.clone()))?;
        // 与外键 ON DELETE SET NULL 一致
        for city_set in self.working.city_sets.values_mut() {
            if city_set.is_cover(id) {
                city_set.cover_photo_id = None;
            }
        }
        Ok(())
    }

    async fn all_photos(&mut self) -> Result<Vec<Photo>, PhotoError> {
        Ok(self.working.photos.values().cloned().collect())
    }

    async fn newest_photo_in(
        &mut self,
        key: &CitySetKey,
        policy: &GroupingPolicy,
        exclude: &PhotoId,
    ) -> Result<Option<PhotoId>, PhotoError> {
        Ok(self
            .working
            .photos
            .values()
            .filter(|p| &p.id != exclude)
            .filter(|p| CitySetKey::derive(&p.location, policy).as_ref() == Some(key))
            .min_by(|a, b| newest_first(a, b))
            .map(|p| p.id.clone()))
    }

    async fn find_city_set_for_update(
        &mut self,
        key: &CitySetKey,
    ) -> Result<Option<CitySet>, CitySetError> {
        Ok(self.working.city_sets.get(key).cloned())
    }

    async fn lock_or_create_city_set(
        &mut self,
        key: &CitySetKey,
        country_code: Option<&str>,
    ) -> Result<CitySet, CitySetError> {
        let state = &mut self.working;
        if let Some(existing) = state.city_sets.get(key) {
            return Ok(existing.clone());
        }
        state.next_city_set_id += 1;
        let city_set = CitySet::empty(
            CitySetId::from(state.next_city_set_id),
            key.clone(),
            country_code.map(str::to_string),
            Utc::now().naive_utc(),
        );
        state.city_sets.insert(key.clone(), city_set.clone());
        Ok(city_set)
    }

    async fn lock_all_city_sets(&mut self) -> Result<Vec<CitySet>, CitySetError> {
        Ok(self.working.city_sets.values().cloned().collect())
    }

    async fn save_city_set(&mut self, city_set: &CitySet) -> Result<(), CitySetError> {
        match self.working.city_sets.get_mut(&city_set.key) {
            Some(stored) => {
                *stored = city_set.clone();
                Ok(())
            }
            None => Err(CitySetError::NotFound(city_set.key.to_string())),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), PhotoError> {
        let InMemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl PhotoDao for InMemoryPhotoStore {
    async fn get_page(&self, page: PhotoPage) -> Result<Vec<Photo>, QueryError> {
        let state = self.state.lock().await;
        let mut photos: Vec<Photo> = state.photos.values().cloned().collect();
        photos.sort_by(newest_first);
        let (start, end) = page.bounds(photos.len());
        Ok(photos.drain(start..end).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Photo>, QueryError> {
        Ok(self.state.lock().await.photos.get(&id).cloned())
    }
}

fn to_view(state: &StoreState, city_set: &CitySet) -> CitySetView {
    let cover_photo = city_set
        .cover_photo_id
        .as_ref()
        .and_then(|id| state.photos.get(&id.as_i64()))
        .map(CoverPhoto::from);
    CitySetView {
        city_set: city_set.clone(),
        cover_photo,
    }
}

#[async_trait]
impl CitySetDao for InMemoryPhotoStore {
    async fn get_all(&self) -> Result<Vec<CitySetView>, QueryError> {
        let state = self.state.lock().await;
        Ok(state
            .city_sets
            .values()
            .map(|city_set| to_view(&state, city_set))
            .collect())
    }

    async fn get_by_key(&self, key: &CitySetKey) -> Result<Option<CitySetView>, QueryError> {
        let state = self.state.lock().await;
        Ok(state.city_sets.get(key).map(|city_set| to_view(&state, city_set)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_generator::SnowflakeIdGenerator;
    use application::command::photo::{CreatePhotoCmd, PhotoService, UpdatePhotoCmd};
    use application::error::AppError;
    use application::projector::city_set::CitySetProjector;
    use chrono::{NaiveDate, NaiveDateTime};
    use domain::photo::{GeoLocation, NewPhoto, PhotoPatch};

    fn taken(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn located(country: &str, code: &str, region: &str, city: &str) -> GeoLocation {
        GeoLocation {
            country: Some(country.to_string()),
            country_code: Some(code.to_string()),
            region: Some(region.to_string()),
            city: Some(city.to_string()),
            ..Default::default()
        }
    }

    fn kyoto() -> GeoLocation {
        located("Japan", "JP", "Kyoto", "Higashiyama")
    }

    fn new_photo(title: &str, location: GeoLocation, day: Option<u32>) -> CreatePhotoCmd {
        CreatePhotoCmd {
            photo: NewPhoto {
                title: title.to_string(),
                image_url: format!("https://cdn.example.com/{}.jpg", title),
                date_time_original: day.map(taken),
                location,
                ..Default::default()
            },
        }
    }

    fn service_on(factory: Arc<dyn UnitOfWorkFactory>) -> PhotoService {
        PhotoService::new(
            Arc::new(SnowflakeIdGenerator::new(7).unwrap()),
            factory,
            CitySetProjector::new(GroupingPolicy::default()),
        )
    }

    fn setup() -> (InMemoryPhotoStore, PhotoService) {
        let store = InMemoryPhotoStore::new();
        let service = service_on(Arc::new(store.clone()));
        (store, service)
    }

    async fn city_set(store: &InMemoryPhotoStore, country: &str, city: &str) -> CitySet {
        store
            .get_by_key(&CitySetKey::new(country, city))
            .await
            .unwrap()
            .expect("city set should exist")
            .city_set
    }

    #[tokio::test]
    async fn first_photo_creates_set_and_becomes_cover() {
        let (store, service) = setup();
        let photo = service
            .create_photo(new_photo("temple", kyoto(), Some(1)))
            .await
            .unwrap();

        let set = city_set(&store, "Japan", "Kyoto").await;
        assert_eq!(set.photo_count, 1);
        assert_eq!(set.cover_photo_id, Some(photo.id.clone()));
        assert_eq!(set.country_code.as_deref(), Some("JP"));

        let view = store.get_all().await.unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].cover_photo.as_ref().map(|c| &c.id), Some(&photo.id));
    }

    #[tokio::test]
    async fn later_photos_keep_the_existing_cover() {
        let (store, service) = setup();
        let first = service
            .create_photo(new_photo("old", kyoto(), Some(1)))
            .await
            .unwrap();
        service
            .create_photo(new_photo("newer", kyoto(), Some(20)))
            .await
            .unwrap();

        let set = city_set(&store, "Japan", "Kyoto").await;
        assert_eq!(set.photo_count, 2);
        assert_eq!(set.cover_photo_id, Some(first.id));
    }

    #[tokio::test]
    async fn other_countries_group_by_city() {
        let (store, service) = setup();
        service
            .create_photo(new_photo(
                "louvre",
                located("France", "fr", "Île-de-France", "Paris"),
                None,
            ))
            .await
            .unwrap();

        let set = city_set(&store, "France", "Paris").await;
        assert_eq!(set.photo_count, 1);
        assert_eq!(set.country_code.as_deref(), Some("FR"));
        assert!(store
            .get_by_key(&CitySetKey::new("France", "Île-de-France"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn photo_without_geo_is_stored_but_not_grouped() {
        let (store, service) = setup();
        let no_city = GeoLocation {
            country: Some("Iceland".to_string()),
            ..Default::default()
        };
        service
            .create_photo(new_photo("glacier", no_city, None))
            .await
            .unwrap();
        service
            .create_photo(new_photo("nowhere", GeoLocation::default(), None))
            .await
            .unwrap();

        assert_eq!(store.photo_count().await, 2);
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_photo_without_geo_leaves_sets_untouched() {
        let (store, service) = setup();
        service
            .create_photo(new_photo("temple", kyoto(), Some(1)))
            .await
            .unwrap();
        let plain = service
            .create_photo(new_photo("plain", GeoLocation::default(), Some(2)))
            .await
            .unwrap();
        let before = store.get_all().await.unwrap();

        service.delete_photo(plain.id).await.unwrap();

        assert_eq!(store.get_all().await.unwrap(), before);
        assert_eq!(store.photo_count().await, 1);
    }

    #[tokio::test]
    async fn deleting_a_photo_whose_set_is_missing_still_deletes_it() {
        let (store, service) = setup();
        let photo = service
            .create_photo(new_photo("wanderer", kyoto(), Some(1)))
            .await
            .unwrap();
        service
            .update_photo(UpdatePhotoCmd {
                id: photo.id.clone(),
                patch: PhotoPatch {
                    region: Some("Nara".to_string()),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        let deleted = service.delete_photo(photo.id.clone()).await.unwrap();
        assert_eq!(deleted.id, photo.id);
        assert_eq!(store.photo_count().await, 0);
        assert!(store
            .get_by_key(&CitySetKey::new("Japan", "Nara"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_non_cover_keeps_the_cover() {
        let (store, service) = setup();
        let cover = service
            .create_photo(new_photo("a", kyoto(), Some(1)))
            .await
            .unwrap();
        let other = service
            .create_photo(new_photo("b", kyoto(), Some(2)))
            .await
            .unwrap();

        let deleted = service.delete_photo(other.id.clone()).await.unwrap();
        assert_eq!(deleted.id, other.id);

        let set = city_set(&store, "Japan", "Kyoto").await;
        assert_eq!(set.photo_count, 1);
        assert_eq!(set.cover_photo_id, Some(cover.id));
    }

    #[tokio::test]
    async fn deleting_the_cover_promotes_the_newest_remaining_photo() {
        let (store, service) = setup();
        let cover = service
            .create_photo(new_photo("first", kyoto(), Some(5)))
            .await
            .unwrap();
        let undated = service
            .create_photo(new_photo("undated", kyoto(), None))
            .await
            .unwrap();
        let newest = service
            .create_photo(new_photo("newest", kyoto(), Some(28)))
            .await
            .unwrap();
        service
            .create_photo(new_photo("middle", kyoto(), Some(12)))
            .await
            .unwrap();

        service.delete_photo(cover.id).await.unwrap();
        let set = city_set(&store, "Japan", "Kyoto").await;
        assert_eq!(set.photo_count, 3);
        assert_eq!(set.cover_photo_id, Some(newest.id.clone()));
        assert_ne!(set.cover_photo_id, Some(undated.id));
    }

    #[tokio::test]
    async fn equal_capture_times_prefer_the_lowest_id() {
        let (store, service) = setup();
        let cover = service
            .create_photo(new_photo("cover", kyoto(), Some(1)))
            .await
            .unwrap();
        let earlier_id = service
            .create_photo(new_photo("twin-a", kyoto(), Some(9)))
            .await
            .unwrap();
        service
            .create_photo(new_photo("twin-b", kyoto(), Some(9)))
            .await
            .unwrap();

        service.delete_photo(cover.id).await.unwrap();
        let set = city_set(&store, "Japan", "Kyoto").await;
        assert_eq!(set.cover_photo_id, Some(earlier_id.id));
    }

    #[tokio::test]
    async fn deleting_the_last_photo_leaves_an_empty_set() {
        let (store, service) = setup();
        let only = service
            .create_photo(new_photo("only", kyoto(), Some(3)))
            .await
            .unwrap();

        service.delete_photo(only.id).await.unwrap();
        let set = city_set(&store, "Japan", "Kyoto").await;
        assert_eq!(set.photo_count, 0);
        assert_eq!(set.cover_photo_id, None);
        assert_eq!(store.photo_count().await, 0);
    }

    #[tokio::test]
    async fn deleting_an_unknown_photo_is_not_found() {
        let (_, service) = setup();
        let result = service.delete_photo(PhotoId::from(42)).await;
        assert!(matches!(
            result,
            Err(AppError::PhotoError(PhotoError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn invalid_photo_is_rejected_before_writing() {
        let (store, service) = setup();
        let result = service.create_photo(new_photo("  ", kyoto(), None)).await;
        assert!(matches!(
            result,
            Err(AppError::PhotoError(PhotoError::ValidationErr(_)))
        ));
        assert_eq!(store.photo_count().await, 0);
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_leaves_sets_alone_until_rebuild() {
        let (store, service) = setup();
        let photo = service
            .create_photo(new_photo("moved", kyoto(), Some(1)))
            .await
            .unwrap();

        let updated = service
            .update_photo(UpdatePhotoCmd {
                id: photo.id.clone(),
                patch: PhotoPatch {
                    title: Some("moved to Osaka".to_string()),
                    region: Some("Osaka".to_string()),
                    ..Default::default()
                },
            })
            .await
            .unwrap();
        assert_eq!(updated.title, "moved to Osaka");
        assert_eq!(city_set(&store, "Japan", "Kyoto").await.photo_count, 1);
        assert!(store
            .get_by_key(&CitySetKey::new("Japan", "Osaka"))
            .await
            .unwrap()
            .is_none());

        let rebuilt = service.rebuild_city_sets().await.unwrap();
        assert_eq!(rebuilt.len(), 2);
        let kyoto_set = city_set(&store, "Japan", "Kyoto").await;
        assert_eq!(kyoto_set.photo_count, 0);
        assert_eq!(kyoto_set.cover_photo_id, None);
        let osaka = city_set(&store, "Japan", "Osaka").await;
        assert_eq!(osaka.photo_count, 1);
        assert_eq!(osaka.cover_photo_id, Some(photo.id));
    }

    #[tokio::test]
    async fn photos_page_newest_first() {
        let (store, service) = setup();
        let undated = service
            .create_photo(new_photo("undated", kyoto(), None))
            .await
            .unwrap();
        let old = service
            .create_photo(new_photo("old", kyoto(), Some(1)))
            .await
            .unwrap();
        let new = service
            .create_photo(new_photo("new", kyoto(), Some(2)))
            .await
            .unwrap();

        let all: Vec<PhotoId> = store
            .get_page(PhotoPage::all())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(all, vec![new.id, old.id.clone(), undated.id]);

        let second = store.get_page(PhotoPage::new(1, 1)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, old.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_count_every_photo() {
        let (store, service) = setup();
        let mut handles = Vec::new();
        for i in 0..16 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .create_photo(new_photo(&format!("p{}", i), kyoto(), Some(1 + i % 20)))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let set = city_set(&store, "Japan", "Kyoto").await;
        assert_eq!(set.photo_count, 16);
        assert!(set.cover_photo_id.is_some());
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    /// Unit of work whose city set writes always fail.
    struct BrokenCitySets(InMemoryPhotoStore);

    struct BrokenUnitOfWork(Box<dyn PhotoUnitOfWork>);

    #[async_trait]
    impl UnitOfWorkFactory for BrokenCitySets {
        async fn begin(&self) -> Result<Box<dyn PhotoUnitOfWork>, PhotoError> {
            Ok(Box::new(BrokenUnitOfWork(self.0.begin().await?)))
        }
    }

    #[async_trait]
    impl PhotoUnitOfWork for BrokenUnitOfWork {
        async fn insert_photo(&mut self, photo: &Photo) -> Result<(), PhotoError> {
            self.0.insert_photo(photo).await
        }

        async fn find_photo_for_update(
            &mut self,
            id: &PhotoId,
        ) -> Result<Option<Photo>, PhotoError> {
            self.0.find_photo_for_update(id).await
        }

        async fn update_photo(&mut self, photo: &Photo) -> Result<(), PhotoError> {
            self.0.update_photo(photo).await
        }

        async fn delete_photo(&mut self, id: &PhotoId) -> Result<(), PhotoError> {
            self.0.delete_photo(id).await
        }

        async fn all_photos(&mut self) -> Result<Vec<Photo>, PhotoError> {
            self.0.all_photos().await
        }

        async fn newest_photo_in(
            &mut self,
            key: &CitySetKey,
            policy: &GroupingPolicy,
            exclude: &PhotoId,
        ) -> Result<Option<PhotoId>, PhotoError> {
            self.0.newest_photo_in(key, policy, exclude).await
        }

        async fn find_city_set_for_update(
            &mut self,
            key: &CitySetKey,
        ) -> Result<Option<CitySet>, CitySetError> {
            self.0.find_city_set_for_update(key).await
        }

        async fn lock_or_create_city_set(
            &mut self,
            key: &CitySetKey,
            country_code: Option<&str>,
        ) -> Result<CitySet, CitySetError> {
            self.0.lock_or_create_city_set(key, country_code).await
        }

        async fn lock_all_city_sets(&mut self) -> Result<Vec<CitySet>, CitySetError> {
            self.0.lock_all_city_sets().await
        }

        async fn save_city_set(&mut self, _city_set: &CitySet) -> Result<(), CitySetError> {
            Err(CitySetError::DbErr("connection reset".to_string()))
        }

        async fn commit(self: Box<Self>) -> Result<(), PhotoError> {
            self.0.commit().await
        }
    }

    #[tokio::test]
    async fn failed_city_set_write_rolls_back_the_photo() {
        let store = InMemoryPhotoStore::new();
        let service = service_on(Arc::new(BrokenCitySets(store.clone())));

        let result = service
            .create_photo(new_photo("lost", kyoto(), Some(1)))
            .await;
        assert!(matches!(
            result,
            Err(AppError::CitySetError(CitySetError::DbErr(_)))
        ));
        assert_eq!(store.photo_count().await, 0);
        assert!(store.get_all().await.unwrap().is_empty());

        // 没有地理信息的照片不经过城市集合，仍然可以写入
        service
            .create_photo(new_photo("plain", GeoLocation::default(), None))
            .await
            .unwrap();
        assert_eq!(store.photo_count().await, 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_photo_and_set() {
        let store = InMemoryPhotoStore::new();
        let photo = service_on(Arc::new(store.clone()))
            .create_photo(new_photo("kept", kyoto(), Some(1)))
            .await
            .unwrap();

        let broken = service_on(Arc::new(BrokenCitySets(store.clone())));
        assert!(broken.delete_photo(photo.id.clone()).await.is_err());

        assert_eq!(store.photo_count().await, 1);
        let set = city_set(&store, "Japan", "Kyoto").await;
        assert_eq!(set.photo_count, 1);
        assert_eq!(set.cover_photo_id, Some(photo.id));
    }
}
