use crate::error::AppError;
use chrono::NaiveDateTime;
use domain::city_set::{tally_photos, CitySet, CitySetKey, GroupingPolicy};
use domain::photo::Photo;
use domain::unit_of_work::PhotoUnitOfWork;
use log::{debug, info, warn};

/// CitySetProjector 在照片写事务内维护 (country, city) 聚合
///
/// Every method runs against an open unit of work and leaves committing to
/// the caller, so the photo row and the aggregate land together or not at all.
#[derive(Debug, Clone, Default)]
pub struct CitySetProjector {
    policy: GroupingPolicy,
}

impl CitySetProjector {
    pub fn new(policy: GroupingPolicy) -> Self {
        Self { policy }
    }

    /// 照片已插入：计数加一，必要时设置封面
    pub async fn on_photo_created(
        &self,
        uow: &mut dyn PhotoUnitOfWork,
        photo: &Photo,
        now: NaiveDateTime,
    ) -> Result<Option<CitySet>, AppError> {
        let Some(key) = CitySetKey::derive(&photo.location, &self.policy) else {
            debug!("No geo information available for photo: {}", photo.id);
            return Ok(None);
        };
        let country_code = photo.location.country_code.as_deref();

        let mut city_set = uow.lock_or_create_city_set(&key, country_code).await?;
        city_set.record_photo(&photo.id, country_code, now);
        uow.save_city_set(&city_set).await?;

        debug!(
            "city set {} now has {} photos, cover {:?}",
            key, city_set.photo_count, city_set.cover_photo_id
        );
        Ok(Some(city_set))
    }

    /// 删除照片：先调整聚合（必要时挑选新封面），最后删除照片本身
    pub async fn on_photo_deleted(
        &self,
        uow: &mut dyn PhotoUnitOfWork,
        photo: &Photo,
        now: NaiveDateTime,
    ) -> Result<Option<CitySet>, AppError> {
        let updated = match CitySetKey::derive(&photo.location, &self.policy) {
            Some(key) => self.detach_photo(uow, &key, photo, now).await?,
            None => None,
        };
        uow.delete_photo(&photo.id).await?;
        Ok(updated)
    }

    async fn detach_photo(
        &self,
        uow: &mut dyn PhotoUnitOfWork,
        key: &CitySetKey,
        photo: &Photo,
        now: NaiveDateTime,
    ) -> Result<Option<CitySet>, AppError> {
        let Some(mut city_set) = uow.find_city_set_for_update(key).await? else {
            warn!("city set {} missing while deleting photo {}", key, photo.id);
            return Ok(None);
        };

        let replacement = if city_set.is_cover(&photo.id) {
            uow.newest_photo_in(key, &self.policy, &photo.id).await?
        } else {
            None
        };
        city_set.remove_photo(&photo.id, replacement, now);
        uow.save_city_set(&city_set).await?;
        Ok(Some(city_set))
    }

    /// 按照片表全量重算所有城市集合
    ///
    /// Sets that no longer have members are kept with a zero count.
    pub async fn rebuild(
        &self,
        uow: &mut dyn PhotoUnitOfWork,
        now: NaiveDateTime,
    ) -> Result<Vec<CitySet>, AppError> {
        let existing = uow.lock_all_city_sets().await?;
        let photos = uow.all_photos().await?;
        let mut tallies = tally_photos(&photos, &self.policy);

        let mut rebuilt = Vec::with_capacity(existing.len() + tallies.len());
        for mut city_set in existing {
            let tally = tallies.remove(&city_set.key);
            city_set.reconcile(tally.as_ref(), now);
            uow.save_city_set(&city_set).await?;
            rebuilt.push(city_set);
        }
        for (key, tally) in tallies {
            let mut city_set = uow
                .lock_or_create_city_set(&key, tally.country_code.as_deref())
                .await?;
            city_set.reconcile(Some(&tally), now);
            uow.save_city_set(&city_set).await?;
            rebuilt.push(city_set);
        }

        rebuilt.sort_by(|a, b| a.key.cmp(&b.key));
        info!(
            "rebuilt {} city sets from {} photos",
            rebuilt.len(),
            photos.len()
        );
        Ok(rebuilt)
    }
}
