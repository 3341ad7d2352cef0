use crate::command::shared::IdGenerator;
use crate::error::AppError;
use crate::projector::city_set::CitySetProjector;
use chrono::{NaiveDateTime, Utc};
use domain::city_set::CitySet;
use domain::photo::{NewPhoto, Photo, PhotoError, PhotoPatch};
use domain::unit_of_work::UnitOfWorkFactory;
use domain::value::PhotoId;
use log::info;
use std::sync::Arc;

#[derive(Debug)]
pub struct CreatePhotoCmd {
    pub photo: NewPhoto,
}

#[derive(Debug)]
pub struct UpdatePhotoCmd {
    pub id: PhotoId,
    pub patch: PhotoPatch,
}

/// 照片命令服务：每个命令在一个事务内完成照片写入与城市集合维护
#[derive(Clone)]
pub struct PhotoService {
    id_generator: Arc<dyn IdGenerator>,
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    projector: CitySetProjector,
}

impl PhotoService {
    pub fn new(
        id_generator: Arc<dyn IdGenerator>,
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        projector: CitySetProjector,
    ) -> Self {
        Self {
            id_generator,
            uow_factory,
            projector,
        }
    }

    pub async fn create_photo(&self, cmd: CreatePhotoCmd) -> Result<Photo, AppError> {
        let now = now();
        let id = PhotoId::from(self.id_generator.next_id().await?);
        let photo = Photo::create(id, cmd.photo, now)?;

        let mut uow = self.uow_factory.begin().await?;
        uow.insert_photo(&photo).await?;
        let city_set = self
            .projector
            .on_photo_created(uow.as_mut(), &photo, now)
            .await?;
        uow.commit().await?;

        match city_set {
            Some(city_set) => info!(
                "photo {} created in city set {} ({} photos)",
                photo.id, city_set.key, city_set.photo_count
            ),
            None => info!("photo {} created without geo assignment", photo.id),
        }
        Ok(photo)
    }

    /// 删除照片，返回被删除的记录
    pub async fn delete_photo(&self, id: PhotoId) -> Result<Photo, AppError> {
        let mut uow = self.uow_factory.begin().await?;
        let photo = uow
            .find_photo_for_update(&id)
            .await?
            .ok_or_else(|| PhotoError::NotFound(id.clone()))?;
        self.projector
            .on_photo_deleted(uow.as_mut(), &photo, now())
            .await?;
        uow.commit().await?;

        info!("photo {} deleted", photo.id);
        Ok(photo)
    }

    /// 局部更新照片。城市集合不随之调整，需要时调用 `rebuild_city_sets`
    pub async fn update_photo(&self, cmd: UpdatePhotoCmd) -> Result<Photo, AppError> {
        let mut uow = self.uow_factory.begin().await?;
        let mut photo = uow
            .find_photo_for_update(&cmd.id)
            .await?
            .ok_or_else(|| PhotoError::NotFound(cmd.id.clone()))?;
        photo.apply(cmd.patch, now())?;
        uow.update_photo(&photo).await?;
        uow.commit().await?;

        info!("photo {} updated", photo.id);
        Ok(photo)
    }

    pub async fn rebuild_city_sets(&self) -> Result<Vec<CitySet>, AppError> {
        let mut uow = self.uow_factory.begin().await?;
        let city_sets = self.projector.rebuild(uow.as_mut(), now()).await?;
        uow.commit().await?;
        Ok(city_sets)
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
