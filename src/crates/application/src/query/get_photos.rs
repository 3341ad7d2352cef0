use crate::query::dao::PhotoDao;
use crate::query::QueryError;
use domain::photo::Photo;
use model::photo::PhotoPage;
use std::sync::Arc;

#[derive(Clone)]
pub struct GetPhotos {
    dao: Arc<dyn PhotoDao + Send + Sync>,
}

impl GetPhotos {
    pub fn new(dao: Arc<dyn PhotoDao + Send + Sync>) -> Self {
        Self { dao }
    }

    pub async fn handle(&self, page: PhotoPage) -> Result<Vec<Photo>, QueryError> {
        self.dao.get_page(page).await
    }
}

#[derive(Clone)]
pub struct GetPhoto {
    dao: Arc<dyn PhotoDao + Send + Sync>,
}

impl GetPhoto {
    pub fn new(dao: Arc<dyn PhotoDao + Send + Sync>) -> Self {
        Self { dao }
    }

    pub async fn handle(&self, id: i64) -> Result<Photo, QueryError> {
        self.dao
            .get_by_id(id)
            .await?
            .ok_or_else(|| QueryError::NotFound("Photo not found".to_string()))
    }
}
