use crate::repository::postgres::command::db_data::photo;
use crate::repository::postgres::command::unit_of_work::newest_first;
use application::query::dao::PhotoDao;
use application::query::QueryError;
use async_trait::async_trait;
use domain::photo::Photo;
use model::photo::PhotoPage;
use sea_orm::*;

#[derive(Clone)]
pub struct PhotoDaoImpl {
    db: DatabaseConnection,
}

impl PhotoDaoImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PhotoDao for PhotoDaoImpl {
    async fn get_page(&self, page: PhotoPage) -> Result<Vec<Photo>, QueryError> {
        let select = newest_first(photo::Entity::find());
        let models = if page.is_paged() {
            select
                .paginate(&self.db, page.page_size)
                .fetch_page(page.page_num)
                .await
        } else {
            select.all(&self.db).await
        }
        .map_err(|e| QueryError::DbError(e.to_string()))?;
        Ok(models.into_iter().map(Photo::from).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Photo>, QueryError> {
        let model = photo::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| QueryError::DbError(e.to_string()))?;
        Ok(model.map(Photo::from))
    }
}
