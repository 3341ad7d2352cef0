use super::db_data::user::{self, ActiveModel, Entity};
use async_trait::async_trait;
use domain::user::{User, UserError, UserRepository};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

#[derive(Clone)]
pub struct UserRepositoryImpl {
    db: DatabaseConnection,
}

impl UserRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn count(&self) -> Result<u64, UserError> {
        user::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| UserError::DbErr(e.to_string()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let result = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| UserError::DbErr(e.to_string()))?;
        Ok(result.map(|model| model.into()))
    }

    async fn save(&self, agg: &User) -> Result<(), UserError> {
        let active_model: ActiveModel = agg.into();
        let result = Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(user::Column::Username)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| UserError::DbErr(e.to_string()))?;
        if result == 0 {
            return Err(UserError::UserExists(agg.username.clone()));
        }
        Ok(())
    }
}
