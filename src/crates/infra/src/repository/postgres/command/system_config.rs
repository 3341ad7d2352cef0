use super::db_data::system_config::{ActiveModel, Column, Entity};
use application::shared::SystemConfigStore;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

/// system_config 表上的键值标记
#[derive(Clone)]
pub struct SystemConfigStoreImpl {
    db: DatabaseConnection,
}

impl SystemConfigStoreImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SystemConfigStore for SystemConfigStoreImpl {
    async fn get_string(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = Entity::find()
            .filter(Column::Key.eq(key))
            .one(&self.db)
            .await?;
        Ok(row.map(|m| m.value))
    }

    async fn insert_if_absent(&self, key: &str, value: &str) -> anyhow::Result<bool> {
        let now = Utc::now().naive_utc();
        let marker = ActiveModel {
            key: Set(key.to_owned()),
            value: Set(value.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // 并发启动的实例只有一个能写入
        let inserted = Entity::insert(marker)
            .on_conflict(OnConflict::column(Column::Key).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await?;
        Ok(inserted == 1)
    }
}
