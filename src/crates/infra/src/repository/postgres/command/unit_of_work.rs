use super::db_data::{city_set, photo};
use async_trait::async_trait;
use chrono::Utc;
use domain::city_set::{CitySet, CitySetError, CitySetKey, GroupingPolicy};
use domain::photo::{Photo, PhotoError};
use domain::unit_of_work::{PhotoUnitOfWork, UnitOfWorkFactory};
use domain::value::PhotoId;
use log::debug;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;

fn photo_err(e: DbErr) -> PhotoError {
    PhotoError::DbErr(e.to_string())
}

fn city_set_err(e: DbErr) -> CitySetError {
    CitySetError::DbErr(e.to_string())
}

/// 照片所属分组的 SQL 条件，与 `GroupingPolicy::grouping_city` 保持一致
pub(crate) fn grouping_condition(key: &CitySetKey, policy: &GroupingPolicy) -> Condition {
    let codes = policy.region_grouped_codes();
    let by_city = photo::Column::City.eq(key.city.as_str());
    let grouping = if codes.is_empty() {
        Condition::all().add(by_city)
    } else {
        Condition::any()
            .add(
                Condition::all()
                    .add(photo::Column::CountryCode.is_in(codes.iter().cloned()))
                    .add(photo::Column::Region.eq(key.city.as_str())),
            )
            .add(
                Condition::all()
                    .add(
                        Condition::any()
                            .add(photo::Column::CountryCode.is_null())
                            .add(photo::Column::CountryCode.is_not_in(codes.iter().cloned())),
                    )
                    .add(by_city),
            )
    };
    Condition::all()
        .add(photo::Column::Country.eq(key.country.as_str()))
        .add(grouping)
}

/// 拍摄时间倒序，无拍摄时间的排最后，同一时间按 id 升序
pub(crate) fn newest_first<S: QueryOrder>(select: S) -> S {
    select
        .order_by(Expr::col(photo::Column::DateTimeOriginal).is_null(), Order::Asc)
        .order_by_desc(photo::Column::DateTimeOriginal)
        .order_by_asc(photo::Column::Id)
}

/// 删除封面时挑选替代照片的查询
fn replacement_query(
    key: &CitySetKey,
    policy: &GroupingPolicy,
    exclude: &PhotoId,
) -> Select<photo::Entity> {
    let select = photo::Entity::find()
        .select_only()
        .column(photo::Column::Id)
        .filter(grouping_condition(key, policy))
        .filter(photo::Column::Id.ne(exclude.as_i64()));
    newest_first(select).limit(1)
}

#[derive(Clone)]
pub struct PostgresUnitOfWorkFactory {
    db: DatabaseConnection,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> Result<Box<dyn PhotoUnitOfWork>, PhotoError> {
        let txn = self.db.begin().await.map_err(photo_err)?;
        Ok(Box::new(PostgresUnitOfWork { txn }))
    }
}

/// 基于数据库事务的 unit of work，drop 时未提交的事务会回滚
pub struct PostgresUnitOfWork {
    txn: DatabaseTransaction,
}

impl PostgresUnitOfWork {
    async fn find_city_set(
        &self,
        key: &CitySetKey,
    ) -> Result<Option<city_set::Model>, CitySetError> {
        city_set::Entity::find()
            .filter(city_set::Column::Country.eq(key.country.as_str()))
            .filter(city_set::Column::City.eq(key.city.as_str()))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(city_set_err)
    }
}

#[async_trait]
impl PhotoUnitOfWork for PostgresUnitOfWork {
    async fn insert_photo(&mut self, photo: &Photo) -> Result<(), PhotoError> {
        photo::Entity::insert(photo::ActiveModel::from(photo))
            .exec_without_returning(&self.txn)
            .await
            .map_err(photo_err)?;
        Ok(())
    }

    async fn find_photo_for_update(&mut self, id: &PhotoId) -> Result<Option<Photo>, PhotoError> {
        let model = photo::Entity::find_by_id(id.as_i64())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(photo_err)?;
        Ok(model.map(Photo::from))
    }

    async fn update_photo(&mut self, photo: &Photo) -> Result<(), PhotoError> {
        match photo::ActiveModel::from(photo).update(&self.txn).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(PhotoError::NotFound(photo.id.clone())),
            Err(e) => Err(photo_err(e)),
        }
    }

    async fn delete_photo(&mut self, id: &PhotoId) -> Result<(), PhotoError> {
        let result = photo::Entity::delete_by_id(id.as_i64())
            .exec(&self.txn)
            .await
            .map_err(photo_err)?;
        if result.rows_affected == 0 {
            return Err(PhotoError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn all_photos(&mut self) -> Result<Vec<Photo>, PhotoError> {
        let models = photo::Entity::find()
            .all(&self.txn)
            .await
            .map_err(photo_err)?;
        Ok(models.into_iter().map(Photo::from).collect())
    }

    async fn newest_photo_in(
        &mut self,
        key: &CitySetKey,
        policy: &GroupingPolicy,
        exclude: &PhotoId,
    ) -> Result<Option<PhotoId>, PhotoError> {
        let id: Option<i64> = replacement_query(key, policy, exclude)
            .into_tuple()
            .one(&self.txn)
            .await
            .map_err(photo_err)?;
        Ok(id.map(PhotoId::from))
    }

    async fn find_city_set_for_update(
        &mut self,
        key: &CitySetKey,
    ) -> Result<Option<CitySet>, CitySetError> {
        Ok(self.find_city_set(key).await?.map(CitySet::from))
    }

    async fn lock_or_create_city_set(
        &mut self,
        key: &CitySetKey,
        country_code: Option<&str>,
    ) -> Result<CitySet, CitySetError> {
        // 空集合占位后再加锁，并发创建同一 (country, city) 时只会有一行
        let placeholder = city_set::ActiveModel {
            id: NotSet,
            country: Set(key.country.clone()),
            country_code: Set(country_code.map(str::to_string)),
            city: Set(key.city.clone()),
            photo_count: Set(0),
            cover_photo_id: Set(None),
            updated_at: Set(Utc::now().naive_utc()),
        };
        let inserted = city_set::Entity::insert(placeholder)
            .on_conflict(
                OnConflict::columns([city_set::Column::Country, city_set::Column::City])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.txn)
            .await
            .map_err(city_set_err)?;
        if inserted > 0 {
            debug!("created city set {}", key);
        }

        self.find_city_set(key)
            .await?
            .map(CitySet::from)
            .ok_or_else(|| CitySetError::NotFound(key.to_string()))
    }

    async fn lock_all_city_sets(&mut self) -> Result<Vec<CitySet>, CitySetError> {
        let models = city_set::Entity::find()
            .order_by_asc(city_set::Column::Country)
            .order_by_asc(city_set::Column::City)
            .lock_exclusive()
            .all(&self.txn)
            .await
            .map_err(city_set_err)?;
        Ok(models.into_iter().map(CitySet::from).collect())
    }

    async fn save_city_set(&mut self, city_set: &CitySet) -> Result<(), CitySetError> {
        match city_set::ActiveModel::from(city_set).update(&self.txn).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(CitySetError::NotFound(city_set.key.to_string())),
            Err(e) => Err(city_set_err(e)),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), PhotoError> {
        let uow = *self;
        uow.txn.commit().await.map_err(photo_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacement_sql(policy: &GroupingPolicy) -> String {
        replacement_query(&CitySetKey::new("Japan", "Kyoto"), policy, &PhotoId::from(5))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn replacement_query_matches_grouping_and_cover_order() {
        let sql = replacement_sql(&GroupingPolicy::new(["JP", "TW"]));

        assert!(sql.contains(r#""photos"."country" = 'Japan'"#), "{}", sql);
        assert!(sql.contains(r#""photos"."region" = 'Kyoto'"#), "{}", sql);
        assert!(sql.contains(r#""photos"."country_code" IS NULL"#), "{}", sql);
        assert!(sql.contains(r#""photos"."country_code" NOT IN ("#), "{}", sql);
        assert!(sql.contains(r#""photos"."city" = 'Kyoto'"#), "{}", sql);
        assert!(sql.contains(r#""photos"."id" <> 5"#), "{}", sql);
        assert!(
            sql.ends_with(
                r#"ORDER BY "date_time_original" IS NULL ASC, "photos"."date_time_original" DESC, "photos"."id" ASC LIMIT 1"#
            ),
            "{}",
            sql
        );
    }

    #[test]
    fn without_region_grouping_only_city_is_matched() {
        let sql = replacement_sql(&GroupingPolicy::new(Vec::<String>::new()));

        assert!(sql.contains(r#""photos"."city" = 'Kyoto'"#), "{}", sql);
        assert!(!sql.contains("region"), "{}", sql);
        assert!(!sql.contains("country_code"), "{}", sql);
    }
}
