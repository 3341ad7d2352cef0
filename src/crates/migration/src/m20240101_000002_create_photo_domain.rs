use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create photos table
        manager
            .create_table(
                Table::create()
                    .table(Photos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Photos::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Photos::Title).string().not_null())
                    .col(ColumnDef::new(Photos::Description).text())
                    .col(ColumnDef::new(Photos::ImageUrl).text().not_null())
                    .col(ColumnDef::new(Photos::BlurData).text())
                    .col(ColumnDef::new(Photos::Width).integer())
                    .col(ColumnDef::new(Photos::Height).integer())
                    .col(ColumnDef::new(Photos::AspectRatio).double())
                    .col(ColumnDef::new(Photos::DateTimeOriginal).date_time())
                    .col(ColumnDef::new(Photos::Country).string())
                    .col(ColumnDef::new(Photos::CountryCode).string())
                    .col(ColumnDef::new(Photos::Region).string())
                    .col(ColumnDef::new(Photos::City).string())
                    .col(ColumnDef::new(Photos::District).string())
                    .col(ColumnDef::new(Photos::FullAddress).text())
                    .col(ColumnDef::new(Photos::Latitude).double())
                    .col(ColumnDef::new(Photos::Longitude).double())
                    .col(ColumnDef::new(Photos::Altitude).double())
                    .col(ColumnDef::new(Photos::CameraMake).string())
                    .col(ColumnDef::new(Photos::CameraModel).string())
                    .col(ColumnDef::new(Photos::LensModel).string())
                    .col(ColumnDef::new(Photos::FocalLength).double())
                    .col(ColumnDef::new(Photos::FocalLengthIn35mmFilm).integer())
                    .col(ColumnDef::new(Photos::FNumber).double())
                    .col(ColumnDef::new(Photos::Iso).integer())
                    .col(ColumnDef::new(Photos::ExposureTime).double())
                    .col(ColumnDef::new(Photos::ExposureCompensation).double())
                    .col(ColumnDef::new(Photos::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Photos::UpdatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // 封面回填与分组查询用到的索引
        manager
            .create_index(
                Index::create()
                    .name("idx_photos_country_city")
                    .table(Photos::Table)
                    .col(Photos::Country)
                    .col(Photos::City)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_photos_country_region")
                    .table(Photos::Table)
                    .col(Photos::Country)
                    .col(Photos::Region)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_photos_date_time_original")
                    .table(Photos::Table)
                    .col(Photos::DateTimeOriginal)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Create city_sets table
        manager
            .create_table(
                Table::create()
                    .table(CitySets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CitySets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CitySets::Country).string().not_null())
                    .col(ColumnDef::new(CitySets::CountryCode).string())
                    .col(ColumnDef::new(CitySets::City).string().not_null())
                    .col(
                        ColumnDef::new(CitySets::PhotoCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CitySets::CoverPhotoId).big_integer())
                    .col(ColumnDef::new(CitySets::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_city_sets_cover_photo_id")
                            .from(CitySets::Table, CitySets::CoverPhotoId)
                            .to(Photos::Table, Photos::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // (country, city) 唯一，并发创建时依赖它做 ON CONFLICT
        manager
            .create_index(
                Index::create()
                    .name("idx_city_sets_country_city")
                    .table(CitySets::Table)
                    .col(CitySets::Country)
                    .col(CitySets::City)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CitySets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Photos::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Photos {
    Table,
    Id,
    Title,
    Description,
    ImageUrl,
    BlurData,
    Width,
    Height,
    AspectRatio,
    DateTimeOriginal,
    Country,
    CountryCode,
    Region,
    City,
    District,
    FullAddress,
    Latitude,
    Longitude,
    Altitude,
    CameraMake,
    CameraModel,
    LensModel,
    FocalLength,
    #[sea_orm(iden = "focal_length_in_35mm_film")]
    FocalLengthIn35mmFilm,
    FNumber,
    Iso,
    ExposureTime,
    ExposureCompensation,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CitySets {
    Table,
    Id,
    Country,
    CountryCode,
    City,
    PhotoCount,
    CoverPhotoId,
    UpdatedAt,
}
