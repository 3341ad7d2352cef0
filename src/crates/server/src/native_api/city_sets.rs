use crate::consts;
use crate::native_api::response::{ok_data, ok_success, ApiError, CitySetResponse};
use crate::AppState;
use actix_web::{web, HttpResponse, Scope};
use application::query::get_city_sets::{GetCitySet, GetCitySets};

pub async fn list_city_sets(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let usecase = GetCitySets::new(state.city_set_dao.clone());
    let city_sets = usecase.handle().await?;
    Ok(ok_data(
        city_sets
            .into_iter()
            .map(CitySetResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn get_city_set(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (country, city) = path.into_inner();
    let usecase = GetCitySet::new(state.city_set_dao.clone());
    let city_set = usecase.handle(&country, &city).await?;
    Ok(ok_data(CitySetResponse::from(city_set)))
}

/// 按照片表全量重算城市集合
pub async fn rebuild_city_sets(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let city_sets = state
        .photo_service()
        .rebuild_city_sets()
        .await
        .map_err(|e| ApiError::from_app(e, "Failed to rebuild city sets"))?;
    Ok(ok_success(
        city_sets
            .into_iter()
            .map(CitySetResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub fn configure_service() -> Scope {
    web::scope(consts::URL_PATH_CITY_SETS)
        .route("", web::get().to(list_city_sets))
        .route("/rebuild", web::post().to(rebuild_city_sets))
        .route("/{country}/{city}", web::get().to(get_city_set))
}
