use domain::city_set::CitySet;
use domain::photo::Photo;
use domain::value::PhotoId;

/// 城市集合封面的展示信息
#[derive(Debug, Clone, PartialEq)]
pub struct CoverPhoto {
    pub id: PhotoId,
    pub title: String,
    pub image_url: String,
    pub blur_data: Option<String>,
    pub aspect_ratio: Option<f64>,
}

impl From<&Photo> for CoverPhoto {
    fn from(photo: &Photo) -> Self {
        Self {
            id: photo.id.clone(),
            title: photo.title.clone(),
            image_url: photo.image_url.clone(),
            blur_data: photo.blur_data.clone(),
            aspect_ratio: photo.aspect_ratio,
        }
    }
}

/// City set together with its cover photo, as the travel gallery reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct CitySetView {
    pub city_set: CitySet,
    pub cover_photo: Option<CoverPhoto>,
}

