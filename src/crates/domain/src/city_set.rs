use crate::photo::{newest_first, GeoLocation, Photo};
use crate::value::{CitySetId, PhotoId};
use chrono::NaiveDateTime;
use log::warn;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CitySetError {
    #[error("database error: {0}")]
    DbErr(String),
    #[error("city set not found: {0}")]
    NotFound(String),
}

/// 城市集合的唯一键 (country, city)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CitySetKey {
    pub country: String,
    pub city: String,
}

impl CitySetKey {
    pub fn new(country: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
        }
    }

    /// Grouping key of a photo location, `None` when the photo has no geo
    /// assignment.
    pub fn derive(location: &GeoLocation, policy: &GroupingPolicy) -> Option<Self> {
        let country = location.country.as_deref()?;
        let city = policy.grouping_city(location)?;
        Some(Self::new(country, city))
    }
}

impl Display for CitySetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.country, self.city)
    }
}

/// 分组策略：部分国家（默认日本、台湾）按 region 而不是 city 归组
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingPolicy {
    region_grouped_codes: Vec<String>,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        Self::new(["JP", "TW"])
    }
}

impl GroupingPolicy {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut region_grouped_codes: Vec<String> = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        region_grouped_codes.sort();
        region_grouped_codes.dedup();
        Self {
            region_grouped_codes,
        }
    }

    pub fn region_grouped_codes(&self) -> &[String] {
        &self.region_grouped_codes
    }

    pub fn groups_by_region(&self, country_code: Option<&str>) -> bool {
        country_code.map_or(false, |code| {
            self.region_grouped_codes
                .iter()
                .any(|c| c.eq_ignore_ascii_case(code))
        })
    }

    pub fn grouping_city<'a>(&self, location: &'a GeoLocation) -> Option<&'a str> {
        if self.groups_by_region(location.country_code.as_deref()) {
            location.region.as_deref()
        } else {
            location.city.as_deref()
        }
    }
}

/// 按 (country, city) 聚合的照片集合，photo_count 与 cover_photo_id 为冗余字段
#[derive(Debug, Clone, PartialEq)]
pub struct CitySet {
    pub id: CitySetId,
    pub key: CitySetKey,
    pub country_code: Option<String>,
    pub photo_count: i32,
    pub cover_photo_id: Option<PhotoId>,
    pub updated_at: NaiveDateTime,
}

impl CitySet {
    /// Empty aggregate, the state a freshly created row starts in.
    pub fn empty(
        id: CitySetId,
        key: CitySetKey,
        country_code: Option<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            key,
            country_code,
            photo_count: 0,
            cover_photo_id: None,
            updated_at: now,
        }
    }

    pub fn is_cover(&self, photo_id: &PhotoId) -> bool {
        self.cover_photo_id.as_ref() == Some(photo_id)
    }

    /// 新增照片：计数加一，封面先到先得
    pub fn record_photo(
        &mut self,
        photo_id: &PhotoId,
        country_code: Option<&str>,
        now: NaiveDateTime,
    ) -> &mut Self {
        self.photo_count += 1;
        if self.cover_photo_id.is_none() {
            self.cover_photo_id = Some(photo_id.clone());
        }
        if let Some(code) = country_code {
            self.country_code = Some(code.to_string());
        }
        self.updated_at = now;
        self
    }

    /// 删除照片：计数减一；如果删除的是封面，换成 `replacement`
    pub fn remove_photo(
        &mut self,
        photo_id: &PhotoId,
        replacement: Option<PhotoId>,
        now: NaiveDateTime,
    ) -> &mut Self {
        if self.photo_count <= 0 {
            warn!(
                "city set {} already has photo_count {} while removing photo {}",
                self.key, self.photo_count, photo_id
            );
            self.photo_count = 0;
        } else {
            self.photo_count -= 1;
        }
        if self.is_cover(photo_id) {
            self.cover_photo_id = replacement;
        }
        self.updated_at = now;
        self
    }

    /// Overwrite the counters from a full recount. The current cover is kept
    /// while it is still a member.
    pub fn reconcile(&mut self, tally: Option<&CitySetTally>, now: NaiveDateTime) -> &mut Self {
        match tally {
            Some(tally) => {
                self.photo_count = tally.photo_ids.len() as i32;
                let keep_cover = self
                    .cover_photo_id
                    .as_ref()
                    .map_or(false, |cover| tally.photo_ids.contains(cover));
                if !keep_cover {
                    self.cover_photo_id = tally.photo_ids.first().cloned();
                }
                if tally.country_code.is_some() {
                    self.country_code = tally.country_code.clone();
                }
            }
            None => {
                self.photo_count = 0;
                self.cover_photo_id = None;
            }
        }
        self.updated_at = now;
        self
    }
}

/// 一次全量统计中某个城市集合的成员
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CitySetTally {
    pub country_code: Option<String>,
    /// Members in cover precedence order.
    pub photo_ids: Vec<PhotoId>,
}

pub fn tally_photos(photos: &[Photo], policy: &GroupingPolicy) -> BTreeMap<CitySetKey, CitySetTally> {
    let mut ordered: Vec<&Photo> = photos.iter().collect();
    ordered.sort_by(|a, b| newest_first(a, b));

    let mut tallies: BTreeMap<CitySetKey, CitySetTally> = BTreeMap::new();
    for photo in ordered {
        let Some(key) = CitySetKey::derive(&photo.location, policy) else {
            continue;
        };
        let tally = tallies.entry(key).or_default();
        if tally.country_code.is_none() {
            tally.country_code = photo.location.country_code.clone();
        }
        tally.photo_ids.push(photo.id.clone());
    }
    tallies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::NewPhoto;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn location(country: &str, code: &str, region: &str, city: &str) -> GeoLocation {
        GeoLocation {
            country: Some(country.to_string()),
            country_code: Some(code.to_string()),
            region: Some(region.to_string()),
            city: Some(city.to_string()),
            ..Default::default()
        }
    }

    fn photo(id: i64, loc: GeoLocation, hour: Option<u32>) -> Photo {
        let taken = hour.map(|h| {
            NaiveDate::from_ymd_opt(2024, 4, 1)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        });
        Photo::create(
            PhotoId::from(id),
            NewPhoto {
                title: format!("photo {}", id),
                image_url: format!("https://cdn.example.com/{}.jpg", id),
                date_time_original: taken,
                location: loc,
                ..Default::default()
            },
            now(),
        )
        .unwrap()
    }

    #[test]
    fn region_grouped_countries_use_region() {
        let policy = GroupingPolicy::default();
        let key = CitySetKey::derive(&location("Japan", "JP", "Kyoto", "Higashiyama"), &policy);
        assert_eq!(key, Some(CitySetKey::new("Japan", "Kyoto")));

        let key = CitySetKey::derive(&location("France", "FR", "Île-de-France", "Paris"), &policy);
        assert_eq!(key, Some(CitySetKey::new("France", "Paris")));
    }

    #[test]
    fn missing_geo_fields_yield_no_key() {
        let policy = GroupingPolicy::default();
        let mut loc = location("Taiwan", "TW", "Taipei", "Da'an");
        loc.region = None;
        assert_eq!(CitySetKey::derive(&loc, &policy), None);

        let loc = GeoLocation {
            city: Some("Paris".to_string()),
            ..Default::default()
        };
        assert_eq!(CitySetKey::derive(&loc, &policy), None);
    }

    #[test]
    fn policy_codes_are_normalized() {
        let policy = GroupingPolicy::new([" kr", "KR", ""]);
        assert_eq!(policy.region_grouped_codes(), &["KR".to_string()]);
        assert!(policy.groups_by_region(Some("kr")));
        assert!(!policy.groups_by_region(Some("JP")));
        assert!(!policy.groups_by_region(None));
    }

    #[test]
    fn record_photo_keeps_first_cover() {
        let mut set = CitySet::empty(CitySetId::from(1), CitySetKey::new("Japan", "Kyoto"), None, now());
        set.record_photo(&PhotoId::from(10), Some("JP"), now());
        set.record_photo(&PhotoId::from(11), Some("JP"), now());
        assert_eq!(set.photo_count, 2);
        assert_eq!(set.cover_photo_id, Some(PhotoId::from(10)));
        assert_eq!(set.country_code.as_deref(), Some("JP"));
    }

    #[test]
    fn remove_photo_replaces_cover_and_never_underflows() {
        let mut set = CitySet::empty(CitySetId::from(1), CitySetKey::new("Japan", "Kyoto"), None, now());
        set.record_photo(&PhotoId::from(10), None, now());
        set.remove_photo(&PhotoId::from(10), None, now());
        assert_eq!(set.photo_count, 0);
        assert_eq!(set.cover_photo_id, None);

        set.remove_photo(&PhotoId::from(10), None, now());
        assert_eq!(set.photo_count, 0);
    }

    #[test]
    fn remove_non_cover_keeps_cover() {
        let mut set = CitySet::empty(CitySetId::from(1), CitySetKey::new("Japan", "Kyoto"), None, now());
        set.record_photo(&PhotoId::from(10), None, now());
        set.record_photo(&PhotoId::from(11), None, now());
        set.remove_photo(&PhotoId::from(11), Some(PhotoId::from(99)), now());
        assert_eq!(set.photo_count, 1);
        assert_eq!(set.cover_photo_id, Some(PhotoId::from(10)));
    }

    #[test]
    fn tally_groups_and_orders_members() {
        let policy = GroupingPolicy::default();
        let photos = vec![
            photo(1, location("Japan", "JP", "Kyoto", "Sakyo"), Some(8)),
            photo(2, location("Japan", "JP", "Kyoto", "Higashiyama"), Some(10)),
            photo(3, location("France", "FR", "IDF", "Paris"), None),
            photo(4, GeoLocation::default(), Some(9)),
        ];
        let tallies = tally_photos(&photos, &policy);
        assert_eq!(tallies.len(), 2);
        let kyoto = &tallies[&CitySetKey::new("Japan", "Kyoto")];
        assert_eq!(kyoto.photo_ids, vec![PhotoId::from(2), PhotoId::from(1)]);
        assert_eq!(kyoto.country_code.as_deref(), Some("JP"));
    }

    #[test]
    fn reconcile_keeps_valid_cover_and_resets_orphans() {
        let mut set = CitySet::empty(CitySetId::from(1), CitySetKey::new("Japan", "Kyoto"), None, now());
        set.cover_photo_id = Some(PhotoId::from(1));
        set.photo_count = 7;
        let tally = CitySetTally {
            country_code: Some("JP".to_string()),
            photo_ids: vec![PhotoId::from(2), PhotoId::from(1)],
        };
        set.reconcile(Some(&tally), now());
        assert_eq!(set.photo_count, 2);
        assert_eq!(set.cover_photo_id, Some(PhotoId::from(1)));

        set.reconcile(None, now());
        assert_eq!(set.photo_count, 0);
        assert_eq!(set.cover_photo_id, None);
    }
}
