pub const URL_PATH_AUTH: &str = "/auth";
pub const URL_PATH_PHOTOS: &str = "/photos";
pub const URL_PATH_CITY_SETS: &str = "/city-sets";

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD_LEN: usize = 12;

pub const LOGIN_MAX_ATTEMPTS: usize = 3;
pub const LOGIN_WINDOW_SECS: u64 = 60;
