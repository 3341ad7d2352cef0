pub mod photo;
pub mod shared;
