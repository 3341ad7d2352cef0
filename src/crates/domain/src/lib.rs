pub mod city_set;
pub mod photo;
pub mod unit_of_work;
pub mod user;
pub mod value;
