pub mod city_set;
pub mod photo;
