pub mod city_set;
