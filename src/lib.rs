pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod recommend;
pub mod tmdb;
pub mod views;
