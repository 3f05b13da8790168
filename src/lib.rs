pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod pages;
pub mod state;
