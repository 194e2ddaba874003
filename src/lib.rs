pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod follows;
pub mod likes;
pub mod messages;
pub mod state;
pub mod users;
