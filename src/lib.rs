pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod database;
pub mod error;
pub mod media;
pub mod telemetry;
pub mod users;
pub mod utils;
