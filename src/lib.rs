pub mod api;
pub mod config;
pub mod dates;
pub mod error;
pub mod models;
pub mod portal;
pub mod scope;
pub mod services;
pub mod state;
