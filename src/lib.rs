pub mod app;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
