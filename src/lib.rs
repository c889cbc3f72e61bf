pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;
