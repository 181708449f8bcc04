pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod filters;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod resources;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod validation;
pub mod views;

pub use api::ApiClient;
pub use app::router;
pub use config::Config;
pub use resources::Resources;
pub use state::AppState;
pub use storage::TokenStore;
