pub mod config;
pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

pub use startup::{build_router, spawn_rate_limit_cleanup, AppState, Application};
