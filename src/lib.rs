pub mod aggregator;
pub mod config;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod middleware;
pub mod models;
pub mod notifier;
pub mod server;
pub mod sink;
pub mod state;
pub mod throttle;
pub mod upload;
pub mod utils;
