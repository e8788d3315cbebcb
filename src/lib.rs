pub mod broadcast;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod model;
pub mod reporter;
pub mod strategy;
pub mod ui;
