pub mod accounts;
pub mod analytics;
pub mod api;
pub mod config;
pub mod content;
pub mod monitoring;
pub mod ranking;
pub mod wordpress;
