//! Headless WordPress integration.

pub mod client;
pub mod helpers;
pub mod models;

pub use client::{PostQuery, RankingPeriod, WordPressClient};
