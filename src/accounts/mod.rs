//! Reader accounts backed by Supabase: sessions, bookmarks, author follows
//! and reading history.

pub mod bookmarks;
pub mod client;
pub mod error;
pub mod follows;
pub mod history;
mod links;
pub mod models;
pub mod profile;

pub use client::SupabaseClient;
pub use error::{AccountError, AccountResult};
