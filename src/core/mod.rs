pub mod types;
pub mod record;
pub mod config;
pub mod error;
