//! Data models and configuration.

pub mod config;
pub mod layout;
pub mod record;
