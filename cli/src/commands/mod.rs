//! Command implementations

pub mod config;
pub mod redirects;
pub mod version;
