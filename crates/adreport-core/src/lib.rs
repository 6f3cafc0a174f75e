pub mod config;
pub mod derived;
pub mod error;
pub mod provider;
pub mod report;
pub mod store;
