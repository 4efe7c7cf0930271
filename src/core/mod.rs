//! Core business logic abstractions

pub mod account;
pub mod analytics;
pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod fetcher;
pub mod identity;
pub mod log;
pub mod quote;
pub mod rates;
