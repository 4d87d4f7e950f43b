pub mod app;
pub mod config;
pub mod detail;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod habitat;
pub mod output;
pub mod page;
pub mod seed;
pub mod store;
