pub mod app;
pub mod core;
pub mod engine;
pub mod enrich;
pub mod scan;
pub mod store;
