/// Connection pool setup and migrations
pub mod connection;
/// Row types and their queries
pub mod models;
/// Durable storage for reminder rules
pub mod store;
