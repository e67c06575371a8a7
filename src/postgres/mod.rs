// ABOUTME: PostgreSQL destination module
// ABOUTME: Exports connection management for the migration target

pub mod connection;

pub use connection::connect;
