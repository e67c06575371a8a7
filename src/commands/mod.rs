// ABOUTME: Command implementations
// ABOUTME: Exports the one-shot migrate command

pub mod migrate;

pub use migrate::migrate;
