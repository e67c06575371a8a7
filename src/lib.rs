// ABOUTME: Library module for redmine-pg-migrator
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod migration;
pub mod postgres;
pub mod sqlite;
pub mod utils;
