// ABOUTME: Library root for stagecoach - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod applicable;
pub mod cloud;
pub mod config;
pub mod confirm;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod lock;
pub mod output;
pub mod reconcile;
pub mod types;
pub mod zones;
