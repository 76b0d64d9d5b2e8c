//! Core services, error types, and shared helpers.

pub mod errors;
pub mod services;
pub mod time;
pub mod utils;
