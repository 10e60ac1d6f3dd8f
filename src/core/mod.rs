//! Core module - shared infrastructure for Itinera
//!
//! This module contains foundational types, configuration, error handling
//! and retry policy used throughout the application.

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::Config;
pub use error::{ItineraError, Result};
pub use types::*;
