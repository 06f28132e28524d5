//! Power-aware advisor core — shared errors and configuration.

pub mod config;
pub mod error;

pub use config::SpecFetcherConfig;
pub use error::{BoxError, Error, Result};
