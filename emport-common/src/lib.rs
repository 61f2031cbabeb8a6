//! # Emport Common Library
//!
//! Shared code for the emport service and its tooling:
//! - Error type and result alias
//! - Bootstrap configuration loading (TOML + compiled defaults)
//! - Tracing subscriber initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
