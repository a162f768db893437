//! Infrastructure layer module
//!
//! - Settings profile resolution (`.env` side file, process environment, defaults)
//! - Service configuration loading
//! - Logging infrastructure

pub mod config;
pub mod logging;
