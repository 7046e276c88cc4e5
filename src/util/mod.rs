//! Utility modules for deploychain

pub mod logging;

pub use logging::{init_logging, LoggingConfig};
