pub mod config;
pub mod subscriber;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use subscriber::{build_filter, init_logging, LoggingError};
