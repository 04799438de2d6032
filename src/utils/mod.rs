//! Utility modules shared by the container and its hosts

pub mod env;
pub mod logging;

pub use env::{env_int, env_opt};
pub use logging::{init_logging, init_logging_from_config};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
