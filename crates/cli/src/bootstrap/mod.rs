//! Process setup: config first, then logging.
mod config;
mod logging;

pub use config::load_config;
pub use logging::init_logging;
