pub mod config;
pub mod event;

pub use config::{ConfigError, SessionConfig, SessionConfigBuilder};
pub use event::{Dispatcher, EventKind, SessionEvent};
