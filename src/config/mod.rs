mod engine_config;

pub use engine_config::{ConfigError, EngineConfig};
