//! LakeShore 346 common library
//!
//! Provides the pieces shared by the command-line tools:
//! - layered configuration loading (figment)
//! - logging setup (tracing-subscriber, tracing-appender)

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    load_config, load_config_from_file, AppConfig, LoggingConfig, TransferConfig,
    DEFAULT_CONFIG_FILE, ENV_PREFIX,
};
pub use error::{Error, Result};
pub use logging::{init_logging, BracketedLevelFormat};
