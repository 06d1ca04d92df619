//! Base layer: built-in defaults, so every later source only overrides.

use crate::config::CodeplanConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&CodeplanConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
