//! Global config file: `$XDG_CONFIG_HOME/codeplan/config.toml` (optional)

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use tracing::debug;

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    // No HOME means no global file, not an error.
    let Ok(path) = xdg::global_config_path() else {
        return Ok(builder);
    };
    debug!(path = %path.display(), exists = path.exists(), "Global config file");
    Ok(builder.add_source(
        File::from(path)
            .format(FileFormat::Toml)
            .required(false),
    ))
}
