//! CLI subcommands.

pub mod batch;
pub mod export;
pub mod process;

use ttn_core::models::config::PipelineConfig;

/// Load configuration from a file or fall back to defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PipelineConfig> {
    match config_path {
        Some(path) => Ok(PipelineConfig::from_file(std::path::Path::new(path))?),
        None => Ok(PipelineConfig::default()),
    }
}
