mod types;

pub use types::*;

use anyhow::{Context, Result};
use discforge_av::{handbrake::is_hardware_codec, Container};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./discforge.toml",
        "~/.config/discforge/config.toml",
        "/etc/discforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.drive.device.trim().is_empty() {
        anyhow::bail!("drive.device cannot be empty");
    }

    if config.encoder.workers == 0 {
        anyhow::bail!("encoder.workers must be at least 1");
    }

    if let Err(e) = config.encoder.container.parse::<Container>() {
        anyhow::bail!("encoder.container: {}", e);
    }

    if config.drive.poll_interval_secs == 0 {
        tracing::warn!("drive.poll_interval_secs is 0; the drive will be polled continuously");
    }

    if !is_hardware_codec(&config.encoder.video_codec) {
        tracing::warn!(
            "encoder.video_codec '{}' is a CPU encoder; transcoding will be slow",
            config.encoder.video_codec
        );
    }

    Ok(())
}
