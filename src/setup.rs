//! Startup validation: both tools must resolve and the extraction tool's
//! license must be usable before the pipeline starts.

use anyhow::{Context, Result};
use discforge_av::tools::{HANDBRAKE_NAMES, MAKEMKV_NAMES};
use discforge_av::{resolve_tool, HandBrake, LicenseStatus, MakeMkv};

use crate::config::Config;

/// Validated handles on both external tools.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub makemkv: MakeMkv,
    pub handbrake: HandBrake,
    pub license: LicenseStatus,
}

/// Resolve the extraction tool from config or `PATH`.
pub fn resolve_makemkv(config: &Config) -> Result<MakeMkv> {
    let path = resolve_tool(MAKEMKV_NAMES, config.tools.makemkv_path.as_deref())
        .context("Setup error")?;
    tracing::debug!("Using extraction tool {}", path.display());
    Ok(MakeMkv::new(path))
}

/// Resolve the transcode tool from config or `PATH`.
pub fn resolve_handbrake(config: &Config) -> Result<HandBrake> {
    let path = resolve_tool(HANDBRAKE_NAMES, config.tools.handbrake_path.as_deref())
        .context("Setup error")?;
    tracing::debug!("Using transcode tool {}", path.display());
    Ok(HandBrake::new(path))
}

/// Resolve both tools and check the extraction tool's license.
///
/// Every error here is fatal to startup.
pub async fn prepare(config: &Config) -> Result<Toolchain> {
    let makemkv = resolve_makemkv(config)?;
    let handbrake = resolve_handbrake(config)?;

    let license = makemkv
        .check_license()
        .await
        .context("MakeMKV cannot be used")?;

    match &license.version {
        Some(version) => tracing::info!("MakeMKV {version} ready"),
        None => tracing::info!("MakeMKV ready"),
    }

    Ok(Toolchain {
        makemkv,
        handbrake,
        license,
    })
}
