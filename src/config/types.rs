use discforge_av::{Container, EncodeSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub drive: DriveConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub encoder: EncoderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriveConfig {
    /// Drive identifier, used both for OS queries and as the extraction
    /// tool's `dev:` source (e.g. `/dev/sr0` or `D:`).
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Eject once every selected title has been extracted.
    #[serde(default = "default_true")]
    pub eject_on_completion: bool,

    #[serde(default = "default_eject_timeout")]
    pub eject_timeout_secs: u64,

    /// Pause after an abandoned session before polling again.
    #[serde(default = "default_fault_delay")]
    pub fault_delay_secs: u64,
}

#[cfg(windows)]
fn default_device() -> String {
    "D:".to_string()
}

#[cfg(not(windows))]
fn default_device() -> String {
    "/dev/sr0".to_string()
}

fn default_poll_interval() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

fn default_eject_timeout() -> u64 {
    10
}

fn default_fault_delay() -> u64 {
    5
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            poll_interval_secs: default_poll_interval(),
            eject_on_completion: true,
            eject_timeout_secs: default_eject_timeout(),
            fault_delay_secs: default_fault_delay(),
        }
    }
}

impl DriveConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn eject_timeout(&self) -> Duration {
        Duration::from_secs(self.eject_timeout_secs)
    }

    pub fn fault_delay(&self) -> Duration {
        Duration::from_secs(self.fault_delay_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Root for extracted containers and session logs.
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,

    /// Root for delivery files.
    #[serde(default = "default_encoded_dir")]
    pub encoded_dir: PathBuf,
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("./raw")
}

fn default_encoded_dir() -> PathBuf {
    PathBuf::from("./encoded")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            encoded_dir: default_encoded_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Explicit extraction tool path; `PATH` is searched when unset or missing.
    pub makemkv_path: Option<PathBuf>,

    /// Explicit transcode tool path; `PATH` is searched when unset or missing.
    pub handbrake_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Titles shorter than this many seconds are treated as junk.
    #[serde(default = "default_min_title_length")]
    pub min_title_length: u64,
}

fn default_min_title_length() -> u64 {
    300
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            min_title_length: default_min_title_length(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncoderConfig {
    /// Number of parallel transcode workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Keep extracted containers after a successful transcode.
    #[serde(default)]
    pub keep_raw_files: bool,

    /// Delivery files at or below this size are treated as truncated.
    #[serde(default = "default_min_output_bytes")]
    pub min_output_bytes: u64,

    #[serde(default = "default_container")]
    pub container: String,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_video_quality")]
    pub video_quality: String,

    #[serde(default = "default_video_preset")]
    pub video_preset: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    #[serde(default = "default_audio_mixdown")]
    pub audio_mixdown: String,

    /// Extra transcode arguments, appended verbatim.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_workers() -> usize {
    4
}

fn default_min_output_bytes() -> u64 {
    1024
}

fn default_container() -> String {
    "av_mp4".to_string()
}

fn default_video_codec() -> String {
    "nvenc_h265".to_string()
}

fn default_video_quality() -> String {
    "23".to_string()
}

fn default_video_preset() -> String {
    "p5".to_string()
}

fn default_audio_codec() -> String {
    "av_aac".to_string()
}

fn default_audio_quality() -> String {
    "0.6".to_string()
}

fn default_audio_mixdown() -> String {
    "7point1".to_string()
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            keep_raw_files: false,
            min_output_bytes: default_min_output_bytes(),
            container: default_container(),
            video_codec: default_video_codec(),
            video_quality: default_video_quality(),
            video_preset: default_video_preset(),
            audio_codec: default_audio_codec(),
            audio_quality: default_audio_quality(),
            audio_mixdown: default_audio_mixdown(),
            extra_args: Vec::new(),
        }
    }
}

impl EncoderConfig {
    /// Container parsed from the configured tag, falling back to MP4.
    ///
    /// [`crate::config::load_config`] rejects unknown tags, so the fallback
    /// only applies to hand-built configs.
    pub fn container(&self) -> Container {
        self.container.parse().unwrap_or_default()
    }

    pub fn settings(&self) -> EncodeSettings {
        EncodeSettings {
            container: self.container(),
            video_codec: self.video_codec.clone(),
            video_quality: self.video_quality.clone(),
            video_preset: self.video_preset.clone(),
            audio_codec: self.audio_codec.clone(),
            audio_quality: self.audio_quality.clone(),
            audio_mixdown: self.audio_mixdown.clone(),
            extra_args: self.extra_args.clone(),
        }
    }
}
