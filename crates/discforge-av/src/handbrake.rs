//! Transcode tool adapter.

use discforge_common::SessionLog;
use std::path::{Path, PathBuf};

use crate::{Priority, ToolCommand};

/// Delivery container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Container {
    /// MPEG-4 Part 14 container
    #[default]
    Mp4,
    /// Matroska container
    Mkv,
    /// WebM container
    Webm,
}

impl Container {
    /// Get the file extension for this container.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mkv => "mkv",
            Container::Webm => "webm",
        }
    }

    /// Format tag understood by the transcode tool's `-f` option.
    pub fn format_tag(&self) -> &'static str {
        match self {
            Container::Mp4 => "av_mp4",
            Container::Mkv => "av_mkv",
            Container::Webm => "av_webm",
        }
    }
}

impl std::str::FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "av_mp4" | "mp4" | "m4v" => Ok(Container::Mp4),
            "av_mkv" | "mkv" | "matroska" => Ok(Container::Mkv),
            "av_webm" | "webm" => Ok(Container::Webm),
            _ => Err(format!("Unknown container format: {}", s)),
        }
    }
}

/// Encoder parameters. Codec, quality, and preset values are passed to the
/// tool verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    pub container: Container,
    pub video_codec: String,
    pub video_quality: String,
    pub video_preset: String,
    pub audio_codec: String,
    pub audio_quality: String,
    pub audio_mixdown: String,
    /// Appended after all generated arguments.
    pub extra_args: Vec<String>,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            container: Container::Mp4,
            video_codec: "nvenc_h265".to_string(),
            video_quality: "23".to_string(),
            video_preset: "p5".to_string(),
            audio_codec: "av_aac".to_string(),
            audio_quality: "0.6".to_string(),
            audio_mixdown: "7point1".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl EncodeSettings {
    /// Build the argument vector for one transcode.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-i".into(),
            input.to_string_lossy().to_string(),
            "-o".into(),
            output.to_string_lossy().to_string(),
            "-f".into(),
            self.container.format_tag().into(),
            "-e".into(),
            self.video_codec.clone(),
            "-q".into(),
            self.video_quality.clone(),
            "--encoder-preset".into(),
            self.video_preset.clone(),
            "--optimize".into(),
            "--auto-anamorphic".into(),
            "--modulus".into(),
            "2".into(),
            "--all-audio".into(),
            "--mixdown".into(),
            self.audio_mixdown.clone(),
            "--aencoder".into(),
            self.audio_codec.clone(),
            "--aq".into(),
            self.audio_quality.clone(),
            "--subtitle".into(),
            "none".into(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Whether a video codec name selects a hardware encoder.
pub fn is_hardware_codec(codec: &str) -> bool {
    let codec = codec.to_lowercase();
    ["nvenc", "vce", "qsv", "vt_", "amf", "mf_"]
        .iter()
        .any(|hw| codec.contains(hw))
}

/// Delivery path for a source container: `<root>/<label>/<stem>.<ext>`.
pub fn delivery_path(delivery_root: &Path, safe_label: &str, source: &Path, container: Container) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    delivery_root
        .join(safe_label)
        .join(format!("{stem}.{}", container.extension()))
}

/// Handle on the transcode executable.
#[derive(Debug, Clone)]
pub struct HandBrake {
    program: PathBuf,
}

impl HandBrake {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Transcode `input` to `output` at lowered priority, returning the
    /// tool's exit code. Output is appended to `log`.
    pub async fn transcode(
        &self,
        settings: &EncodeSettings,
        input: &Path,
        output: &Path,
        log: &SessionLog,
    ) -> i32 {
        ToolCommand::new(self.program.clone())
            .args(settings.args(input, output))
            .priority(Priority::Lowered)
            .run_logged(log)
            .await
    }
}
