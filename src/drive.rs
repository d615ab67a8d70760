//! Optical drive presence, label, and eject.
//!
//! The pipeline treats these as three independent OS queries behind the
//! [`DiscDrive`] trait. [`SystemDrive`] implements them with the host's
//! volume tools: `blkid`/`eject` on unix, PowerShell on windows.

use async_trait::async_trait;
use discforge_av::ToolCommand;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for presence and label queries.
const QUERY_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
pub trait DiscDrive: Send + Sync {
    /// Drive identifier passed to the extraction tool as `dev:<id>`.
    fn device(&self) -> &str;

    /// Whether a readable disc is in the drive.
    async fn is_present(&self) -> bool;

    /// Volume label of the loaded disc, empty if none.
    async fn volume_label(&self) -> String;

    /// Best-effort eject. Never fails and never blocks past its timeout.
    async fn eject(&self);
}

/// Drive backed by the host OS.
#[derive(Debug, Clone)]
pub struct SystemDrive {
    device: String,
    eject_timeout: Duration,
}

impl SystemDrive {
    pub fn new(device: impl Into<String>, eject_timeout: Duration) -> Self {
        Self {
            device: device.into(),
            eject_timeout,
        }
    }

    async fn query(&self, program: &str, args: Vec<String>, timeout: Duration) -> Option<String> {
        match ToolCommand::new(PathBuf::from(program))
            .args(args)
            .timeout(timeout)
            .execute()
            .await
        {
            Ok(output) if output.status.success() => Some(output.stdout.trim().to_string()),
            Ok(output) => {
                tracing::trace!("{program} exited with code {}", output.code());
                None
            }
            Err(e) => {
                tracing::debug!("{program} failed: {e}");
                None
            }
        }
    }
}

#[cfg(not(windows))]
impl SystemDrive {
    fn presence_command(&self) -> (&'static str, Vec<String>) {
        ("blkid", vec!["-p".into(), self.device.clone()])
    }

    fn label_command(&self) -> (&'static str, Vec<String>) {
        (
            "blkid",
            vec![
                "-p".into(),
                "-o".into(),
                "value".into(),
                "-s".into(),
                "LABEL".into(),
                self.device.clone(),
            ],
        )
    }

    fn eject_command(&self) -> (&'static str, Vec<String>) {
        ("eject", vec![self.device.clone()])
    }
}

#[cfg(windows)]
impl SystemDrive {
    fn powershell(script: String) -> (&'static str, Vec<String>) {
        (
            "powershell",
            vec!["-NoProfile".into(), "-Command".into(), script],
        )
    }

    fn drive_root(&self) -> String {
        format!("{}\\", self.device.trim_end_matches('\\'))
    }

    fn presence_command(&self) -> (&'static str, Vec<String>) {
        Self::powershell(format!(
            "if (([System.IO.DriveInfo]::new('{}')).IsReady) {{ exit 0 }} else {{ exit 1 }}",
            self.drive_root()
        ))
    }

    fn label_command(&self) -> (&'static str, Vec<String>) {
        Self::powershell(format!(
            "([System.IO.DriveInfo]::new('{}')).VolumeLabel",
            self.drive_root()
        ))
    }

    fn eject_command(&self) -> (&'static str, Vec<String>) {
        Self::powershell(format!(
            "(New-Object -ComObject Shell.Application).NameSpace(17).ParseName('{}').InvokeVerb('Eject')",
            self.device
        ))
    }
}

#[async_trait]
impl DiscDrive for SystemDrive {
    fn device(&self) -> &str {
        &self.device
    }

    async fn is_present(&self) -> bool {
        let (program, args) = self.presence_command();
        self.query(program, args, QUERY_TIMEOUT).await.is_some()
    }

    async fn volume_label(&self) -> String {
        let (program, args) = self.label_command();
        self.query(program, args, QUERY_TIMEOUT)
            .await
            .unwrap_or_default()
    }

    async fn eject(&self) {
        let (program, args) = self.eject_command();
        if self.query(program, args, self.eject_timeout).await.is_none() {
            tracing::warn!("Eject of {} did not complete", self.device);
        }
    }
}
