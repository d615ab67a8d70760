//! Shared helpers for integration tests.
//!
//! Provides a scriptable [`FakeDrive`], a [`RecordingHandler`] that captures
//! jobs instead of transcoding them, and (unix only) generators for fake
//! extraction and transcode executables written as shell scripts.

#![allow(dead_code)]

use async_trait::async_trait;
use discforge::coordinator::CoordinatorSettings;
use discforge::drive::DiscDrive;
use discforge::encode::{Job, JobHandler, JobOutcome};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Report for a disc with a junk title at native 0 and two real titles at
/// native 1 and 9.
pub const THREE_TITLE_REPORT: &str = r#"MSG:1005,0,1,"MakeMKV v1.17.7 linux(x64-release) started","%1 started","MakeMKV v1.17.7 linux(x64-release)"
CINFO:2,0,"FAKE_DISC_NAME"
TINFO:0,9,0,"0:04:50"
TINFO:0,10,0,"1.2 GB"
TINFO:1,9,0,"1:32:10"
TINFO:1,10,0,"24.3 GB"
TINFO:9,10,0,"0:58:00"
TINFO:9,9,0,"7.1 GB"
"#;

/// Report whose only title is below the default minimum length.
pub const JUNK_ONLY_REPORT: &str = r#"CINFO:2,0,"JUNK"
TINFO:0,9,0,"0:01:00"
TINFO:0,10,0,"100 MB"
"#;

/// Drive whose disc disappears when ejected, unless the tray is stuck.
pub struct FakeDrive {
    device: String,
    label: String,
    present: AtomicBool,
    stuck: bool,
    ejects: AtomicUsize,
    cancel_on_eject: Option<CancellationToken>,
}

impl FakeDrive {
    pub fn new(device: &str, label: &str) -> Self {
        Self {
            device: device.to_string(),
            label: label.to_string(),
            present: AtomicBool::new(true),
            stuck: false,
            ejects: AtomicUsize::new(0),
            cancel_on_eject: None,
        }
    }

    /// Cancel `token` on every eject, ending a coordinator run after its
    /// first session.
    pub fn cancel_on_eject(mut self, token: CancellationToken) -> Self {
        self.cancel_on_eject = Some(token);
        self
    }

    /// Ejecting is counted but the disc stays in the drive.
    pub fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }

    pub fn ejects(&self) -> usize {
        self.ejects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscDrive for FakeDrive {
    fn device(&self) -> &str {
        &self.device
    }

    async fn is_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    async fn volume_label(&self) -> String {
        self.label.clone()
    }

    async fn eject(&self) {
        if !self.stuck {
            self.present.store(false, Ordering::SeqCst);
        }
        self.ejects.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_eject {
            token.cancel();
        }
    }
}

/// Job handler that records every job and reports success.
#[derive(Default)]
pub struct RecordingHandler {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingHandler {
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobHandler for RecordingHandler {
    async fn handle(&self, job: &Job) -> anyhow::Result<JobOutcome> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(JobOutcome::Encoded {
            source_removed: false,
        })
    }
}

/// Coordinator settings with short delays, rooted at `root/raw`.
pub fn fast_settings(root: &Path) -> CoordinatorSettings {
    CoordinatorSettings {
        raw_dir: root.join("raw"),
        min_title_length: 300,
        eject_on_completion: true,
        poll_interval: Duration::from_millis(10),
        fault_delay: Duration::from_millis(10),
    }
}

/// Write an executable shell script.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Fake extraction tool.
///
/// Every invocation's arguments are appended to `calls`. Scans print
/// `report`; extractions write `<dest>/FAKE_tNN.mkv` for the requested
/// native index, or exit 2 if that index is in `failing`.
#[cfg(unix)]
pub fn fake_makemkv(dir: &Path, report: &str, calls: &Path, failing: &[u32]) -> PathBuf {
    let fail_cases: String = failing
        .iter()
        .map(|n| format!("    {n}) echo \"read error on title {n}\" >&2; exit 2 ;;\n"))
        .collect();

    let body = format!(
        r#"echo "$*" >> '{calls}'
case " $* " in
  *" mkv "*)
    n=$#
    eval "dest=\${{$n}}"
    eval "native=\${{$((n - 1))}}"
    case "$native" in
{fail_cases}    esac
    echo "Saving 1 titles into directory $dest"
    printf 'raw' > "$dest/FAKE_t$(printf '%02d' "$native").mkv"
    ;;
  *" info "*)
    cat <<'REPORT'
{report}REPORT
    ;;
esac
exit 0
"#,
        calls = calls.display(),
    );

    write_script(dir, "makemkvcon", &body)
}

/// Fake transcode tool: writes `size` bytes to the `-o` path, prints a
/// progress line, and exits with `code`.
#[cfg(unix)]
pub fn fake_handbrake(dir: &Path, size: usize, code: i32) -> PathBuf {
    let body = format!(
        r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
echo "Encoding: task 1 of 1, 100.00 %"
echo "x264 [info]: fake encoder" >&2
head -c {size} /dev/zero > "$out"
exit {code}
"#
    );

    write_script(dir, "HandBrakeCLI", &body)
}

/// Read a file, or an empty string if it does not exist.
pub fn read_or_empty(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

/// The single `log_*.txt` session log under `dir`.
pub fn session_log(dir: &Path) -> PathBuf {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with("log_"))
                .unwrap_or(false)
        })
        .expect("session log")
}
