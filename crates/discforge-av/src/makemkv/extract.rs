//! Title extraction.

use discforge_common::paths::{ensure_dir, is_container_file};
use discforge_common::{console, SessionLog, TitleDescriptor};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::MakeMkv;
use crate::{Error, Priority, Result, ToolCommand};

impl MakeMkv {
    /// Arguments to extract one title, addressed by its native index.
    pub fn extract_args(device: &str, native_index: u32, destination: &Path) -> Vec<String> {
        vec![
            "-r".into(),
            "--decrypt".into(),
            "--cache=1024".into(),
            "--minlength=0".into(),
            "mkv".into(),
            format!("dev:{device}"),
            native_index.to_string(),
            destination.to_string_lossy().to_string(),
        ]
    }

    /// Extract `title` from `device` into `destination`.
    ///
    /// Runs at normal priority with all tool output appended to `log`, and
    /// returns the container file the tool wrote.
    ///
    /// # Errors
    ///
    /// - [`Error::ExtractionFailed`] if the tool exits nonzero.
    /// - [`Error::MissingOutput`] if it exits zero but no container file can
    ///   be found in `destination`.
    pub async fn extract(
        &self,
        device: &str,
        destination: &Path,
        title: &TitleDescriptor,
        log: &SessionLog,
    ) -> Result<PathBuf> {
        ensure_dir(destination)?;

        let native = title.native_index;
        console(format!(
            "Ripping: Title {} (source title {native}, {})",
            title.filtered_index,
            title.duration_hms()
        ));
        log.append_line(format!("RIP START t{native:02} ({})", title.display_name));

        let code = ToolCommand::new(self.program.clone())
            .args(Self::extract_args(device, native, destination))
            .priority(Priority::Normal)
            .run_logged(log)
            .await;

        if code != 0 {
            return Err(Error::ExtractionFailed { code });
        }

        let output = locate_output(destination, native)?
            .ok_or_else(|| Error::missing_output(destination))?;
        log.append_line(format!("RIP DONE t{native:02} -> {}", output.display()));

        Ok(output)
    }
}

/// Find the container file the extraction tool just wrote.
///
/// The tool's file naming is not relied upon: the newest container file
/// whose name carries the `tNN` hint for `native_index` wins, and failing
/// that the newest container file in the directory.
pub fn locate_output(dir: &Path, native_index: u32) -> std::io::Result<Option<PathBuf>> {
    let hint = format!("t{native_index:02}");
    let mut candidates: Vec<(SystemTime, bool, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_container_file(&path) {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let hinted = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase().contains(&hint))
            .unwrap_or(false);
        candidates.push((modified, hinted, path));
    }

    let any_hinted = candidates.iter().any(|(_, hinted, _)| *hinted);

    Ok(candidates
        .into_iter()
        .filter(|(_, hinted, _)| *hinted || !any_hinted)
        .max_by_key(|(modified, _, _)| *modified)
        .map(|(_, _, path)| path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn touch(path: &Path, age: Duration) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_extract_args_use_native_index() {
        let args = MakeMkv::extract_args("D:", 9, Path::new("/raw/DISC"));
        assert_eq!(
            args,
            vec!["-r", "--decrypt", "--cache=1024", "--minlength=0", "mkv", "dev:D:", "9", "/raw/DISC"]
        );
    }

    #[test]
    fn test_locate_output_prefers_hinted_file() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("DISC_t01.mkv"), Duration::from_secs(60));
        touch(&tmp.path().join("DISC_t03.mkv"), Duration::from_secs(0));

        let found = locate_output(tmp.path(), 1).unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "DISC_t01.mkv");
    }

    #[test]
    fn test_locate_output_falls_back_to_newest() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("old.mkv"), Duration::from_secs(120));
        touch(&tmp.path().join("new.mkv"), Duration::from_secs(5));
        touch(&tmp.path().join("newest.txt"), Duration::from_secs(0));

        let found = locate_output(tmp.path(), 7).unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "new.mkv");
    }

    #[test]
    fn test_locate_output_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(locate_output(tmp.path(), 0).unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_zero_exit_without_output_is_missing_output() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = crate::test_fixtures::write_script(
            tmp.path(),
            "makemkvcon",
            "echo \"Saving 1 titles\"\nexit 0\n",
        );
        let dest = tmp.path().join("raw/DISC");
        let log = SessionLog::new(tmp.path().join("log.txt"));
        let title = TitleDescriptor {
            native_index: 3,
            filtered_index: 0,
            duration_seconds: 3600,
            length_label: "1:00:00".into(),
            size_label: "20 GB".into(),
            display_name: "DISC_t03".into(),
        };

        let err = MakeMkv::new(tool)
            .extract("/dev/sr0", &dest, &title, &log)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingOutput { .. }), "{err:?}");
        assert!(dest.is_dir());
        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("RIP START t03"));
        assert!(!content.contains("RIP DONE"));
    }
}
