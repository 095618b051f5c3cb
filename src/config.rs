use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the output folder created under the user's home directory.
pub const OUTPUT_DIR_NAME: &str = "imageresizer";

/// Jobs that take longer than this are reported as timed out.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 120;

/// Settings of the privileged side, fixed when the gateway is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizerConfig {
    pub destination_dir: PathBuf,
    pub job_timeout: Option<Duration>,
    pub reveal_output: bool,
}

/// On-disk config file format. Every key is optional.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub destination_dir: Option<PathBuf>,
    pub job_timeout_secs: Option<u64>,
    pub reveal_output: Option<bool>,
}

/// `<home>/imageresizer`.
pub fn default_destination() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine the user's home directory")?;
    Ok(home.join(OUTPUT_DIR_NAME))
}

impl ResizerConfig {
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            job_timeout: Some(Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS)),
            reveal_output: true,
        }
    }

    /// Defaults, then the optional config file on top.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::new(default_destination()?);
        if let Some(path) = config_path {
            let file = ConfigFile::read(path)?;
            config.merge_from_file(file);
            tracing::debug!(path = %path.display(), "loaded configuration");
        }
        Ok(config)
    }

    fn merge_from_file(&mut self, file: ConfigFile) {
        if let Some(dir) = file.destination_dir {
            self.destination_dir = dir;
        }
        if let Some(secs) = file.job_timeout_secs {
            self.set_timeout_secs(secs);
        }
        if let Some(reveal) = file.reveal_output {
            self.reveal_output = reveal;
        }
    }

    /// `0` disables the timeout.
    pub fn set_timeout_secs(&mut self, secs: u64) {
        self.job_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ResizerConfig::new("/tmp/out");
        assert_eq!(config.job_timeout, Some(Duration::from_secs(120)));
        assert!(config.reveal_output);
    }

    #[test]
    fn test_default_destination_is_under_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(default_destination().unwrap(), home.join("imageresizer"));
        }
    }

    #[test]
    fn test_file_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("resizer.json");
        fs::write(
            &path,
            r#"{"destinationDir": "/srv/resized", "jobTimeoutSecs": 0, "revealOutput": false}"#,
        )
        .unwrap();

        let mut config = ResizerConfig::new("/tmp/out");
        config.merge_from_file(ConfigFile::read(&path).unwrap());

        assert_eq!(config.destination_dir, PathBuf::from("/srv/resized"));
        assert_eq!(config.job_timeout, None);
        assert!(!config.reveal_output);
    }

    #[test]
    fn test_partial_file_keeps_other_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("resizer.json");
        fs::write(&path, r#"{"jobTimeoutSecs": 30}"#).unwrap();

        let mut config = ResizerConfig::new("/tmp/out");
        config.merge_from_file(ConfigFile::read(&path).unwrap());

        assert_eq!(config.destination_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.job_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_broken_file_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{ nope").unwrap();

        let err = ConfigFile::read(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
