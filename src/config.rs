use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub audio: AudioConfig,
    pub lyrics: LyricsConfig,
}

/// Backend endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
}

/// Lyric generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LyricsConfig {
    pub genre: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: defaults::BACKEND_URL.to_string(),
            timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            genre: defaults::DEFAULT_GENRE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file is
    /// missing. A present-but-invalid file is reported and replaced with
    /// defaults rather than aborting.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    tracing::warn!("ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            }
        }
    }

    /// Default config file location (`~/.config/humlyric/config.toml`).
    #[cfg(feature = "cli")]
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("humlyric").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.url, defaults::BACKEND_URL);
        assert_eq!(config.backend.timeout_secs, defaults::REQUEST_TIMEOUT_SECS);
        assert_eq!(config.audio.device, None);
        assert_eq!(config.audio.sample_rate, defaults::SAMPLE_RATE);
        assert_eq!(config.lyrics.genre, defaults::DEFAULT_GENRE);
    }

    #[test]
    fn test_load_full_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[backend]
url = "http://10.0.0.1:9000"
timeout_secs = 5

[audio]
device = "pipewire"
sample_rate = 44100

[lyrics]
genre = "folk"
"#
        )
        .expect("write");

        let config = Config::load(file.path()).expect("load");
        assert_eq!(config.backend.url, "http://10.0.0.1:9000");
        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.audio.device.as_deref(), Some("pipewire"));
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.lyrics.genre, "folk");
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "[lyrics]\ngenre = \"jazz\"").expect("write");

        let config = Config::load(file.path()).expect("load");
        assert_eq!(config.lyrics.genre, "jazz");
        assert_eq!(config.backend.url, defaults::BACKEND_URL);
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "backend = not toml").expect("write");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/humlyric.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_invalid_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "???").expect("write");
        let config = Config::load_or_default(file.path());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_roundtrip_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("parse");
        assert_eq!(config, parsed);
    }
}
