// bases/media_cli/src/config.rs
use media_fetcher::FetchConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings loaded from the JSON config file. Every field is optional;
/// a missing or unreadable file behaves like an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Browser cookie export forwarded to the fetching tool.
    pub cookie_file: Option<PathBuf>,

    /// Default directory for downloads when the command gives none.
    pub output_dir: Option<PathBuf>,

    /// Where the download history lives.
    pub history_file: Option<PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> Self {
        let Ok(raw) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(%error, path = %path.display(), "ignoring unreadable config file");
                Self::default()
            }
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            cookie_file: self.cookie_file.clone(),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("downloads"))
    }

    pub fn history_file(&self) -> PathBuf {
        self.history_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("download_history.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/definitely/not/here.json"));
        assert!(config.cookie_file.is_none());
        assert_eq!(config.output_dir(), PathBuf::from("downloads"));
    }

    #[test]
    fn partial_config_parses() {
        let config: Config =
            serde_json::from_str(r#"{"cookie_file": "/tmp/cookies.txt"}"#).unwrap();
        assert_eq!(config.cookie_file, Some(PathBuf::from("/tmp/cookies.txt")));
        assert!(config.output_dir.is_none());
    }
}
