use crate::error::{ReleaseError, Result};
use crate::provider::ProviderKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHANGELOG: &str = "CHANGELOG.md";

const LOCAL_CONFIG: &str = "./release.toml";
const USER_CONFIG: &str = ".release.toml";

/// Defaults for the release command line.
///
/// Every value can be overridden by the matching flag. Secrets are never read
/// from here: the password comes from `--password` or `RELEASE_PASSWORD`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub provider: Option<ProviderKind>,

    /// "owner/name" on the hosted provider
    #[serde(default)]
    pub repo: Option<String>,

    /// API base replacing the provider's public one, used verbatim
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_changelog")]
    pub changelog: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub git: GitConfig,
}

/// Settings only the direct-git provider reads
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct GitConfig {
    /// Remote URL or path the tag is pushed to
    #[serde(default)]
    pub origin: Option<String>,

    /// Tagger email
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub ssh_key: Option<PathBuf>,
}

fn default_changelog() -> String {
    DEFAULT_CHANGELOG.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            repo: None,
            host: None,
            changelog: default_changelog(),
            username: None,
            git: GitConfig::default(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release.toml` in current directory
/// 3. `.release.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err(ReleaseError::Config)` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    match locate(config_path) {
        Some(path) => read_config(&path),
        None => Ok(Config::default()),
    }
}

fn locate(config_path: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = config_path {
        return Some(PathBuf::from(path));
    }

    if Path::new(LOCAL_CONFIG).exists() {
        return Some(PathBuf::from(LOCAL_CONFIG));
    }

    dirs::config_dir()
        .map(|dir| dir.join(USER_CONFIG))
        .filter(|path| path.exists())
}

fn read_config(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .map_err(|e| ReleaseError::config(format!("Cannot read {}: {}", path.display(), e)))?;

    toml::from_str(&text)
        .map_err(|e| ReleaseError::config(format!("Invalid config {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.changelog, "CHANGELOG.md");
        assert_eq!(config.provider, None);
        assert_eq!(config.git, GitConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("provider = \"gitlab\"\nrepo = \"group/project\"").unwrap();
        assert_eq!(config.provider, Some(ProviderKind::Gitlab));
        assert_eq!(config.repo.as_deref(), Some("group/project"));
        assert_eq!(config.changelog, "CHANGELOG.md");
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(toml::from_str::<Config>("provider = \"svn\"").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let err = load_config(Some("/definitely/not/here/release.toml")).unwrap_err();
        assert!(matches!(err, ReleaseError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }
}
