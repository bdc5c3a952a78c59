//! Settings from the environment and defaults from `turnup.toml`.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::commands::update::UpdateOptions;

/// Configuration file looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "turnup.toml";

/// Errors that can occur when loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {}", path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config file: {}", path.display())]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// TOML error.
        #[source]
        source: Box<toml::de::Error>,
    },
}

/// Runtime settings loaded from environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Github API token for authenticated requests.
    pub github_token: Option<String>,
    /// Github API root, for Github Enterprise servers.
    pub github_api_url: Option<String>,
}

impl Settings {
    /// Load settings from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<L: Fn(&str) -> Option<String>>(lookup: L) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            github_token: non_empty("GITHUB_TOKEN"),
            github_api_url: non_empty("TURNUP_GITHUB_API_URL"),
        }
    }
}

/// Defaults read from `turnup.toml`. Command line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Default user or organization.
    pub owner: Option<String>,
    /// Repositories always considered, as `owner/name`.
    pub repositories: Vec<String>,
    /// Registry passed to the package manager.
    pub registry: Option<String>,
    /// Skip lockfile regeneration.
    pub no_lockfile: bool,
    /// Do not open pull requests.
    pub no_pull_request: bool,
    /// Github API root.
    pub github_api_url: Option<String>,
}

impl FileConfig {
    /// Parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read.
    /// Returns [`ConfigError::Parse`] if the file is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }
}

/// All application configuration, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values from the environment.
    pub settings: Settings,
    /// Values from the configuration file.
    pub file: FileConfig,
}

impl Config {
    /// Load settings from the environment and defaults from the configuration file.
    ///
    /// An explicit `path` must exist. Without one, `turnup.toml` in `cwd` is used when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration file cannot be read or parsed.
    pub fn load(path: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        let file = match path {
            Some(explicit) => FileConfig::load(explicit)?,
            None => {
                let default_path = cwd.join(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    FileConfig::load(&default_path)?
                } else {
                    FileConfig::default()
                }
            }
        };

        Ok(Self {
            settings: Settings::from_env(),
            file,
        })
    }

    /// The API root to use: environment first, then the configuration file.
    #[must_use]
    pub fn github_api_url(&self) -> Option<&str> {
        self.settings
            .github_api_url
            .as_deref()
            .or(self.file.github_api_url.as_deref())
    }

    /// Fill in options the command line left unset from the configuration file.
    /// Repository lists are concatenated, file entries first.
    #[must_use]
    pub fn merge_options(&self, cli: UpdateOptions) -> UpdateOptions {
        let mut repositories = self.file.repositories.clone();
        repositories.extend(cli.repositories);

        UpdateOptions {
            repositories,
            owner: cli.owner.or_else(|| self.file.owner.clone()),
            registry: cli.registry.or_else(|| self.file.registry.clone()),
            no_lockfile: cli.no_lockfile || self.file.no_lockfile,
            no_pull_request: cli.no_pull_request || self.file.no_pull_request,
            skip_selection: cli.skip_selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_settings_default_has_no_token() {
        let settings = Settings::default();
        assert!(settings.github_token.is_none());
    }

    #[test]
    fn test_settings_from_lookup() {
        let vars = HashMap::from([
            ("GITHUB_TOKEN", "test_token_123"),
            ("TURNUP_GITHUB_API_URL", "  "),
        ]);
        let settings = Settings::from_lookup(|key| vars.get(key).map(|v| (*v).to_owned()));
        assert_eq!(settings.github_token, Some("test_token_123".to_owned()));
        assert!(settings.github_api_url.is_none());
    }

    #[test]
    fn test_file_config_parses_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
owner = "acme"
repositories = ["acme/api"]
registry = "https://registry.example.com"
no_lockfile = true
github_api_url = "https://github.example.com/api/v3"
"#,
        )
        .unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.owner.as_deref(), Some("acme"));
        assert_eq!(config.repositories, ["acme/api"]);
        assert!(config.no_lockfile);
        assert!(!config.no_pull_request);
    }

    #[test]
    fn test_file_config_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "ownr = \"acme\"\n").unwrap();
        assert!(matches!(
            FileConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.file, FileConfig::default());
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(Some(&missing), dir.path()),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_cli_options_override_file() {
        let config = Config {
            settings: Settings::default(),
            file: FileConfig {
                owner: Some("acme".to_owned()),
                repositories: vec!["acme/a".to_owned()],
                registry: Some("https://file.example.com".to_owned()),
                no_lockfile: true,
                ..FileConfig::default()
            },
        };
        let merged = config.merge_options(UpdateOptions {
            repositories: vec!["acme/b".to_owned()],
            owner: Some("other".to_owned()),
            skip_selection: true,
            ..UpdateOptions::default()
        });

        assert_eq!(merged.repositories, ["acme/a", "acme/b"]);
        assert_eq!(merged.owner.as_deref(), Some("other"));
        assert_eq!(merged.registry.as_deref(), Some("https://file.example.com"));
        assert!(merged.no_lockfile);
        assert!(!merged.no_pull_request);
        assert!(merged.skip_selection);
    }

    #[test]
    fn test_env_api_url_wins() {
        let config = Config {
            settings: Settings {
                github_api_url: Some("https://env.example.com".to_owned()),
                ..Settings::default()
            },
            file: FileConfig {
                github_api_url: Some("https://file.example.com".to_owned()),
                ..FileConfig::default()
            },
        };
        assert_eq!(config.github_api_url(), Some("https://env.example.com"));
    }
}
