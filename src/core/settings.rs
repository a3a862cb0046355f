//! Scheduler settings and their loader.

use crate::core::scheduler::DEFAULT_INTERVAL;
use crate::error::{Result, SchedulerError};
use crate::sources::Resource;
use config::{Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Construction-time options for a scheduler, as read from settings sources.
///
/// ```yaml
/// interval_ms: 5000
/// resources:
///   - https://example.com/status
///   - url: https://example.com/private
///     auth:
///       type: bearer
///       token: secret
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollerSettings {
    /// Poll period in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Resources to poll, in order.
    #[serde(default)]
    pub resources: Vec<Resource>,
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL.as_millis() as u64
}

impl PollerSettings {
    /// The poll period.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            resources: Vec::new(),
        }
    }
}

/// Loads [`PollerSettings`] from a file and environment variables.
///
/// The file format is detected from the extension (YAML, TOML or JSON).
/// Environment variables are applied after the file and override it.
///
/// # Examples
///
/// ```rust,no_run
/// use pollwatch::core::SettingsLoader;
///
/// # fn example() -> pollwatch::error::Result<()> {
/// // POLLWATCH_INTERVAL_MS=5000 overrides interval_ms from the file
/// let settings = SettingsLoader::new()
///     .with_file("pollwatch.yaml")
///     .with_env_overrides("POLLWATCH", "__")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env: Option<(String, String)>,
}

impl SettingsLoader {
    /// Create a loader with no sources; loading yields the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from a file.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Override settings from environment variables.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "POLLWATCH")
    /// * `separator` - Separator for nested keys (e.g., "__")
    pub fn with_env_overrides(mut self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.env = Some((prefix.into(), separator.into()));
        self
    }

    /// Load and merge all configured sources.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file extension is not supported or the file does not exist
    /// - A source cannot be parsed
    /// - The merged settings do not deserialize
    pub fn load(&self) -> Result<PollerSettings> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.file {
            validate_extension(path)?;
            if !path.exists() {
                return Err(SchedulerError::LoadError(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path.clone()).required(true));
        }

        if let Some((prefix, separator)) = &self.env {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .separator(separator)
                    .try_parsing(true),
            );
        }

        let merged = builder
            .build()
            .map_err(|e| SchedulerError::LoadError(format!("Failed to build settings: {}", e)))?;

        merged.try_deserialize::<PollerSettings>().map_err(|e| {
            SchedulerError::DeserializationError(format!("Failed to deserialize settings: {}", e))
        })
    }
}

fn validate_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            SchedulerError::LoadError(format!(
                "Unable to determine file format for: {}",
                path.display()
            ))
        })?;

    match extension {
        "yaml" | "yml" | "toml" | "json" => Ok(()),
        _ => Err(SchedulerError::LoadError(format!(
            "Unsupported file extension: {}. Supported: .yaml, .yml, .toml, .json",
            extension
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{HttpAuth, RequestSpec};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_extension() {
        assert!(validate_extension(Path::new("settings.yaml")).is_ok());
        assert!(validate_extension(Path::new("settings.yml")).is_ok());
        assert!(validate_extension(Path::new("settings.toml")).is_ok());
        assert!(validate_extension(Path::new("settings.json")).is_ok());
        assert!(validate_extension(Path::new("settings.txt")).is_err());
        assert!(validate_extension(Path::new("settings")).is_err());
    }

    #[test]
    fn test_defaults_without_sources() {
        let settings = SettingsLoader::new().load().unwrap();
        assert_eq!(settings, PollerSettings::default());
        assert_eq!(settings.interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pollwatch.yaml");
        fs::write(
            &path,
            r#"
interval_ms: 5000
resources:
  - http://mock-url1.com
  - url: http://mock-url2.com
    auth:
      type: basic
      username: user1
      password: secret
"#,
        )
        .unwrap();

        let settings = SettingsLoader::new().with_file(&path).load().unwrap();
        assert_eq!(settings.interval_ms, 5000);
        assert_eq!(settings.resources.len(), 2);
        assert_eq!(settings.resources[0], Resource::from("http://mock-url1.com"));

        let spec = settings.resources[1].request().unwrap();
        assert_eq!(spec.url, "http://mock-url2.com");
        assert_eq!(spec.method, "GET");
        assert_eq!(
            spec.auth,
            Some(HttpAuth::Basic {
                username: "user1".to_string(),
                password: Some("secret".to_string()),
            })
        );
    }

    #[test]
    fn test_load_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pollwatch.json");
        fs::write(
            &path,
            r#"{ "resources": ["a", { "url": "b", "timeout_ms": 1500 }] }"#,
        )
        .unwrap();

        let settings = SettingsLoader::new().with_file(&path).load().unwrap();
        assert_eq!(settings.interval_ms, 60_000);
        assert_eq!(
            settings.resources[1],
            Resource::from(RequestSpec::new("b").with_timeout(Duration::from_millis(1500)))
        );
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = SettingsLoader::new()
            .with_file("/nonexistent/pollwatch.yaml")
            .load();
        assert!(matches!(result, Err(SchedulerError::LoadError(_))));
    }

    #[test]
    fn test_invalid_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pollwatch.toml");
        fs::write(&path, "interval_ms = \"soon\"\n").unwrap();

        let result = SettingsLoader::new().with_file(&path).load();
        assert!(matches!(result, Err(SchedulerError::DeserializationError(_))));
    }
}
