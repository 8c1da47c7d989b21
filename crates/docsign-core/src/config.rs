//! Configuration for placement, signing, uploads and the demo authenticator
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `DOCSIGN_*` environment variables.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocsignConfig {
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub signing: SigningConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl DocsignConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string; missing sections use defaults
    ///
    /// # Example
    ///
    /// ```
    /// use docsign_core::config::DocsignConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = DocsignConfig::from_toml(r#"
    ///     [signing]
    ///     latency_ms = 500
    /// "#)?;
    /// assert_eq!(config.signing.latency_ms, 500);
    /// assert_eq!(config.placement.min_size, 20.0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        checked_min_size(config.placement.min_size).context("Invalid [placement] min_size")?;
        Ok(config)
    }

    /// Defaults, overlaid with `path` when given, overlaid with the process environment
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `DOCSIGN_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DOCSIGN_MIN_PLACEMENT_SIZE") {
            let min_size: f64 = v
                .parse()
                .with_context(|| format!("Invalid DOCSIGN_MIN_PLACEMENT_SIZE: {}", v))?;
            self.placement.min_size = checked_min_size(min_size)
                .with_context(|| format!("Invalid DOCSIGN_MIN_PLACEMENT_SIZE: {}", v))?;
        }
        if let Some(v) = lookup("DOCSIGN_SIGNING_LATENCY_MS") {
            self.signing.latency_ms = v
                .parse()
                .with_context(|| format!("Invalid DOCSIGN_SIGNING_LATENCY_MS: {}", v))?;
        }
        if let Some(v) = lookup("DOCSIGN_UPLOAD_LATENCY_MS") {
            self.upload.latency_ms = v
                .parse()
                .with_context(|| format!("Invalid DOCSIGN_UPLOAD_LATENCY_MS: {}", v))?;
        }
        if let Some(v) = lookup("DOCSIGN_AUTH_USERNAME") {
            self.auth.username = Some(v);
        }
        if let Some(v) = lookup("DOCSIGN_AUTH_PASSWORD") {
            self.auth.password = Some(v);
        }
        Ok(())
    }
}

/// Signature box placement parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Boxes must be strictly wider and taller than this (default: 20 px)
    #[serde(default = "default_min_size")]
    pub min_size: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Simulated signing latency (default: 2000 ms)
    #[serde(default = "default_signing_latency_ms")]
    pub latency_ms: u64,
    /// Extension of the exported artifact (default: "pdf")
    #[serde(default = "default_export_extension")]
    pub export_extension: String,
}

impl SigningConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_signing_latency_ms(),
            export_extension: default_export_extension(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Simulated upload latency (default: 2000 ms)
    #[serde(default = "default_upload_latency_ms")]
    pub latency_ms: u64,
    /// Percent added per progress tick (default: 10)
    #[serde(default = "default_progress_step")]
    pub progress_step: u8,
    /// Time between progress ticks (default: 200 ms)
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl UploadConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_upload_latency_ms(),
            progress_step: default_progress_step(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

/// Credentials accepted by the static demo authenticator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Placement threshold must be a finite, non-negative size
fn checked_min_size(value: f64) -> anyhow::Result<f64> {
    anyhow::ensure!(
        value.is_finite() && value >= 0.0,
        "minimum placement size must be finite and non-negative, got {}",
        value
    );
    Ok(value)
}

fn default_min_size() -> f64 {
    20.0
}

fn default_signing_latency_ms() -> u64 {
    2000
}

fn default_export_extension() -> String {
    "pdf".to_string()
}

fn default_upload_latency_ms() -> u64 {
    2000
}

fn default_progress_step() -> u8 {
    10
}

fn default_progress_interval_ms() -> u64 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = DocsignConfig::default();
        assert_eq!(config.placement.min_size, 20.0);
        assert_eq!(config.signing.latency(), Duration::from_millis(2000));
        assert_eq!(config.signing.export_extension, "pdf");
        assert_eq!(config.upload.progress_step, 10);
        assert_eq!(config.upload.progress_interval(), Duration::from_millis(200));
        assert_eq!(config.auth, AuthConfig::default());
    }

    #[test]
    fn test_empty_toml_equals_defaults() {
        let config = DocsignConfig::from_toml("").unwrap();
        assert_eq!(config, DocsignConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = DocsignConfig::from_toml(
            r#"
            [placement]
            min_size = 32.0

            [upload]
            latency_ms = 1500

            [auth]
            username = "jackson"
            password = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.placement.min_size, 32.0);
        assert_eq!(config.upload.latency_ms, 1500);
        assert_eq!(config.upload.progress_step, 10);
        assert_eq!(config.signing, SigningConfig::default());
        assert_eq!(config.auth.username.as_deref(), Some("jackson"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = DocsignConfig::from_toml("[placement\nmin_size = ").unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DOCSIGN_SIGNING_LATENCY_MS", "10"),
            ("DOCSIGN_MIN_PLACEMENT_SIZE", "5.5"),
            ("DOCSIGN_AUTH_USERNAME", "alice"),
        ]
        .into_iter()
        .collect();

        let mut config = DocsignConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.signing.latency_ms, 10);
        assert_eq!(config.placement.min_size, 5.5);
        assert_eq!(config.upload.latency_ms, 2000);
        assert_eq!(config.auth.username.as_deref(), Some("alice"));
        assert_eq!(config.auth.password, None);
    }

    #[test]
    fn test_min_size_must_be_finite_and_non_negative() {
        for bad in ["NaN", "inf", "-1"] {
            let mut config = DocsignConfig::default();
            let err = config
                .apply_env(|key| (key == "DOCSIGN_MIN_PLACEMENT_SIZE").then(|| bad.to_string()))
                .unwrap_err();
            assert!(err.to_string().contains("DOCSIGN_MIN_PLACEMENT_SIZE"));
            assert_eq!(config.placement.min_size, 20.0);
        }

        let err = DocsignConfig::from_toml("[placement]\nmin_size = -5.0").unwrap_err();
        assert!(err.to_string().contains("min_size"));
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = DocsignConfig::default();
        let err = config
            .apply_env(|key| (key == "DOCSIGN_UPLOAD_LATENCY_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("DOCSIGN_UPLOAD_LATENCY_MS"));
    }
}
