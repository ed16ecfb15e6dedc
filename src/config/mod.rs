//! Configuration management for probfuse
//!
//! Handles loading, validation, environment overrides and named profiles for
//! the fusion pipeline settings.

use crate::error::{FusionError, Result};
use crate::fusion::{Normalization, DEFAULT_DEPTH};
use crate::probfuse::Policy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub fusion: FusionConfig,
    pub probfuse: ProbFuseSettings,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Where the source runs and judgments live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory holding `run1 .. runN`, one `.res` file each
    pub runs_dir: PathBuf,
    /// Judgment (qrels) file
    pub qrels: PathBuf,
    pub expected_runs: usize,
}

/// Output layout and depth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Maximum documents written per topic
    pub depth: usize,
}

/// Score-based fusion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    pub normalization: Normalization,
}

/// ProbFuse configuration grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbFuseSettings {
    pub segments: Vec<usize>,
    pub training_fractions: Vec<f64>,
    pub policies: Vec<Policy>,
    /// Base seed; configuration `i` uses `seed + i`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub max_workers: usize,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_fractions: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<Policy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl OutputConfig {
    pub fn base_combinations_dir(&self) -> PathBuf {
        self.dir.join("base_combinations")
    }

    pub fn preprocessed_dir(&self) -> PathBuf {
        self.dir.join("preprocessed_scores")
    }

    pub fn probfuse_dir(&self) -> PathBuf {
        self.dir.join("probfuse")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_unvalidated(path)?.finalize(None)
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        Self::load_unvalidated(path)?.finalize(Some(profile))
    }

    /// Load from `path`, or fall back to the defaults when it does not exist
    ///
    /// Both paths get the profile, the environment overrides and validation.
    pub fn load_or_default(path: &Path, profile: Option<&str>) -> Result<Self> {
        if path.exists() {
            return Self::load_unvalidated(path)?.finalize(profile);
        }

        tracing::warn!(
            "Config file not found, using defaults. Run 'probfuse config init' to create one."
        );
        Self::default().finalize(profile)
    }

    /// Apply the profile and environment overrides, then validate
    pub fn finalize(mut self, profile: Option<&str>) -> Result<Self> {
        if let Some(profile) = profile {
            self.apply_profile(profile)?;
        }
        self.apply_env_overrides();
        ConfigValidator::validate(&self)?;
        Ok(self)
    }

    fn load_unvalidated(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FusionError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| FusionError::io(e, format!("Failed to read config file: {:?}", path)))?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| FusionError::io(e, format!("Failed to write config file: {:?}", path)))?;
        Ok(())
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| FusionError::Config(format!("Unknown profile '{}'", profile)))?;

        if let Some(segments) = overrides.segments {
            self.probfuse.segments = segments;
        }
        if let Some(fractions) = overrides.training_fractions {
            self.probfuse.training_fractions = fractions;
        }
        if let Some(policies) = overrides.policies {
            self.probfuse.policies = policies;
        }
        if let Some(seed) = overrides.seed {
            self.probfuse.seed = Some(seed);
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: PROBFUSE_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("PROBFUSE_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "OUTPUT__DEPTH" => {
                self.output.depth = parse_env(path, value)?;
            }
            "FUSION__NORMALIZATION" => {
                self.fusion.normalization = value.parse()?;
            }
            "PROBFUSE__SEED" => {
                self.probfuse.seed = Some(parse_env(path, value)?);
            }
            "PROBFUSE__MAX_WORKERS" => {
                self.probfuse.max_workers = parse_env(path, value)?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FusionError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("probfuse").join("config.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| FusionError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            input: InputConfig {
                runs_dir: PathBuf::from("input/ten_models"),
                qrels: PathBuf::from("input/qrels.trec7.txt"),
                expected_runs: 10,
            },
            output: OutputConfig {
                dir: PathBuf::from("output"),
                depth: DEFAULT_DEPTH,
            },
            fusion: FusionConfig {
                normalization: Normalization::MinMax,
            },
            probfuse: ProbFuseSettings {
                segments: vec![
                    2, 4, 6, 8, 10, 15, 20, 25, 30, 40, 50, 100, 150, 200, 250, 300, 400, 500,
                ],
                training_fractions: vec![0.1, 0.2, 0.3, 0.4, 0.5],
                policies: Policy::BOTH.to_vec(),
                seed: None,
                max_workers: 4,
            },
            profiles: HashMap::from([(
                "quick".to_string(),
                ProfileOverrides {
                    segments: Some(vec![10, 25, 50]),
                    training_fractions: Some(vec![0.1, 0.5]),
                    policies: None,
                    seed: None,
                },
            )]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.probfuse.seed = Some(2006);
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.probfuse.seed, Some(2006));
        assert_eq!(loaded.probfuse.segments.len(), 18);
        assert_eq!(loaded.fusion.normalization, Normalization::MinMax);
        assert_eq!(loaded.probfuse.policies, vec![Policy::Judged, Policy::All]);
    }

    #[test]
    fn test_profile_overrides_grid() {
        let mut config = Config::default();
        config.apply_profile("quick").unwrap();
        assert_eq!(config.probfuse.segments, vec![10, 25, 50]);
        assert_eq!(config.probfuse.training_fractions, vec![0.1, 0.5]);
        assert_eq!(config.probfuse.policies.len(), 2);

        assert!(config.apply_profile("missing").is_err());
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[_meta]
schema_version = "1.0.0"

[input]
runs_dir = "runs"
qrels = "qrels.txt"
expected_runs = 3

[output]
dir = "out"
depth = 100

[fusion]
normalization = "max"

[probfuse]
segments = [4]
training_fractions = [0.5]
policies = ["all"]
max_workers = 1
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.fusion.normalization, Normalization::Max);
        assert_eq!(config.probfuse.policies, vec![Policy::All]);
        assert_eq!(config.output.probfuse_dir(), PathBuf::from("out/probfuse"));
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_defaults_are_validated() {
        let missing = Path::new("/nonexistent/probfuse.toml");
        let config = Config::load_or_default(missing, Some("quick")).unwrap();
        assert_eq!(config.probfuse.segments, vec![10, 25, 50]);

        let mut broken = Config::default();
        broken.profiles.insert(
            "broken".to_string(),
            ProfileOverrides {
                segments: Some(vec![0]),
                ..Default::default()
            },
        );
        assert!(matches!(
            broken.finalize(Some("broken")),
            Err(FusionError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(Path::new("/nonexistent/probfuse.toml"));
        assert!(matches!(result, Err(FusionError::ConfigNotFound { .. })));
    }
}
