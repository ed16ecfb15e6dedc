use crate::config::Config;
use crate::error::{FusionError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, reporting every problem at once
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_input(config, &mut errors);
        Self::validate_output(config, &mut errors);
        Self::validate_probfuse(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FusionError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_input(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.input.runs_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "input.runs_dir",
                "Runs directory cannot be empty",
            ));
        }

        if config.input.qrels.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "input.qrels",
                "Judgment file path cannot be empty",
            ));
        }

        if config.input.expected_runs == 0 {
            errors.push(ValidationError::new(
                "input.expected_runs",
                "At least one run is required",
            ));
        }
    }

    fn validate_output(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.output.dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "output.dir",
                "Output directory cannot be empty",
            ));
        }

        if config.output.depth == 0 {
            errors.push(ValidationError::new(
                "output.depth",
                "Depth must be greater than 0",
            ));
        }
    }

    fn validate_probfuse(config: &Config, errors: &mut Vec<ValidationError>) {
        let settings = &config.probfuse;

        if settings.segments.is_empty() {
            errors.push(ValidationError::new(
                "probfuse.segments",
                "At least one segment count is required",
            ));
        }
        if settings.segments.contains(&0) {
            errors.push(ValidationError::new(
                "probfuse.segments",
                "Segment counts must be greater than 0",
            ));
        }

        if settings.training_fractions.is_empty() {
            errors.push(ValidationError::new(
                "probfuse.training_fractions",
                "At least one training fraction is required",
            ));
        }
        for fraction in &settings.training_fractions {
            if !(*fraction > 0.0 && *fraction <= 1.0) {
                errors.push(ValidationError::new(
                    "probfuse.training_fractions",
                    format!("Training fraction must be in (0, 1], got {}", fraction),
                ));
            }
        }

        if settings.policies.is_empty() {
            errors.push(ValidationError::new(
                "probfuse.policies",
                "At least one policy is required",
            ));
        }

        if settings.max_workers == 0 {
            errors.push(ValidationError::new(
                "probfuse.max_workers",
                "Max workers must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_bad_fraction_and_segments_reported_together() {
        let mut config = Config::default();
        config.probfuse.training_fractions = vec![0.0, 0.5, 1.2];
        config.probfuse.segments = vec![0, 10];

        match ConfigValidator::validate(&config) {
            Err(FusionError::ConfigValidation { errors }) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().any(|e| e.path == "probfuse.segments"));
            }
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_depth() {
        let mut config = Config::default();
        config.output.depth = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_empty_policies() {
        let mut config = Config::default();
        config.probfuse.policies.clear();
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
