use crate::types::CocomoParams;
use serde::Deserialize;
use std::path::Path;

/// All settings that can be placed in a .costline.yml config file.
/// Every field is optional — omitted fields fall back to built-in defaults.
/// CLI flags always take precedence over values set here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CostlineConfig {
    // Cost model overrides
    pub salary: Option<f64>,
    pub working_days: Option<f64>,

    // File-scan overrides
    pub exclude_dirs: Option<Vec<String>>,

    // Security scan defaults
    pub security: Option<SecurityConfig>,

    // Output defaults (overridden by the corresponding CLI flag)
    pub export: Option<String>,
    pub ai_model: Option<String>,
}

/// Security-scan section. `enabled: false` is equivalent to --no-security.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    pub enabled: Option<bool>,
    pub config: Option<String>,
}

impl CostlineConfig {
    /// Builds the calibration params, applying any cost-model overrides
    /// from the file onto the standard defaults.
    pub fn cocomo_params(&self) -> CocomoParams {
        let mut params = CocomoParams::default();
        if let Some(salary) = self.salary {
            params.monthly_salary = salary;
        }
        if let Some(days) = self.working_days {
            params.working_days_per_month = days;
        }
        params
    }

    pub fn security_enabled(&self) -> bool {
        self.security
            .as_ref()
            .and_then(|s| s.enabled)
            .unwrap_or(true)
    }

    pub fn security_config(&self) -> Option<&str> {
        self.security.as_ref().and_then(|s| s.config.as_deref())
    }

    pub fn extra_exclude_dirs(&self) -> Vec<String> {
        self.exclude_dirs.clone().unwrap_or_default()
    }

    /// Validates semantic constraints that serde cannot enforce.
    ///
    /// Returns a human-readable error describing exactly what is wrong and
    /// what values are accepted. Called automatically by [`load_config`].
    pub fn validate(&self) -> Result<(), String> {
        if let Some(salary) = self.salary {
            if !salary.is_finite() || salary <= 0.0 {
                return Err(format!(
                    "Invalid 'salary' value: {salary}. \
                     Must be a positive monthly salary in your currency (e.g. 15000)"
                ));
            }
        }

        if let Some(days) = self.working_days {
            if !days.is_finite() || days <= 0.0 || days > 31.0 {
                return Err(format!(
                    "Invalid 'working_days' value: {days}. \
                     Must be a number of working days per month between 1 and 31"
                ));
            }
        }

        if let Some(security) = &self.security {
            if let Some(cfg) = &security.config {
                if cfg.trim().is_empty() {
                    return Err("Invalid 'security.config' value: \"\". \
                         Expected \"auto\", a semgrep registry pack like \"p/default\", \
                         or a path to a local rules file"
                        .to_string());
                }
            }
        }

        if let Some(model) = &self.ai_model {
            if model.trim().is_empty() {
                return Err("Invalid 'ai_model' value: \"\". \
                     Expected a chat model name, e.g. \"gpt-4o-mini\""
                    .to_string());
            }
        }

        Ok(())
    }
}

/// Reads, parses, and validates a YAML config file from `path`.
pub fn load_config(path: &Path) -> Result<CostlineConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config file '{}': {e}", path.display()))?;
    let cfg: CostlineConfig = serde_yaml::from_str(&content)
        .map_err(|e| format!("Invalid config file '{}': {e}", path.display()))?;
    cfg.validate()
        .map_err(|e| format!("Config file '{}': {e}", path.display()))?;
    Ok(cfg)
}

/// Annotated YAML template — printed by `--generate-config`.
pub static TEMPLATE: &str = r#"# costline configuration file
# Generated by: costline --generate-config
#
# All settings are optional. Omit any field to use the built-in default.
# CLI flags always take precedence over values in this file.
# Save this file as .costline.yml in your project root, then run:
#
#   costline --config .costline.yml [path]

# ── Cost model ─────────────────────────────────────────────────────────────────

# Monthly salary per developer, in your currency. Only affects the cost figure.
# salary: 15000.0

# Working days per month. Sets the baseline daily velocity that the observed
# git history is compared against.
# working_days: 22.0

# ── File scanning ──────────────────────────────────────────────────────────────

# Additional directory names to exclude from line counting
# (merged with the built-in list: node_modules, target, build, …).
# exclude_dirs:
#   - "generated"
#   - "fixtures"

# ── Security scan ──────────────────────────────────────────────────────────────

# security:
#   # Set to false to skip the semgrep scan entirely (same as --no-security).
#   enabled: true
#   # Ruleset passed to semgrep --config: "auto", a registry pack like
#   # "p/default", or a path to a local rules file.
#   config: "auto"

# ── Output ─────────────────────────────────────────────────────────────────────

# Write the JSON report to this file after every run (same as --export).
# export: "costline-report.json"

# Chat model used when --ai-insights is given.
# ai_model: "gpt-4o-mini"
"#;

/// Prints the config template to stdout, or writes it to `output_path` if given.
pub fn print_template(output_path: Option<&Path>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(path, TEMPLATE)
            .map_err(|e| format!("Cannot write config template to '{}': {e}", path.display())),
        None => {
            print!("{TEMPLATE}");
            Ok(())
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_template_is_valid_yaml() {
        let result: Result<CostlineConfig, _> = serde_yaml::from_str(TEMPLATE);
        assert!(
            result.is_ok(),
            "TEMPLATE must parse as valid CostlineConfig: {:?}",
            result.err()
        );
        let cfg = result.unwrap();
        // All fields should be None (everything is commented out in the template)
        assert!(cfg.salary.is_none());
        assert!(cfg.security.is_none());
        assert!(cfg.export.is_none());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let cfg: CostlineConfig = serde_yaml::from_str("{}").expect("empty map should parse");
        assert!(cfg.salary.is_none());
        assert!(cfg.working_days.is_none());
        assert!(cfg.exclude_dirs.is_none());
        assert!(cfg.security.is_none());
        assert!(cfg.ai_model.is_none());
    }

    #[test]
    fn test_exclude_dirs_parsed() {
        let yaml = "exclude_dirs:\n  - generated\n  - fixtures\n";
        let cfg: CostlineConfig = serde_yaml::from_str(yaml).expect("should parse");
        let dirs = cfg.exclude_dirs.expect("exclude_dirs should be Some");
        assert!(dirs.contains(&"generated".to_string()));
        assert!(dirs.contains(&"fixtures".to_string()));
    }

    #[test]
    fn test_security_section_parsed() {
        let yaml = "security:\n  enabled: false\n  config: p/default\n";
        let cfg: CostlineConfig = serde_yaml::from_str(yaml).expect("should parse");
        assert!(!cfg.security_enabled());
        assert_eq!(cfg.security_config(), Some("p/default"));
    }

    #[test]
    fn test_security_defaults_to_enabled() {
        let cfg = CostlineConfig::default();
        assert!(cfg.security_enabled(), "absent section means enabled");
        assert!(cfg.security_config().is_none());

        let yaml = "security:\n  config: auto\n";
        let cfg: CostlineConfig = serde_yaml::from_str(yaml).expect("should parse");
        assert!(cfg.security_enabled(), "absent 'enabled' key means enabled");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "unknown_setting: true\n";
        let result: Result<CostlineConfig, _> = serde_yaml::from_str(yaml);
        assert!(
            result.is_err(),
            "Unknown fields should be rejected by deny_unknown_fields"
        );

        let nested = "security:\n  unknown_setting: true\n";
        let result: Result<CostlineConfig, _> = serde_yaml::from_str(nested);
        assert!(result.is_err(), "Unknown nested fields should be rejected");
    }

    #[test]
    fn test_cocomo_params_default_without_overrides() {
        let cfg = CostlineConfig::default();
        let params = cfg.cocomo_params();
        assert!((params.monthly_salary - 15_000.0).abs() < 1e-9);
        assert!((params.working_days_per_month - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_cocomo_params_overridden() {
        let yaml = "salary: 9500.0\nworking_days: 20\n";
        let cfg: CostlineConfig = serde_yaml::from_str(yaml).expect("should parse");
        let params = cfg.cocomo_params();
        assert!((params.monthly_salary - 9500.0).abs() < 1e-9);
        assert!((params.working_days_per_month - 20.0).abs() < 1e-9);
    }

    // ── validate() tests ──────────────────────────────────────────────────────

    #[test]
    fn test_validate_valid_config_passes() {
        let yaml = "salary: 12000.0\nworking_days: 21\nsecurity:\n  config: auto\n";
        let cfg: CostlineConfig = serde_yaml::from_str(yaml).expect("should parse");
        assert!(cfg.validate().is_ok(), "Valid config should pass validation");
    }

    #[test]
    fn test_validate_negative_salary_rejected() {
        let yaml = "salary: -100.0\n";
        let cfg: CostlineConfig = serde_yaml::from_str(yaml).expect("should parse");
        let result = cfg.validate();
        assert!(result.is_err(), "Negative salary should be rejected");
        let msg = result.unwrap_err();
        assert!(msg.contains("salary"), "Error should mention 'salary': {msg}");
        assert!(
            msg.contains("positive"),
            "Error should explain the requirement: {msg}"
        );
    }

    #[test]
    fn test_validate_nan_salary_rejected() {
        let yaml = "salary: .nan\n";
        let cfg: CostlineConfig = serde_yaml::from_str(yaml).expect("should parse");
        assert!(cfg.validate().is_err(), "NaN salary should be rejected");
    }

    #[test]
    fn test_validate_working_days_range() {
        for bad in ["working_days: 0\n", "working_days: 45\n"] {
            let cfg: CostlineConfig = serde_yaml::from_str(bad).expect("should parse");
            let result = cfg.validate();
            assert!(result.is_err(), "'{bad}' should be rejected");
            assert!(
                result.unwrap_err().contains("working_days"),
                "Error should name the field"
            );
        }
    }

    #[test]
    fn test_validate_empty_security_config_rejected() {
        let yaml = "security:\n  config: \"\"\n";
        let cfg: CostlineConfig = serde_yaml::from_str(yaml).expect("should parse");
        let result = cfg.validate();
        assert!(result.is_err(), "Empty ruleset should be rejected");
        let msg = result.unwrap_err();
        assert!(
            msg.contains("auto"),
            "Error should list accepted values: {msg}"
        );
    }

    #[test]
    fn test_validate_empty_ai_model_rejected() {
        let yaml = "ai_model: \"\"\n";
        let cfg: CostlineConfig = serde_yaml::from_str(yaml).expect("should parse");
        assert!(cfg.validate().is_err(), "Empty model name should be rejected");
    }

    // ── Example file test ─────────────────────────────────────────────────────

    #[test]
    fn test_load_example_file() {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let example_path = manifest_dir.join(".costline.example.yml");

        let cfg = load_config(&example_path).unwrap_or_else(|e| {
            panic!("Example config file should parse and validate successfully: {e}")
        });

        // Cost model
        assert!(
            (cfg.salary.expect("salary should be set in example file") - 12_000.0).abs() < 1e-9,
            "salary should match example file"
        );
        assert!(
            (cfg.working_days.expect("working_days should be set") - 21.0).abs() < 1e-9,
            "working_days should match example file"
        );

        // File scanning
        let dirs = cfg
            .exclude_dirs
            .as_ref()
            .expect("exclude_dirs should be set in example file");
        assert!(
            dirs.contains(&"generated".to_string()),
            "exclude_dirs should contain 'generated'"
        );
        assert!(
            dirs.contains(&"fixtures".to_string()),
            "exclude_dirs should contain 'fixtures'"
        );
        assert!(
            dirs.contains(&"vendor".to_string()),
            "exclude_dirs should contain 'vendor'"
        );

        // Security
        assert!(cfg.security_enabled(), "example file enables the scan");
        assert_eq!(
            cfg.security_config(),
            Some("p/default"),
            "security.config should match example file"
        );

        // Output
        assert_eq!(
            cfg.export.as_deref(),
            Some("costline-report.json"),
            "export should match example file"
        );
        assert_eq!(
            cfg.ai_model.as_deref(),
            Some("gpt-4o-mini"),
            "ai_model should match example file"
        );

        // Params roundtrip
        let params = cfg.cocomo_params();
        assert!((params.monthly_salary - 12_000.0).abs() < 1e-9);
        assert!((params.working_days_per_month - 21.0).abs() < 1e-9);
    }
}
