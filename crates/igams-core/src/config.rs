use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "igams.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Policy thresholds for metrics, issue detection, and suggestion rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Quality scores strictly below this emit a `low_quality` issue.
    #[serde(default = "default_low_quality_score")]
    pub low_quality_score: f64,
    /// Elapsed minutes strictly above this emit a `time_overrun` issue.
    /// Absolute, independent of the step's planned duration.
    #[serde(default = "default_overrun_minutes")]
    pub overrun_minutes: f64,
    /// Planned duration used when a record carries none.
    #[serde(default = "default_planned_minutes")]
    pub default_planned_minutes: f64,
    /// Minimum quality for a completed step to count as efficient.
    #[serde(default = "default_efficiency_quality_bar")]
    pub efficiency_quality_bar: f64,
    #[serde(default = "default_quality_compliance_floor")]
    pub quality_compliance_floor: f64,
    #[serde(default = "default_time_deviation_ceiling")]
    pub time_deviation_ceiling: f64,
    #[serde(default = "default_execution_accuracy_floor")]
    pub execution_accuracy_floor: f64,
    #[serde(default = "default_repeated_skip_count")]
    pub repeated_skip_count: usize,
}

fn default_low_quality_score() -> f64 {
    0.6
}

fn default_overrun_minutes() -> f64 {
    120.0
}

fn default_planned_minutes() -> f64 {
    60.0
}

fn default_efficiency_quality_bar() -> f64 {
    0.7
}

fn default_quality_compliance_floor() -> f64 {
    0.6
}

fn default_time_deviation_ceiling() -> f64 {
    1.5
}

fn default_execution_accuracy_floor() -> f64 {
    0.5
}

fn default_repeated_skip_count() -> usize {
    2
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_quality_score: default_low_quality_score(),
            overrun_minutes: default_overrun_minutes(),
            default_planned_minutes: default_planned_minutes(),
            efficiency_quality_bar: default_efficiency_quality_bar(),
            quality_compliance_floor: default_quality_compliance_floor(),
            time_deviation_ceiling: default_time_deviation_ceiling(),
            execution_accuracy_floor: default_execution_accuracy_floor(),
            repeated_skip_count: default_repeated_skip_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// AdvisoryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "IGAMS_ADVISORY_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key_env: default_api_key_env(),
            model: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// LogStoreConfig / AnalysisConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("igams.db")
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Longest inclusive span accepted by range queries.
    #[serde(default = "default_max_range_days")]
    pub max_range_days: u32,
}

fn default_max_range_days() -> u32 {
    366
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_range_days: default_max_range_days(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    #[serde(default)]
    pub log_store: LogStoreConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            thresholds: Thresholds::default(),
            advisory: AdvisoryConfig::default(),
            log_store: LogStoreConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    /// Load the config at `path`. Returns defaults if the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let t = &self.thresholds;

        // 1. Ratio thresholds live in [0, 1]
        for (name, value) in [
            ("low_quality_score", t.low_quality_score),
            ("efficiency_quality_bar", t.efficiency_quality_bar),
            ("quality_compliance_floor", t.quality_compliance_floor),
            ("execution_accuracy_floor", t.execution_accuracy_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("thresholds.{name}={value} must be within [0, 1]"),
                });
            }
        }

        // 2. Durations must be positive
        if !(t.default_planned_minutes > 0.0) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "thresholds.default_planned_minutes={} must be positive",
                    t.default_planned_minutes
                ),
            });
        }
        if !(t.overrun_minutes > 0.0) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "thresholds.overrun_minutes={} must be positive",
                    t.overrun_minutes
                ),
            });
        }

        // 3. A ceiling at or below 1.0 flags on-plan days
        if t.time_deviation_ceiling <= 1.0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "thresholds.time_deviation_ceiling={} flags steps that ran on plan",
                    t.time_deviation_ceiling
                ),
            });
        }

        if t.repeated_skip_count == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "thresholds.repeated_skip_count=0 fires on every day".to_string(),
            });
        }

        // 4. Advisory bridge
        if self.advisory.enabled {
            match self.advisory.endpoint.as_deref() {
                None | Some("") => warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "advisory.enabled is true but advisory.endpoint is not set"
                        .to_string(),
                }),
                Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!("advisory.endpoint '{url}' is not an http(s) URL"),
                    })
                }
                Some(_) => {}
            }
        }
        if self.advisory.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "advisory.timeout_secs must be greater than zero".to_string(),
            });
        }

        if self.analysis.max_range_days == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "analysis.max_range_days must be greater than zero".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_preserve_policy_constants() {
        let t = Thresholds::default();
        assert_eq!(t.low_quality_score, 0.6);
        assert_eq!(t.overrun_minutes, 120.0);
        assert_eq!(t.default_planned_minutes, 60.0);
        assert_eq!(t.efficiency_quality_bar, 0.7);
        assert_eq!(t.quality_compliance_floor, 0.6);
        assert_eq!(t.time_deviation_ceiling, 1.5);
        assert_eq!(t.execution_accuracy_floor, 0.5);
        assert_eq!(t.repeated_skip_count, 2);
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "thresholds:\n  overrun_minutes: 90\nadvisory:\n  enabled: true\n  endpoint: http://localhost:9000/advise\n",
        )
        .unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.thresholds.overrun_minutes, 90.0);
        assert_eq!(cfg.thresholds.low_quality_score, 0.6);
        assert!(cfg.advisory.enabled);
        assert_eq!(cfg.advisory.timeout_secs, 15);
        assert_eq!(cfg.advisory.api_key_env, "IGAMS_ADVISORY_KEY");
        assert_eq!(cfg.log_store.path, PathBuf::from("igams.db"));
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut cfg = Config::default();
        cfg.advisory.model = Some("advisor-large".to_string());
        cfg.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), cfg);
    }

    #[test]
    fn default_config_has_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_out_of_range_thresholds() {
        let mut cfg = Config::default();
        cfg.thresholds.low_quality_score = 1.5;
        cfg.thresholds.default_planned_minutes = 0.0;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Error));
        assert!(warnings[0].message.contains("low_quality_score"));
        assert!(warnings[1].message.contains("default_planned_minutes"));
    }

    #[test]
    fn validate_flags_enabled_advisory_without_endpoint() {
        let mut cfg = Config::default();
        cfg.advisory.enabled = true;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("advisory.endpoint"));

        cfg.advisory.endpoint = Some("ftp://example.com".to_string());
        assert!(cfg.validate()[0].message.contains("not an http(s) URL"));
    }

    #[test]
    fn validate_warns_on_low_ceiling() {
        let mut cfg = Config::default();
        cfg.thresholds.time_deviation_ceiling = 1.0;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
    }
}
