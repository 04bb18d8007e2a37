//! Repository health scoring.
//!
//! A repository's health is the weighted sum of three component scores, each
//! in `[0, 100]`:
//!
//! | Component | Score |
//! |-----------|-------|
//! | `required_files` | `100 × Σ weight(present ∧ required) / Σ weight(required)` |
//! | `security_scanning` | `100` if advanced security is enabled, else `0` |
//! | `dependabot` | `max(0, 100 − multiplier × Σ count × severity weight)` when vulnerability alerts are enabled, else `0` |
//!
//! The overall score is bucketed into a [`TrafficLight`] using the
//! configured `green` and `amber` thresholds.
//!
//! Everything here is pure; the concurrent scan that gathers
//! [`RepositoryFacts`] lives in the `workflows` crate.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{GovernanceError, RepositoryId, RepositorySummary, Timestamp, TrafficLight};

/// Default location of the health configuration.
pub const HEALTH_CONFIG_FILE: &str = "repo_health_config.yaml";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The `repo_health_config.yaml` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// File name → requirement. Names match case-insensitively in the
    /// repository root or in `.github/`.
    pub required_files: BTreeMap<String, RequiredFile>,
    /// Severity (lowercase) → weight.
    pub alert_severity_weights: BTreeMap<String, f64>,
    /// Scale applied to the weighted alert sum before subtracting it from
    /// 100. Defaults to 1.
    pub alert_penalty_multiplier: f64,
    pub scoring: ScoringConfig,
    pub scanning: ScanningConfig,
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredFile {
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub description: String,
}

fn default_true() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub component_weights: ComponentWeights,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentWeights {
    pub required_files: f64,
    pub security_scanning: f64,
    pub dependabot: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            required_files: 0.4,
            security_scanning: 0.3,
            dependabot: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub green: f64,
    pub amber: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            green: 80.0,
            amber: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Repositories checked concurrently.
    pub max_workers: usize,
    pub include_archived: bool,
    pub include_private: bool,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            include_archived: false,
            include_private: true,
        }
    }
}

/// Output format of a health report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Csv,
    Markdown,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    pub output_directory: String,
    /// How many repositories to list in the best and worst sections.
    pub include_top_bottom: usize,
    pub export_formats: Vec<ReportFormat>,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            output_directory: "reports".to_string(),
            include_top_bottom: 5,
            export_formats: vec![ReportFormat::Csv, ReportFormat::Markdown],
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        let file = |required: bool, weight: f64, description: &str| RequiredFile {
            required,
            weight,
            description: description.to_string(),
        };
        Self {
            required_files: BTreeMap::from([
                ("README.md".into(), file(true, 1.0, "Project documentation and overview")),
                ("CODEOWNERS".into(), file(true, 1.0, "Define individuals responsible for code")),
                ("SECURITY.md".into(), file(true, 1.0, "Security policy and reporting instructions")),
                ("CODE_OF_CONDUCT.md".into(), file(true, 0.8, "Community behavior guidelines")),
                ("GOVERNANCE.md".into(), file(false, 0.5, "Project governance model")),
                ("SUPPORT.md".into(), file(false, 0.5, "Support guidelines and resources")),
                (".gitignore".into(), file(true, 0.8, "Git ignore patterns")),
                ("pull_request_template.md".into(), file(true, 0.8, "PR template for contributors")),
            ]),
            alert_severity_weights: BTreeMap::from([
                ("critical".into(), 1.0),
                ("high".into(), 0.75),
                ("medium".into(), 0.5),
                ("low".into(), 0.25),
            ]),
            alert_penalty_multiplier: 1.0,
            scoring: ScoringConfig::default(),
            scanning: ScanningConfig::default(),
            reporting: ReportingConfig::default(),
        }
    }
}

impl HealthConfig {
    /// Parses and validates a health configuration document. Missing keys
    /// take their default values. Severity keys are lowercased.
    pub fn from_yaml(document: &str, text: &str) -> Result<Self, GovernanceError> {
        let mut config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| GovernanceError::invalid_document(document, e))?
        };
        config.alert_severity_weights = std::mem::take(&mut config.alert_severity_weights)
            .into_iter()
            .map(|(severity, weight)| (severity.to_lowercase(), weight))
            .collect();
        config.validate(document)?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, GovernanceError> {
        serde_yaml::to_string(self)
            .map_err(|e| GovernanceError::invalid_document(HEALTH_CONFIG_FILE, e))
    }

    fn validate(&self, document: &str) -> Result<(), GovernanceError> {
        let w = self.scoring.component_weights;
        let all_weights = [w.required_files, w.security_scanning, w.dependabot]
            .into_iter()
            .chain(self.required_files.values().map(|f| f.weight))
            .chain(self.alert_severity_weights.values().copied())
            .chain([self.alert_penalty_multiplier]);
        for weight in all_weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(GovernanceError::configuration(
                    document,
                    format!("weights must be finite and non-negative, found {weight}"),
                ));
            }
        }
        let t = self.scoring.thresholds;
        if t.amber > t.green {
            return Err(GovernanceError::configuration(
                document,
                format!(
                    "scoring.thresholds.amber ({}) must not exceed green ({})",
                    t.amber, t.green
                ),
            ));
        }
        if self.scanning.max_workers == 0 {
            return Err(GovernanceError::configuration(
                document,
                "scanning.max_workers must be at least 1",
            ));
        }
        Ok(())
    }

    /// Whether the scan policy covers `repository`.
    pub fn includes(&self, repository: &RepositorySummary) -> bool {
        (self.scanning.include_archived || !repository.archived)
            && (self.scanning.include_private || !repository.private)
    }

    /// Configured file names that appear in `entries` (case-insensitive).
    pub fn present_files<'a>(&self, entries: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        let found: BTreeSet<String> = entries.into_iter().map(str::to_uppercase).collect();
        self.required_files
            .keys()
            .filter(|name| found.contains(&name.to_uppercase()))
            .cloned()
            .collect()
    }

    /// Scores one repository.
    pub fn score(&self, facts: RepositoryFacts) -> RepositoryHealth {
        let required_files_score = self.required_files_score(&facts.present_files);
        let security_scanning_score = if facts.security_scanning { 100.0 } else { 0.0 };
        let alert_score = self.alert_score(&facts.alert_counts);
        let dependabot_score = if facts.dependabot_enabled {
            alert_score
        } else {
            0.0
        };

        let w = self.scoring.component_weights;
        let overall_score = required_files_score * w.required_files
            + security_scanning_score * w.security_scanning
            + dependabot_score * w.dependabot;
        let t = self.scoring.thresholds;

        RepositoryHealth {
            traffic_light: TrafficLight::classify(overall_score, t.green, t.amber),
            facts,
            required_files_score,
            security_scanning_score,
            alert_score,
            dependabot_score,
            overall_score,
        }
    }

    fn required_files_score(&self, present: &BTreeSet<String>) -> f64 {
        let (total, achieved) = self
            .required_files
            .iter()
            .filter(|(_, file)| file.required)
            .fold((0.0, 0.0), |(total, achieved), (name, file)| {
                let hit = if present.contains(name) { file.weight } else { 0.0 };
                (total + file.weight, achieved + hit)
            });
        if total > 0.0 {
            achieved * 100.0 / total
        } else {
            0.0
        }
    }

    fn alert_score(&self, counts: &BTreeMap<String, u32>) -> f64 {
        let weighted: f64 = counts
            .iter()
            .filter_map(|(severity, count)| {
                self.alert_severity_weights
                    .get(severity)
                    .map(|weight| f64::from(*count) * weight)
            })
            .sum();
        (100.0 - weighted * self.alert_penalty_multiplier).max(0.0)
    }

    /// Counts severities, keeping only the configured ones.
    pub fn count_alerts<S: AsRef<str>>(&self, severities: &[S]) -> BTreeMap<String, u32> {
        let mut counts: BTreeMap<String, u32> = self
            .alert_severity_weights
            .keys()
            .map(|k| (k.clone(), 0))
            .collect();
        for severity in severities {
            if let Some(count) = counts.get_mut(&severity.as_ref().to_lowercase()) {
                *count += 1;
            }
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Facts and results
// ---------------------------------------------------------------------------

/// Everything observed about one repository, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryFacts {
    pub repository: RepositoryId,
    pub last_updated: Option<Timestamp>,
    pub is_archived: bool,
    pub is_private: bool,
    /// Configured file names found in the repository.
    pub present_files: BTreeSet<String>,
    pub security_scanning: bool,
    pub dependabot_enabled: bool,
    /// Open alerts per configured severity.
    pub alert_counts: BTreeMap<String, u32>,
}

/// A scored repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryHealth {
    #[serde(flatten)]
    pub facts: RepositoryFacts,
    pub required_files_score: f64,
    pub security_scanning_score: f64,
    /// Alert score regardless of whether alerts are enabled.
    pub alert_score: f64,
    pub dependabot_score: f64,
    pub overall_score: f64,
    pub traffic_light: TrafficLight,
}

/// Organization-wide aggregates over a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSummary {
    pub total_repos: usize,
    pub archived_repos: usize,
    pub private_repos: usize,
    pub avg_health_score: f64,
    pub traffic_light_distribution: BTreeMap<TrafficLight, usize>,
    pub security_scanning_enabled: usize,
    pub dependabot_enabled: usize,
    pub total_critical_alerts: u64,
    pub total_high_alerts: u64,
    pub scan_date: Timestamp,
}

impl HealthSummary {
    pub fn from_results(results: &[RepositoryHealth], scan_date: Timestamp) -> Self {
        let count = |pred: fn(&RepositoryHealth) -> bool| results.iter().filter(|r| pred(r)).count();
        let alerts = |severity: &str| -> u64 {
            results
                .iter()
                .filter_map(|r| r.facts.alert_counts.get(severity))
                .map(|c| u64::from(*c))
                .sum()
        };

        let mut distribution = BTreeMap::new();
        for result in results {
            *distribution.entry(result.traffic_light).or_insert(0) += 1;
        }

        let avg_health_score = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.overall_score).sum::<f64>() / results.len() as f64
        };

        Self {
            total_repos: results.len(),
            archived_repos: count(|r| r.facts.is_archived),
            private_repos: count(|r| r.facts.is_private),
            avg_health_score,
            traffic_light_distribution: distribution,
            security_scanning_enabled: count(|r| r.facts.security_scanning),
            dependabot_enabled: count(|r| r.facts.dependabot_enabled),
            total_critical_alerts: alerts("critical"),
            total_high_alerts: alerts("high"),
            scan_date,
        }
    }
}

/// The `n` best results, highest score first; ties break by name.
pub fn top_repositories(results: &[RepositoryHealth], n: usize) -> Vec<&RepositoryHealth> {
    let mut sorted: Vec<&RepositoryHealth> = results.iter().collect();
    sorted.sort_by(|a, b| {
        b.overall_score
            .total_cmp(&a.overall_score)
            .then_with(|| a.facts.repository.cmp(&b.facts.repository))
    });
    sorted.truncate(n);
    sorted
}

/// The `n` worst results, lowest score first; ties break by name.
pub fn bottom_repositories(results: &[RepositoryHealth], n: usize) -> Vec<&RepositoryHealth> {
    let mut sorted: Vec<&RepositoryHealth> = results.iter().collect();
    sorted.sort_by(|a, b| {
        a.overall_score
            .total_cmp(&b.overall_score)
            .then_with(|| a.facts.repository.cmp(&b.facts.repository))
    });
    sorted.truncate(n);
    sorted
}
