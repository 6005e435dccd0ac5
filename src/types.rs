use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Core Git Data ────────────────────────────────────────────────────────────

/// One parsed `git log` entry. Ephemeral — produced by the log scanner,
/// consumed by the aggregator, never persisted individually.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    #[allow(dead_code)]
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<FixedOffset>,
    #[allow(dead_code)]
    pub subject: String,
    pub files_changed: u64,
    pub insertions: u64,
    pub deletions: u64,
}

/// Repository-level statistics reduced from the full commit sequence.
/// Never built from an empty sequence — the aggregator refuses that input,
/// so every field here can assume at least one commit exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSummary {
    pub total_commits: u64,
    pub total_authors: u64,
    pub authors: HashMap<String, u64>,
    pub total_insertions: u64,
    pub total_deletions: u64,
    pub total_files_changed: u64,
    pub avg_changes_per_commit: f64,
    pub avg_files_per_commit: f64,
    pub commits_per_day: f64,
    pub first_commit_date: DateTime<FixedOffset>,
    pub last_commit_date: DateTime<FixedOffset>,
    /// Whole-day span between first and last commit, floored to a minimum
    /// of 1 so every downstream per-day ratio has a safe denominator.
    pub repository_age_days: i64,
}

// ─── Source Scan ──────────────────────────────────────────────────────────────

/// Line counts produced by the source-tree scanner.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CodeMetrics {
    pub total_lines: u64,
    pub code_lines: u64,
    pub comment_lines: u64,
    pub blank_lines: u64,
    pub files_count: u64,
    /// Language name → code lines written in it.
    pub languages: HashMap<String, u64>,
}

// ─── Cost Model ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ComplexityTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplexityTier::Low    => write!(f, "Low"),
            ComplexityTier::Medium => write!(f, "Medium"),
            ComplexityTier::High   => write!(f, "High"),
        }
    }
}

/// One calibration tier of the cost model: commits below `max_kloc`
/// use the four constants a, b, c, d.
#[derive(Debug, Clone, Copy)]
pub struct TierParams {
    pub max_kloc: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tier: ComplexityTier,
}

/// Immutable calibration values threaded into the estimator and the
/// integrated calculator. Defaults are the standard COCOMO II tables.
#[derive(Debug, Clone)]
pub struct CocomoParams {
    pub monthly_salary: f64,
    pub working_days_per_month: f64,
    pub maintenance_ratio: f64,
    pub expansion_ratio: f64,
    pub tiers: [TierParams; 3],
}

impl Default for CocomoParams {
    fn default() -> Self {
        CocomoParams {
            monthly_salary:         15_000.0,
            working_days_per_month: 22.0,
            maintenance_ratio:      0.18,
            expansion_ratio:        0.30,
            tiers: [
                TierParams { max_kloc:  50.0, a: 2.4, b: 1.05, c: 2.5, d: 0.38, tier: ComplexityTier::Low },
                TierParams { max_kloc: 300.0, a: 3.0, b: 1.12, c: 2.5, d: 0.35, tier: ComplexityTier::Medium },
                TierParams { max_kloc: f64::INFINITY, a: 3.6, b: 1.20, c: 2.5, d: 0.32, tier: ComplexityTier::High },
            ],
        }
    }
}

/// Output of the cost model: a pure function of code-line count and salary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostEstimate {
    pub kloc: f64,
    pub effort_person_months: f64,
    pub duration_months: f64,
    pub headcount: f64,
    pub maintenance_headcount: f64,
    pub expansion_headcount: f64,
    pub productivity: f64,
    pub cost: f64,
    pub complexity: ComplexityTier,
}

// ─── Integrated Indicators ────────────────────────────────────────────────────

/// Comparison indicators combining the cost estimate with observed history.
/// Only constructed when both a CostEstimate and a GitSummary exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratedIndicators {
    pub lines_per_commit: f64,
    pub commits_needed_to_rebuild: f64,
    pub commits_per_month: f64,
    pub actual_velocity: f64,
    pub estimated_velocity: f64,
    pub velocity_ratio: f64,
    pub commit_efficiency: f64,
    pub change_percentage_per_commit: f64,
    /// Composite score. Each term is capped before summing but the total is
    /// deliberately not clamped to 100.
    pub productivity_score: f64,
}

// ─── Security ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High     => write!(f, "HIGH"),
            Severity::Medium   => write!(f, "MEDIUM"),
            Severity::Low      => write!(f, "LOW"),
            Severity::Info     => write!(f, "INFO"),
        }
    }
}

/// One finding from the security scanner, reduced to the fields the report
/// uses. Optional metadata stays optional instead of defaulting to guesses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub rule_id: String,
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub file: String,
    pub line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwe: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owasp: Option<Vec<String>>,
    pub confidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReport {
    pub total_findings: u64,
    pub critical_count: u64,
    pub high_count: u64,
    pub medium_count: u64,
    pub low_count: u64,
    pub info_count: u64,
    pub categories: HashMap<String, u64>,
    pub files_with_findings: HashMap<String, u64>,
    pub findings: Vec<SecurityFinding>,
    pub files_scanned: u64,
    pub scan_duration_seconds: f64,
    pub scan_timestamp: String,
}

// ─── AI Insights ──────────────────────────────────────────────────────────────

/// Structured free-text sections returned by the language-model client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiInsights {
    pub model: String,
    pub assessment: String,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
}

// ─── Result Bundle ────────────────────────────────────────────────────────────

/// Everything one analysis run produced. `cocomo` is always present; the
/// other sections are independently optional and consumers must treat them
/// as possibly absent. Field names are the export contract — report
/// renderers key off them directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultBundle {
    pub project_name: String,
    pub project_path: String,
    pub analysis_type: String,
    pub generated_at: String,
    pub cocomo: CostEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrated: Option<IntegratedIndicators>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_insights: Option<AiInsights>,
}
