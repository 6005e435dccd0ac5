//! Threshold-driven reading of the numbers: short, human sentences the
//! terminal report prints under each section. Nothing here is exported.

use crate::security::security_score;
use crate::types::{
    ComplexityTier, CostEstimate, GitSummary, IntegratedIndicators, ResultBundle, SecurityReport,
};

// ─── Rule Tables ──────────────────────────────────────────────────────────────
// Each table is ordered so the first matching band wins; the last band is a
// catch-all. Three operator families: upper bounds (`value < t`), strict
// floors (`value > t`), and inclusive floors (`value >= t`).

const TEAM_SIZE_RULES: &[(f64, &str)] = &[
    (5.0,           "✓ A small team is enough for this build"),
    (15.0,          "⚡ Mid-sized team required - consider splitting into squads"),
    (f64::INFINITY, "⚠️ Large team required - expect organizational overhead"),
];

const TIME_RULES: &[(f64, &str)] = &[
    (6.0,           "✓ Short development timeline"),
    (18.0,          "⚡ Medium development timeline - plan releases carefully"),
    (f64::INFINITY, "⚠️ Long-term development - technology drift is a risk"),
];

const PRODUCTIVITY_RULES: &[(f64, &str)] = &[
    (300.0,         "📉 Low productivity - consider refactoring or automation"),
    (600.0,         "📊 Adequate productivity"),
    (f64::INFINITY, "📈 High productivity - good practices are paying off"),
];

const VELOCITY_RULES: &[(f64, &str)] = &[
    (1.2,               "🚀 Velocity ahead of the model - very productive team!"),
    (0.8,               "✓ Velocity in line with the model"),
    (f64::NEG_INFINITY, "⚠️ Velocity behind the model - look for impediments"),
];

const COMMIT_EFFICIENCY_RULES: &[(f64, &str)] = &[
    (50.0,              "✓ High commit efficiency - little rework"),
    (30.0,              "⚡ Moderate efficiency - some rework present"),
    (f64::NEG_INFINITY, "⚠️ Low efficiency - heavy rework (churn)"),
];

const CHANGE_SIZE_RULES: &[(f64, &str)] = &[
    (1.0,           "✓ Small, incremental commits - good practice"),
    (5.0,           "⚡ Moderate commit size"),
    (f64::INFINITY, "⚠️ Very large commits - consider splitting changes"),
];

const COMMIT_FREQUENCY_RULES: &[(f64, &str)] = &[
    (40.0,              "✓ High commit frequency - active development"),
    (20.0,              "⚡ Moderate commit frequency"),
    (f64::NEG_INFINITY, "📊 Low commit frequency"),
];

const PRODUCTIVITY_SCORE_RULES: &[(f64, &str)] = &[
    (75.0,              "🌟 Excellent team productivity!"),
    (50.0,              "👍 Good overall productivity"),
    (f64::NEG_INFINITY, "📈 Room to improve productivity"),
];

const SECURITY_SCORE_RULES: &[(f64, &str)] = &[
    (90.0,              "🛡️ Excellent security posture!"),
    (75.0,              "✓ Good overall security"),
    (60.0,              "⚠️ Moderate security - attention needed"),
    (f64::NEG_INFINITY, "🚨 Significant security problems detected"),
];

fn first_below(value: f64, rules: &[(f64, &'static str)]) -> &'static str {
    rules
        .iter()
        .find(|(threshold, _)| value < *threshold)
        .map(|(_, message)| *message)
        .unwrap_or("")
}

fn first_above(value: f64, rules: &[(f64, &'static str)]) -> &'static str {
    rules
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map(|(_, message)| *message)
        .unwrap_or("")
}

fn first_at_least(value: f64, rules: &[(f64, &'static str)]) -> &'static str {
    rules
        .iter()
        .find(|(threshold, _)| value >= *threshold)
        .map(|(_, message)| *message)
        .unwrap_or("")
}

fn push_rule(out: &mut Vec<String>, message: &str) {
    if !message.is_empty() {
        out.push(message.to_string());
    }
}

// ─── Builders ─────────────────────────────────────────────────────────────────

/// All insight lines for one run, grouped the way the terminal report
/// prints them. Sections for stages that did not run stay empty.
#[derive(Debug, Default)]
pub struct InsightSet {
    pub estimate: Vec<String>,
    pub integrated: Vec<String>,
    pub team: Vec<String>,
    pub security: Vec<String>,
}

impl InsightSet {
    pub fn is_empty(&self) -> bool {
        self.estimate.is_empty()
            && self.integrated.is_empty()
            && self.team.is_empty()
            && self.security.is_empty()
    }
}

pub fn build_insights(bundle: &ResultBundle) -> InsightSet {
    InsightSet {
        estimate: estimate_insights(&bundle.cocomo),
        integrated: bundle
            .integrated
            .as_ref()
            .map(integrated_insights)
            .unwrap_or_default(),
        team: bundle.git.as_ref().map(team_insights).unwrap_or_default(),
        security: bundle
            .security
            .as_ref()
            .map(security_insights)
            .unwrap_or_default(),
    }
}

pub fn estimate_insights(estimate: &CostEstimate) -> Vec<String> {
    let mut out = Vec::new();
    push_rule(&mut out, complexity_message(estimate.complexity));
    push_rule(&mut out, first_below(estimate.headcount, TEAM_SIZE_RULES));
    push_rule(&mut out, first_below(estimate.duration_months, TIME_RULES));
    push_rule(&mut out, first_below(estimate.productivity, PRODUCTIVITY_RULES));
    out
}

pub fn integrated_insights(indicators: &IntegratedIndicators) -> Vec<String> {
    let mut out = Vec::new();
    push_rule(&mut out, first_above(indicators.velocity_ratio, VELOCITY_RULES));
    push_rule(
        &mut out,
        first_above(indicators.commit_efficiency, COMMIT_EFFICIENCY_RULES),
    );
    push_rule(
        &mut out,
        first_below(indicators.change_percentage_per_commit, CHANGE_SIZE_RULES),
    );
    push_rule(
        &mut out,
        first_above(indicators.commits_per_month, COMMIT_FREQUENCY_RULES),
    );
    push_rule(
        &mut out,
        first_at_least(indicators.productivity_score, PRODUCTIVITY_SCORE_RULES),
    );
    out
}

/// Contribution-shape observations: author concentration, headcount, and
/// day-to-day activity.
pub fn team_insights(git: &GitSummary) -> Vec<String> {
    let mut out = Vec::new();

    let top_author_commits = git.authors.values().copied().max().unwrap_or(0);
    let top_author_percent = if git.total_commits > 0 {
        top_author_commits as f64 / git.total_commits as f64 * 100.0
    } else {
        0.0
    };
    if top_author_percent > 70.0 {
        out.push("⚠️ Commits heavily concentrated on one author - bus-factor risk".to_string());
    } else if top_author_percent > 50.0 {
        out.push("⚡ Moderate commit concentration - spread the knowledge further".to_string());
    } else {
        out.push("✓ Contributions well distributed across the team".to_string());
    }

    match git.total_authors {
        1 => out.push("👤 Single-author project - consider involving more contributors".to_string()),
        2..=3 => out.push("👥 Small team - focused development".to_string()),
        4..=10 => out.push("👥 Mid-sized team - scales well".to_string()),
        _ => out.push("👥 Large team - make sure processes are well defined".to_string()),
    }

    if git.commits_per_day >= 5.0 {
        out.push("🔥 Very active repository - intense development".to_string());
    } else if git.commits_per_day >= 1.0 {
        out.push("✓ Regular development activity".to_string());
    } else {
        out.push("📊 Moderate development activity".to_string());
    }

    out
}

pub fn security_insights(report: &SecurityReport) -> Vec<String> {
    let mut out = Vec::new();
    push_rule(&mut out, first_at_least(security_score(report), SECURITY_SCORE_RULES));

    if report.critical_count > 0 {
        out.push(format!(
            "🔴 URGENT: {} critical finding{} must be fixed immediately",
            report.critical_count,
            if report.critical_count != 1 { "s" } else { "" },
        ));
    }
    if report.high_count > 5 {
        out.push(format!(
            "🟠 {} high-severity findings need prioritized attention",
            report.high_count,
        ));
    }

    let security_issues = report.categories.get("security").copied().unwrap_or(0);
    if security_issues as f64 > report.total_findings as f64 * 0.5 {
        out.push("⚠️ Most findings are security-related".to_string());
    }
    let best_practice_issues = report.categories.get("best-practice").copied().unwrap_or(0);
    if best_practice_issues as f64 > report.total_findings as f64 * 0.3 {
        out.push("📋 Many best-practice violations - review the guidelines".to_string());
    }

    out
}

fn complexity_message(tier: ComplexityTier) -> &'static str {
    match tier {
        ComplexityTier::Low    => "✓ Low-complexity project - well suited to a small team",
        ComplexityTier::Medium => "⚡ Medium-complexity project - needs steady coordination",
        ComplexityTier::High   => "⚠️ High-complexity project - needs rigorous management",
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::collections::HashMap;

    fn make_estimate() -> CostEstimate {
        CostEstimate {
            kloc: 10.0,
            effort_person_months: 26.9,
            duration_months: 8.7,
            headcount: 3.1,
            maintenance_headcount: 0.56,
            expansion_headcount: 0.93,
            productivity: 371.0,
            cost: 403_500.0,
            complexity: ComplexityTier::Low,
        }
    }

    fn make_indicators() -> IntegratedIndicators {
        IntegratedIndicators {
            lines_per_commit: 100.0,
            commits_needed_to_rebuild: 100.0,
            commits_per_month: 30.0,
            actual_velocity: 250.0,
            estimated_velocity: 22.7,
            velocity_ratio: 1.0,
            commit_efficiency: 40.0,
            change_percentage_per_commit: 2.5,
            productivity_score: 81.0,
        }
    }

    fn make_git(authors: &[(&str, u64)], commits_per_day: f64) -> GitSummary {
        let date = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00")
            .expect("test date should parse");
        let total_commits: u64 = authors.iter().map(|(_, n)| n).sum();
        GitSummary {
            total_commits,
            total_authors: authors.len() as u64,
            authors: authors.iter().map(|(a, n)| (a.to_string(), *n)).collect(),
            total_insertions: 1000,
            total_deletions: 200,
            total_files_changed: 50,
            avg_changes_per_commit: 12.0,
            avg_files_per_commit: 0.5,
            commits_per_day,
            first_commit_date: date,
            last_commit_date: date,
            repository_age_days: 100,
        }
    }

    fn make_security(critical: u64, high: u64, categories: &[(&str, u64)]) -> SecurityReport {
        let total = categories.iter().map(|(_, n)| n).sum::<u64>().max(critical + high);
        SecurityReport {
            total_findings: total,
            critical_count: critical,
            high_count: high,
            medium_count: 0,
            low_count: 0,
            info_count: 0,
            categories: categories.iter().map(|(c, n)| (c.to_string(), *n)).collect(),
            files_with_findings: HashMap::new(),
            findings: Vec::new(),
            files_scanned: 10,
            scan_duration_seconds: 1.0,
            scan_timestamp: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_estimate_insights_cover_all_four_axes() {
        let lines = estimate_insights(&make_estimate());

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Low-complexity"));
        assert!(lines[1].contains("small team is enough"), "headcount 3.1 < 5");
        assert!(lines[2].contains("Medium development timeline"), "8.7 months");
        assert!(lines[3].contains("Adequate productivity"), "371 lines/pm");
    }

    #[test]
    fn test_upper_bound_rules_are_exclusive() {
        let mut estimate = make_estimate();
        estimate.headcount = 5.0;
        estimate.duration_months = 6.0;
        estimate.productivity = 600.0;

        let lines = estimate_insights(&estimate);
        assert!(lines[1].contains("Mid-sized team"), "exactly 5 is not < 5");
        assert!(lines[2].contains("Medium development"), "exactly 6 is not < 6");
        assert!(lines[3].contains("High productivity"), "exactly 600 is not < 600");
    }

    #[test]
    fn test_integrated_insights_middle_bands() {
        let lines = integrated_insights(&make_indicators());

        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("in line with the model"), "ratio 1.0");
        assert!(lines[1].contains("Moderate efficiency"), "efficiency 40");
        assert!(lines[2].contains("Moderate commit size"), "2.5%");
        assert!(lines[3].contains("Moderate commit frequency"), "30/month");
        assert!(lines[4].contains("Excellent team productivity"), "score 81");
    }

    #[test]
    fn test_strict_floor_vs_inclusive_floor() {
        let mut indicators = make_indicators();
        indicators.velocity_ratio = 0.8;
        indicators.productivity_score = 75.0;

        let lines = integrated_insights(&indicators);
        assert!(
            lines[0].contains("behind the model"),
            "ratio exactly 0.8 misses the strict > 0.8 band"
        );
        assert!(
            lines[4].contains("Excellent"),
            "score exactly 75 lands in the inclusive >= 75 band"
        );
    }

    #[test]
    fn test_team_insights_single_author() {
        let lines = team_insights(&make_git(&[("ana", 20)], 0.5));

        assert!(lines[0].contains("heavily concentrated"), "100% on one author");
        assert!(lines[1].contains("Single-author project"));
        assert!(lines[2].contains("Moderate development activity"));
    }

    #[test]
    fn test_team_insights_distributed_team() {
        let lines = team_insights(&make_git(&[("ana", 10), ("bob", 10), ("cy", 10)], 5.0));

        assert!(lines[0].contains("well distributed"), "33% top share");
        assert!(lines[1].contains("Small team"));
        assert!(lines[2].contains("Very active"));
    }

    #[test]
    fn test_security_insights_clean_report() {
        let lines = security_insights(&make_security(0, 0, &[]));

        assert_eq!(lines.len(), 1, "clean scan gets only the posture line");
        assert!(lines[0].contains("Excellent security posture"));
    }

    #[test]
    fn test_security_insights_flag_critical_and_high() {
        let lines = security_insights(&make_security(2, 7, &[("security", 9)]));

        assert!(lines.iter().any(|l| l.contains("2 critical findings")));
        assert!(lines.iter().any(|l| l.contains("7 high-severity findings")));
        assert!(
            lines.iter().any(|l| l.contains("security-related")),
            "9 of 9 findings in the security category"
        );
    }

    #[test]
    fn test_security_insights_singular_critical() {
        let lines = security_insights(&make_security(1, 0, &[("security", 1)]));
        assert!(
            lines.iter().any(|l| l.contains("1 critical finding must")),
            "no plural s for a single finding"
        );
    }

    #[test]
    fn test_bundle_without_optional_stages_yields_estimate_only() {
        let bundle = ResultBundle {
            project_name: "demo".to_string(),
            project_path: "/tmp/demo".to_string(),
            analysis_type: "integrated".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            cocomo: make_estimate(),
            git: None,
            integrated: None,
            security: None,
            ai_insights: None,
        };

        let set = build_insights(&bundle);
        assert!(!set.estimate.is_empty());
        assert!(set.integrated.is_empty());
        assert!(set.team.is_empty());
        assert!(set.security.is_empty());
        assert!(!set.is_empty());
    }
}
