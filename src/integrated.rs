use crate::types::{CocomoParams, ComplexityTier, CostEstimate, GitSummary, IntegratedIndicators};

const BASE_SCORE:          f64 = 50.0;
const VELOCITY_TERM_CAP:   f64 = 25.0;
const EFFICIENCY_TERM_CAP: f64 = 15.0;
const BONUS_HIGH:          f64 = 10.0;
const BONUS_MEDIUM:        f64 = 5.0;

/// Combines the cost estimate with observed history into comparison
/// indicators. Requires both inputs — the orchestrator skips this stage
/// entirely when git analysis degraded.
///
/// Every ratio is zero-guarded on its denominator; a zero-line project or a
/// churn-free history produces zeros, never a division fault.
pub fn combine(
    cocomo: &CostEstimate,
    git: &GitSummary,
    total_code_lines: u64,
    params: &CocomoParams,
) -> IntegratedIndicators {
    let total_lines = total_code_lines as f64;
    let total_commits = git.total_commits as f64;
    let age_days = git.repository_age_days as f64;
    let churn = (git.total_insertions + git.total_deletions) as f64;

    let lines_per_commit = ratio(total_lines, total_commits);
    let commits_needed_to_rebuild = ratio(cocomo.kloc * 1000.0, lines_per_commit);
    let actual_velocity = ratio(total_lines, age_days);
    let estimated_velocity = ratio(cocomo.productivity, params.working_days_per_month);
    let velocity_ratio = ratio(actual_velocity, estimated_velocity);
    let commit_efficiency = ratio(total_lines, churn) * 100.0;
    let change_percentage_per_commit = ratio(git.avg_changes_per_commit, total_lines) * 100.0;
    let commits_per_month = ratio(total_commits, age_days / 30.0);

    IntegratedIndicators {
        lines_per_commit,
        commits_needed_to_rebuild,
        commits_per_month,
        actual_velocity,
        estimated_velocity,
        velocity_ratio,
        commit_efficiency,
        change_percentage_per_commit,
        productivity_score: productivity_score(velocity_ratio, commit_efficiency, cocomo.complexity),
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Composite score: each term is capped individually, the sum is not
/// clamped afterwards. Changing that would silently move every historical
/// report, so the formula stays exactly as calibrated.
fn productivity_score(velocity_ratio: f64, commit_efficiency: f64, tier: ComplexityTier) -> f64 {
    let velocity_term = (velocity_ratio * VELOCITY_TERM_CAP).min(VELOCITY_TERM_CAP);
    let efficiency_term = (commit_efficiency / 100.0 * EFFICIENCY_TERM_CAP).min(EFFICIENCY_TERM_CAP);
    let complexity_bonus = match tier {
        ComplexityTier::High   => BONUS_HIGH,
        ComplexityTier::Medium => BONUS_MEDIUM,
        ComplexityTier::Low    => 0.0,
    };

    BASE_SCORE + velocity_term + efficiency_term + complexity_bonus
}

// ─── Tests ────────────────────────────────────────────────────────────────────
