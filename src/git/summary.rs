use crate::error::GitError;
use crate::types::{CommitRecord, GitSummary};
use std::collections::HashMap;

/// Reduces an ordered commit sequence into repository-level statistics.
///
/// Refuses empty input: callers must treat [`GitError::EmptyHistory`] as
/// "no repository data available" and degrade, so every ratio below has a
/// live denominator. First/last commit are picked by timestamp value, not
/// input order — log order is newest-first but nothing here relies on it.
pub fn summarize(commits: &[CommitRecord]) -> Result<GitSummary, GitError> {
    if commits.is_empty() {
        return Err(GitError::EmptyHistory);
    }

    let mut authors: HashMap<String, u64> = HashMap::new();
    let mut total_insertions = 0u64;
    let mut total_deletions = 0u64;
    let mut total_files_changed = 0u64;
    let mut first = commits[0].timestamp;
    let mut last = commits[0].timestamp;

    for c in commits {
        *authors.entry(c.author.clone()).or_insert(0) += 1;
        total_insertions += c.insertions;
        total_deletions += c.deletions;
        total_files_changed += c.files_changed;
        if c.timestamp < first {
            first = c.timestamp;
        }
        if c.timestamp > last {
            last = c.timestamp;
        }
    }

    let total_commits = commits.len() as u64;
    // whole-day span, floored to 1 so per-day ratios never divide by zero
    let repository_age_days = (last - first).num_days().max(1);
    let total_changes = total_insertions + total_deletions;

    Ok(GitSummary {
        total_commits,
        total_authors: authors.len() as u64,
        authors,
        total_insertions,
        total_deletions,
        total_files_changed,
        avg_changes_per_commit: total_changes as f64 / total_commits as f64,
        avg_files_per_commit: total_files_changed as f64 / total_commits as f64,
        commits_per_day: total_commits as f64 / repository_age_days as f64,
        first_commit_date: first,
        last_commit_date: last,
        repository_age_days,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
