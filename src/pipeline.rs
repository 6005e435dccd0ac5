//! Stage orchestration: code scan → git history → security scan →
//! integrated indicators. Only the first stage can abort the run; the
//! rest degrade to absent report sections.

use crate::cocomo;
use crate::error::{AnalysisError, GitError, SecurityError};
use crate::git::{log_parser, summary};
use crate::integrated;
use crate::scan;
use crate::security;
use crate::types::{CocomoParams, CodeMetrics, GitSummary, ResultBundle};
use chrono::Utc;
use std::path::Path;

// ─── Stage Events ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Code,
    Git,
    Security,
    Integration,
}

impl Stage {
    pub const COUNT: usize = 4;

    /// 1-based position for "[n/4]" progress lines.
    pub fn index(self) -> usize {
        match self {
            Stage::Code        => 1,
            Stage::Git         => 2,
            Stage::Security    => 3,
            Stage::Integration => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Started,
    Completed,
    Skipped,
    Degraded,
}

/// One progress notification. The stage tag is the contract; renderers must
/// not parse the message text.
#[derive(Debug, Clone)]
pub struct StageEvent {
    pub stage: Stage,
    pub status: StageStatus,
    pub message: String,
}

impl StageEvent {
    /// Coarse overall progress, derived from the stage tag alone.
    pub fn percent(&self) -> u8 {
        match (self.stage, self.status) {
            (Stage::Code, StageStatus::Started)        => 10,
            (Stage::Code, _)                           => 30,
            (Stage::Git, StageStatus::Started)         => 35,
            (Stage::Git, _)                            => 60,
            (Stage::Security, StageStatus::Started)    => 62,
            (Stage::Security, _)                       => 80,
            (Stage::Integration, StageStatus::Started) => 85,
            (Stage::Integration, _)                    => 100,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != StageStatus::Started
    }
}

// ─── Options ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub run_security: bool,
    pub security_config: String,
    /// Promote a missing/unreadable git history from a degraded stage to a
    /// fatal error.
    pub require_git: bool,
    pub extra_exclude_dirs: Vec<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            run_security: true,
            security_config: "auto".to_string(),
            require_git: false,
            extra_exclude_dirs: Vec::new(),
        }
    }
}

/// The bundle plus the scan detail the export deliberately leaves out.
/// The terminal report shows the line counts; the JSON contract does not
/// carry them.
pub struct AnalysisOutcome {
    pub bundle: ResultBundle,
    pub code: CodeMetrics,
}

// ─── Orchestrator ─────────────────────────────────────────────────────────────

pub fn analyze(
    project: &Path,
    options: &AnalysisOptions,
    params: &CocomoParams,
    mut on_event: impl FnMut(StageEvent),
) -> Result<AnalysisOutcome, AnalysisError> {
    let mut emit = |stage, status, message: String| {
        on_event(StageEvent { stage, status, message });
    };

    // Stage 1: source scan + cost model. Fatal on failure.
    emit(
        Stage::Code,
        StageStatus::Started,
        "Scanning source files...".to_string(),
    );
    let code = scan::scan_project(project, &options.extra_exclude_dirs)?;
    let estimate = cocomo::estimate(code.code_lines, params);
    emit(
        Stage::Code,
        StageStatus::Completed,
        format!("{} code lines in {} files", code.code_lines, code.files_count),
    );

    // Stage 2: git history. Degrades unless the caller demanded it.
    emit(
        Stage::Git,
        StageStatus::Started,
        "Reading git history...".to_string(),
    );
    let git = match collect_history(project) {
        Ok(history) => {
            emit(
                Stage::Git,
                StageStatus::Completed,
                format!(
                    "{} commits from {} authors",
                    history.total_commits, history.total_authors
                ),
            );
            Some(history)
        }
        Err(e) if options.require_git => return Err(AnalysisError::GitRequired(e)),
        Err(e) => {
            log::warn!("git analysis skipped: {e}");
            emit(
                Stage::Git,
                StageStatus::Degraded,
                format!("Git analysis skipped: {e}"),
            );
            None
        }
    };

    // Stage 3: security scan. Always best-effort.
    let security = if options.run_security {
        emit(
            Stage::Security,
            StageStatus::Started,
            "Running security scan...".to_string(),
        );
        match security::run_scan(project, &options.security_config) {
            Ok(report) => {
                emit(
                    Stage::Security,
                    StageStatus::Completed,
                    format!(
                        "{} findings across {} files",
                        report.total_findings,
                        report.files_with_findings.len()
                    ),
                );
                Some(report)
            }
            Err(e @ SecurityError::ToolMissing(_)) => {
                log::warn!("security scan skipped: {e}");
                emit(
                    Stage::Security,
                    StageStatus::Skipped,
                    "Security scan skipped (semgrep not installed)".to_string(),
                );
                None
            }
            Err(e) => {
                log::warn!("security scan failed: {e}");
                emit(
                    Stage::Security,
                    StageStatus::Degraded,
                    format!("Security scan failed: {e}"),
                );
                None
            }
        }
    } else {
        emit(
            Stage::Security,
            StageStatus::Skipped,
            "Security scan disabled".to_string(),
        );
        None
    };

    // Stage 4: integrated indicators, only meaningful with history.
    let integrated = match &git {
        Some(history) => {
            emit(
                Stage::Integration,
                StageStatus::Started,
                "Computing integrated indicators...".to_string(),
            );
            let indicators = integrated::combine(&estimate, history, code.code_lines, params);
            emit(
                Stage::Integration,
                StageStatus::Completed,
                "Analysis complete".to_string(),
            );
            Some(indicators)
        }
        None => {
            emit(
                Stage::Integration,
                StageStatus::Skipped,
                "Analysis complete (no git history)".to_string(),
            );
            None
        }
    };

    let canonical = project.canonicalize().unwrap_or_else(|_| project.to_path_buf());
    let bundle = ResultBundle {
        project_name: project_name(&canonical),
        project_path: canonical.display().to_string(),
        analysis_type: "integrated".to_string(),
        generated_at: Utc::now().to_rfc3339(),
        cocomo: estimate,
        git,
        integrated,
        security,
        ai_insights: None,
    };

    Ok(AnalysisOutcome { bundle, code })
}

fn collect_history(project: &Path) -> Result<GitSummary, GitError> {
    let (commits, warnings) = log_parser::collect_log(project)?;
    if warnings > 0 {
        log::warn!("{warnings} malformed git log entries skipped");
    }
    summary::summarize(&commits)
}

fn project_name(canonical: &Path) -> String {
    canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| canonical.display().to_string())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
