use crate::error::SecurityError;
use crate::types::{SecurityFinding, SecurityReport, Severity};
use chrono::Utc;
use serde::Deserialize;
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const TOOL:               &str  = "semgrep";
const SCAN_TIMEOUT_SECS:  u64   = 300;
const RULE_TIMEOUT:       &str  = "60";
const MAX_TARGET_BYTES:   &str  = "5MB";
const MAX_FINDINGS:       usize = 500;

// ─── Semgrep Payload ──────────────────────────────────────────────────────────
// Typed models for the slice of semgrep's JSON output the report consumes.
// Every field the tool may omit is an Option here; nothing is read out of an
// untyped map.

#[derive(Debug, Deserialize)]
struct SemgrepOutput {
    #[serde(default)]
    results: Vec<SemgrepResult>,
    paths: Option<SemgrepPaths>,
}

#[derive(Debug, Deserialize)]
struct SemgrepPaths {
    #[serde(default)]
    scanned: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SemgrepResult {
    check_id: Option<String>,
    path: Option<String>,
    start: Option<SemgrepPosition>,
    extra: Option<SemgrepExtra>,
}

#[derive(Debug, Deserialize)]
struct SemgrepPosition {
    line: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SemgrepExtra {
    severity: Option<String>,
    message: Option<String>,
    metadata: Option<SemgrepMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct SemgrepMetadata {
    category: Option<String>,
    confidence: Option<String>,
    cwe: Option<OneOrMany>,
    owasp: Option<OneOrMany>,
}

/// Semgrep emits both `"cwe": "CWE-89"` and `"cwe": ["CWE-89", …]`
/// depending on the rule pack.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

/// Checks whether semgrep responds to `--version`.
pub fn semgrep_available() -> bool {
    Command::new(TOOL)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Runs a semgrep scan over `project` and reduces its findings.
///
/// Exit codes 0 and 1 both carry valid JSON (1 means findings were present);
/// any other exit is a tool failure. The whole scan is bounded by a 300 s
/// deadline on top of semgrep's own per-rule timeout.
pub fn run_scan(project: &Path, config: &str) -> Result<SecurityReport, SecurityError> {
    if !semgrep_available() {
        return Err(SecurityError::ToolMissing(TOOL.to_string()));
    }

    let started = Instant::now();
    let mut child = Command::new(TOOL)
        .args([
            "--config",
            config,
            "--json",
            "--max-target-bytes",
            MAX_TARGET_BYTES,
            "--timeout",
            RULE_TIMEOUT,
            "--quiet",
        ])
        .arg(project)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SecurityError::CommandFailed {
            tool: TOOL.to_string(),
            message: e.to_string(),
        })?;

    let (status, stdout, stderr) = wait_with_deadline(&mut child, SCAN_TIMEOUT_SECS)?;

    let code = status.code().unwrap_or(-1);
    if code != 0 && code != 1 {
        return Err(SecurityError::CommandFailed {
            tool: TOOL.to_string(),
            message: format!("exit code {code}: {}", stderr.trim()),
        });
    }

    let output: SemgrepOutput = serde_json::from_str(&stdout)?;
    Ok(build_report(output, started.elapsed()))
}

/// Polls the child until it exits or the deadline passes, then returns its
/// exit status and captured output. Both pipes are drained on reader threads
/// the whole time — a scan with more output than the pipe buffer would
/// otherwise block forever and turn into a bogus timeout.
fn wait_with_deadline(
    child: &mut Child,
    seconds: u64,
) -> Result<(ExitStatus, String, String), SecurityError> {
    let stdout = child.stdout.take().ok_or_else(|| SecurityError::CommandFailed {
        tool: TOOL.to_string(),
        message: "failed to capture stdout".to_string(),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| SecurityError::CommandFailed {
        tool: TOOL.to_string(),
        message: "failed to capture stderr".to_string(),
    })?;

    let stdout_reader = thread::spawn(move || {
        let mut text = String::new();
        let _ = BufReader::new(stdout).read_to_string(&mut text);
        text
    });
    let stderr_reader = thread::spawn(move || {
        let mut text = String::new();
        let _ = BufReader::new(stderr).read_to_string(&mut text);
        text
    });

    let deadline = Instant::now() + Duration::from_secs(seconds);
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout_text = stdout_reader.join().unwrap_or_else(|_| String::new());
                let stderr_text = stderr_reader.join().unwrap_or_else(|_| String::new());
                return Ok((status, stdout_text, stderr_text));
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SecurityError::Timeout {
                        tool: TOOL.to_string(),
                        seconds,
                    });
                }
                thread::sleep(Duration::from_millis(100));
            }
            Err(e) => {
                return Err(SecurityError::CommandFailed {
                    tool: TOOL.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}

// ─── Report ───────────────────────────────────────────────────────────────────

fn build_report(output: SemgrepOutput, elapsed: Duration) -> SecurityReport {
    let files_scanned = output.paths.map_or(0, |p| p.scanned.len() as u64);

    let mut report = SecurityReport {
        total_findings: 0,
        critical_count: 0,
        high_count: 0,
        medium_count: 0,
        low_count: 0,
        info_count: 0,
        categories: Default::default(),
        files_with_findings: Default::default(),
        findings: Vec::new(),
        files_scanned,
        scan_duration_seconds: elapsed.as_secs_f64(),
        scan_timestamp: Utc::now().to_rfc3339(),
    };

    for result in output.results.into_iter().take(MAX_FINDINGS) {
        let finding = reduce_finding(result);
        match finding.severity {
            Severity::Critical => report.critical_count += 1,
            Severity::High     => report.high_count += 1,
            Severity::Medium   => report.medium_count += 1,
            Severity::Low      => report.low_count += 1,
            Severity::Info     => report.info_count += 1,
        }
        *report.categories.entry(finding.category.clone()).or_insert(0) += 1;
        *report
            .files_with_findings
            .entry(finding.file.clone())
            .or_insert(0) += 1;
        report.findings.push(finding);
    }

    report.total_findings = report.findings.len() as u64;
    report
}

fn reduce_finding(result: SemgrepResult) -> SecurityFinding {
    let extra = result.extra.unwrap_or_default();
    let metadata = extra.metadata.unwrap_or_default();

    SecurityFinding {
        rule_id: result.check_id.unwrap_or_else(|| "unknown".to_string()),
        severity: normalize_severity(extra.severity.as_deref().unwrap_or("INFO")),
        category: metadata.category.unwrap_or_else(|| "unknown".to_string()),
        message: extra.message.unwrap_or_else(|| "no message".to_string()),
        file: result.path.unwrap_or_default(),
        line: result.start.and_then(|s| s.line).unwrap_or(0),
        cwe: metadata.cwe.map(OneOrMany::into_vec),
        owasp: metadata.owasp.map(OneOrMany::into_vec),
        confidence: metadata.confidence.unwrap_or_else(|| "HIGH".to_string()),
    }
}

/// Semgrep severities collapse onto the report scale: ERROR is critical,
/// WARNING is high. Anything unrecognized lands on Info rather than being
/// promoted to a level the tool never claimed.
fn normalize_severity(raw: &str) -> Severity {
    match raw.to_uppercase().as_str() {
        "ERROR" | "CRITICAL" => Severity::Critical,
        "WARNING" | "HIGH"   => Severity::High,
        "MEDIUM"             => Severity::Medium,
        "LOW"                => Severity::Low,
        _                    => Severity::Info,
    }
}

/// 0–100 score: 100 with a clean scan, shrinking logarithmically with the
/// severity-weighted finding count, floored at 0. Info findings carry no
/// weight. Rounded to two decimals for display stability.
pub fn security_score(report: &SecurityReport) -> f64 {
    if report.total_findings == 0 {
        return 100.0;
    }

    let weighted = report.critical_count * 10
        + report.high_count * 5
        + report.medium_count * 2
        + report.low_count;

    if weighted == 0 {
        return 100.0;
    }

    let score = (100.0 - (weighted as f64).ln_1p() * 10.0).max(0.0);
    (score * 100.0).round() / 100.0
}

/// Files with the most findings, descending, ties broken by name for a
/// stable report.
pub fn top_vulnerable_files(report: &SecurityReport, limit: usize) -> Vec<(String, u64)> {
    let mut files: Vec<(String, u64)> = report
        .files_with_findings
        .iter()
        .map(|(file, count)| (file.clone(), *count))
        .collect();
    files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    files.truncate(limit);
    files
}

// ─── Tests ────────────────────────────────────────────────────────────────────
