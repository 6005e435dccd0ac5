use crate::error::GitError;
use crate::types::CommitRecord;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

/// `git log` line layout: one `hash|author|date|subject` header per commit,
/// followed by the `--shortstat` summary for commits that touched files.
const LOG_FORMAT: &str = "--pretty=format:%H|%an|%ai|%s";

/// Author-date layout produced by `%ai`: `2024-01-01 10:00:00 -0300`.
/// Offsets are kept as written; comparisons use the instant they denote.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

static STATS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+) files? changed(?:, (\d+) insertions?\(\+\))?(?:, (\d+) deletions?\(-\))?")
        .unwrap()
});

/// Runs `git log --shortstat` for `repo` and parses the captured output.
///
/// Returns the commit records (newest first, as git emits them) together
/// with the number of malformed lines that were skipped.
pub fn collect_log(repo: &Path) -> Result<(Vec<CommitRecord>, usize), GitError> {
    if !repo.join(".git").exists() {
        return Err(GitError::NotARepository(repo.to_path_buf()));
    }

    let mut child = Command::new("git")
        .args(["log", LOG_FORMAT, "--shortstat"])
        .current_dir(repo)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| GitError::GitUnavailable(e.to_string()))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| GitError::GitUnavailable("failed to capture git stdout".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| GitError::GitUnavailable("failed to capture git stderr".to_string()))?;

    let stderr_reader = thread::spawn(move || {
        let mut stderr_text = String::new();
        let mut reader = BufReader::new(stderr);
        let _ = reader.read_to_string(&mut stderr_text);
        stderr_text
    });

    let mut log_text = String::new();
    BufReader::new(stdout)
        .read_to_string(&mut log_text)
        .map_err(|e| GitError::CommandFailed(format!("failed reading git output: {e}")))?;

    let status = child
        .wait()
        .map_err(|e| GitError::CommandFailed(format!("failed to wait for git process: {e}")))?;

    if !status.success() {
        let stderr_text = stderr_reader.join().unwrap_or_else(|_| String::new());
        return Err(GitError::CommandFailed(stderr_text.trim().to_string()));
    }

    let _ = stderr_reader.join();

    Ok(parse_log(&log_text))
}

/// Parses raw log text into commit records, in input order.
///
/// Pure and restartable: the same text always yields the same records. The
/// pending record doubles as the parser state — `None` expects a header,
/// `Some` expects a stats line or the next header. A header arriving while
/// a record is pending means the previous commit had no diff (a merge, an
/// empty commit): the pending record is flushed with zero stats.
///
/// Header fields are split on a literal `|`, with the subject consuming the
/// remainder of the line. A subject containing `|` survives intact; an
/// author name containing `|` shifts the fields. That is a known limitation
/// of the log format, not something this parser tries to repair.
///
/// Malformed headers (wrong field count, unparseable date) are skipped and
/// counted — partial results beat total failure. The second return value is
/// that skip count.
pub fn parse_log(text: &str) -> (Vec<CommitRecord>, usize) {
    let mut records: Vec<CommitRecord> = Vec::new();
    let mut warnings = 0usize;
    let mut pending: Option<CommitRecord> = None;

    for raw in text.lines() {
        let line = raw.trim();

        match pending.take() {
            None => {
                if line.contains('|') {
                    match parse_header(line) {
                        Some(rec) => pending = Some(rec),
                        None => warnings += 1,
                    }
                }
                // anything else here is paragraph noise — skipped
            }
            Some(rec) => {
                if line.contains("changed") {
                    records.push(apply_stats(rec, line));
                } else if line.contains('|') {
                    records.push(rec);
                    match parse_header(line) {
                        Some(next) => pending = Some(next),
                        None => warnings += 1,
                    }
                } else {
                    // blank separator between header and stats keeps the state
                    pending = Some(rec);
                }
            }
        }
    }

    if let Some(rec) = pending.take() {
        records.push(rec);
    }

    (records, warnings)
}

fn parse_header(line: &str) -> Option<CommitRecord> {
    let mut parts = line.splitn(4, '|');
    let (hash, author, date, subject) =
        (parts.next()?, parts.next()?, parts.next()?, parts.next()?);

    let timestamp = DateTime::parse_from_str(date.trim(), DATE_FORMAT).ok()?;

    Some(CommitRecord {
        hash: hash.to_string(),
        author: author.to_string(),
        timestamp,
        subject: subject.to_string(),
        files_changed: 0,
        insertions: 0,
        deletions: 0,
    })
}

/// Fills a pending record from its shortstat line. Absent insertion or
/// deletion clauses stay 0.
fn apply_stats(mut rec: CommitRecord, line: &str) -> CommitRecord {
    if let Some(caps) = STATS_RE.captures(line) {
        rec.files_changed = caps.get(1).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        rec.insertions = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        rec.deletions = caps.get(3).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    }
    rec
}

// ─── Tests ────────────────────────────────────────────────────────────────────
