use crate::error::AnalysisError;
use crate::types::CodeMetrics;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names that never contain first-party source. Dot-prefixed
/// directories (`.git`, `.venv`, `.idea`, …) are caught by the hidden rule
/// instead, so only the visible offenders are listed here.
static EXCLUDED_DIRS: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from([
    "node_modules", "vendor", "dist", "build", "target", "out",
    "bin", "obj", "coverage", "venv", "env", "__pycache__",
]));

/// Generated-file suffixes that would otherwise pass language detection.
static EXCLUDED_SUFFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| vec![
    ".min.js", ".min.css",
]);

static LANGUAGE_BY_EXTENSION: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let table: &[(&str, &[&str])] = &[
        ("Python",     &[".py", ".pyw", ".pyx"]),
        ("JavaScript", &[".js", ".jsx", ".mjs", ".cjs"]),
        ("TypeScript", &[".ts", ".tsx"]),
        ("Java",       &[".java"]),
        ("C",          &[".c", ".h"]),
        ("C++",        &[".cpp", ".hpp", ".cc", ".cxx", ".hxx"]),
        ("C#",         &[".cs"]),
        ("Go",         &[".go"]),
        ("Rust",       &[".rs"]),
        ("PHP",        &[".php", ".phtml"]),
        ("Ruby",       &[".rb"]),
        ("Swift",      &[".swift"]),
        ("Kotlin",     &[".kt", ".kts"]),
        ("Scala",      &[".scala"]),
        ("R",          &[".r"]),
        ("Shell",      &[".sh", ".bash", ".zsh"]),
        ("SQL",        &[".sql"]),
        ("HTML",       &[".html", ".htm"]),
        ("CSS",        &[".css", ".scss", ".sass", ".less"]),
        ("Vue",        &[".vue"]),
        ("Dart",       &[".dart"]),
    ];
    let mut map = HashMap::new();
    for (language, extensions) in table {
        for ext in *extensions {
            map.insert(*ext, *language);
        }
    }
    map
});

/// Line-prefix comment heuristic. Deliberately simple: it misses trailing
/// comments and flags continuation lines starting with `*`, which is the
/// accepted tradeoff for staying language-agnostic.
const COMMENT_PREFIXES: [&str; 6] = ["#", "//", "/*", "*", "--", "<!--"];

struct FileCount {
    language: &'static str,
    total: u64,
    code: u64,
    comment: u64,
    blank: u64,
}

/// Walks `root` and counts lines for every recognized source file, skipping
/// hidden entries, dependency/build directories, and minified artifacts.
/// Files are counted in parallel and reduced into one [`CodeMetrics`].
///
/// Finding no source files at all is the pipeline's one fatal condition, so
/// it surfaces here as an error rather than an empty result.
pub fn scan_project(root: &Path, extra_exclude_dirs: &[String]) -> Result<CodeMetrics, AnalysisError> {
    if !root.is_dir() {
        return Err(AnalysisError::InvalidPath(root.to_path_buf()));
    }

    let files: Vec<(PathBuf, &'static str)> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped(e, extra_exclude_dirs))
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_lowercase();
            if EXCLUDED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
                return None;
            }
            let language = name
                .rfind('.')
                .and_then(|idx| LANGUAGE_BY_EXTENSION.get(&name[idx..]))?;
            Some((e.into_path(), *language))
        })
        .collect();

    if files.is_empty() {
        return Err(AnalysisError::NoSourceFiles(root.to_path_buf()));
    }

    let counts: Vec<FileCount> = files
        .par_iter()
        .filter_map(|(path, language)| count_file(path, *language))
        .collect();

    let mut metrics = CodeMetrics::default();
    for count in counts {
        metrics.total_lines += count.total;
        metrics.code_lines += count.code;
        metrics.comment_lines += count.comment;
        metrics.blank_lines += count.blank;
        metrics.files_count += 1;
        *metrics.languages.entry(count.language.to_string()).or_insert(0) += count.code;
    }

    Ok(metrics)
}

fn is_skipped(entry: &DirEntry, extra_exclude_dirs: &[String]) -> bool {
    // the walk root itself is never skipped, even when invoked as "."
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir()
        && (EXCLUDED_DIRS.contains(name.as_ref())
            || extra_exclude_dirs.iter().any(|d| d == name.as_ref()))
}

fn count_file(path: &Path, language: &'static str) -> Option<FileCount> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("skipping unreadable file {}: {e}", path.display());
            return None;
        }
    };
    let content = String::from_utf8_lossy(&bytes);

    let mut count = FileCount {
        language,
        total: 0,
        code: 0,
        comment: 0,
        blank: 0,
    };

    for line in content.lines() {
        count.total += 1;
        let stripped = line.trim();
        if stripped.is_empty() {
            count.blank += 1;
        } else if COMMENT_PREFIXES.iter().any(|p| stripped.starts_with(p)) {
            count.comment += 1;
        } else {
            count.code += 1;
        }
    }

    Some(count)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
