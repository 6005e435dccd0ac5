use crate::insights;
use crate::security;
use crate::types::{
    CodeMetrics, ComplexityTier, CostEstimate, GitSummary, IntegratedIndicators, ResultBundle,
    SecurityReport,
};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};
use std::collections::HashMap;

pub fn report_terminal(bundle: &ResultBundle, code: &CodeMetrics) {
    eprintln!();
    println!(
        "{} — {} {}",
        "💰 costline".green().bold(),
        bundle.project_name.bold(),
        format!("({})", bundle.project_path).bright_black(),
    );
    println!(
        "   {}",
        format!(
            "integrated analysis, generated {}",
            bundle.generated_at.get(..10).unwrap_or(&bundle.generated_at)
        )
        .bright_black(),
    );
    println!();

    print_source_section(code);
    print_cocomo_section(&bundle.cocomo);

    match &bundle.git {
        Some(git) => print_git_section(git),
        None => absent_section("📊 Git History", "not a git repository or no commits"),
    }

    match &bundle.integrated {
        Some(indicators) => print_integrated_section(indicators),
        None => absent_section("⚖️  Estimate vs. Reality", "requires git history"),
    }

    match &bundle.security {
        Some(report) => print_security_section(report),
        None => absent_section("🔐 Security", "scan skipped or unavailable"),
    }

    print_insights(bundle);

    if let Some(ai) = &bundle.ai_insights {
        print_ai_section(ai);
    }

    println!();
}

// ─── Sections ─────────────────────────────────────────────────────────────────

fn print_source_section(code: &CodeMetrics) {
    println!("{}", "📄 Source".cyan().bold());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["METRIC", "VALUE"]);
    table.add_row(vec![
        Cell::new("Files"),
        Cell::new(group_thousands(code.files_count)),
    ]);
    table.add_row(vec![
        Cell::new("Total lines"),
        Cell::new(group_thousands(code.total_lines)),
    ]);
    table.add_row(vec![
        Cell::new("Code lines"),
        Cell::new(group_thousands(code.code_lines)).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Comment lines"),
        Cell::new(group_thousands(code.comment_lines)),
    ]);
    table.add_row(vec![
        Cell::new("Blank lines"),
        Cell::new(group_thousands(code.blank_lines)),
    ]);
    println!("{table}");

    let top = top_entries(&code.languages, 5);
    if !top.is_empty() {
        let parts: Vec<String> = top
            .iter()
            .map(|(language, lines)| {
                format!("{language} {:.0}%", percent_of(*lines, code.code_lines))
            })
            .collect();
        println!("   {}", parts.join(" · ").bright_black());
    }
    println!();
}

fn print_cocomo_section(estimate: &CostEstimate) {
    println!("{}", "💵 COCOMO Estimate".cyan().bold());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["METRIC", "VALUE"]);
    table.add_row(vec![
        Cell::new("Size"),
        Cell::new(format!("{:.2} KLOC", estimate.kloc)),
    ]);
    table.add_row(vec![
        Cell::new("Effort"),
        Cell::new(format!("{:.1} person-months", estimate.effort_person_months)),
    ]);
    table.add_row(vec![
        Cell::new("Duration"),
        Cell::new(format!("{:.1} months", estimate.duration_months)),
    ]);
    table.add_row(vec![
        Cell::new("Team size"),
        Cell::new(format!("{:.1} people", estimate.headcount)),
    ]);
    table.add_row(vec![
        Cell::new("Maintenance team"),
        Cell::new(format!("{:.1} people", estimate.maintenance_headcount)),
    ]);
    table.add_row(vec![
        Cell::new("Expansion team"),
        Cell::new(format!("{:.1} people", estimate.expansion_headcount)),
    ]);
    table.add_row(vec![
        Cell::new("Productivity"),
        Cell::new(format!("{:.0} lines/person-month", estimate.productivity)),
    ]);
    table.add_row(vec![
        Cell::new("Estimated cost"),
        Cell::new(fmt_money(estimate.cost)).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("Complexity"), tier_cell(estimate.complexity)]);
    println!("{table}");
    println!();
}

fn print_git_section(git: &GitSummary) {
    println!("{}", "📊 Git History".cyan().bold());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["METRIC", "VALUE"]);
    table.add_row(vec![
        Cell::new("Commits"),
        Cell::new(group_thousands(git.total_commits)),
    ]);
    table.add_row(vec![
        Cell::new("Authors"),
        Cell::new(group_thousands(git.total_authors)),
    ]);
    table.add_row(vec![
        Cell::new("Insertions"),
        Cell::new(format!("+{}", group_thousands(git.total_insertions))).fg(Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Deletions"),
        Cell::new(format!("-{}", group_thousands(git.total_deletions))).fg(Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Files changed"),
        Cell::new(group_thousands(git.total_files_changed)),
    ]);
    table.add_row(vec![
        Cell::new("Avg changes/commit"),
        Cell::new(format!("{:.1}", git.avg_changes_per_commit)),
    ]);
    table.add_row(vec![
        Cell::new("Avg files/commit"),
        Cell::new(format!("{:.1}", git.avg_files_per_commit)),
    ]);
    table.add_row(vec![
        Cell::new("Commits/day"),
        Cell::new(format!("{:.2}", git.commits_per_day)),
    ]);
    table.add_row(vec![
        Cell::new("Repository age"),
        Cell::new(format!("{} days", group_thousands(git.repository_age_days as u64))),
    ]);
    table.add_row(vec![
        Cell::new("First commit"),
        Cell::new(git.first_commit_date.format("%Y-%m-%d").to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Last commit"),
        Cell::new(git.last_commit_date.format("%Y-%m-%d").to_string()),
    ]);
    println!("{table}");

    let top = top_entries(&git.authors, 5);
    if !top.is_empty() {
        println!("   {}", "Top authors:".bright_black());
        for (author, commits) in &top {
            println!(
                "   {} {} {}",
                "•".white(),
                author.cyan(),
                format!(
                    "{} commit{} ({:.0}%)",
                    commits,
                    if *commits != 1 { "s" } else { "" },
                    percent_of(*commits, git.total_commits)
                )
                .bright_black(),
            );
        }
    }
    println!();
}

fn print_integrated_section(indicators: &IntegratedIndicators) {
    println!("{}", "⚖️  Estimate vs. Reality".cyan().bold());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["INDICATOR", "VALUE"]);
    table.add_row(vec![
        Cell::new("Lines per commit"),
        Cell::new(format!("{:.1}", indicators.lines_per_commit)),
    ]);
    table.add_row(vec![
        Cell::new("Commits to rebuild"),
        Cell::new(format!("{:.0}", indicators.commits_needed_to_rebuild)),
    ]);
    table.add_row(vec![
        Cell::new("Commits per month"),
        Cell::new(format!("{:.1}", indicators.commits_per_month)),
    ]);
    table.add_row(vec![
        Cell::new("Actual velocity"),
        Cell::new(format!("{:.1} lines/day", indicators.actual_velocity)),
    ]);
    table.add_row(vec![
        Cell::new("Estimated velocity"),
        Cell::new(format!("{:.1} lines/day", indicators.estimated_velocity)),
    ]);
    table.add_row(vec![
        Cell::new("Velocity ratio"),
        Cell::new(format!("{:.2}x", indicators.velocity_ratio)),
    ]);
    table.add_row(vec![
        Cell::new("Commit efficiency"),
        Cell::new(format!("{:.1}%", indicators.commit_efficiency)),
    ]);
    table.add_row(vec![
        Cell::new("Change per commit"),
        Cell::new(format!("{:.2}%", indicators.change_percentage_per_commit)),
    ]);
    table.add_row(vec![
        Cell::new("Productivity score"),
        score_cell(indicators.productivity_score),
    ]);
    println!("{table}");
    println!();
}

fn print_security_section(report: &SecurityReport) {
    println!("{}", "🔐 Security".cyan().bold());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["SEVERITY", "FINDINGS"]);
    table.add_row(vec![
        Cell::new("🔴 Critical").fg(Color::Red),
        severity_count_cell(report.critical_count, Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("🟠 High").fg(Color::Yellow),
        severity_count_cell(report.high_count, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("🟡 Medium"),
        severity_count_cell(report.medium_count, Color::Reset),
    ]);
    table.add_row(vec![
        Cell::new("🟢 Low").fg(Color::Green),
        severity_count_cell(report.low_count, Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("ℹ️  Info").fg(Color::DarkGrey),
        severity_count_cell(report.info_count, Color::DarkGrey),
    ]);
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(group_thousands(report.total_findings)).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    println!(
        "   {} {}",
        "Security score:".bright_black(),
        format!("{:.0}/100", security::security_score(report)),
    );

    let top_files = security::top_vulnerable_files(report, 5);
    if !top_files.is_empty() {
        println!("   {}", "Most affected files:".bright_black());
        for (file, findings) in &top_files {
            println!(
                "   {} {} {}",
                "•".white(),
                truncate_path(file, 56).cyan(),
                format!("{} finding{}", findings, if *findings != 1 { "s" } else { "" })
                    .bright_black(),
            );
        }
    }
    println!();
}

fn print_insights(bundle: &ResultBundle) {
    let set = insights::build_insights(bundle);
    if set.is_empty() {
        return;
    }

    println!("{}", "💡 Insights".cyan().bold());
    for group in [&set.estimate, &set.integrated, &set.team, &set.security] {
        for line in group {
            println!("    {} {}", "•".white(), line);
        }
    }
    println!();
}

fn print_ai_section(ai: &crate::types::AiInsights) {
    println!(
        "{} {}",
        "🤖 AI Insights".cyan().bold(),
        format!("({})", ai.model).bright_black(),
    );
    println!("    {}", ai.assessment);

    for (title, lines) in [
        ("Strengths", &ai.strengths),
        ("Concerns", &ai.concerns),
        ("Recommendations", &ai.recommendations),
    ] {
        if lines.is_empty() {
            continue;
        }
        println!("    {}", title.bold());
        for line in lines {
            println!("      {} {}", "•".white(), line);
        }
    }
    println!();
}

fn absent_section(title: &str, reason: &str) {
    println!("{} {}", title.bright_black(), format!("— {reason}").bright_black());
    println!();
}

// ─── Cell builders ────────────────────────────────────────────────────────────

/// Tier cell: plain label text + color so comfy-table measures the real
/// visible width (no ANSI escape bytes in the column content).
fn tier_cell(tier: ComplexityTier) -> Cell {
    match tier {
        ComplexityTier::Low    => Cell::new("🟢 LOW").fg(Color::Green),
        ComplexityTier::Medium => Cell::new("🟡 MEDIUM").fg(Color::Yellow),
        ComplexityTier::High   => Cell::new("🔴 HIGH").fg(Color::Red).add_attribute(Attribute::Bold),
    }
}

/// Productivity-score cell: high is good here, so the color scale runs the
/// opposite way to a risk score.
fn score_cell(score: f64) -> Cell {
    let text = format!("{score:.0}/100");
    if score >= 75.0 {
        Cell::new(text).fg(Color::Green).add_attribute(Attribute::Bold)
    } else if score >= 50.0 {
        Cell::new(text).fg(Color::Yellow)
    } else {
        Cell::new(text).fg(Color::Red)
    }
}

fn severity_count_cell(count: u64, color: Color) -> Cell {
    if count > 0 {
        Cell::new(group_thousands(count)).fg(color)
    } else {
        Cell::new("0").fg(Color::DarkGrey)
    }
}

// ─── Other helpers ────────────────────────────────────────────────────────────

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn fmt_money(amount: f64) -> String {
    format!("${}", group_thousands(amount.round().max(0.0) as u64))
}

fn percent_of(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Largest entries first; ties break alphabetically so output is stable.
fn top_entries(map: &HashMap<String, u64>, limit: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}

/// Keeps the tail of an over-long path, counting chars rather than bytes so
/// multi-byte file names never split mid-character.
fn truncate_path(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    let skip = count - (max - 1);
    let start = s.char_indices().nth(skip).map_or(0, |(i, _)| i);
    format!("…{}", &s[start..])
}

// ─── Tests ────────────────────────────────────────────────────────────────────
