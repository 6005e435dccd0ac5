mod ai;
mod cocomo;
mod config;
mod error;
mod git;
mod insights;
mod integrated;
mod pipeline;
mod reporters;
mod scan;
mod security;
mod types;

use clap::Parser;
use colored::Colorize;
use error::AnalysisError;
use indicatif::{ProgressBar, ProgressStyle};
use pipeline::{AnalysisOptions, Stage, StageEvent, StageStatus};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(
    name = "costline",
    about = "💰 Estimate development effort and cost, cross-checked against git history",
    version,
    long_about = "Estimates development effort, duration, team size, and cost from the\n\
                  source tree (COCOMO II), then cross-checks the estimate against the\n\
                  project's actual git history and an optional semgrep security scan.\n\n\
                  Stages degrade independently: a project without git history still\n\
                  gets a cost estimate, just without the comparison indicators."
)]
struct Args {
    /// Project directory to analyze.
    #[arg(value_name = "PATH", default_value = ".")]
    project_path: PathBuf,

    /// Write the JSON report to this file.
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Skip the semgrep security scan.
    #[arg(long)]
    no_security: bool,

    /// Ruleset for semgrep --config: "auto", a registry pack like "p/default",
    /// or a path to a local rules file.
    #[arg(long, value_name = "CFG")]
    security_config: Option<String>,

    /// Generate narrative insights via an OpenAI-compatible API
    /// (requires OPENAI_API_KEY).
    #[arg(long)]
    ai_insights: bool,

    /// Fail instead of degrading when the project has no usable git history.
    #[arg(long)]
    require_git: bool,

    /// Monthly salary per developer. Only affects the cost figure.
    #[arg(long, value_name = "N")]
    salary: Option<f64>,

    /// Path to a config file (default: .costline.yml in the project, if present).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print an annotated config template and exit.
    #[arg(long)]
    generate_config: bool,

    /// Suppress progress output and the terminal report (useful with --export).
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), AnalysisError> {
    if args.generate_config {
        return config::print_template(None).map_err(AnalysisError::Config);
    }

    let cfg = load_config(args)?;
    let mut params = cfg.cocomo_params();
    if let Some(salary) = args.salary {
        if !salary.is_finite() || salary <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "invalid --salary value: {salary}. Must be a positive monthly salary"
            )));
        }
        params.monthly_salary = salary;
    }

    let options = AnalysisOptions {
        run_security: !args.no_security && cfg.security_enabled(),
        security_config: resolve_security_config(args.security_config.as_deref(), &cfg),
        require_git: args.require_git,
        extra_exclude_dirs: cfg.extra_exclude_dirs(),
    };

    let start = Instant::now();
    let mut outcome = if args.quiet {
        pipeline::analyze(&args.project_path, &options, &params, |_| {})?
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .expect("spinner template is static and valid")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.enable_steady_tick(Duration::from_millis(80));

        let result = pipeline::analyze(&args.project_path, &options, &params, |event| {
            if event.is_terminal() {
                pb.println(stage_line(&event));
            } else {
                pb.set_message(stage_label(&event));
            }
        });
        pb.finish_and_clear();
        result?
    };

    if !args.quiet {
        eprintln!(
            "✔ {} — {} code lines, {} — ⏱ {}",
            outcome.bundle.project_name,
            outcome.code.code_lines,
            match &outcome.bundle.git {
                Some(git) => format!("{} commits", git.total_commits),
                None => "no git history".to_string(),
            },
            fmt_dur(start.elapsed()),
        );
    }

    if args.ai_insights {
        attach_ai_insights(&mut outcome.bundle, &cfg, args.quiet);
    }

    if !args.quiet {
        reporters::terminal::report_terminal(&outcome.bundle, &outcome.code);
    }

    let export_path = args
        .export
        .clone()
        .or_else(|| cfg.export.as_ref().map(PathBuf::from));
    if let Some(path) = export_path {
        reporters::json::export_bundle(&outcome.bundle, &path)?;
    }

    Ok(())
}

/// Explicit --config must exist; the implicit project-local .costline.yml is
/// only picked up when present.
fn load_config(args: &Args) -> Result<config::CostlineConfig, AnalysisError> {
    if let Some(path) = &args.config {
        return config::load_config(path).map_err(AnalysisError::Config);
    }
    let implicit = args.project_path.join(".costline.yml");
    if implicit.is_file() {
        log::info!("using config file {}", implicit.display());
        return config::load_config(&implicit).map_err(AnalysisError::Config);
    }
    Ok(config::CostlineConfig::default())
}

fn resolve_security_config(flag: Option<&str>, cfg: &config::CostlineConfig) -> String {
    flag.or_else(|| cfg.security_config())
        .unwrap_or("auto")
        .to_string()
}

fn attach_ai_insights(bundle: &mut types::ResultBundle, cfg: &config::CostlineConfig, quiet: bool) {
    let client = match ai::AiClient::from_env(cfg.ai_model.clone()) {
        Ok(client) => client,
        Err(e) => {
            log::warn!("ai insights unavailable: {e}");
            eprintln!("{}", format!("⚠ AI insights unavailable: {e}").yellow());
            return;
        }
    };

    if !quiet {
        eprintln!("🤖 Generating AI insights ({})...", client.model());
    }
    match client.generate(bundle) {
        Ok(insights) => bundle.ai_insights = Some(insights),
        Err(e) => {
            log::warn!("ai insights failed: {e}");
            eprintln!("{}", format!("⚠ AI insights unavailable: {e}").yellow());
        }
    }
}

// ─── Progress formatting ───────────────────────────────────────────────────────

fn stage_label(event: &StageEvent) -> String {
    format!(
        "[{}/{}] {} ({}%)",
        event.stage.index(),
        Stage::COUNT,
        event.message,
        event.percent()
    )
}

/// Finished-stage line printed above the spinner, one per stage outcome:
/// completed, skipped, or degraded.
fn stage_line(event: &StageEvent) -> String {
    let mark = match event.status {
        StageStatus::Completed => "✓",
        StageStatus::Skipped => "↷",
        StageStatus::Degraded => "⚠",
        StageStatus::Started => " ",
    };
    format!(
        "  {} [{}/{}] {}",
        mark,
        event.stage.index(),
        Stage::COUNT,
        event.message
    )
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{ms}ms")
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
