use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use text_patcher::config::{
    apply_patch_sets, check_patch_set, discover_patch_files, load_from_path, ApplicationError,
    ApplyOptions, CheckStatus, FailurePolicy, PatchConfig,
};
use text_patcher::message::error_chain;
use text_patcher::presets::{find_preset, PRESETS};
use text_patcher::runner::{PatchError, PatchReport, PatchStatus, RunMode};

#[derive(Parser)]
#[command(name = "text-patcher")]
#[command(about = "Apply ordered literal and regex rewrite rules to text files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply patch files to a workspace
    Apply {
        /// Workspace root (defaults to the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Specific patch file to apply (otherwise applies all in patches/)
        #[arg(short, long)]
        patches: Option<PathBuf>,

        /// Show what would change without writing any file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show a unified diff of each change
        #[arg(short, long)]
        diff: bool,

        /// Stop at the first patch file that fails
        #[arg(long)]
        fail_fast: bool,

        /// Print results as JSON instead of text
        #[arg(long, conflicts_with = "diff")]
        json: bool,
    },

    /// Report which patch files are applied, pending, or broken, without writing
    Check {
        /// Workspace root (defaults to the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Specific patch file to check (otherwise checks all in patches/)
        #[arg(short, long)]
        patches: Option<PathBuf>,
    },

    /// List discovered patch files and built-in presets
    List {
        /// Workspace root (defaults to the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },

    /// Run a built-in preset
    Preset {
        /// Preset name (see `list`)
        name: String,

        /// Workspace root (defaults to the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Show what would change without writing the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show a unified diff of the change
        #[arg(short, long)]
        diff: bool,
    },
}

fn main() -> ExitCode {
    text_patcher::logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply {
            workspace,
            patches,
            dry_run,
            diff,
            fail_fast,
            json,
        } => cmd_apply(workspace, patches, dry_run, diff, fail_fast, json),

        Commands::Check { workspace, patches } => cmd_check(workspace, patches),

        Commands::List { workspace } => cmd_list(workspace),

        Commands::Preset {
            name,
            workspace,
            dry_run,
            diff,
        } => cmd_preset(&name, workspace, dry_run, diff),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), error_chain(&e));
            ExitCode::FAILURE
        }
    }
}

/// Explicit `--workspace`, else the current directory.
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    let path = match cli_workspace {
        Some(path) => path,
        None => env::current_dir().context("cannot determine current directory")?,
    };
    path.canonicalize()
        .with_context(|| format!("workspace not found: {}", path.display()))
}

fn load_configs(workspace: &Path, patches: Option<PathBuf>) -> Result<Vec<PatchConfig>> {
    let patch_files = match patches {
        Some(path) => vec![path],
        None => discover_patch_files(workspace)?,
    };

    patch_files
        .iter()
        .map(|file| load_from_path(file).map_err(anyhow::Error::from))
        .collect()
}

fn run_mode(dry_run: bool) -> RunMode {
    if dry_run {
        RunMode::DryRun
    } else {
        RunMode::Write
    }
}

/// Show unified diff between original and patched content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => continue,
        };
        print!("{}", line);
        if change.missing_newline() {
            println!();
        }
    }
}

fn print_report(name: &str, report: &PatchReport, show_diff: bool) {
    match report.status {
        PatchStatus::Patched => {
            let verb = if report.dry_run { "Would patch" } else { "Patched" };
            println!(
                "{} {}: {} {} ({} replacements)",
                "✓".green(),
                name,
                verb,
                report.target.display(),
                report.total_replacements()
            );
            for outcome in report.rules.iter().filter(|o| o.replacements == 0) {
                println!("    {} rule '{}' matched nothing", "·".dimmed(), outcome.rule_id);
            }
            if show_diff {
                display_diff(&report.target, &report.before, &report.after);
            }
        }
        PatchStatus::Unchanged => {
            println!(
                "{} {}: Already clean {}",
                "⊙".yellow(),
                name,
                report.target.display()
            );
        }
    }
}

fn print_failure(name: &str, error: &ApplicationError) {
    eprintln!("{} {}: {}", "✗".red(), name, error);
    if let ApplicationError::Patch(PatchError::Pattern { source, .. }) = error {
        eprintln!("  Fix the pattern of rule '{}' in the patch file", source.rule_id());
    }
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    patch_set: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a PatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn cmd_apply(
    workspace: Option<PathBuf>,
    patches: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    fail_fast: bool,
    json: bool,
) -> Result<ExitCode> {
    let workspace = resolve_workspace(workspace)?;
    let configs = load_configs(&workspace, patches)?;

    let options = ApplyOptions {
        mode: run_mode(dry_run),
        policy: if fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::BestEffort
        },
    };
    let results = apply_patch_sets(&configs, &workspace, options);
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    if json {
        let entries: Vec<JsonEntry<'_>> = results
            .iter()
            .map(|(name, result)| JsonEntry {
                patch_set: name,
                report: result.as_ref().ok(),
                error: result.as_ref().err().map(ToString::to_string),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("Workspace: {}", workspace.display());
        if dry_run {
            println!("{}", "[DRY RUN - no files will be written]".cyan());
        }
        println!();

        let mut patched = 0;
        let mut unchanged = 0;
        for (name, result) in &results {
            match result {
                Ok(report) => {
                    print_report(name, report, show_diff);
                    match report.status {
                        PatchStatus::Patched => patched += 1,
                        PatchStatus::Unchanged => unchanged += 1,
                    }
                }
                Err(e) => print_failure(name, e),
            }
        }

        let not_run = configs.len().saturating_sub(results.len());

        println!();
        println!("{}", "Summary:".bold());
        println!("  {} patched", format!("{}", patched).green());
        println!("  {} already clean", format!("{}", unchanged).yellow());
        println!("  {} failed", format!("{}", failed).red());
        if not_run > 0 {
            println!("  {} not run (fail-fast)", not_run);
        }
    }

    Ok(if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_check(workspace: Option<PathBuf>, patches: Option<PathBuf>) -> Result<ExitCode> {
    let workspace = resolve_workspace(workspace)?;
    let configs = load_configs(&workspace, patches)?;

    println!("{}", "Patch Status Report".bold());
    println!("Workspace: {}", workspace.display());
    println!();

    let mut applied = Vec::new();
    let mut pending = Vec::new();
    let mut broken = Vec::new();

    for config in &configs {
        match check_patch_set(config, &workspace) {
            Ok(CheckStatus::Applied) => applied.push(config.name()),
            Ok(status @ CheckStatus::Pending { .. }) => {
                pending.push((config.name(), status.to_string()))
            }
            Ok(status @ CheckStatus::NotIdempotent) => {
                broken.push((config.name(), status.to_string()))
            }
            Err(e) => broken.push((config.name(), e.to_string())),
        }
    }

    if !applied.is_empty() {
        println!(
            "{} {} ({} patch sets)",
            "✓".green(),
            "APPLIED".green().bold(),
            applied.len()
        );
        for name in &applied {
            println!("  - {}", name);
        }
        println!();
    }

    if !pending.is_empty() {
        println!(
            "{} {} ({} patch sets)",
            "⊙".yellow(),
            "PENDING".yellow().bold(),
            pending.len()
        );
        for (name, reason) in &pending {
            println!("  - {} ({})", name, reason.dimmed());
        }
        println!();
    }

    if !broken.is_empty() {
        println!(
            "{} {} ({} patch sets)",
            "✗".red(),
            "FAILING".red().bold(),
            broken.len()
        );
        for (name, reason) in &broken {
            println!("  - {} ({})", name, reason.dimmed());
        }
        println!();
    }

    Ok(if pending.is_empty() && broken.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_list(workspace: Option<PathBuf>) -> Result<ExitCode> {
    let workspace = resolve_workspace(workspace)?;

    println!("{}", "Patch files:".bold());
    match discover_patch_files(&workspace) {
        Ok(files) => {
            for file in files {
                match load_from_path(&file) {
                    Ok(config) => println!(
                        "  {} -> {} ({} rules){}",
                        config.name(),
                        config.target_path,
                        config.rules.len(),
                        config
                            .meta
                            .description
                            .as_deref()
                            .map(|d| format!(": {d}"))
                            .unwrap_or_default()
                    ),
                    Err(e) => println!("  {} {}", "✗".red(), e),
                }
            }
        }
        Err(e) => println!("  {}", e.to_string().dimmed()),
    }

    println!();
    println!("{}", "Built-in presets:".bold());
    for preset in PRESETS {
        let config = preset.config()?;
        println!(
            "  {} -> {} ({} rules)",
            preset.name,
            config.target_path,
            config.rules.len()
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_preset(
    name: &str,
    workspace: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
) -> Result<ExitCode> {
    let preset = find_preset(name).with_context(|| {
        let known: Vec<&str> = PRESETS.iter().map(|p| p.name).collect();
        format!("unknown preset '{name}' (known: {})", known.join(", "))
    })?;
    let workspace = resolve_workspace(workspace)?;

    let report = preset.run(&workspace, run_mode(dry_run))?;
    print_report(preset.name, &report, show_diff);
    if !dry_run {
        println!("{}", preset.success_message());
    }

    Ok(ExitCode::SUCCESS)
}
