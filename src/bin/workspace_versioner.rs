use anyhow::{Context, Result};
use colored::Colorize;
use std::process::ExitCode;

use workspace_versioner::cli::{self, Invocation, Mode, Settings};
use workspace_versioner::{DependencyGraph, VersionManager, VersionerConfig, WorkspaceScanner};

fn main() -> Result<ExitCode> {
    let args: Vec<_> = std::env::args_os().collect();
    let settings = Settings::from_args(args.iter().cloned());

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(settings.log_level()))
        .init();

    let config = VersionerConfig::load(&settings.root)?
        .with_overrides(settings.crates_dir.clone(), settings.strip_prefix.clone());
    let workspace = WorkspaceScanner::new(&settings.root, config)
        .scan()
        .with_context(|| format!("Failed to scan workspace at {}", settings.root.display()))?;

    let matches = cli::build_command(&workspace).get_matches_from(args);
    let invocation = Invocation::from_matches(&workspace, &matches);

    let graph = DependencyGraph::discover(&workspace)?;
    let manager = VersionManager::new(workspace).with_dry_run(invocation.dry_run);

    match invocation.mode {
        Mode::List { json } => {
            let summaries = cli::package_summaries(manager.workspace(), &graph);
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for summary in &summaries {
                    println!(
                        "  {} {} {}",
                        summary.key.bright_white().bold(),
                        summary.flag.dimmed(),
                        summary.version.as_deref().unwrap_or("-").cyan()
                    );
                }
            }
        }
        Mode::Check => {
            let report = manager.check_consistency()?;
            report.print();
            if report.has_issues() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Mode::Sync(version) => manager.sync(&version)?.print(),
        Mode::Update(requested) => manager.update(&requested)?.print(),
        Mode::Inspect => {
            log::info!(
                "{} package(s), {} dependency edge(s); nothing requested",
                manager.workspace().packages().len(),
                graph.edge_count()
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}
