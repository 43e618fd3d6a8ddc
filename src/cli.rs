//! Command-line surface.
//!
//! Flags depend on the packages found in the workspace, so parsing happens in
//! two phases: [`Settings::from_args`] reads the options needed to locate and
//! scan the workspace, then [`build_command`] adds one `--<package> <VERSION>`
//! flag per sub-package and [`Invocation::from_matches`] interprets the result.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::graph::DependencyGraph;
use crate::workspace::{Workspace, MAIN_PACKAGE};

/// Long flags owned by the tool itself; packages cannot claim them.
const RESERVED_FLAGS: &[&str] = &[
    "main",
    "sync",
    "list",
    "json",
    "check",
    "dry-run",
    "verbose",
    "root",
    "crates-dir",
    "strip-prefix",
    "help",
    "version",
];

/// Options taking a value that are needed before the workspace is scanned.
const SETTINGS_OPTIONS: &[&str] = &["--root", "--crates-dir", "--strip-prefix"];

const PACKAGE_ID_PREFIX: &str = "package:";

fn base_command() -> Command {
    Command::new("workspace-versioner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Update crate versions in the workspace")
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .default_value(".")
                .help("Workspace root"),
        )
        .arg(
            Arg::new("crates-dir")
                .long("crates-dir")
                .value_name("DIR")
                .help("Directory holding the sub-packages [default: crates]"),
        )
        .arg(
            Arg::new("strip-prefix")
                .long("strip-prefix")
                .value_name("PREFIX")
                .help("Prefix removed from generated package flags"),
        )
        .arg(
            Arg::new("main")
                .short('m')
                .long("main")
                .value_name("VERSION")
                .help("Update main package version"),
        )
        .arg(
            Arg::new("sync")
                .short('s')
                .long("sync")
                .value_name("VERSION")
                .help("Synchronize all packages to VERSION"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .action(ArgAction::SetTrue)
                .help("List all available packages"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .requires("list")
                .help("Print the package list as JSON"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Report dependency versions that disagree with their packages"),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Show what would change without writing files"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Log more (repeat for debug output)"),
        )
}

/// Options resolved before the workspace is scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub root: PathBuf,
    pub crates_dir: Option<String>,
    pub strip_prefix: Option<String>,
    pub verbosity: u8,
}

/// Number of `v`s in a short flag cluster such as `-nv` or `-lvv`.
///
/// Scanning stops at `-m`/`-s` since the rest of the cluster is their value.
fn short_verbosity(arg: &str) -> Option<usize> {
    let cluster = arg.strip_prefix('-').filter(|rest| !rest.starts_with('-'))?;
    let count = cluster
        .chars()
        .take_while(|c| !matches!(c, 'm' | 's'))
        .filter(|&c| c == 'v')
        .count();
    (count > 0).then_some(count)
}

impl Settings {
    /// First parsing phase.
    ///
    /// Package flags are not known yet, so only the settings options and
    /// `-v` are kept from `args` before handing them to clap.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let mut kept: Vec<OsString> = args.iter().take(1).cloned().collect();

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            let lossy = arg.to_string_lossy();
            let text: &str = &lossy;
            if text == "--" {
                break;
            }
            if SETTINGS_OPTIONS.contains(&text) {
                kept.push(arg.clone());
                if let Some(value) = iter.next() {
                    kept.push(value.clone());
                }
            } else if SETTINGS_OPTIONS
                .iter()
                .any(|opt| text.starts_with(&format!("{}=", opt)))
                || text == "--verbose"
            {
                kept.push(arg.clone());
            } else if let Some(count) = short_verbosity(text) {
                kept.push(OsString::from(format!("-{}", "v".repeat(count))));
            }
        }

        let matches = base_command()
            .ignore_errors(true)
            .try_get_matches_from(kept)
            .ok();

        let Some(matches) = matches else {
            return Self::default();
        };

        Self {
            root: matches
                .get_one::<PathBuf>("root")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(".")),
            crates_dir: matches.get_one::<String>("crates-dir").cloned(),
            strip_prefix: matches.get_one::<String>("strip-prefix").cloned(),
            verbosity: matches.get_one::<u8>("verbose").copied().unwrap_or(0),
        }
    }

    /// Log filter matching the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            crates_dir: None,
            strip_prefix: None,
            verbosity: 0,
        }
    }
}

/// Second parsing phase: the full command with one flag per sub-package.
///
/// A package whose flag collides with a built-in flag or with another
/// package's flag gets no flag.
pub fn build_command(workspace: &Workspace) -> Command {
    let strip_prefix = workspace.config().strip_prefix.as_deref();
    let mut command = base_command();
    let mut taken: HashSet<String> = RESERVED_FLAGS.iter().map(|f| f.to_string()).collect();

    for package in workspace.packages().iter().filter(|p| !p.is_main()) {
        let flag = package.flag_name(strip_prefix);
        if !taken.insert(flag.clone()) {
            log::warn!(
                "No flag for package '{}': --{} is already taken",
                package.key,
                flag
            );
            continue;
        }

        command = command.arg(
            Arg::new(format!("{}{}", PACKAGE_ID_PREFIX, package.key))
                .long(flag)
                .value_name("VERSION")
                .help_heading("Packages")
                .help(format!("Update {} version", package.key)),
        );
    }

    command
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Print the discovered packages.
    List { json: bool },
    /// Report inconsistent dependency versions.
    Check,
    /// Set every package to one version.
    Sync(String),
    /// Set the named packages (key → version).
    Update(BTreeMap<String, String>),
    /// Nothing requested: discovery and dependency analysis only.
    Inspect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: Mode,
    pub dry_run: bool,
}

impl Invocation {
    /// Interpret second-phase matches. List wins over check, check over
    /// sync, sync over per-package updates.
    pub fn from_matches(workspace: &Workspace, matches: &ArgMatches) -> Self {
        let dry_run = matches.get_flag("dry-run");

        let mode = if matches.get_flag("list") {
            Mode::List {
                json: matches.get_flag("json"),
            }
        } else if matches.get_flag("check") {
            Mode::Check
        } else if let Some(version) = matches.get_one::<String>("sync") {
            Mode::Sync(version.clone())
        } else {
            let mut requested = BTreeMap::new();
            if let Some(version) = matches.get_one::<String>("main") {
                requested.insert(MAIN_PACKAGE.to_string(), version.clone());
            }
            for package in workspace.packages().iter().filter(|p| !p.is_main()) {
                let id = format!("{}{}", PACKAGE_ID_PREFIX, package.key);
                let value = matches
                    .try_get_one::<String>(&id)
                    .ok()
                    .flatten();
                if let Some(version) = value {
                    requested.insert(package.key.clone(), version.clone());
                }
            }

            if requested.is_empty() {
                Mode::Inspect
            } else {
                Mode::Update(requested)
            }
        };

        Self { mode, dry_run }
    }
}

/// One row of `--list` output.
#[derive(Debug, Clone, Serialize)]
pub struct PackageSummary {
    pub key: String,
    pub name: String,
    pub flag: String,
    pub version: Option<String>,
    pub manifest: PathBuf,
    pub dependencies: Vec<String>,
}

pub fn package_summaries(workspace: &Workspace, graph: &DependencyGraph) -> Vec<PackageSummary> {
    let strip_prefix = workspace.config().strip_prefix.as_deref();
    workspace
        .packages()
        .iter()
        .map(|package| PackageSummary {
            key: package.key.clone(),
            name: package.name.clone(),
            flag: format!("--{}", package.flag_name(strip_prefix)),
            version: package.version.clone(),
            manifest: package.manifest.clone(),
            dependencies: graph
                .dependencies_of(&package.key)
                .iter()
                .map(|edge| edge.dependency.clone())
                .collect(),
        })
        .collect()
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
