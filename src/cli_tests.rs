use crate::cli::{build_command, package_summaries, Invocation, Mode, Settings};
use crate::config::VersionerConfig;
use crate::graph::DependencyGraph;
use crate::test_support::{create_test_workspace, scan, write};
use crate::workspace::{Workspace, WorkspaceScanner};
use std::path::PathBuf;

fn invocation(workspace: &Workspace, args: &[&str]) -> Invocation {
    let mut argv = vec!["workspace-versioner"];
    argv.extend_from_slice(args);
    let matches = build_command(workspace).try_get_matches_from(argv).unwrap();
    Invocation::from_matches(workspace, &matches)
}

#[test]
fn test_settings_defaults() {
    let settings = Settings::from_args(["workspace-versioner"]);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.root, PathBuf::from("."));
    assert_eq!(settings.log_level(), "warn");
}

#[test]
fn test_settings_ignore_package_flags() {
    let settings = Settings::from_args([
        "workspace-versioner",
        "--collision",
        "0.2.0",
        "--root",
        "/tmp/ws",
        "--strip-prefix=gdrust-",
        "-vv",
    ]);
    assert_eq!(settings.root, PathBuf::from("/tmp/ws"));
    assert_eq!(settings.strip_prefix.as_deref(), Some("gdrust-"));
    assert_eq!(settings.crates_dir, None);
    assert_eq!(settings.verbosity, 2);
    assert_eq!(settings.log_level(), "debug");
}

#[test]
fn test_settings_count_verbosity_in_short_clusters() {
    let settings = Settings::from_args(["workspace-versioner", "-nv", "--sync", "1.0.0"]);
    assert_eq!(settings.verbosity, 1);

    let settings = Settings::from_args(["workspace-versioner", "-lvv"]);
    assert_eq!(settings.verbosity, 2);
    assert_eq!(settings.log_level(), "debug");

    // Everything after -m is its value.
    let settings = Settings::from_args(["workspace-versioner", "-mv1.0", "--verbose"]);
    assert_eq!(settings.verbosity, 1);
}

#[test]
fn test_settings_stop_at_double_dash() {
    let settings = Settings::from_args(["workspace-versioner", "--", "--root", "/elsewhere"]);
    assert_eq!(settings.root, PathBuf::from("."));
}

#[test]
fn test_no_flags_is_inspect() {
    let workspace_dir = create_test_workspace();
    let workspace = scan(workspace_dir.path());
    let inv = invocation(&workspace, &[]);
    assert_eq!(inv.mode, Mode::Inspect);
    assert!(!inv.dry_run);
}

#[test]
fn test_package_flags_generated() {
    let workspace_dir = create_test_workspace();
    let workspace = scan(workspace_dir.path());

    let inv = invocation(&workspace, &["--alpha", "0.5.0", "-m", "1.0.0", "--dry-run"]);
    match inv.mode {
        Mode::Update(requested) => {
            assert_eq!(requested.len(), 2);
            assert_eq!(requested["alpha"], "0.5.0");
            assert_eq!(requested["main"], "1.0.0");
        }
        other => panic!("unexpected mode {:?}", other),
    }
    assert!(inv.dry_run);
}

#[test]
fn test_unknown_package_flag_rejected() {
    let workspace_dir = create_test_workspace();
    let workspace = scan(workspace_dir.path());
    let result = build_command(&workspace).try_get_matches_from(["workspace-versioner", "--delta", "1.0.0"]);
    assert!(result.is_err());
}

#[test]
fn test_mode_precedence() {
    let workspace_dir = create_test_workspace();
    let workspace = scan(workspace_dir.path());

    assert_eq!(
        invocation(&workspace, &["--list", "--sync", "1.0.0"]).mode,
        Mode::List { json: false }
    );
    assert_eq!(
        invocation(&workspace, &["--check", "--sync", "1.0.0"]).mode,
        Mode::Check
    );
    assert_eq!(
        invocation(&workspace, &["-s", "1.0.0", "--beta", "2.0.0"]).mode,
        Mode::Sync("1.0.0".to_string())
    );
    assert_eq!(
        invocation(&workspace, &["-l", "--json"]).mode,
        Mode::List { json: true }
    );
}

#[test]
fn test_json_requires_list() {
    let workspace_dir = create_test_workspace();
    let workspace = scan(workspace_dir.path());
    let result = build_command(&workspace).try_get_matches_from(["workspace-versioner", "--json"]);
    assert!(result.is_err());
}

#[test]
fn test_prefix_stripping_and_collisions() {
    let workspace_dir = create_test_workspace();
    let root = workspace_dir.path();
    write(root, "crates/gdrust_collision/Cargo.toml", "[package]\nversion = \"0.1.0\"\n");
    write(root, "crates/gdrust_check/Cargo.toml", "[package]\nversion = \"0.1.0\"\n");
    write(root, "crates/collision/Cargo.toml", "[package]\nversion = \"0.1.0\"\n");

    let config = VersionerConfig::default().with_overrides(None, Some("gdrust-".to_string()));
    let workspace = WorkspaceScanner::new(root, config).scan().unwrap();

    // `collision` sorts first and claims --collision; gdrust_check loses to --check.
    let inv = invocation(&workspace, &["--collision", "0.9.0"]);
    match inv.mode {
        Mode::Update(requested) => {
            assert_eq!(requested.len(), 1);
            assert_eq!(requested["collision"], "0.9.0");
        }
        other => panic!("unexpected mode {:?}", other),
    }

    let inv = invocation(&workspace, &["--check"]);
    assert_eq!(inv.mode, Mode::Check);
}

#[test]
fn test_package_summaries() {
    let workspace_dir = create_test_workspace();
    let workspace = scan(workspace_dir.path());
    let graph = DependencyGraph::discover(&workspace).unwrap();

    let summaries = package_summaries(&workspace, &graph);
    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries[0].flag, "--main");
    assert_eq!(summaries[1].key, "alpha");
    assert_eq!(summaries[1].dependencies, vec!["main".to_string()]);

    let json = serde_json::to_value(&summaries).unwrap();
    assert_eq!(json[2]["name"], "beta");
    assert_eq!(json[2]["version"], "0.2.0");
}
