use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{create_dir_all, read_to_string, write};
use std::path::Path;
use tempfile::tempdir;

fn write_fixture(root: &Path) {
    create_dir_all(root.join("src")).unwrap();
    create_dir_all(root.join("node_modules/dep")).unwrap();
    write(root.join("src/main.rs"), "fn main() {\n    println!(\"hi\");\n}\n").unwrap();
    write(root.join("README.md"), "# fixture\n").unwrap();
    write(root.join("style.css"), "body { margin: 0; }\n").unwrap();
    write(root.join("node_modules/dep/index.js"), "module.exports = {};\n").unwrap();
}

#[test]
fn extract_local_directory_writes_default_output_file() {
    let repo = tempdir().unwrap();
    write_fixture(repo.path());
    let work = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("repo-extract").expect("Binary exists");
    cmd.current_dir(work.path())
        .arg("extract")
        .arg(repo.path())
        .env_remove("RUST_LOG");

    cmd.assert()
        .success()
        .stdout(
            predicate::str::contains("Summary:")
                .and(predicate::str::contains("Files found: 4"))
                .and(predicate::str::contains("Files excluded by patterns: 1"))
                .and(predicate::str::contains("Files processed: 3"))
                .and(predicate::str::contains(
                    "Analysis complete! Output written to: output.txt",
                )),
        );

    let written = read_to_string(work.path().join("output.txt")).unwrap();
    assert!(written.starts_with("Directory structure:\n"));
    assert!(written.contains("File: src/main.rs"));
    assert!(!written.contains("node_modules"));
}

#[test]
fn extract_honours_format_exclude_and_output_flags() {
    let repo = tempdir().unwrap();
    write_fixture(repo.path());
    let work = tempdir().unwrap();
    let out = work.path().join("dump.json");

    let mut cmd = Command::cargo_bin("repo-extract").unwrap();
    cmd.current_dir(work.path())
        .args(["extract", "-f", "json", "-e", "**/*.css", "-o"])
        .arg(&out)
        .arg(repo.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Files processed: 2"));

    let json = read_to_string(&out).unwrap();
    assert!(json.contains("\"filesFound\": 4"));
    assert!(json.contains("\"path\": \"README.md\""));
    assert!(!json.contains("style.css"), "css must be excluded: {json}");
}

#[test]
fn dry_run_writes_nothing() {
    let repo = tempdir().unwrap();
    write_fixture(repo.path());
    let work = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("repo-extract").unwrap();
    cmd.current_dir(work.path())
        .args(["extract", "--dry-run"])
        .arg(repo.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Summary:").and(predicate::str::contains("Output written").not()));
    assert!(!work.path().join("output.txt").exists());
}

#[test]
fn invalid_format_is_rejected_by_argument_parser() {
    let repo = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("repo-extract").unwrap();
    cmd.args(["extract", "-f", "yaml"]).arg(repo.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("yaml"));
}

#[test]
fn unknown_source_fails_with_non_zero_exit() {
    let work = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("repo-extract").unwrap();
    cmd.current_dir(work.path())
        .args(["extract", "./no/such/dir/anywhere"]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Summary:").not());
}

#[test]
fn patterns_subcommand_lists_default_excludes() {
    let mut cmd = Command::cargo_bin("repo-extract").unwrap();
    cmd.arg("patterns");
    cmd.assert().success().stdout(
        predicate::str::contains("**/node_modules").and(predicate::str::contains("**/.git")),
    );
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use repo_extract::cli::{run, Cli, Commands};

    let _ = run(Cli {
        command: Commands::Patterns,
    })
    .await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
