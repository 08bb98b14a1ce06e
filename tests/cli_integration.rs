//! CLI integration tests.
//!
//! These tests run the `gito` binary against real repositories.

use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A bare repository with one commit on `main` tagged `v1`.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let work = dir.path().join("work");
        std::fs::create_dir_all(work.join("docs")).unwrap();

        run_git(&work, &["init", "-q"]);
        run_git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(&work, &["config", "user.email", "test@example.com"]);
        run_git(&work, &["config", "user.name", "Test User"]);
        std::fs::write(work.join("README.md"), "hello\n").unwrap();
        std::fs::write(work.join("docs/guide.md"), "guide\n").unwrap();
        run_git(&work, &["add", "-A"]);
        run_git(&work, &["commit", "-q", "-m", "initial"]);
        run_git(&work, &["tag", "v1"]);
        run_git(dir.path(), &["clone", "-q", "--bare", "work", "app.git"]);

        Self { dir }
    }

    fn repo(&self) -> PathBuf {
        self.dir.path().join("app.git")
    }

    fn fake(&self, rest: &str) -> PathBuf {
        self.repo().join("gitFakeFs").join(rest)
    }

    /// A `gito` command isolated from the user's configuration.
    fn gito(&self) -> Command {
        let mut cmd = Command::cargo_bin("gito").unwrap();
        cmd.env_remove("GITOVERLAY_CONFIG")
            .env("XDG_CONFIG_HOME", self.dir.path().join("xdg"))
            .env("HOME", self.dir.path().join("home"))
            .env_remove("RUST_LOG");
        cmd
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");
    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

#[test]
fn help_flag_works() {
    Command::cargo_bin("gito")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("branches"));
}

#[test]
fn ls_overlay_root() {
    let fixture = Fixture::new();
    fixture
        .gito()
        .arg("ls")
        .arg(fixture.fake(""))
        .assert()
        .success()
        .stdout("HEAD\nbranches\ntags\ncommits\nindex\nchangesInIndex\n");
}

#[test]
fn ls_json_branches() {
    let fixture = Fixture::new();
    let output = fixture
        .gito()
        .args(["ls", "--json"])
        .arg(fixture.fake("branches"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(names, vec!["main"]);
}

#[test]
fn ls_long_revision() {
    let fixture = Fixture::new();
    fixture
        .gito()
        .args(["ls", "--long"])
        .arg(fixture.fake("tags/v1"))
        .assert()
        .success()
        .stdout(predicate::str::contains("- 100644").and(predicate::str::contains("README.md")))
        .stdout(predicate::str::contains("d 040000").or(predicate::str::contains("d 040755")));
}

#[test]
fn cat_file_from_branch() {
    let fixture = Fixture::new();
    fixture
        .gito()
        .arg("cat")
        .arg(fixture.fake("branches/main/docs/guide.md"))
        .assert()
        .success()
        .stdout("guide\n");
}

#[test]
fn cat_missing_file_fails() {
    let fixture = Fixture::new();
    fixture
        .gito()
        .arg("cat")
        .arg(fixture.fake("branches/main/nope.md"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("ENOENT, no such file or directory"));
}

#[test]
fn stat_json_reports_directory() {
    let fixture = Fixture::new();
    let output = fixture
        .gito()
        .args(["stat", "--json"])
        .arg(fixture.fake("commits"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let meta: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(meta["kind"], "directory");
}

#[test]
fn realpath_of_overlay_root() {
    let fixture = Fixture::new();
    let expected = std::fs::canonicalize(fixture.repo())
        .unwrap()
        .join("gitFakeFs");
    fixture
        .gito()
        .arg("realpath")
        .arg(fixture.fake(""))
        .assert()
        .success()
        .stdout(format!("{}\n", expected.display()));
}

#[test]
fn tree_of_head() {
    let fixture = Fixture::new();
    fixture
        .gito()
        .arg("tree")
        .arg(fixture.fake("HEAD"))
        .assert()
        .success()
        .stdout("README.md\ndocs/\n  guide.md\n");
}

#[test]
fn tree_depth_limit() {
    let fixture = Fixture::new();
    fixture
        .gito()
        .args(["tree", "--depth", "1"])
        .arg(fixture.fake("HEAD"))
        .assert()
        .success()
        .stdout("README.md\ndocs/\n");
}

#[test]
fn unknown_object_type_fails() {
    let fixture = Fixture::new();
    fixture
        .gito()
        .arg("stat")
        .arg(fixture.fake("stash"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("ENOENT"));
}

#[test]
fn config_file_changes_entry_name() {
    let fixture = Fixture::new();
    let config = fixture.dir.path().join("gito.toml");
    std::fs::write(&config, "entry_name = \"@git\"\n").unwrap();

    fixture
        .gito()
        .arg("--config")
        .arg(&config)
        .arg("ls")
        .arg(fixture.repo())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("@git\n"));

    fixture
        .gito()
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("entry_name = \"@git\""));
}

#[test]
fn config_from_environment() {
    let fixture = Fixture::new();
    let config = fixture.dir.path().join("env.toml");
    std::fs::write(&config, "repository_suffix = \".repo\"\n").unwrap();

    fixture
        .gito()
        .env("GITOVERLAY_CONFIG", &config)
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"repository_suffix\": \".repo\""));
}

#[test]
fn invalid_config_fails() {
    let fixture = Fixture::new();
    let config = fixture.dir.path().join("bad.toml");
    std::fs::write(&config, "entry_name = \"a/b\"\n").unwrap();

    fixture
        .gito()
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn completion_bash() {
    Command::cargo_bin("gito")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gito"));
}
