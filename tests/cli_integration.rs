//! Integration tests for the ovc command line.
//!
//! Every invocation runs with an isolated environment: no config file, no
//! pager variables, and a temporary HOME.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// An `ovc` invocation that cannot see the user's config or pager.
fn ovc(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ovc").unwrap();
    cmd.env("HOME", home)
        .env_remove("OVC_CONFIG")
        .env_remove("OVC_PAGER")
        .env_remove("PAGER")
        .env_remove("XDG_CONFIG_HOME");
    cmd
}

// =============================================================================
// exec
// =============================================================================

#[test]
fn exec_passes_exit_status() {
    let home = TempDir::new().unwrap();
    ovc(home.path()).args(["exec", "--", "true"]).assert().code(0);
    ovc(home.path()).args(["exec", "--", "false"]).assert().code(1);
    ovc(home.path())
        .args(["exec", "--", "sh", "-c", "exit 42"])
        .assert()
        .code(42);
}

#[test]
fn exec_inherits_stdout() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["exec", "--", "printf", "hello"])
        .assert()
        .success()
        .stdout("hello");
}

#[test]
fn exec_missing_program() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["exec", "--", "ovc-no-such-program-anywhere"])
        .assert()
        .code(127)
        .stderr(predicate::str::contains(
            "ERROR: cannot execute ovc-no-such-program-anywhere",
        ));
}

#[test]
fn exec_signal_death_aborts() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["exec", "--", "sh", "-c", "kill -KILL $$"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "ERROR: sh was terminated by signal SIGKILL (9)",
        ));
}

#[test]
fn exec_requires_a_program() {
    let home = TempDir::new().unwrap();
    ovc(home.path()).arg("exec").assert().failure();
}

// =============================================================================
// Echo and dry run
// =============================================================================

#[test]
fn verbose_echoes_display_line() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["-v", "exec", "--", "printf", "a b"])
        .assert()
        .success()
        .stdout("a b")
        .stderr(predicate::str::contains("+ printf 'a b'"));
}

#[test]
fn dry_run_echoes_and_does_not_run() {
    let home = TempDir::new().unwrap();
    let marker = home.path().join("ran");

    ovc(home.path())
        .args(["-n", "exec", "--", "touch"])
        .arg(&marker)
        .assert()
        .success()
        .stderr(predicate::str::contains("+ touch"));

    assert!(!marker.exists());
}

#[test]
fn dry_run_reports_success_for_failing_command() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["--dry-run", "exec", "--", "false"])
        .assert()
        .success()
        .stderr(predicate::str::contains("+ false"));
}

#[test]
fn double_debug_traces_fed_bytes() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["--debug", "--debug", "inject", "--line", "hi", "--", "cat"])
        .assert()
        .success()
        .stdout("hi\n")
        .stderr(predicate::str::contains("[trace] stdin (3 bytes)"));
}

// =============================================================================
// capture / inject / run
// =============================================================================

#[test]
fn capture_prints_lines() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["capture", "--", "printf", "foo\\n\\nbar\\n"])
        .assert()
        .success()
        .stdout("foo\n\nbar\n");
}

#[test]
fn capture_json_report() {
    let home = TempDir::new().unwrap();
    let output = ovc(home.path())
        .args(["capture", "--json", "--", "sh", "-c", "echo one; echo two; exit 4"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["program"], "sh");
    assert_eq!(report["status"], 4);
    assert_eq!(report["lines"], serde_json::json!(["one", "two"]));
}

#[test]
fn inject_lines_reach_stdin() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["inject", "--line", "a", "--line", "b c", "--", "cat"])
        .assert()
        .success()
        .stdout("a\nb c\n");
}

#[test]
fn inject_from_file() {
    let home = TempDir::new().unwrap();
    let change = home.path().join("change.txt");
    fs::write(&change, "Change: new\nDescription: fix\n").unwrap();

    ovc(home.path())
        .args(["inject", "--from"])
        .arg(&change)
        .args(["--", "cat"])
        .assert()
        .success()
        .stdout("Change: new\nDescription: fix\n");
}

#[test]
fn run_feeds_file_and_captures() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("in.txt");
    fs::write(&input, "line one\nline two\n").unwrap();

    ovc(home.path())
        .args(["run", "--stdout", "--input"])
        .arg(&input)
        .args(["--", "cat"])
        .assert()
        .success()
        .stdout("line one\nline two\n");
}

#[test]
fn run_redirects_to_output_file() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("out.txt");

    ovc(home.path())
        .args(["run", "--output"])
        .arg(&out)
        .args(["--", "printf", "written"])
        .assert()
        .success()
        .stdout("");

    assert_eq!(fs::read_to_string(&out).unwrap(), "written");
}

#[test]
fn run_null_streams() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["run", "--null-stdout", "--null-stderr", "--"])
        .args(["sh", "-c", "echo out; echo err >&2; exit 6"])
        .assert()
        .code(6)
        .stdout("")
        .stderr("");
}

#[test]
fn run_captured_stderr_is_reemitted() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["run", "--stderr", "--", "sh", "-c", "echo oops >&2"])
        .assert()
        .success()
        .stderr("oops\n");
}

// =============================================================================
// quote
// =============================================================================

#[test]
fn quote_plain() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["quote", "svn", "commit", "-m", "fix it", ""])
        .assert()
        .success()
        .stdout("svn commit -m 'fix it' ''\n");
}

#[test]
fn quote_escape_and_dash_guard() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["quote", "--escape", "perforce", "--dash-guard", "p4", "-f", "a b@x", "#"])
        .assert()
        .success()
        .stdout("p4 ./-f 'a b%40x' %23\n");
}

#[test]
fn quote_rejects_unknown_backend() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["quote", "--escape", "cvs", "cvs", "up"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown backend"));
}

// =============================================================================
// config / completion
// =============================================================================

#[test]
fn config_path_defaults_to_home() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".ovc/config.toml"));
}

#[test]
fn config_set_then_show() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("ovc.toml");
    fs::write(&path, "").unwrap();

    ovc(home.path())
        .env("OVC_CONFIG", &path)
        .args(["config", "set", "pager.command", "less -R"])
        .assert()
        .success();

    let output = ovc(home.path())
        .env("OVC_CONFIG", &path)
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["pager"], "less -R");
    assert_eq!(shown["paging"], "auto");
}

#[test]
fn ovc_pager_env_overrides_config() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("ovc.toml");
    fs::write(&path, "[pager]\ncommand = \"more\"\n").unwrap();

    ovc(home.path())
        .env("OVC_CONFIG", &path)
        .env("OVC_PAGER", "most")
        .env("PAGER", "less")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pager = most"));
}

#[test]
fn invalid_config_is_reported() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("ovc.toml");
    fs::write(&path, "colour = true\n").unwrap();

    ovc(home.path())
        .env("OVC_CONFIG", &path)
        .args(["exec", "--", "true"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ERROR:"));
}

#[test]
fn completion_generates_script() {
    let home = TempDir::new().unwrap();
    ovc(home.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ovc"));
}
