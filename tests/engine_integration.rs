//! Integration tests for the subprocess I/O engine.
//!
//! These tests run real child processes (`sh`, `cat`, `printf`) through the
//! library API and check exit codes, captured bytes, and deadlock freedom.

use std::fs;

use tempfile::TempDir;

use omnivc::core::command::Command;
use omnivc::engine::{split_lines, Context, ExecError, RunOptions, Runner, EXEC_FAILED_STATUS};

// =============================================================================
// Helpers
// =============================================================================

fn runner() -> Runner {
    Runner::new(Context::default())
}

fn sh(script: &str) -> Command {
    Command::builder("sh").arg("-c").arg(script).build()
}

fn cat() -> Command {
    Command::builder("cat").build()
}

/// Deterministic, non-repeating-looking payload of `len` bytes.
fn payload(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| match i % 61 {
            60 => b'\n',
            n => b'!' + ((i / 61 + n) % 90) as u8,
        })
        .collect()
}

// =============================================================================
// execute / capture / inject
// =============================================================================

#[test]
fn execute_true_is_zero() {
    assert_eq!(runner().execute(&Command::builder("true").build()).unwrap(), 0);
}

#[test]
fn execute_false_is_nonzero() {
    assert_ne!(runner().execute(&Command::builder("false").build()).unwrap(), 0);
}

#[test]
fn exit_codes_pass_through() {
    for code in [0, 1, 2, 42, 128, 254, 255] {
        let status = runner().execute(&sh(&format!("exit {}", code))).unwrap();
        assert_eq!(status, code, "exit {}", code);
    }
}

#[test]
fn capture_splits_lines() {
    let (status, lines) = runner()
        .capture(&Command::builder("printf").arg("foo\\n\\nbar\\n").build())
        .unwrap();
    assert_eq!(status, 0);
    assert_eq!(lines, ["foo", "", "bar"]);
}

#[test]
fn capture_output_rejoins_byte_identically() {
    let text = "alpha\n  beta  \n\n\tgamma\n";
    let out = runner()
        .run(&cat(), RunOptions::new().input(text).capture_stdout())
        .unwrap();
    let bytes = out.stdout.clone().unwrap();
    assert_eq!(bytes, text.as_bytes());

    let joined = out.stdout_lines().join("\n") + "\n";
    assert_eq!(joined, text);
}

#[test]
fn capture_keeps_status_of_failing_command() {
    let (status, lines) = runner().capture(&sh("echo partial; exit 3")).unwrap();
    assert_eq!(status, 3);
    assert_eq!(lines, ["partial"]);
}

#[test]
fn inject_feeds_lines_in_order() {
    let status = runner()
        .inject(
            &["first", "second"],
            &sh(r#"read a; read b; test "$a/$b" = "first/second""#),
        )
        .unwrap();
    assert_eq!(status, 0);
}

#[test]
fn inject_terminates_every_line() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("fed.txt");
    let status = runner()
        .inject(
            &["a", "", "c"],
            &Command::builder("sh")
                .arg("-c")
                .arg("cat > \"$0\"")
                .arg(path.to_str().unwrap())
                .build(),
        )
        .unwrap();
    assert_eq!(status, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "a\n\nc\n");
}

// =============================================================================
// Deadlock freedom
// =============================================================================

#[test]
fn large_feed_through_cat_does_not_deadlock() {
    // Far beyond any pipe buffer in both directions at once.
    let input = payload(8 * 1024 * 1024);
    let out = runner()
        .run(&cat(), RunOptions::new().input(input.clone()).capture_stdout())
        .unwrap();
    assert_eq!(out.status, 0);
    assert_eq!(out.stdout.unwrap(), input);
}

#[test]
fn large_feed_with_stdout_and_stderr_capture() {
    let input = payload(2 * 1024 * 1024);
    let out = runner()
        .run(
            &sh("tee /dev/stderr"),
            RunOptions::new()
                .input(input.clone())
                .capture_stdout()
                .capture_stderr(),
        )
        .unwrap();
    assert_eq!(out.status, 0);
    assert_eq!(out.stdout.unwrap(), input);
    assert_eq!(out.stderr.unwrap(), input);
}

#[test]
fn large_output_without_input() {
    let out = runner()
        .run(
            &sh("i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done"),
            RunOptions::new().capture_stdout(),
        )
        .unwrap();
    let lines = out.stdout_lines();
    assert_eq!(lines.len(), 20000);
    assert_eq!(lines[0], "line-0");
    assert_eq!(lines[19999], "line-19999");
}

#[test]
fn child_ignoring_input_does_not_hang() {
    let out = runner()
        .run(
            &Command::builder("true").build(),
            RunOptions::new().input(payload(4 * 1024 * 1024)),
        )
        .unwrap();
    assert_eq!(out.status, 0);
}

#[test]
fn empty_input_gives_immediate_eof() {
    let out = runner()
        .run(&cat(), RunOptions::new().input(Vec::new()).capture_stdout())
        .unwrap();
    assert_eq!(out.status, 0);
    assert_eq!(out.stdout.unwrap(), b"");
}

// =============================================================================
// Redirection
// =============================================================================

#[test]
fn output_file_is_truncated_and_written() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out.txt");
    fs::write(&path, "previous contents that are longer").unwrap();

    let out = runner()
        .run(
            &Command::builder("printf").arg("fresh").build(),
            RunOptions::new().capture_stdout().output_file(&path),
        )
        .unwrap();

    assert_eq!(out.status, 0);
    assert_eq!(out.stdout, None);
    assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");
}

#[test]
fn output_file_with_feed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("copy.bin");
    let input = payload(512 * 1024);

    let out = runner()
        .run(
            &cat(),
            RunOptions::new().input(input.clone()).output_file(&path),
        )
        .unwrap();

    assert_eq!(out.status, 0);
    assert_eq!(fs::read(&path).unwrap(), input);
}

#[test]
fn unwritable_output_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing-dir/out.txt");
    let err = runner()
        .run(&cat(), RunOptions::new().output_file(&path))
        .unwrap_err();
    assert!(matches!(err, ExecError::Open { .. }));
}

#[test]
fn null_stdin_reads_nothing() {
    let out = runner()
        .run(&cat(), RunOptions::new().null_stdin().capture_stdout())
        .unwrap();
    assert_eq!(out.status, 0);
    assert_eq!(out.stdout.unwrap(), b"");
}

#[test]
fn null_stderr_keeps_stdout() {
    let out = runner()
        .run(
            &sh("echo kept; echo dropped >&2"),
            RunOptions::new().capture_stdout().null_stderr(),
        )
        .unwrap();
    assert_eq!(out.stdout_lines(), ["kept"]);
    assert_eq!(out.stderr, None);
}

#[test]
fn capture_wins_over_null_stderr() {
    let out = runner()
        .run(
            &sh("echo err >&2"),
            RunOptions::new().capture_stderr().null_stderr(),
        )
        .unwrap();
    assert_eq!(out.stderr_lines(), ["err"]);
}

// =============================================================================
// Failure modes
// =============================================================================

#[test]
fn signal_death_is_fatal() {
    let err = runner().execute(&sh("kill -KILL $$")).unwrap_err();
    match err {
        ExecError::Signaled {
            program,
            signal,
            name,
        } => {
            assert_eq!(program, "sh");
            assert_eq!(signal, 9);
            assert_eq!(name, "SIGKILL");
        }
        other => panic!("expected signal error, got: {other}"),
    }
}

#[test]
fn signal_death_is_fatal_while_capturing() {
    let err = runner()
        .run(
            &sh("echo before; kill -TERM $$"),
            RunOptions::new().input("ignored").capture_stdout().capture_stderr(),
        )
        .unwrap_err();
    assert!(matches!(err, ExecError::Signaled { signal: 15, .. }));
}

#[test]
fn unknown_program_reports_exec_failure() {
    let out = runner()
        .run(
            &Command::builder("ovc-no-such-program-anywhere").arg("x").build(),
            RunOptions::new().capture_stderr(),
        )
        .unwrap();
    assert_eq!(out.status, EXEC_FAILED_STATUS);
    let message = String::from_utf8(out.stderr.unwrap()).unwrap();
    assert!(message.contains("ERROR: cannot execute ovc-no-such-program-anywhere"));
}

#[test]
fn arguments_reach_the_child_verbatim() {
    let tricky = ["", "two words", "$HOME", "'quoted'", "-n", "*"];
    let command = Command::builder("sh")
        .arg("-c")
        .arg(r#"for a in "$@"; do printf '%s\n' "[$a]"; done"#)
        .arg("sh")
        .list(tricky)
        .build();

    let (status, lines) = runner().capture(&command).unwrap();
    assert_eq!(status, 0);
    let expected: Vec<String> = tricky.iter().map(|a| format!("[{}]", a)).collect();
    assert_eq!(lines, expected);
}

#[test]
fn dry_run_never_spawns() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("ran");
    let runner = Runner::new(Context {
        dry_run: true,
        ..Default::default()
    });

    let status = runner
        .execute(
            &Command::builder("touch")
                .arg(marker.to_str().unwrap())
                .build(),
        )
        .unwrap();

    assert_eq!(status, 0);
    assert!(!marker.exists());
}

#[test]
fn split_lines_matches_capture() {
    let text = b"x\ny\n";
    let out = runner()
        .run(&cat(), RunOptions::new().input(&text[..]).capture_stdout())
        .unwrap();
    assert_eq!(out.stdout_lines(), split_lines(text));
}
