//! Integration tests for the jqline binary.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test config file.
fn create_config(dir: &TempDir, content: &str) -> PathBuf {
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

/// Command with the user config pointed at `config_path`, run inside `dir`.
fn cmd_with_config(dir: &TempDir, config_path: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("jqline");
    cmd.env("JQLINE_CONFIG", config_path);
    cmd.env_remove("JQLINE_LOG");
    cmd.current_dir(dir.path());
    cmd
}

/// Command with no user config at all.
fn cmd_without_config(dir: &TempDir) -> assert_cmd::Command {
    cmd_with_config(dir, &dir.path().join("nonexistent.toml"))
}

/// Config running `program` in place of jq.
fn config_for(dir: &TempDir, program: &str) -> PathBuf {
    create_config(dir, &format!("executable = {:?}\n", program))
}

#[test]
fn test_args_named_argument() {
    let dir = TempDir::new().unwrap();

    cmd_without_config(&dir)
        .args(["args", "--", r#"--arg var "val 212" .value = $var"#])
        .assert()
        .success()
        .stdout(r#"["--arg","var","val 212",".value = $var"]"#.to_string() + "\n");
}

#[test]
fn test_args_flag_only() {
    let dir = TempDir::new().unwrap();

    cmd_without_config(&dir)
        .args(["args", "--", "-c"])
        .assert()
        .success()
        .stdout("[\"-c\",\"\"]\n");
}

#[test]
fn test_args_unknown_flag_joins_filter() {
    let dir = TempDir::new().unwrap();

    cmd_without_config(&dir)
        .args(["args", "--", "-M --only-for-plugin-test-purpose . | .[]"])
        .assert()
        .success()
        .stdout("[\"-M\",\"--only-for-plugin-test-purpose . | .[]\"]\n");
}

#[test]
fn test_args_project_flag() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".jqline.toml"),
        r#"
[flags]
"--only-for-plugin-test-purpose" = 0
"#,
    )
    .unwrap();

    cmd_without_config(&dir)
        .args(["args", "--", "-M --only-for-plugin-test-purpose . | .[]"])
        .assert()
        .success()
        .stdout("[\"-M\",\"--only-for-plugin-test-purpose\",\". | .[]\"]\n");
}

#[test]
fn test_invalid_arity_config() {
    let dir = TempDir::new().unwrap();
    let config = create_config(
        &dir,
        r#"
[flags]
"--bogus" = 3
"#,
    );

    cmd_with_config(&dir, &config)
        .args(["args", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Config error"))
        .stderr(predicate::str::contains("--bogus"));
}

#[test]
fn test_malformed_config() {
    let dir = TempDir::new().unwrap();
    let config = create_config(&dir, "timeout_ms = [not toml");

    cmd_with_config(&dir, &config)
        .args(["args", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse TOML"));
}

#[test]
fn test_explicit_config_flag() {
    let dir = TempDir::new().unwrap();
    let explicit = dir.path().join("explicit.toml");
    fs::write(&explicit, "[flags]\n\"--custom\" = 1\n").unwrap();

    cmd_without_config(&dir)
        .arg("--config")
        .arg(&explicit)
        .args(["args", "--", "--custom value ."])
        .assert()
        .success()
        .stdout("[\"--custom\",\"value\",\".\"]\n");
}

#[cfg(unix)]
#[test]
fn test_run_passes_argv() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/echo");

    cmd_with_config(&dir, &config)
        .args(["run", "--", "-c .foo | .bar"])
        .assert()
        .success()
        .stdout("-c .foo | .bar\n");
}

#[cfg(unix)]
#[test]
fn test_run_text_input() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");

    cmd_with_config(&dir, &config)
        .args(["run", "--text", r#"{"a":1}"#, "-"])
        .assert()
        .success()
        .stdout(r#"{"a":1}"#);
}

#[cfg(unix)]
#[test]
fn test_run_file_input() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");
    let data = dir.path().join("data.json");
    fs::write(&data, "[1,2,3]").unwrap();

    cmd_with_config(&dir, &config)
        .arg("run")
        .arg("--file")
        .arg(&data)
        .arg("-")
        .assert()
        .success()
        .stdout("[1,2,3]");
}

#[cfg(unix)]
#[test]
fn test_run_forwards_stdin() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");

    cmd_with_config(&dir, &config)
        .args(["run", "--stdin", "-"])
        .write_stdin("piped")
        .assert()
        .success()
        .stdout("piped");
}

#[cfg(unix)]
#[test]
fn test_run_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");

    cmd_with_config(&dir, &config)
        .args(["run", "--file", "/nonexistent/input.json", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Input error"));
}

#[cfg(unix)]
#[test]
fn test_run_failure_writes_stderr() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");

    cmd_with_config(&dir, &config)
        .args(["run", "/nonexistent/file"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No such file"));
}

#[cfg(unix)]
#[test]
fn test_run_timeout() {
    let dir = TempDir::new().unwrap();
    let sleep = which::which("sleep").unwrap();
    let config = config_for(&dir, &sleep.display().to_string());

    cmd_with_config(&dir, &config)
        .args(["run", "--timeout-ms", "100", "10"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("100 ms timeout reached"))
        .stderr(predicate::str::contains("WARN").not());
}

#[cfg(unix)]
#[test]
fn test_configured_env_reaches_child() {
    let dir = TempDir::new().unwrap();
    let config = create_config(
        &dir,
        r#"
executable = "/bin/sh"

[env]
GREETING = "hello"

[flags]
"-c" = 1
"#,
    );

    cmd_with_config(&dir, &config)
        .args(["run", "--", r#"-c "echo $GREETING""#])
        .assert()
        .success()
        .stdout("hello\n");
}

#[cfg(unix)]
#[test]
fn test_bare_executable_skips_non_executable_on_path() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    for (bin_dir, mode, body) in [
        (&first, 0o644, "#!/bin/sh\necho wrong\n"),
        (&second, 0o755, "#!/bin/sh\necho right\n"),
    ] {
        fs::create_dir(bin_dir).unwrap();
        let tool = bin_dir.join("fake-jq");
        fs::write(&tool, body).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(mode)).unwrap();
    }
    let config = config_for(&dir, "fake-jq");
    let path = std::env::join_paths([&first, &second]).unwrap();

    cmd_with_config(&dir, &config)
        .env("PATH", path)
        .args(["run", "."])
        .assert()
        .success()
        .stdout("right\n");
}

#[test]
fn test_missing_executable() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/nonexistent/jq");

    cmd_with_config(&dir, &config)
        .args(["run", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("executable not found"));
}

#[cfg(unix)]
#[test]
fn test_exec_success() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");

    cmd_with_config(&dir, &config)
        .arg("exec")
        .write_stdin(r#"{"query":"-","input":"hello"}"#)
        .assert()
        .success()
        .stdout("{\"ok\":true,\"stdout\":\"hello\"}\n");
}

#[cfg(unix)]
#[test]
fn test_exec_failure() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");

    let output = cmd_with_config(&dir, &config)
        .arg("exec")
        .write_stdin(r#"{"query":"/nonexistent/file"}"#)
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let response: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(response["ok"], false);
    assert_eq!(response["reason"], "non_zero_exit");
    assert!(response["stderr"].as_str().unwrap().contains("No such file"));
}

#[test]
fn test_exec_invalid_json() {
    let dir = TempDir::new().unwrap();

    cmd_without_config(&dir)
        .arg("exec")
        .write_stdin("not json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Request error"));
}

#[test]
fn test_exec_missing_query() {
    let dir = TempDir::new().unwrap();

    cmd_without_config(&dir)
        .arg("exec")
        .write_stdin(r#"{"input":"{}"}"#)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Request error"));
}

#[cfg(unix)]
#[test]
fn test_playbook_runs_every_block() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");
    fs::write(dir.path().join("data.json"), "[1,2]\n").unwrap();
    let playbook = dir.path().join("notes.md");
    fs::write(
        &playbook,
        "jq -\n{\"a\": 1}\n\njq -\n./data.json\n",
    )
    .unwrap();

    cmd_with_config(&dir, &config)
        .arg("playbook")
        .arg(&playbook)
        .assert()
        .success()
        .stdout(predicate::str::contains("# line 1: jq -\n{\"a\": 1}"))
        .stdout(predicate::str::contains("# line 4: jq -\n[1,2]"));
}

#[cfg(unix)]
#[test]
fn test_playbook_single_line() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");
    let playbook = dir.path().join("notes.md");
    fs::write(&playbook, "jq -\nfirst\n\njq -\nsecond\n").unwrap();

    cmd_with_config(&dir, &config)
        .arg("playbook")
        .arg(&playbook)
        .args(["--line", "4"])
        .assert()
        .success()
        .stdout("second");
}

#[cfg(unix)]
#[test]
fn test_playbook_no_query_at_line() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");
    let playbook = dir.path().join("notes.md");
    fs::write(&playbook, "jq -\nfirst\n").unwrap();

    cmd_with_config(&dir, &config)
        .arg("playbook")
        .arg(&playbook)
        .args(["--line", "2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no jq query on line 2"));
}

#[cfg(unix)]
#[test]
fn test_playbook_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");
    let playbook = dir.path().join("notes.md");
    fs::write(&playbook, "jq -\n./missing.json\n\njq -\nstill runs\n").unwrap();

    cmd_with_config(&dir, &config)
        .arg("playbook")
        .arg(&playbook)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("still runs"))
        .stderr(predicate::str::contains("line 1: input file not found"));
}

#[test]
fn test_playbook_without_queries() {
    let dir = TempDir::new().unwrap();
    let playbook = dir.path().join("notes.md");
    fs::write(&playbook, "# just notes\n").unwrap();

    cmd_without_config(&dir)
        .arg("playbook")
        .arg(&playbook)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no jq queries"));
}

/// stdout that rejects every write with ENOSPC.
#[cfg(target_os = "linux")]
fn full_stdout() -> std::process::Stdio {
    fs::OpenOptions::new()
        .write(true)
        .open("/dev/full")
        .unwrap()
        .into()
}

#[cfg(target_os = "linux")]
#[test]
fn test_run_output_write_failure() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_jqline"))
        .env("JQLINE_CONFIG", &config)
        .current_dir(dir.path())
        .args(["run", "--text", "{}", "-"])
        .stdout(full_stdout())
        .stderr(std::process::Stdio::piped())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Output error"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_playbook_output_write_failure() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, "/bin/cat");
    let playbook = dir.path().join("notes.md");
    fs::write(&playbook, "jq -\nfirst\n").unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_jqline"))
        .env("JQLINE_CONFIG", &config)
        .current_dir(dir.path())
        .arg("playbook")
        .arg(&playbook)
        .stdout(full_stdout())
        .stderr(std::process::Stdio::piped())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Output error"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_playbook_comment_after_query_sends_no_input() {
    let dir = TempDir::new().unwrap();
    let config = create_config(
        &dir,
        r#"
executable = "/bin/sh"

[flags]
"-c" = 1
"#,
    );
    let playbook = dir.path().join("notes.md");
    fs::write(
        &playbook,
        "jq -c \"[ -p /dev/stdin ] && echo piped || echo none\"\n# note\n",
    )
    .unwrap();

    cmd_with_config(&dir, &config)
        .arg("playbook")
        .arg(&playbook)
        .args(["--line", "1"])
        .assert()
        .success()
        .stdout("none\n");
}
