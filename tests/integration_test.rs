use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Helper to get the compiled binary path
fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_scriptlang"))
}

/// Helper to create a temporary directory for tests
fn create_temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Helper to write a script into a directory
fn create_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run_script(script: &Path, extra_args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .arg(script)
        .args(extra_args)
        .current_dir(script.parent().unwrap())
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_version_flag() {
    let output = Command::new(get_binary_path())
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_flag_is_invocation_error() {
    let output = Command::new(get_binary_path())
        .arg("--no-such-flag")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_missing_script_exits_1() {
    let temp_dir = create_temp_dir();
    let output = Command::new(get_binary_path())
        .arg(temp_dir.path().join("absent.sl"))
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent.sl"));
}

#[test]
fn test_script_prints_and_logs() {
    let temp_dir = create_temp_dir();
    let script = create_script(
        temp_dir.path(),
        "demo.sl",
        r#"
# greet everyone
set name = "world"
print "hello " + name
log "done"
"#,
    );

    let output = run_script(&script, &[]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello world\n");

    let log = fs::read_to_string(temp_dir.path().join("logs/demo.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(" [SET] name = world"));
    assert!(lines[1].ends_with(" [PRINT] hello world"));
    assert!(lines[2].ends_with(" [LOG] done"));
    // "YYYY-MM-DD HH:MM:SS " prefix
    assert_eq!(lines[0].find(" [SET]"), Some(19));
}

#[test]
fn test_log_file_option() {
    let temp_dir = create_temp_dir();
    let script = create_script(temp_dir.path(), "a.sl", "log 1");
    let log_path = temp_dir.path().join("custom/run.log");

    let output = run_script(&script, &["--log-file", log_path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(fs::read_to_string(&log_path).unwrap().contains("[LOG] 1"));
    assert!(!temp_dir.path().join("logs").exists());
}

#[test]
fn test_no_log_option() {
    let temp_dir = create_temp_dir();
    let script = create_script(temp_dir.path(), "a.sl", "print 7");

    let output = run_script(&script, &["--no-log"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "7\n");
    assert!(!temp_dir.path().join("logs").exists());
}

#[test]
fn test_lexical_error_exits_2() {
    let temp_dir = create_temp_dir();
    let script = create_script(temp_dir.path(), "bad.sl", "set x = 1\nprint x ? 2\n");

    let output = run_script(&script, &["--no-log"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lexical error"));
    assert!(stderr.contains("print x ? 2"));
}

#[test]
fn test_syntax_error_exits_2() {
    let temp_dir = create_temp_dir();
    let script = create_script(temp_dir.path(), "bad.sl", "while 1\n  print 1\n");

    let output = run_script(&script, &[]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("syntax error"));
    assert!(stderr.contains("missing END"));
    // nothing ran, so no log was created
    assert!(!temp_dir.path().join("logs").exists());
}

#[test]
fn test_runtime_error_exits_3() {
    let temp_dir = create_temp_dir();
    let script = create_script(temp_dir.path(), "bad.sl", "print 1\nprint z\nprint 3\n");

    let output = run_script(&script, &["--no-log"]);
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("undefined variable 'z'"));
    assert!(stderr.contains("line 2, col 1"));
}

#[test]
fn test_file_statements_end_to_end() {
    let temp_dir = create_temp_dir();
    let script = create_script(
        temp_dir.path(),
        "files.sl",
        r#"
writefile "out/data.txt" "line1\n"
appendfile "out/data.txt" "line2\n"
readfile "out/data.txt" body
print body
deletefile "out/data.txt"
deletefile "out/data.txt"
"#,
    );

    let output = run_script(&script, &[]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "line1\nline2\n\n");
    assert!(!temp_dir.path().join("out/data.txt").exists());

    let log = fs::read_to_string(temp_dir.path().join("logs/files.log")).unwrap();
    assert_eq!(log.matches("[DELETEFILE]").count(), 1);
    assert!(log.contains("[READFILE] out/data.txt -> body"));
}

#[test]
fn test_repl_keeps_state_between_lines() {
    let mut child = Command::new(get_binary_path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn repl");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"function sq(n) return n * n end\nset x = sq(6)\nprint x\nprint nope\nexit\n")
        .unwrap();

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("36"));
    assert!(stdout.contains("Goodbye!"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("undefined variable 'nope'"));
}
