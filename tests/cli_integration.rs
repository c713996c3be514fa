//! CLI integration tests
//!
//! Tests the command-line interface end-to-end.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Cheapest accepted scrypt cost; these tests are not about key stretching.
const LOG_N: &str = "4";

/// Run saltypass against `store` with the master key on stdin
fn run_with_key(store: &Path, args: &[&str], key: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_saltypass"))
        .arg("--passphrase-stdin")
        .arg("--scrypt-log-n")
        .arg(LOG_N)
        .arg("--store")
        .arg(store)
        .args(args)
        .env_remove("SALTYPASS_STORE")
        .env_remove("SALTYPASS_SCRYPT_LOG_N")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start saltypass");

    {
        let stdin = child.stdin.as_mut().expect("failed to open stdin");
        // Ignore BrokenPipe errors - the command may exit before reading stdin
        // if it encounters an error (e.g., entry not found)
        let _ = stdin.write_all(key.as_bytes());
    }

    child.wait_with_output().expect("failed to wait for saltypass")
}

fn secret_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn add(store: &Path, name: &str, secret: &Path, key: &str) -> Output {
    run_with_key(
        store,
        &["add", name, "--secret-file", secret.to_str().unwrap()],
        key,
    )
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_add_list_show() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("secure.dat");

    for (name, secret) in [
        ("mail", "hunter2"),
        ("bank", "correct horse"),
        ("wifi", "пароль"),
    ] {
        let file = secret_file(&temp_dir, &format!("{name}.txt"), &format!("{secret}\n"));
        assert_success(&add(&store, name, &file, "master"), "add");
    }

    let result = run_with_key(&store, &["list"], "");
    assert_success(&result, "list");
    assert_eq!(stdout(&result), "mail\nbank\nwifi\n");

    let result = run_with_key(&store, &["show", "wifi"], "master\n");
    assert_success(&result, "show");
    assert_eq!(stdout(&result), "пароль\n");

    // The plaintext never reaches the store file.
    let raw = fs::read(&store).unwrap();
    assert!(!String::from_utf8_lossy(&raw).contains("hunter2"));
    assert_eq!(&raw[..2], &[3, 0]);
}

#[test]
fn test_show_with_wrong_key_fails() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("secure.dat");
    let file = secret_file(&temp_dir, "secret.txt", "secret123");
    assert_success(&add(&store, "site", &file, "key1"), "add");

    let result = run_with_key(&store, &["show", "site"], "key2");
    assert!(!result.status.success());
    assert!(stdout(&result).is_empty(), "no plaintext on a wrong key");
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("wrong master key"), "stderr: {stderr}");
}

#[test]
fn test_add_refuses_different_key() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("secure.dat");
    let file = secret_file(&temp_dir, "secret.txt", "s");
    assert_success(&add(&store, "first", &file, "key1"), "add");

    let result = add(&store, "second", &file, "key2");
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("--allow-new-key"), "stderr: {stderr}");

    let result = run_with_key(
        &store,
        &[
            "add",
            "second",
            "--secret-file",
            file.to_str().unwrap(),
            "--allow-new-key",
        ],
        "key2",
    );
    assert_success(&result, "add --allow-new-key");

    let result = run_with_key(&store, &["show", "second"], "key2");
    assert_success(&result, "show");
    assert_eq!(stdout(&result), "s\n");
}

#[test]
fn test_remove() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("secure.dat");
    let file = secret_file(&temp_dir, "secret.txt", "s");
    for name in ["x", "y", "z"] {
        assert_success(&add(&store, name, &file, "k"), "add");
    }

    assert_success(&run_with_key(&store, &["rm", "y"], ""), "remove");
    let result = run_with_key(&store, &["list"], "");
    assert_eq!(stdout(&result), "x\nz\n");

    let result = run_with_key(&store, &["remove", "y"], "");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("no entry named 'y'"));

    assert_success(&run_with_key(&store, &["remove", "x"], ""), "remove");
    assert_success(&run_with_key(&store, &["remove", "z"], ""), "remove");
    assert_eq!(fs::read(&store).unwrap(), vec![0, 0]);
}

#[test]
fn test_list_without_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("missing.dat");
    let result = run_with_key(&store, &["list"], "");
    assert_success(&result, "list");
    assert!(stdout(&result).is_empty());
    assert!(!store.exists());
}

#[test]
fn test_show_without_store_fails() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("missing.dat");
    let result = run_with_key(&store, &["show", "anything"], "k");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("failed to open"));
}

#[test]
fn test_corrupt_store_fails() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("secure.dat");
    // Claims two entries, holds one name and nothing else.
    fs::write(&store, [0x02, 0x00, 0x01, 0x00, b'a']).unwrap();

    let result = run_with_key(&store, &["list"], "");
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("corrupt store"), "stderr: {stderr}");
    assert!(stderr.contains("truncated"), "stderr: {stderr}");
}

#[test]
fn test_reads_store_written_by_hand() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("secure.dat");
    // count=1, "a", "bb": the value isn't armored, so show must fail cleanly.
    fs::write(&store, [0x01, 0x00, 0x01, 0x00, 0x61, 0x02, 0x00, 0x62, 0x62]).unwrap();

    let result = run_with_key(&store, &["list"], "");
    assert_eq!(stdout(&result), "a\n");

    let result = run_with_key(&store, &["show", "a"], "k");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("unrecognized"));
}

#[test]
fn test_rejects_out_of_range_cost() {
    for log_n in ["3", "19", "30"] {
        let result = Command::new(env!("CARGO_BIN_EXE_saltypass"))
            .args(["--scrypt-log-n", log_n, "list"])
            .output()
            .unwrap();
        assert!(!result.status.success(), "log_n {log_n} accepted");
    }
}

#[test]
fn test_add_from_stdin_needs_secret_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = temp_dir.path().join("secure.dat");

    let result = run_with_key(&store, &["add", "site"], "key");
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("--secret-file"), "stderr: {stderr}");
    assert!(!store.exists());
}
