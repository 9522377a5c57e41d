//! Startup behavior of the server binary.

use std::io::ErrorKind;
use std::net::TcpListener;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Run the binary in `dir` with an empty environment and closed stdin.
fn run_server(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mysql-mcp-server"))
        .args(args)
        .current_dir(dir.path())
        .env_clear()
        .stdin(Stdio::null())
        .output()
        .unwrap()
}

#[test]
fn test_missing_database_exits_before_connecting() {
    let dir = TempDir::new().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let output = run_server(&dir, &["--host", "127.0.0.1", "--port", &port]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MYSQL_DATABASE"), "{stderr}");
    assert!(stderr.contains("Usage:"), "{stderr}");
    assert!(output.stdout.is_empty());

    let accepted = listener.accept();
    assert!(
        matches!(accepted, Err(ref e) if e.kind() == ErrorKind::WouldBlock),
        "server connected to the database: {accepted:?}"
    );
}

#[test]
fn test_blank_database_exits_with_status_one() {
    let dir = TempDir::new().unwrap();
    let output = run_server(&dir, &["--database", "  "]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_env_file_is_read_from_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "MYSQL_DATABASE=shop\nMYSQL_MAX_CONNECTIONS=0\n",
    )
    .unwrap();

    let output = run_server(&dir, &[]);

    // The database name came from the file, so validation got as far as the pool settings
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("max_connections"), "{stderr}");
    assert!(!stderr.contains("MYSQL_DATABASE (or --database) is required"), "{stderr}");
}

#[test]
fn test_env_file_combines_with_cli_flags() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".env"), "MYSQL_DATABASE=shop\n").unwrap();

    let output = run_server(&dir, &["--max-connections", "1", "--min-connections", "5"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot exceed"), "{stderr}");
}
