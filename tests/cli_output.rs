//! The `dracin` binary keeps logs off stdout

use std::net::TcpListener;
use std::process::Command;

fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[test]
fn test_home_logs_go_to_stderr() {
    let config_home = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_dracin"))
        .arg("home")
        .env("API_BASE_URL", unreachable_base_url())
        .env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.starts_with("== Latest (0) =="), "stdout: {}", stdout);
    assert!(!stdout.contains("dracin_player::"), "stdout: {}", stdout);
    assert!(stderr.contains("row unavailable"), "stderr: {}", stderr);
    // Debug lines stay off without RUST_LOG
    assert!(!stderr.contains("DEBUG"), "stderr: {}", stderr);
}
