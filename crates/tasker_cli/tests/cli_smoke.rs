use std::process::Command;

#[test]
fn cli_smoke_help() {
    let exe = env!("CARGO_BIN_EXE_tasker");
    let output = Command::new(exe)
        .arg("--help")
        .env("TASKER_CONFIG_PATH", std::env::temp_dir().join("tasker-smoke-missing.json"))
        .output()
        .expect("failed to run tasker --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("done"));
}

#[test]
fn cli_smoke_version() {
    let exe = env!("CARGO_BIN_EXE_tasker");
    let output = Command::new(exe)
        .arg("--version")
        .env("TASKER_CONFIG_PATH", std::env::temp_dir().join("tasker-smoke-missing.json"))
        .output()
        .expect("failed to run tasker --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_command_exits_with_error() {
    let exe = env!("CARGO_BIN_EXE_tasker");
    let output = Command::new(exe)
        .arg("nope")
        .env("TASKER_CONFIG_PATH", std::env::temp_dir().join("tasker-smoke-missing.json"))
        .output()
        .expect("failed to run tasker nope");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}
