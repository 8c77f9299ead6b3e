use std::process::Command;

fn screenbot(log_dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_screenbot"));
    cmd.env("SCREENBOT_LOG_DIR", log_dir.path())
        .env_remove("SCREENBOT_REGION")
        .env_remove("SCREENBOT_RETRIES");
    cmd
}

#[test]
fn test_dry_run_prints_parsed_script_as_json() {
    let logs = tempfile::TempDir::new().unwrap();
    let output = screenbot(&logs)
        .args([
            "exec",
            "click text ok 1\\n# STOP_ON_FAIL\\nwait 3\\n# LOOP_IF_SUCCESS 1",
            "--dry-run",
            "--json",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let script: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let instructions = script["instructions"].as_array().unwrap();
    assert_eq!(instructions.len(), 2);
    assert_eq!(instructions[0]["command_text"], "click text ok 1");
    assert_eq!(instructions[0]["stop_on_fail"], true);
    assert_eq!(instructions[1]["line_number"], 3);
    assert_eq!(instructions[1]["loop_target_line"], 1);
}

#[test]
fn test_dry_run_of_script_file() {
    let logs = tempfile::TempDir::new().unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("bot.txt");
    std::fs::write(&path, "press enter\n# IF_FAIL_THEN press esc\n").unwrap();

    let output = screenbot(&logs)
        .arg("run")
        .arg(&path)
        .arg("--dry-run")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[1] press enter | if fail: press esc"));
}

#[test]
fn test_missing_script_file_fails() {
    let logs = tempfile::TempDir::new().unwrap();
    let output = screenbot(&logs)
        .args(["run", "definitely-not-here.txt"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("definitely-not-here.txt"));
}

#[test]
fn test_preset_dry_run() {
    let logs = tempfile::TempDir::new().unwrap();
    let output = screenbot(&logs)
        .args(["preset", "horizontal", "--dry-run", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let script: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(script["instructions"].as_array().unwrap().len(), 10);
    assert!(script["warnings"].as_array().unwrap().is_empty());
}
