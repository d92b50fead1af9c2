use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Reference setup with a quiet simulated device
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[sweep]
reference_max = 2500
step_size = 50
sample_count = 9
fail_threshold = 4030

[simulation]
device = "good"
gain = 1.7
clamp = 3800
noise = 4
seed = 7
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run"], 0, "PASS", "stdout")]
#[case(&["run", "--device", "open"], 3, "FAIL at step", "stdout")]
#[case(&["run", "--device", "shorted"], 2, "invalid value", "stderr")]
#[case(&["self-check"], 0, "OK: 51 levels", "stdout")]
#[case(&["bogus"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("tester_cli").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn missing_config_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("tester_cli").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("self-check");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0..=2500 step 50, 9 samples per level, fail at 4030"));
}

#[rstest]
fn invalid_config_is_humanized() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[sweep]\nstep_size = 0\n").unwrap();

    let mut cmd = Command::cargo_bin("tester_cli").unwrap();
    cmd.arg("--config").arg(&path).arg("run");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("What happened: Configuration is invalid"))
        .stderr(predicate::str::contains("step_size must be > 0"));
}

#[rstest]
fn toml_syntax_error_is_humanized() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[sweep\nstep_size = 5\n").unwrap();

    let mut cmd = Command::cargo_bin("tester_cli").unwrap();
    cmd.arg("--config").arg(&path).arg("self-check");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("not valid TOML"));
}

#[rstest]
fn run_writes_step_trace() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let trace = dir.path().join("trace.csv");

    let mut cmd = Command::cargo_bin("tester_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--trace")
        .arg(&trace);
    cmd.assert().success();

    let text = fs::read_to_string(&trace).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("step,level,median"));
    assert!(lines.next().unwrap().starts_with("0,0,"));
    let rows: Vec<&str> = text.lines().skip(1).collect();
    assert_eq!(rows.len(), 51);
    assert!(rows[50].starts_with("50,2500,"));
}

#[rstest]
fn curve_device_fails_where_curve_crosses_threshold() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let curve = dir.path().join("curve.csv");
    let mut f = fs::File::create(&curve).unwrap();
    writeln!(f, "level,reading").unwrap();
    writeln!(f, "0,0").unwrap();
    writeln!(f, "1000,1000").unwrap();
    writeln!(f, "1200,4500").unwrap();

    let mut cmd = Command::cargo_bin("tester_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--curve")
        .arg(&curve);
    cmd.assert()
        .code(3)
        .stdout(predicate::str::contains("FAIL at step 24: level 1200"));
}

#[rstest]
fn cli_reports_bad_curve_header() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let bad_csv = dir.path().join("curve.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "level,value").unwrap();
    writeln!(f, "0,0").unwrap();

    let mut cmd = Command::cargo_bin("tester_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--curve")
        .arg(&bad_csv);

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
fn serve_runs_one_cycle_per_press() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = assert_cmd::Command::cargo_bin("tester_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("serve").write_stdin("\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("PASS"))
        .stdout(predicate::str::contains("served 1 run(s)"));
}
