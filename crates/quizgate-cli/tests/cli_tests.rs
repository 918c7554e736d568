//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizgate() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("quizgate").unwrap()
}

/// A command that cannot see the developer's own config or environment.
fn isolated(dir: &TempDir) -> Command {
    let mut cmd = quizgate();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("QUIZGATE_PASSING_SCORE")
        .env_remove("QUIZGATE_RECORD_PATH");
    cmd
}

fn bank(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../banks")
        .join(name)
}

fn play(dir: &TempDir, bank_file: &str, answers: &str) -> assert_cmd::assert::Assert {
    isolated(dir)
        .arg("play")
        .arg("--bank")
        .arg(bank(bank_file))
        .arg("--answers")
        .arg(answers)
        .arg("--record")
        .arg(dir.path().join("record.json"))
        .assert()
}

#[test]
fn validate_sample_bank() {
    quizgate()
        .arg("validate")
        .arg("--bank")
        .arg("../../banks/workshop-safety.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 questions"))
        .stdout(predicate::str::contains("All banks valid"));
}

#[test]
fn validate_directory() {
    quizgate()
        .arg("validate")
        .arg("--bank")
        .arg("../../banks")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workshop Safety Post-Test"))
        .stdout(predicate::str::contains("Forklift Practice Quiz"))
        .stdout(predicate::str::contains("Lathe Start-up Simulation"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dupes.toml");
    std::fs::write(
        &path,
        r#"
[assessment]
id = "dupes"
name = "Dupes"

[[questions]]
id = "same"
name = "First"
stem = "One?"
correct_response = "a"

[[questions]]
id = "same"
name = "Second"
stem = "Two?"
correct_response = "b"
"#,
    )
    .unwrap();

    quizgate()
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[same] WARNING: duplicate question ID"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    quizgate()
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn perfect_post_test_is_committed() {
    let dir = TempDir::new().unwrap();

    play(&dir, "workshop-safety.toml", "b,a,c,d,b")
        .success()
        .stdout(predicate::str::contains("100%"))
        .stdout(predicate::str::contains("passed"))
        .stdout(predicate::str::contains("completed / passed / 100"));

    assert!(dir.path().join("record.json").exists());
}

#[test]
fn failed_attempt_then_retake_then_bypass() {
    let dir = TempDir::new().unwrap();

    play(&dir, "workshop-safety.toml", "b,x,c,x,b")
        .success()
        .stdout(predicate::str::contains("60%"))
        .stdout(predicate::str::contains("2,4"))
        .stdout(predicate::str::contains("incomplete / failed / 60"));

    isolated(&dir)
        .arg("record")
        .arg("--record")
        .arg(dir.path().join("record.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1|1-3|3"))
        .stdout(predicate::str::contains("incomplete"));

    // Only the two missed questions come back, scored against all five.
    play(&dir, "workshop-safety.toml", "a,d")
        .success()
        .stderr(predicate::str::contains("[1/2] Loose clothing"))
        .stderr(predicate::str::contains("[2/2] Machine guards"))
        .stdout(predicate::str::contains("100%"))
        .stdout(predicate::str::contains("completed / passed / 100"));

    play(&dir, "workshop-safety.toml", "b")
        .success()
        .stdout(predicate::str::contains("bypassed (already passed)"))
        .stdout(predicate::str::contains("100%"));
}

#[test]
fn practice_quiz_allows_skips_and_writes_nothing() {
    let dir = TempDir::new().unwrap();

    play(&dir, "forklift-practice.toml", "a,-,b,b")
        .success()
        .stdout(predicate::str::contains("75%"))
        .stdout(predicate::str::contains("passed"))
        .stdout(predicate::str::contains("not written"));

    assert!(!dir.path().join("record.json").exists());
}

#[test]
fn skip_refused_when_not_enabled() {
    let dir = TempDir::new().unwrap();

    play(&dir, "workshop-safety.toml", "-,a,c,d,b")
        .failure()
        .stderr(predicate::str::contains("skipping is not enabled"));
}

#[test]
fn simulation_interaction() {
    let dir = TempDir::new().unwrap();

    play(&dir, "lathe-startup.toml", "pass")
        .success()
        .stdout(predicate::str::contains("100%"));

    play(&dir, "lathe-startup.toml", "fail")
        .success()
        .stdout(predicate::str::contains("0%"))
        .stderr(predicate::str::contains("A checklist step was missed"));
}

#[test]
fn running_out_of_answers_fails() {
    let dir = TempDir::new().unwrap();

    play(&dir, "workshop-safety.toml", "b,a")
        .failure()
        .stderr(predicate::str::contains("ran out of answers after 2 of 5"));
}

#[test]
fn play_saves_json_report() {
    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("out").join("attempt.json");

    isolated(&dir)
        .arg("play")
        .arg("--bank")
        .arg(bank("workshop-safety.toml"))
        .arg("--answers")
        .arg("b,a,x,d,b")
        .arg("--record")
        .arg(dir.path().join("record.json"))
        .arg("--report")
        .arg(&report_path)
        .assert()
        .success();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["results"]["score"], 80);
    assert_eq!(report["results"]["passed"], true);
    assert_eq!(report["results"]["inc_number_list"], "3");
    assert_eq!(report["results"]["total_to_include"], 5);
    assert_eq!(report["committed"]["score"], 80);
}

#[test]
fn config_file_overrides_record_path() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("quizgate.toml"),
        "record_path = \"./state/lms.json\"\n",
    )
    .unwrap();

    isolated(&dir)
        .arg("play")
        .arg("--bank")
        .arg(bank("workshop-safety.toml"))
        .arg("--answers")
        .arg("b,a,c,d,b")
        .assert()
        .success();

    assert!(dir.path().join("state/lms.json").exists());

    isolated(&dir)
        .arg("record")
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));
}

#[test]
fn record_without_file() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .arg("record")
        .arg("--record")
        .arg(dir.path().join("missing.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No record at"));
}

#[test]
fn decode_incorrect_set() {
    quizgate()
        .arg("decode")
        .arg("--bank")
        .arg("../../banks/workshop-safety.toml")
        .arg("--incorrect")
        .arg("0|2-1|4")
        .assert()
        .success()
        .stdout(predicate::str::contains("emergency-stop"))
        .stdout(predicate::str::contains("spills"))
        .stdout(predicate::str::contains(
            "2 question(s) to retake, 3 counted as correct",
        ));
}

#[test]
fn decode_rejects_bad_sets() {
    quizgate()
        .arg("decode")
        .arg("--bank")
        .arg("../../banks/workshop-safety.toml")
        .arg("--incorrect")
        .arg("0|x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot decode"));

    quizgate()
        .arg("decode")
        .arg("--bank")
        .arg("../../banks/workshop-safety.toml")
        .arg("--incorrect")
        .arg("0|9")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown question 9"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizgate()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizgate.toml"))
        .stdout(predicate::str::contains("Created banks/example.toml"));

    assert!(dir.path().join("quizgate.toml").exists());
    assert!(dir.path().join("banks/example.toml").exists());

    quizgate()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--bank")
        .arg("banks/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All banks valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizgate()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    quizgate()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    quizgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Assessment session player"));
}

#[test]
fn version_output() {
    quizgate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizgate"));
}
