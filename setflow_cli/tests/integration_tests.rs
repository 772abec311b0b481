//! Integration tests for the setflow binary.
//!
//! These tests drive whole protocols through stdin with a manual clock and
//! check the transcript plus what lands on disk:
//! - Protocol completion and termination reasons
//! - Rejections that leave the protocol untouched
//! - Template pairing feeding a superset
//! - Rollup and volume reporting

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("setflow"))
}

/// `setflow run` with a manual clock against `data_dir`
fn run(data_dir: &Path, args: &[&str], stdin: &str) -> assert_cmd::assert::Assert {
    cli()
        .arg("run")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--manual-clock")
        .args(args)
        .write_stdin(stdin)
        .assert()
}

fn wal_lines(data_dir: &Path, name: &str) -> Vec<serde_json::Value> {
    let path = data_dir.join("wal").join(name);
    if !path.exists() {
        return Vec::new();
    }
    fs::read_to_string(path)
        .expect("Failed to read WAL")
        .lines()
        .map(|line| serde_json::from_str(line).expect("WAL line is JSON"))
        .collect()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Structured resistance-training protocol runner",
        ));
}

#[test]
fn test_myo_reps_to_target() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let mut script = String::from("start\nrec 60 20 9\nstatus\n");
    for _ in 0..5 {
        script.push_str("tick 30\nmini 5 y\n");
    }

    run(data_dir, &["--method", "myo-reps", "--exercise", "bench_press"], &script)
        .success()
        .stdout(predicate::str::contains("mini-set target: 5 reps"))
        .stdout(predicate::str::contains("myo_reps finished: target_reached"))
        .stdout(predicate::str::contains(
            "Bench Press: 6 sets, raw volume 2700.0, weighted 3240.0 (x1.20)",
        ));

    let log = wal_lines(data_dir, "protocol_log.wal");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["method"], "myo_reps");
    assert_eq!(log[0]["termination"], "target_reached");
    assert_eq!(log[0]["record"]["mini_sets"].as_array().unwrap().len(), 5);

    let tracked = wal_lines(data_dir, "tracked_sets.wal");
    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0]["sets"].as_array().unwrap().len(), 6);
    assert_eq!(tracked[0]["protocol_entry_id"], log[0]["id"]);
}

#[test]
fn test_myo_reps_missed_mini_set() {
    let temp_dir = setup_test_dir();

    run(
        temp_dir.path(),
        &["--method", "myo", "--exercise", "lateral_raise"],
        "start\nrec 10 15 8.5\ntick 30\nmini 4 y\ntick 30\nmini 2 n\n",
    )
    .success()
    .stdout(predicate::str::contains("finished: no_match"))
    .stdout(predicate::str::contains("Lateral Raise: 3 sets"));
}

#[test]
fn test_rejection_keeps_protocol_running() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(
        data_dir,
        &["--method", "myo-reps", "--exercise", "bench_press"],
        "start\nrec 60 15 7\nrec 60 15\nstatus\n",
    )
    .success()
    .stdout(predicate::str::contains("rejected: effort rating 7 is not allowed here"))
    .stdout(predicate::str::contains("rejected: missing required field `effort`"))
    .stdout(predicate::str::contains("phase: activation"))
    .stdout(predicate::str::contains("nothing was logged"));

    assert!(wal_lines(data_dir, "protocol_log.wal").is_empty());
}

#[test]
fn test_drop_set_stops_at_max_drops() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(
        data_dir,
        &["--method", "drop-set", "--exercise", "biceps_curl", "--target", "3"],
        "start\nrec 20 12 9\nrec 16 10 9.5\nrec 12 8 10\nrec 8 8 10\n",
    )
    .success()
    .stdout(predicate::str::contains("drop_set finished: max_reached"))
    .stdout(predicate::str::contains("Biceps Curl: 3 sets"));

    let log = wal_lines(data_dir, "protocol_log.wal");
    assert_eq!(log.len(), 1);
    let drops = log[0]["record"]["drops"].as_array().unwrap();
    assert_eq!(drops.len(), 3);
    assert_eq!(drops[1]["reduction_pct"], 20.0);
}

#[test]
fn test_drop_set_low_reps_ends_chain() {
    let temp_dir = setup_test_dir();

    run(
        temp_dir.path(),
        &["--method", "drop-set", "--exercise", "bench_press"],
        "start\nrec 100 8 9\nrec 75 5 9.5\n",
    )
    .success()
    .stdout(predicate::str::contains("finished: max_reached"))
    .stdout(predicate::str::contains("Bench Press: 2 sets"));
}

#[test]
fn test_force_stop_discards_rest_timer() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(
        data_dir,
        &["--method", "myo-reps", "--exercise", "bench_press"],
        "start\nrec 60 12 9\ntick 5\nstop\n",
    )
    .success()
    .stdout(predicate::str::contains("timer discarded: Rest"))
    .stdout(predicate::str::contains("finished: user_stop"))
    .stdout(predicate::str::contains("Bench Press: 1 sets"));

    assert_eq!(wal_lines(data_dir, "protocol_log.wal").len(), 1);
}

#[test]
fn test_superset_with_explicit_pair() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(
        data_dir,
        &[
            "--method",
            "superset",
            "--exercise",
            "bench_press",
            "--pair",
            "barbell_row",
            "--target",
            "2",
        ],
        "start\nrec 80 8 8\ntick 10\nrec 70 10 8\ntick 120\nrec 80 7 8.5\ntick 10\nrec 70 9 8.5\n",
    )
    .success()
    .stdout(predicate::str::contains("timer started: Transition (10)"))
    .stdout(predicate::str::contains("timer started: RoundRest (120)"))
    .stdout(predicate::str::contains("superset finished: target_reached"))
    .stdout(predicate::str::contains("Bench Press: 2 sets"))
    .stdout(predicate::str::contains("Barbell Row: 2 sets"));

    let tracked = wal_lines(data_dir, "tracked_sets.wal");
    let exercises: Vec<&str> = tracked
        .iter()
        .map(|t| t["exercise"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(exercises, vec!["bench_press", "barbell_row"]);
}

#[test]
fn test_superset_without_partner_cannot_start() {
    let temp_dir = setup_test_dir();

    run(
        temp_dir.path(),
        &["--method", "superset", "--exercise", "bench_press"],
        "start\n",
    )
    .success()
    .stdout(predicate::str::contains("Start disabled"))
    .stdout(predicate::str::contains("rejected"));
}

#[test]
fn test_giant_set_one_circuit() {
    let temp_dir = setup_test_dir();

    run(
        temp_dir.path(),
        &[
            "--method",
            "giant-set",
            "--exercise",
            "back_squat",
            "--giant",
            "push_up,kb_swing,pull_up",
            "--target",
            "1",
        ],
        "start\nrec 60 15 7\ntick 15\nrec 0 20 7\ntick 15\nrec 24 20 8\ntick 15\nrec 0 8 9\n",
    )
    .success()
    .stdout(predicate::str::contains("giant_set finished: target_reached"))
    .stdout(predicate::str::contains("Back Squat: 1 sets"))
    .stdout(predicate::str::contains("Pull-up: 1 sets"));
}

#[test]
fn test_giant_set_needs_four_exercises() {
    let temp_dir = setup_test_dir();

    run(
        temp_dir.path(),
        &["--method", "giant-set", "--exercise", "back_squat", "--giant", "push_up"],
        "start\nstatus\n",
    )
    .success()
    .stdout(predicate::str::contains("Start disabled"))
    .stdout(predicate::str::contains("phase: setup"));
}

#[test]
fn test_standard_sets_tracked_without_protocol_log() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(
        data_dir,
        &["--method", "standard", "--exercise", "bench_press"],
        "rec 100 5 8\nrec 100 5 8.5\nrec 100 5 4\ndone\n",
    )
    .success()
    .stdout(predicate::str::contains("rejected"))
    .stdout(predicate::str::contains(
        "Tracked 2 standard sets for Bench Press (volume 1000.0)",
    ));

    assert!(wal_lines(data_dir, "protocol_log.wal").is_empty());
    let tracked = wal_lines(data_dir, "tracked_sets.wal");
    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0]["method"], "standard");
}

#[test]
fn test_standard_tracker_failure_fails_run() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // A directory where the tracker's log should be
    fs::create_dir_all(data_dir.join("wal").join("tracked_sets.wal")).unwrap();

    run(
        data_dir,
        &["--method", "standard", "--exercise", "bench_press"],
        "rec 100 5 8\ndone\n",
    )
    .failure()
    .stdout(predicate::str::contains("standard sets were not tracked"))
    .stdout(predicate::str::contains("No sets recorded").not());
}

#[test]
fn test_unknown_exercise_fails() {
    let temp_dir = setup_test_dir();

    run(
        temp_dir.path(),
        &["--method", "myo-reps", "--exercise", "nonexistent"],
        "",
    )
    .failure()
    .stderr(predicate::str::contains("Unknown exercise"));
}

#[test]
fn test_template_pairing_drives_superset() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .args(["template", "add", "bench_press", "--sets", "4"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added slot_1"));

    cli()
        .args(["template", "pair", "slot_1", "barbell_row"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Paired slot_1 with new slot_2"));

    // Pairing again reuses the reciprocal slot
    cli()
        .args(["template", "pair", "slot_1", "barbell_row"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("with existing slot_2"));

    cli()
        .args(["template", "show"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("barbell_row"))
        .stdout(predicate::str::contains("<-> slot_1"))
        .stdout(predicate::str::contains("4x"));

    run(
        data_dir,
        &[
            "--method",
            "superset",
            "--exercise",
            "bench_press",
            "--template",
            "default",
            "--target",
            "1",
        ],
        "start\nrec 80 8 8\ntick 10\nrec 70 10 8\n",
    )
    .success()
    .stdout(predicate::str::contains("Barbell Row: 1 sets"));

    cli()
        .args(["template", "unpair", "slot_2"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Unpaired slot_2 from slot_1"));
}

#[test]
fn test_rollup_and_volume() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(
        data_dir,
        &["--method", "drop-set", "--exercise", "bench_press"],
        "start\nrec 100 8 9\nrec 80 5 9.5\n",
    )
    .success();
    run(
        data_dir,
        &["--method", "standard", "--exercise", "bench_press"],
        "rec 100 5 8\n",
    )
    .success();

    cli()
        .arg("volume")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("drop_set"))
        .stdout(predicate::str::contains("1800.0"))
        .stdout(predicate::str::contains("total weighted volume: 2300.0"));

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 3 sets"))
        .stdout(predicate::str::contains("Cleaned up 1 processed WAL"));

    let csv = fs::read_to_string(data_dir.join("sets.csv")).expect("Failed to read CSV");
    assert!(csv.starts_with("id,protocol_entry_id,performed_at"));

    // Same totals once everything lives in the CSV
    cli()
        .arg("volume")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("total weighted volume: 2300.0"));
}

#[test]
fn test_exercises_lists_catalog() {
    cli()
        .arg("exercises")
        .assert()
        .success()
        .stdout(predicate::str::contains("bench_press"))
        .stdout(predicate::str::contains("Barbell Row"));
}
