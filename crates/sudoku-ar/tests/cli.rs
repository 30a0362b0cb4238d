#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use sudoku_ar::synthetic::{givens_from_str, PuzzleScene};

const PUZZLE: &str =
    "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79";

fn write_puzzle_png(dir: &std::path::Path) -> std::path::PathBuf {
    let img = PuzzleScene::centered(480, 480, 378.0, 0.0, givens_from_str(PUZZLE)).render();
    let path = dir.join("puzzle.png");
    image::GrayImage::from_raw(img.width as u32, img.height as u32, img.data)
        .unwrap()
        .save(&path)
        .unwrap();
    path
}

#[test]
fn solve_prints_grid_and_writes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_puzzle_png(dir.path());
    let out = dir.path().join("snapshot.json");

    Command::cargo_bin("sudoku-ar")
        .unwrap()
        .arg("solve")
        .arg(&png)
        .arg("--json")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(" 5  3 [4]"))
        .stdout(predicate::str::contains("timings (ms)"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["is_running"], true);
    assert_eq!(json["grid_lines"].as_array().unwrap().len(), 16);
    assert!(json["solution"]["grid"].is_object());
}

#[test]
fn verbose_flag_enables_debug_logs() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_puzzle_png(dir.path());

    Command::cargo_bin("sudoku-ar")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("solve")
        .arg(&png)
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG").not());

    Command::cargo_bin("sudoku-ar")
        .unwrap()
        .env_remove("RUST_LOG")
        .args(["solve", "-v"])
        .arg(&png)
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG"));
}

#[test]
fn missing_image_fails() {
    Command::cargo_bin("sudoku-ar")
        .unwrap()
        .args(["solve", "/no/such/puzzle.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open image"));
}

#[test]
fn print_config_is_loadable_json() {
    let output = Command::cargo_bin("sudoku-ar")
        .unwrap()
        .arg("print-config")
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let params = sudoku_ar::EngineParams::from_json_str(&text).unwrap();
    assert_eq!(params, sudoku_ar::EngineParams::default());
}
