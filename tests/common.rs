#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

/// The binary with HOME pointed at a scratch dir so no real config is read.
pub fn rti() -> Command {
    let mut cmd = cargo_bin_cmd!("rtimesync");
    cmd.env("HOME", env::temp_dir().join("rtimesync_test_home"));
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rtimesync.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Initialize DB and add two full days in September 2025
pub fn init_db_with_data(db_path: &str) {
    rti()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();

    for date in ["2025-09-01", "2025-09-15"] {
        rti()
            .args([
                "--db",
                db_path,
                "add",
                date,
                "--in",
                "09:00",
                "--break",
                "30",
                "--out",
                "17:00",
                "--location",
                "office",
            ])
            .assert()
            .success();
    }
}
