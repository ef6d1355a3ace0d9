use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::{init_db_with_data, rti, setup_test_db};

#[test]
fn test_init_writes_internal_log() {
    let db_path = setup_test_db("init_log");

    rti()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"));

    rti()
        .args(["--db", &db_path, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("migration_applied"))
        .stdout(contains("init"));
}

#[test]
fn test_add_marks_date_entered() {
    let db_path = setup_test_db("add_status");
    init_db_with_data(&db_path);

    rti()
        .args(["--db", &db_path, "status", "2025-09-01"])
        .assert()
        .success()
        .stdout(contains("2025-09-01: entered"));

    rti()
        .args(["--db", &db_path, "status", "2025-09-02"])
        .assert()
        .success()
        .stdout(contains("2025-09-02: not entered"));
}

#[test]
fn test_break_only_is_not_an_entry() {
    let db_path = setup_test_db("break_only");
    init_db_with_data(&db_path);

    rti()
        .args(["--db", &db_path, "add", "2025-09-03", "--break", "45"])
        .assert()
        .success();

    rti()
        .args(["--db", &db_path, "status", "2025-09-03"])
        .assert()
        .success()
        .stdout(contains("not entered"));
}

#[test]
fn test_clearing_times_flips_status() {
    let db_path = setup_test_db("clear_times");
    init_db_with_data(&db_path);

    rti()
        .args([
            "--db",
            &db_path,
            "add",
            "2025-09-15",
            "--in",
            "",
            "--out",
            "",
        ])
        .assert()
        .success();

    rti()
        .args(["--db", &db_path, "status", "2025-09-15"])
        .assert()
        .success()
        .stdout(contains("2025-09-15: not entered"));
}

#[test]
fn test_status_without_cache_is_unknown() {
    let db_path = setup_test_db("status_unknown");
    init_db_with_data(&db_path);

    rti()
        .args(["--db", &db_path, "status", "2025-10-01"])
        .assert()
        .success()
        .stdout(contains("unknown"));
}

#[test]
fn test_invalid_times_are_rejected() {
    let db_path = setup_test_db("invalid_time");
    init_db_with_data(&db_path);

    rti()
        .args(["--db", &db_path, "add", "2025-09-04", "--in", "25:00"])
        .assert()
        .failure()
        .stderr(contains("Invalid time format"));

    rti()
        .args(["--db", &db_path, "add", "2025-09-04", "--break", "abc"])
        .assert()
        .failure();

    rti()
        .args(["--db", &db_path, "add", "2025-13-04", "--in", "09:00"])
        .assert()
        .failure()
        .stderr(contains("Invalid date format"));
}

#[test]
fn test_sync_month_reports_success() {
    let db_path = setup_test_db("sync_month");
    init_db_with_data(&db_path);

    rti()
        .args(["--db", &db_path, "sync", "--month", "2025-09"])
        .assert()
        .success()
        .stdout(contains("Sync of 2025-09 completed"));

    rti()
        .args(["--db", &db_path, "sync", "--month", "2025-9"])
        .assert()
        .failure()
        .stderr(contains("Invalid year-month"));
}

#[test]
fn test_sync_rebuilds_a_cleared_cache() {
    let db_path = setup_test_db("sync_rebuild");
    init_db_with_data(&db_path);

    rti()
        .args(["--db", &db_path, "cache", "--clear", "--month", "2025-09"])
        .assert()
        .success()
        .stdout(contains("1 month(s)"));

    rti()
        .args(["--db", &db_path, "status", "2025-09-01"])
        .assert()
        .success()
        .stdout(contains("unknown"));

    rti()
        .args(["--db", &db_path, "sync", "--month", "2025-09"])
        .assert()
        .success();

    rti()
        .args(["--db", &db_path, "status", "2025-09-01"])
        .assert()
        .success()
        .stdout(contains("2025-09-01: entered"));
}

#[test]
fn test_month_summary_totals() {
    let db_path = setup_test_db("month_summary");
    init_db_with_data(&db_path);

    rti()
        .args(["--db", &db_path, "month", "2025-09"])
        .assert()
        .success()
        .stdout(contains("2025-09-30"))
        .stdout(contains("07:30"))
        .stdout(contains("Entered days: 2").and(contains("Total working time: 15:00")));
}

#[test]
fn test_cache_info_lists_stored_months() {
    let db_path = setup_test_db("cache_info");
    init_db_with_data(&db_path);

    rti()
        .args(["--db", &db_path, "cache", "--info", "--month", "2025-09"])
        .assert()
        .success()
        .stdout(contains("Entered      : 2"))
        .stdout(contains("Stored months: 2025-09"));
}

#[test]
fn test_config_print_shows_defaults() {
    rti()
        .args(["config", "--print"])
        .assert()
        .success()
        .stdout(contains("interval_secs: 300"))
        .stdout(contains("cache_version: attendance-v1"));
}
