//! Log output: the per-run directory is created on first use and
//! credential-bearing fields never reach disk.

use docsim::logging::{json_log, obj, v_str};

#[test]
fn run_dir_written_and_credentials_redacted() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("LOG_DIR", dir.path());
    std::env::set_var("RUN_ID", "r-test");

    json_log(
        "simulate",
        obj(&[
            ("endpoint", v_str("/api/books/add")),
            ("Authorization", v_str("Bearer secret-token")),
        ]),
    );

    let run_dir = dir.path().join("r-test");
    assert!(run_dir.join("manifest.json").exists());

    let events = std::fs::read_to_string(run_dir.join("events.jsonl")).unwrap();
    assert!(events.contains("/api/books/add"));
    assert!(events.contains("[REDACTED]"));
    assert!(!events.contains("secret-token"));
}
