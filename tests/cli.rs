use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{TempDir, tempdir};

const ENV_OVERRIDES: [&str; 6] = [
    "CINETRACK_API_KEY",
    "CINETRACK_API_BASE",
    "CINETRACK_CONFIG",
    "CINETRACK_FORMAT",
    "CINETRACK_NO_CACHE",
    "CINETRACK_DEBUG",
];

fn config_path(temp: &Path) -> PathBuf {
    temp.join("config.yaml")
}

fn write_config(temp: &Path, api_base: Option<&str>) -> PathBuf {
    let path = config_path(temp);
    let mut contents = "api_key: test-key\npreferences:\n  rate_limit_per_second: 100\n".to_string();
    if let Some(base) = api_base {
        contents.push_str(&format!("api_base: {}\n", base));
    }
    fs::write(&path, contents).expect("failed to write config");
    path
}

/// The binary with its config and both stores confined to `temp`
fn cinetrack(temp: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cinetrack"));
    for var in ENV_OVERRIDES {
        cmd.env_remove(var);
    }
    cmd.env("CINETRACK_DATA_DIR", temp.path().join("data"))
        .arg("--config")
        .arg(config_path(temp.path()));
    cmd
}

#[test]
fn status_reports_missing_key_and_paths() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    let assert = cinetrack(&temp).arg("status").assert().success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("API key not configured"));
    assert!(stdout.contains(&config_path(temp.path()).to_string_lossy().to_string()));
    assert!(stdout.contains("state.db"));

    Ok(())
}

#[test]
fn status_json_reports_configured_key() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    write_config(temp.path(), None);

    let assert = cinetrack(&temp)
        .args(["status", "--format", "json"])
        .assert()
        .success();

    let parsed: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(parsed["data"]["api_key_configured"], true);
    assert_eq!(parsed["data"]["config_found"], true);

    Ok(())
}

#[test]
fn search_without_key_asks_for_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    cinetrack(&temp)
        .args(["search", "heat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CINETRACK_API_KEY"));

    Ok(())
}

#[test]
fn blank_search_is_rejected_before_any_request() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    // Unroutable base: any request would fail with a different message
    write_config(temp.path(), Some("http://127.0.0.1:9"));

    cinetrack(&temp)
        .args(["search", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a movie title"));

    Ok(())
}

#[test]
fn search_without_query_or_pending_selection_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    write_config(temp.path(), None);

    cinetrack(&temp)
        .arg("search")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a movie title"));

    Ok(())
}

#[test]
fn empty_history_and_watched_list() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    cinetrack(&temp)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found."));

    cinetrack(&temp)
        .args(["watched", "list", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found."));

    Ok(())
}

#[test]
fn history_select_out_of_range_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    cinetrack(&temp)
        .args(["history", "select", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No search at position 3"));

    Ok(())
}

#[test]
fn watched_check_and_undo_on_empty_list() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    cinetrack(&temp)
        .args(["watched", "check", "tmdb:603"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is not watched"));

    cinetrack(&temp)
        .args(["watched", "undo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to undo."));

    cinetrack(&temp)
        .args(["watched", "check", "not-an-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a movie id"));

    Ok(())
}

#[test]
fn watched_rate_rejects_out_of_range() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    cinetrack(&temp)
        .args(["watched", "rate", "tmdb:603", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 0 and 10"));

    Ok(())
}

#[test]
fn empty_watched_list_json_has_zero_count() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    let assert = cinetrack(&temp)
        .args(["watched", "list", "--format", "json"])
        .assert()
        .success();

    let parsed: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(parsed["data"], serde_json::json!([]));
    assert_eq!(parsed["meta"]["count"], 0);

    Ok(())
}

#[test]
fn cache_clear_json() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    let assert = cinetrack(&temp)
        .args(["cache", "clear", "--format", "json"])
        .assert()
        .success();

    let parsed: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(parsed["data"]["entries_removed"], 0);
    assert!(parsed["meta"]["version"].is_string());

    Ok(())
}

#[test]
fn cache_path_uses_data_dir() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    cinetrack(&temp)
        .args(["cache", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("session.db"));

    Ok(())
}

#[test]
fn completion_script_is_generated() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    cinetrack(&temp)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cinetrack"));

    Ok(())
}

const MATRIX_SEARCH: &str = r#"{
    "page": 1,
    "results": [
        {"id": 603, "title": "The Matrix", "release_date": "1999-03-30", "vote_average": 8.2,
         "overview": "A hacker learns the truth.", "poster_path": "/matrix.jpg"}
    ],
    "total_pages": 1,
    "total_results": 1
}"#;

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn search_prints_results_and_records_history() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _search = server
        .mock("GET", "/search/movie")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(MATRIX_SEARCH)
        .expect(1)
        .create();

    let temp = tempdir()?;
    write_config(temp.path(), Some(&server.url()));

    cinetrack(&temp)
        .args(["search", "Matrix", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The Matrix"))
        .stdout(predicate::str::contains("tmdb:603"));

    cinetrack(&temp)
        .args(["history", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Matrix\""));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn repeated_search_is_served_from_cache() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    // First run fetches, second run is a cache hit followed by one refresh
    let search = server
        .mock("GET", "/search/movie")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(MATRIX_SEARCH)
        .expect(2)
        .create();

    let temp = tempdir()?;
    write_config(temp.path(), Some(&server.url()));

    cinetrack(&temp).args(["search", "matrix"]).assert().success();

    let assert = cinetrack(&temp)
        .args(["search", "MÁTRIX", "--format", "json"])
        .assert()
        .success();
    let parsed: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(parsed["data"]["from_cache"], true);
    assert_eq!(parsed["data"]["results"][0]["title"], "The Matrix");

    search.assert();
    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn search_with_no_results_reports_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _search = server
        .mock("GET", "/search/movie")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"page": 1, "results": [], "total_pages": 0, "total_results": 0}"#)
        .create();

    let temp = tempdir()?;
    write_config(temp.path(), Some(&server.url()));

    cinetrack(&temp)
        .args(["search", "zzzzqqq"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Movie not found"));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn mark_remove_and_undo_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _movie = server
        .mock("GET", "/movie/603")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id": 603, "title": "The Matrix", "release_date": "1999-03-30"}"#)
        .create();

    let temp = tempdir()?;
    write_config(temp.path(), Some(&server.url()));

    cinetrack(&temp)
        .args(["watched", "mark", "603"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked"));

    cinetrack(&temp)
        .args(["watched", "check", "tmdb:603"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is watched"));

    cinetrack(&temp)
        .args(["watched", "remove", "603", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));

    cinetrack(&temp)
        .args(["watched", "undo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored"));

    let assert = cinetrack(&temp)
        .args(["watched", "list", "--format", "json"])
        .assert()
        .success();
    let parsed: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(parsed["data"][0]["id"], "tmdb:603");
    assert_eq!(parsed["meta"]["count"], 1);

    cinetrack(&temp)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The Matrix"));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn unauthorized_error_suggests_init() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _popular = server
        .mock("GET", "/movie/popular")
        .match_query(mockito::Matcher::Any)
        .with_status(401)
        .with_body(r#"{"status_code": 7, "status_message": "Invalid API key"}"#)
        .create();

    let temp = tempdir()?;
    write_config(temp.path(), Some(&server.url()));

    cinetrack(&temp)
        .args(["browse", "popular"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cinetrack init"));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn server_error_is_reported_once() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let _search = server
        .mock("GET", "/search/movie")
        .match_query(mockito::Matcher::Any)
        .with_status(502)
        .with_body("Bad Gateway")
        .create();

    let temp = tempdir()?;
    write_config(temp.path(), Some(&server.url()));

    let assert = cinetrack(&temp).args(["search", "heat"]).assert().failure();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert_eq!(stderr.matches("Error:").count(), 1, "got: {}", stderr);
    assert!(stderr.contains("Server error"));

    Ok(())
}
