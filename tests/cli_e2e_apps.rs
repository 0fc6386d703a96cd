//! End-to-end tests for the `apps` command.

mod common;

use common::prelude::*;

#[test]
fn test_apps_lists_builtin_apps() {
    let fixture = TestFixture::new().with_config(configs::BUILTIN_APPS);

    fixture
        .command()
        .arg("apps")
        .assert()
        .success()
        .stdout(predicate::str::contains("Team Fortress 2 (440) [TF2]"))
        .stdout(predicate::str::contains("Dota 2 (570) [Dota2]"))
        .stdout(predicate::str::contains("never fetched"));
}

#[test]
fn test_apps_json_reports_cached_state() {
    let fixture = TestFixture::new()
        .with_config(configs::TF2_ONLY)
        .with_file(
            "SteamEcon/cache/schema_440.json",
            r#"{"status": 1, "items_game_url": "http://x/items.txt"}"#,
        );

    let output = fixture
        .command()
        .args(["apps", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let rows: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);

    let tf2 = &rows[0];
    assert_eq!(tf2["id"], 440);
    assert_eq!(
        tf2["files"],
        serde_json::json!(["schema_440.json", "clientschema_440.vdf", "TF2Schema.rs"])
    );
    assert_eq!(tf2["client_schema_url"], "http://x/items.txt");
    assert!(tf2["last_modified"].is_string());
}

#[test]
fn test_apps_work_root_override() {
    let fixture = TestFixture::new()
        .with_config(configs::TF2_ONLY)
        .with_file(
            "other/SteamEcon/cache/schema_440.json",
            r#"{"status": 1, "items_game_url": "http://y/items.txt"}"#,
        );

    fixture
        .command()
        .args(["apps", "--work-root"])
        .arg(fixture.path().join("other"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Client schema: http://y/items.txt"));
}
