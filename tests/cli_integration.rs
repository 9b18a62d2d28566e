use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn pagesmith(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pagesmith").unwrap();
    cmd.env("PAGESMITH_HOME", home)
        .env_remove("PAGESMITH_LOG")
        .current_dir(home);
    cmd
}

fn run_ok(home: &Path, args: &[&str]) {
    pagesmith(home).args(args).assert().success();
}

#[test]
fn test_add_and_list_blocks() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    pagesmith(home)
        .args(["new", "Padavali", "--author", "Ana", "--tags", "songs, live"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started a new document"));

    pagesmith(home)
        .args(["add", "text", "Hello world"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Text added successfully"));
    run_ok(home, &["add", "heading", "Intro", "--level", "h3"]);
    run_ok(home, &["add", "quote", "Less is more", "--author", "Mies"]);

    pagesmith(home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Padavali"))
        .stdout(predicate::str::contains("1."))
        .stdout(predicate::str::contains("Hello world"))
        .stdout(predicate::str::contains("Heading"))
        .stdout(predicate::str::is_match("(?s)Hello world.*Intro.*Less is more").unwrap());
}

#[test]
fn test_invalid_block_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    pagesmith(home)
        .args(["add", "audio", "https://example.com/track.xyz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("direct audio file URLs"));

    pagesmith(home)
        .args(["add", "image", "javascript:alert(1)"])
        .assert()
        .failure();

    pagesmith(home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No content yet."));
}

#[test]
fn test_save_needs_title_and_content() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    run_ok(home, &["add", "text", "body"]);
    pagesmith(home)
        .arg("save")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Save failed: Please set a title before saving",
        ));
    assert!(!home.join("saved-content.json").exists());

    run_ok(home, &["meta", "--title", "Notes"]);
    pagesmith(home)
        .arg("save")
        .assert()
        .success()
        .stdout(predicate::str::contains("Content saved successfully (1 item)"));
    assert!(home.join("saved-content.json").exists());
}

#[test]
fn test_move_duplicate_and_delete() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    run_ok(home, &["new", "Order"]);
    for q in ["first", "second", "third"] {
        run_ok(home, &["add", "quote", q]);
    }

    pagesmith(home)
        .args(["mv", "top", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved items top"));
    pagesmith(home)
        .arg("list")
        .assert()
        .stdout(predicate::str::is_match("(?s)third.*first.*second").unwrap());

    pagesmith(home)
        .args(["dup", "1", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Duplicated 2 items"));

    pagesmith(home)
        .args(["rm", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No item at position 9"));

    pagesmith(home)
        .args(["rm", "1", "2", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 3 items"));

    pagesmith(home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("items"))
        .stdout(predicate::str::is_match(r"items\s+= 2").unwrap());
}

#[test]
fn test_index_zero_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    run_ok(home, &["add", "text", "a"]);
    pagesmith(home)
        .args(["rm", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("indexes start at 1"));
}

#[test]
fn test_reset_restores_saved_order() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    run_ok(home, &["new", "Songs"]);
    run_ok(home, &["add", "quote", "alpha"]);
    run_ok(home, &["add", "quote", "beta"]);
    run_ok(home, &["save"]);
    run_ok(home, &["mv", "bottom", "1"]);

    pagesmith(home)
        .arg("list")
        .assert()
        .stdout(predicate::str::is_match("(?s)beta.*alpha").unwrap());

    pagesmith(home)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Order reset to original"));

    pagesmith(home)
        .arg("list")
        .assert()
        .stdout(predicate::str::is_match("(?s)alpha.*beta").unwrap());
}

#[test]
fn test_no_recover_shows_last_save() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    run_ok(home, &["new", "Draft"]);
    run_ok(home, &["add", "text", "unsaved words"]);

    pagesmith(home)
        .args(["--no-recover", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Untitled"))
        .stdout(predicate::str::contains("No content yet."));

    pagesmith(home)
        .args(["--verbose", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Content recovered successfully"))
        .stdout(predicate::str::contains("unsaved words"));
}

fn backdate_backup(home: &Path, hours: i64) {
    let path = home.join("auto-save-backup.json");
    let raw = std::fs::read_to_string(&path).unwrap();
    let mut backup: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let then = chrono::Utc::now() - chrono::Duration::hours(hours);
    backup["timestamp"] = serde_json::Value::String(then.to_rfc3339());
    std::fs::write(&path, backup.to_string()).unwrap();
}

#[test]
fn test_stale_backup_is_not_overwritten() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    run_ok(home, &["new", "Draft"]);
    run_ok(home, &["add", "text", "hours of unsaved work"]);
    backdate_backup(home, 25);

    pagesmith(home)
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("older than the recovery window"))
        .stdout(predicate::str::contains("No content yet."));

    pagesmith(home)
        .args(["add", "text", "new line"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to overwrite"));
    let backup = std::fs::read_to_string(home.join("auto-save-backup.json")).unwrap();
    assert!(backup.contains("hours of unsaved work"));
    assert!(!backup.contains("new line"));

    run_ok(home, &["recover"]);
    pagesmith(home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Draft"))
        .stdout(predicate::str::contains("hours of unsaved work"));
    run_ok(home, &["add", "text", "new line"]);
}

#[test]
fn test_no_recover_discards_stale_backup() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    run_ok(home, &["new", "Draft"]);
    run_ok(home, &["add", "text", "old words"]);
    backdate_backup(home, 25);

    run_ok(home, &["--no-recover", "add", "text", "fresh start"]);
    let backup = std::fs::read_to_string(home.join("auto-save-backup.json")).unwrap();
    assert!(backup.contains("fresh start"));
    assert!(!backup.contains("old words"));
}

#[test]
fn test_export_formats() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    let out = home.join("out");

    pagesmith(home)
        .args(["export", "md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Export failed: Please set a title"));

    run_ok(home, &["new", "My Page", "--tags", "a,b"]);
    run_ok(home, &["add", "heading", "Welcome"]);
    run_ok(home, &["add", "text", "Body & <soul>"]);

    pagesmith(home)
        .args(["export", "html", "--out", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("my_page.html"));
    let html = std::fs::read_to_string(out.join("my_page.html")).unwrap();
    assert!(html.contains("Body &amp; &lt;soul&gt;"));
    assert!(!html.contains("drag-handle"));

    run_ok(home, &["export", "markdown", "--out", out.to_str().unwrap()]);
    let md = std::fs::read_to_string(out.join("my_page.md")).unwrap();
    assert!(md.starts_with("# My Page"));
    assert!(md.contains("**Tags:** a, b"));

    run_ok(home, &["export", "json", "--out", out.to_str().unwrap()]);
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("my_page.json")).unwrap())
            .unwrap();
    assert_eq!(json["title"], "My Page");
    assert_eq!(json["metadata"]["itemCount"], 2);
    assert_eq!(json["content"][0]["type"], "heading");

    pagesmith(home)
        .args(["export", "docx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}

#[test]
fn test_import_replaces_document() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    let out = home.join("out");

    run_ok(home, &["new", "Original"]);
    run_ok(home, &["add", "quote", "keep me", "--author", "Someone"]);
    run_ok(home, &["export", "json", "--out", out.to_str().unwrap()]);

    run_ok(home, &["new", "Other"]);
    pagesmith(home)
        .args(["import", out.join("original.json").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 item"));

    pagesmith(home)
        .arg("list")
        .assert()
        .stdout(predicate::str::contains("Original"))
        .stdout(predicate::str::contains("keep me"));
}

#[test]
fn test_upload_media_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    let png = home.join("logo.png");
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 32]);
    std::fs::write(&png, bytes).unwrap();

    let notes = home.join("notes.txt");
    std::fs::write(&notes, "just text").unwrap();

    pagesmith(home)
        .args(["upload", png.to_str().unwrap(), notes.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("logo.png uploaded successfully"))
        .stderr(predicate::str::contains("Error processing notes.txt"));

    pagesmith(home)
        .arg("list")
        .assert()
        .stdout(predicate::str::contains("Media"));
}

#[test]
fn test_upload_respects_size_limit() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    run_ok(home, &["config", "max_upload_bytes", "16"]);
    let png = home.join("big.png");
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 64]);
    std::fs::write(&png, bytes).unwrap();

    pagesmith(home)
        .args(["upload", png.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is too large"));
}

#[test]
fn test_preferences_and_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    pagesmith(home)
        .arg("font")
        .assert()
        .success()
        .stdout(predicate::str::contains("Font size: large"));
    pagesmith(home)
        .arg("theme")
        .assert()
        .success()
        .stdout(predicate::str::contains("Theme: light"));
    pagesmith(home)
        .arg("status")
        .assert()
        .stdout(predicate::str::is_match(r"font size\s+= large").unwrap())
        .stdout(predicate::str::is_match(r"theme\s+= light").unwrap());

    run_ok(home, &["config", "placeholder_title", "Draft"]);
    pagesmith(home)
        .args(["config", "placeholder_title"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Draft"));
    pagesmith(home)
        .args(["config", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key: bogus"));
}

#[test]
fn test_preview_writes_page() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();

    run_ok(home, &["new", "Look"]);
    run_ok(home, &["add", "text", "seen"]);
    pagesmith(home)
        .arg("preview")
        .assert()
        .success()
        .stdout(predicate::str::contains("look.preview.html"));
    let page = std::fs::read_to_string(home.join("look.preview.html")).unwrap();
    assert!(page.contains("Look - Preview"));
    assert!(page.contains("seen"));
}
