use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use conversation_store::{
    cache_path, diagnostic_log_path, turn_log_path, CacheValue, DiagnosticEntry, DiagnosticLog,
    FileRequestStateCache, FileTurnStore, RequestStateCache, Turn, TurnStore, UNLOCK_ACK,
};
use tempfile::TempDir;

fn store_in_tempdir() -> (TempDir, FileTurnStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = FileTurnStore::new(turn_log_path(dir.path()));
    (dir, store)
}

fn write_raw_log(lines: &[&str]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = turn_log_path(dir.path());
    let mut file = File::create(&path).expect("log file should be created");
    for line in lines {
        writeln!(file, "{line}").expect("line should be written");
    }
    (dir, path)
}

#[test]
fn read_recent_on_missing_store_is_empty() {
    let (_dir, store) = store_in_tempdir();
    let turns = store.read_recent(10).expect("read should succeed");
    assert!(turns.is_empty());
}

#[test]
fn read_recent_returns_chronological_tail() {
    let (_dir, mut store) = store_in_tempdir();
    for i in 0..5 {
        store
            .append(&Turn::exchange(format!("question {i}"), format!("answer {i}")))
            .expect("append should succeed");
    }

    let recent = store.read_recent(2).expect("read should succeed");
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].user_text, "question 3");
    assert_eq!(recent[1].user_text, "question 4");

    let everything = store.read_recent(50).expect("read should succeed");
    assert_eq!(everything.len(), 5);
    assert_eq!(everything[0].user_text, "question 0");
    assert_eq!(everything[4].assistant_text, "answer 4");
}

#[test]
fn append_creates_missing_data_directory() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let nested = dir.path().join("state").join("assistant");
    let mut store = FileTurnStore::new(turn_log_path(&nested));

    store
        .append(&Turn::exchange("hello", "hi"))
        .expect("append should create directories");

    assert!(nested.exists());
    assert_eq!(
        store.read_recent(1).expect("read should succeed").len(),
        1
    );
}

#[test]
fn malformed_lines_are_skipped_without_aborting_the_read() {
    let good_a = r#"{"id":"a","user_text":"first","assistant_text":"one","unlock":0}"#;
    let good_b = r#"{"id":"b","user_text":"second","assistant_text":"two","unlock":0}"#;
    let (_dir, path) = write_raw_log(&[
        good_a,
        "not json at all",
        r#"{"id":"short","user_text":"missing fields"}"#,
        r#"{"id":"c","user_text":"u","assistant_text":"a","unlock":9}"#,
        good_b,
    ]);

    let store = FileTurnStore::new(path);
    let turns = store.read_recent(10).expect("read should tolerate corruption");
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].user_text, "first");
    assert_eq!(turns[1].user_text, "second");
}

#[test]
fn unlock_turns_survive_a_round_trip() {
    let (_dir, mut store) = store_in_tempdir();
    store
        .append_unlock_turn("open sesame")
        .expect("unlock append should succeed");
    store
        .append(&Turn::exchange("real question", "real answer"))
        .expect("append should succeed");

    let turns = store.read_recent(10).expect("read should succeed");
    assert_eq!(turns.len(), 2);
    assert!(turns[0].is_unlock_turn);
    assert_eq!(turns[0].assistant_text, UNLOCK_ACK);
    assert!(!turns[1].is_unlock_turn);
}

#[test]
fn clear_removes_history_and_is_idempotent() {
    let (dir, mut store) = store_in_tempdir();
    store
        .append(&Turn::exchange("q", "a"))
        .expect("append should succeed");
    assert!(turn_log_path(dir.path()).exists());

    store.clear().expect("clear should succeed");
    assert!(!turn_log_path(dir.path()).exists());
    assert!(store.read_recent(5).expect("read should succeed").is_empty());

    store.clear().expect("clearing an absent store should succeed");
}

#[test]
fn cache_get_on_missing_store_is_absent() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let cache = FileRequestStateCache::new(cache_path(dir.path()));
    assert_eq!(cache.get("anything").expect("get should succeed"), None);
}

#[test]
fn cache_set_overwrites_and_rewrites_the_whole_file() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = cache_path(dir.path());
    let mut cache = FileRequestStateCache::new(&path);

    cache
        .set("last_chat_request_successful", CacheValue::Bool(true))
        .expect("set should succeed");
    cache
        .set("stored_query", CacheValue::from("tell me about rust"))
        .expect("set should succeed");
    cache
        .set("last_chat_request_successful", CacheValue::Bool(false))
        .expect("overwrite should succeed");

    let on_disk = fs::read_to_string(&path).expect("cache file should exist");
    let parsed: serde_json::Value =
        serde_json::from_str(&on_disk).expect("cache file should be one JSON object");
    assert_eq!(parsed["last_chat_request_successful"], false);
    assert_eq!(parsed["stored_query"], "tell me about rust");

    let reopened = FileRequestStateCache::new(&path);
    assert_eq!(
        reopened
            .get("last_chat_request_successful")
            .expect("get should succeed"),
        Some(CacheValue::Bool(false))
    );
}

#[test]
fn cache_delete_removes_key_and_tolerates_absence() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let mut cache = FileRequestStateCache::new(cache_path(dir.path()));

    cache
        .set("stored_query", CacheValue::from("pending"))
        .expect("set should succeed");
    cache.delete("stored_query").expect("delete should succeed");
    assert_eq!(cache.get("stored_query").expect("get should succeed"), None);

    cache
        .delete("stored_query")
        .expect("deleting an absent key should succeed");
}

#[test]
fn corrupt_cache_file_reads_as_empty() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = cache_path(dir.path());
    fs::write(&path, "{ definitely not json").expect("corrupt file should be written");

    let mut cache = FileRequestStateCache::new(&path);
    assert_eq!(cache.get("key").expect("get should not fail"), None);

    cache
        .set("key", CacheValue::Int(1))
        .expect("set should recover by rewriting");
    assert_eq!(
        cache.get("key").expect("get should succeed"),
        Some(CacheValue::Int(1))
    );
}

#[test]
fn diagnostic_log_round_trips_last_error_message() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let log = DiagnosticLog::new(diagnostic_log_path(dir.path()), true);

    log.record(&DiagnosticEntry {
        model: "gpt-3.5-turbo".to_string(),
        error_message: "first failure".to_string(),
        user_prompt: "hello".to_string(),
        parameters: vec![("temperature".to_string(), "0".to_string())],
    })
    .expect("record should succeed");
    log.record(&DiagnosticEntry {
        model: "gpt-3.5-turbo".to_string(),
        error_message: "second failure".to_string(),
        user_prompt: "hello again".to_string(),
        parameters: vec![
            ("temperature".to_string(), "0".to_string()),
            ("max_tokens".to_string(), "100".to_string()),
        ],
    })
    .expect("record should succeed");

    let last = log
        .last_error_message()
        .expect("retrieval should succeed")
        .expect("a message should be recorded");
    assert_eq!(last, "second failure");

    let contents =
        fs::read_to_string(diagnostic_log_path(dir.path())).expect("log file should exist");
    assert_eq!(contents.matches("---\n").count(), 2);
    assert!(contents.contains("user_prompt: hello again"));
    assert!(contents.contains("max_tokens: 100"));
}

#[test]
fn disabled_diagnostic_log_records_nothing() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let log = DiagnosticLog::new(diagnostic_log_path(dir.path()), false);

    log.record(&DiagnosticEntry {
        model: "gpt-3.5-turbo".to_string(),
        error_message: "ignored".to_string(),
        user_prompt: "hello".to_string(),
        parameters: Vec::new(),
    })
    .expect("disabled record should be a no-op");

    assert!(!diagnostic_log_path(dir.path()).exists());
    assert_eq!(
        log.last_error_message().expect("retrieval should succeed"),
        None
    );
}

#[test]
fn multi_line_error_detail_stays_on_one_record_line() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let log = DiagnosticLog::new(diagnostic_log_path(dir.path()), true);

    log.record(&DiagnosticEntry {
        model: "gpt-3.5-turbo".to_string(),
        error_message: "line one\nline two".to_string(),
        user_prompt: "hello".to_string(),
        parameters: Vec::new(),
    })
    .expect("record should succeed");

    let last = log
        .last_error_message()
        .expect("retrieval should succeed")
        .expect("a message should be recorded");
    assert_eq!(last, "line one line two");
}
