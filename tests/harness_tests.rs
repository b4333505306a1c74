//! Trials end to end: store, engine, report files and the menu

mod common;

use std::collections::VecDeque;
use std::fs;

use common::{create_harness, MemoryStore, Script, CREATE_CHARGE, PAGE_CHARGE, READ_CHARGE};
use docbench::cli::{LineSource, Menu};
use docbench::report::{ContentionAction, ContentionHandler};
use docbench::{BenchError, FailureKind};
use serde_json::json;
use tempfile::TempDir;

struct Scripted(VecDeque<String>);

impl Scripted {
    fn new(lines: &[&str]) -> Self {
        Self(lines.iter().map(|l| l.to_string()).collect())
    }
}

impl LineSource for Scripted {
    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.0.pop_front()
    }
}

fn lines(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .split("\r\n")
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_insert_appends_report_row() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new(Script::AcceptAll);
    let mut harness = create_harness(store.clone(), 4, dir.path());

    let run = harness.insert(10).await.unwrap();
    harness.insert(2).await.unwrap();

    assert_eq!(run.successes, 10);
    let report = lines(&dir.path().join("Cosmos_Insert_Test.csv"));
    assert_eq!(report.len(), 4);
    assert_eq!(report[0], ",Time Taken(ms),Request Charge (RU)");
    assert_eq!(report[1], "Total Documents,1,1");
    assert!(report[2].starts_with("10,"));
    assert!(report[2].ends_with(&format!(",{}", 10.0 * CREATE_CHARGE)));
    assert!(report[3].starts_with("12,"));
}

#[tokio::test]
async fn test_insert_zero_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new(Script::AcceptAll);
    let mut harness = create_harness(store.clone(), 4, dir.path());

    harness.insert(0).await.unwrap();

    assert!(!dir.path().join("Cosmos_Insert_Test.csv").exists());
    assert_eq!(store.count_calls(), 0);
}

#[tokio::test]
async fn test_point_reads_one_row_per_call() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new(Script::AcceptAll);
    let mut harness = create_harness(store.clone(), 4, dir.path());
    harness.insert(3).await.unwrap();

    let mut ids = store.ids();
    ids.push("missing".to_string());
    let outcomes = harness.point_reads(&ids).await.unwrap();

    assert_eq!(outcomes.len(), 4);
    assert!(outcomes[..3].iter().all(|o| o.is_success()));
    assert!(outcomes[3].is_not_found());
    assert_eq!(
        outcomes[3].failure.as_ref().map(|f| f.kind),
        Some(FailureKind::NotFound)
    );

    let report = lines(&dir.path().join("Cosmos_Read_By_Id_Test.csv"));
    assert_eq!(report[0], ",Time Taken(ms),,,,Request Charge (RU)");
    assert_eq!(report[1], "Total Documents,1,2,3,4,1,2,3,4");
    let charge = READ_CHARGE.to_string();
    assert_eq!(
        report[2],
        format!("3,2,2,2,2,{c},{c},{c},{c}", c = charge)
    );
}

#[tokio::test]
async fn test_point_reads_without_ids() {
    let dir = TempDir::new().unwrap();
    let harness = create_harness(MemoryStore::new(Script::AcceptAll), 4, dir.path());

    assert!(harness.point_reads(&[]).await.unwrap().is_empty());
    assert!(!dir.path().join("Cosmos_Read_By_Id_Test.csv").exists());
}

#[tokio::test]
async fn test_query_row_uses_summed_charge() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new(Script::AcceptAll);
    let mut harness = create_harness(store.clone(), 10, dir.path());
    harness.insert(5).await.unwrap();

    let result = harness.query("SELECT * FROM c").await.unwrap();

    assert_eq!(result.documents.len(), 5);
    assert_eq!(result.pages(), 3);
    assert_eq!(result.request_charge, 3.0 * PAGE_CHARGE);
    let report = lines(&dir.path().join("Cosmos_Query_Test.csv"));
    assert_eq!(report[2], format!("5,3,{}", 3.0 * PAGE_CHARGE));
}

#[tokio::test]
async fn test_query_rejects_blank_text() {
    let dir = TempDir::new().unwrap();
    let harness = create_harness(MemoryStore::new(Script::AcceptAll), 4, dir.path());

    let result = harness.query("   ").await;

    assert!(matches!(result, Err(BenchError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_count_unavailable_recorded_as_sentinel() {
    let dir = TempDir::new().unwrap();
    let harness = create_harness(MemoryStore::without_count(Script::AcceptAll), 4, dir.path());

    assert_eq!(harness.document_count().await, -1);
    harness.query("SELECT * FROM c").await.unwrap();

    let report = lines(&dir.path().join("Cosmos_Query_Test.csv"));
    assert!(report[2].starts_with("-1,"));
}

#[tokio::test]
async fn test_execute_procedure_params() {
    let dir = TempDir::new().unwrap();
    let harness = create_harness(MemoryStore::new(Script::AcceptAll), 4, dir.path());

    let outcome = harness
        .execute_procedure("spInsertDocument", "abc", r#"{"id": "abc"}"#)
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        outcome.body.unwrap(),
        json!({"procedure": "spInsertDocument", "partitionKey": "abc", "params": [{"id": "abc"}]})
    );

    let bad = harness.execute_procedure("sp", "abc", "{oops").await;
    assert!(matches!(bad, Err(BenchError::JsonError(_))));
}

#[tokio::test]
async fn test_busy_report_hands_back_row() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new(Script::AcceptAll);
    let mut harness = create_harness(store.clone(), 4, dir.path());

    // A directory where the report file should be can never be appended to
    fs::create_dir(dir.path().join("Cosmos_Insert_Test.csv")).unwrap();
    let err = harness.insert(3).await.unwrap_err();

    match err {
        BenchError::ReportContended { attempts, row, .. } => {
            assert_eq!(attempts, 2);
            assert!(row.starts_with("3,"));
        }
        other => panic!("unexpected error: {}", other),
    }
    // The documents themselves went in
    assert_eq!(store.stored(), 3);
}

struct ClearsAfterFirstPrompt(std::path::PathBuf);

impl ContentionHandler for ClearsAfterFirstPrompt {
    fn on_contention(&self, _destination: &str, _error: &std::io::Error) -> ContentionAction {
        // Operator closes the file: the blocking directory goes away
        let _ = fs::remove_dir(&self.0);
        ContentionAction::Retry
    }
}

#[tokio::test]
async fn test_contention_handler_retry_keeps_row() {
    let dir = TempDir::new().unwrap();
    let blocked = dir.path().join("Cosmos_Query_Test.csv");
    fs::create_dir(&blocked).unwrap();

    let mut harness = create_harness(MemoryStore::new(Script::AcceptAll), 4, dir.path());
    harness
        .sink_mut()
        .set_handler(ClearsAfterFirstPrompt(blocked.clone()));

    harness.query("SELECT * FROM c").await.unwrap();

    let report = lines(&blocked);
    assert_eq!(report.len(), 3);
    assert!(report[2].starts_with("0,"));
}

#[tokio::test]
async fn test_menu_runs_trials_until_exit() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new(Script::AcceptAll);
    let harness = create_harness(store.clone(), 4, dir.path());

    let input = Scripted::new(&[
        "1", "lots", "6", // malformed count is re-prompted
        "3", "SELECT * FROM c", //
        "2", "", // no ids
        "1", "", // blank leaves the sub-menu
        "q",
    ]);
    let mut menu = Menu::new(harness, input);
    menu.run().await;

    assert_eq!(store.stored(), 6);
    assert!(dir.path().join("Cosmos_Insert_Test.csv").exists());
    assert!(dir.path().join("Cosmos_Query_Test.csv").exists());
    assert!(!dir.path().join("Cosmos_Read_By_Id_Test.csv").exists());
}

#[tokio::test]
async fn test_menu_exits_on_closed_input() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new(Script::AcceptAll);
    let harness = create_harness(store.clone(), 4, dir.path());

    let mut menu = Menu::new(harness, Scripted::new(&["4", "spInsertDocument", "pk", "[1]"]));
    menu.run().await;

    assert_eq!(store.create_calls(), 0);
    assert!(menu.harness().document_count().await == 0);
}
