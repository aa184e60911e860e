use super::AuditLogRepository;
use crate::domain::audit_log::{AuditAction, AuditLog};
use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::ensure_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn make_test_log(log_id: &str, batch_id: &str, minute: u32) -> AuditLog {
    AuditLog {
        log_id: log_id.to_string(),
        action: AuditAction::BulkImport,
        entity_type: "scholars".to_string(),
        entity_id: Some(batch_id.to_string()),
        actor: "admin".to_string(),
        payload_json: Some(json!({ "imported_count": 2, "rejected_count": 1 })),
        created_at: Utc.with_ymd_and_hms(2026, 4, 2, 9, minute, 0).unwrap(),
    }
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = AuditLogRepository::new(setup_test_db());

    let log = make_test_log("log1", "b1", 0);
    assert_eq!(repo.insert(&log).unwrap(), "log1");

    let found = repo.find_by_id("log1").unwrap().unwrap();
    assert_eq!(found.action, AuditAction::BulkImport);
    assert_eq!(found.entity_id.as_deref(), Some("b1"));
    assert_eq!(found.created_at, log.created_at);
    assert_eq!(found.payload_json, log.payload_json);

    assert!(repo.find_by_id("nao-existe").unwrap().is_none());
}

#[test]
fn test_find_by_entity_and_recent() {
    let repo = AuditLogRepository::new(setup_test_db());
    repo.insert(&make_test_log("log1", "b1", 0)).unwrap();
    repo.insert(&make_test_log("log2", "b2", 1)).unwrap();
    repo.insert(&make_test_log("log3", "b1", 2)).unwrap();

    let for_b1 = repo.find_by_entity("scholars", "b1").unwrap();
    let ids: Vec<&str> = for_b1.iter().map(|l| l.log_id.as_str()).collect();
    assert_eq!(ids, vec!["log3", "log1"]);

    let recent = repo.find_recent(2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].log_id, "log3");

    let by_action = repo.find_by_action(AuditAction::DuplicateResolved, 10).unwrap();
    assert!(by_action.is_empty());
}
