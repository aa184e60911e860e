// ==========================================
// ImportSession 集成测试
// ==========================================
// 测试目标: 验证完整的导入流程（文件 → 预览 → 重复处理 → 提交 → 落库/审计）
// ==========================================

mod test_helpers;

use bolsago_import::config::{config_keys, ConfigManager};
use bolsago_import::db::ensure_schema;
use bolsago_import::domain::audit_log::AuditAction;
use bolsago_import::domain::types::{DuplicateAction, ImportType, RecordOperation, RejectionKind};
use bolsago_import::importer::{commit, ImportError};
use bolsago_import::logging;
use bolsago_import::repository::{AuditLogRepository, ExistingRecordsRepository, ImportRepository};
use std::collections::BTreeMap;
use test_helpers::{build_session, create_test_db, fixed_clock, scholar_row, write_csv};

const SCHOLARS_CSV: &str = "\u{feff}Nome;E-mail;CPF\n\
Ana Souza;ana@ufmg.br;111.444.777-35\n\
Bruno Lima;bruno@usp.br;111.444.777-36\n\
Carla Dias;;529.982.247-25\n";

const CLEAN_SCHOLARS_CSV: &str = "nome,email,cpf\n\
Ana Souza,ana@ufmg.br,11144477735\n\
Bruno Lima,bruno@usp.br,52998224725\n";

#[tokio::test]
async fn test_csv_end_to_end() {
    logging::init_test();
    let (_db, conn) = create_test_db().unwrap();
    let session = build_session(&conn);
    let file = write_csv(SCHOLARS_CSV);

    let preview = session
        .preview_file(file.path(), ImportType::Scholars)
        .await
        .unwrap();
    assert_eq!(preview.total_rows, 3);
    assert_eq!(preview.valid_rows, 1);
    assert_eq!(preview.invalid_rows, 2);
    assert!(preview.duplicate_rows().next().is_none());

    let result = session.commit(&preview).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.imported_count, 1);
    assert_eq!(result.rejected_count, 2);
    assert_eq!(result.summary.total_processed, 3);
    assert!(result
        .rejected_records
        .iter()
        .all(|r| r.kind == RejectionKind::Invalid && !r.reasons.is_empty()));

    // 落库: 批次 + 已存在记录索引
    let batches = session.import_repo().get_recent_batches(10).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].imported_count, 1);
    assert_eq!(batches[0].actor, "operador.teste");

    let existing = ExistingRecordsRepository::new(conn.clone());
    assert_eq!(existing.count_by_type(ImportType::Scholars).unwrap(), 1);
    assert!(existing
        .find_natural(ImportType::Scholars, "11144477735")
        .unwrap()
        .is_some());

    // 审计
    let audit = AuditLogRepository::new(conn.clone());
    let logs = audit.find_by_action(AuditAction::BulkImport, 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].entity_id.as_deref(), Some(batches[0].batch_id.as_str()));
}

#[tokio::test]
async fn test_reimport_update_and_skip() {
    let (_db, conn) = create_test_db().unwrap();
    let session = build_session(&conn);
    let file = write_csv(CLEAN_SCHOLARS_CSV);

    let first = session
        .preview_file(file.path(), ImportType::Scholars)
        .await
        .unwrap();
    let first_result = session.commit(&first).await.unwrap();
    assert!(first_result.success);
    assert_eq!(first_result.imported_count, 2);

    let existing = ExistingRecordsRepository::new(conn.clone());
    let ana_id = existing
        .find_natural(ImportType::Scholars, "11144477735")
        .unwrap()
        .unwrap()
        .record_id;

    // 第二次导入: 两行都是重复
    let second = session
        .preview_file(file.path(), ImportType::Scholars)
        .await
        .unwrap();
    assert_eq!(second.duplicate_rows().count(), 2);

    let mut actions = BTreeMap::new();
    actions.insert(1, DuplicateAction::Update);
    let resolved = session.resolve_duplicates(second, &actions).await.unwrap();
    assert_eq!(resolved.rows[0].duplicate_action, Some(DuplicateAction::Update));
    // 未指定 → 默认 skip
    assert_eq!(resolved.rows[1].duplicate_action, Some(DuplicateAction::Skip));

    let result = session.commit(&resolved).await.unwrap();
    assert!(result.success);
    assert_eq!(result.imported_count, 1);
    assert_eq!(
        result.imported_records[0].operation,
        RecordOperation::Update {
            existing_id: ana_id.clone()
        }
    );
    assert_eq!(result.rejected_count, 1);
    assert_eq!(result.rejected_records[0].row_number, 2);
    assert_eq!(result.rejected_records[0].kind, RejectionKind::SkippedDuplicate);

    // 更新复用已存在记录 ID
    assert_eq!(existing.count_by_type(ImportType::Scholars).unwrap(), 2);
    assert_eq!(
        existing
            .find_natural(ImportType::Scholars, "11144477735")
            .unwrap()
            .unwrap()
            .record_id,
        ana_id
    );

    let audit = AuditLogRepository::new(conn.clone());
    assert_eq!(
        audit.find_by_action(AuditAction::DuplicateResolved, 10).unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_configured_default_action_update() {
    let (_db, conn) = create_test_db().unwrap();
    ConfigManager::from_connection(conn.clone())
        .unwrap()
        .set_global_config_value(config_keys::DEFAULT_DUPLICATE_ACTION, "update")
        .unwrap();
    let session = build_session(&conn);

    let rows = vec![scholar_row(1, "Ana", "ana@ufmg.br", "11144477735")];
    let first = session
        .preview_rows("a.csv", rows.clone(), ImportType::Scholars)
        .await
        .unwrap();
    session.commit(&first).await.unwrap();

    let second = session
        .preview_rows("a.csv", rows, ImportType::Scholars)
        .await
        .unwrap();
    let resolved = session
        .resolve_duplicates(second, &BTreeMap::new())
        .await
        .unwrap();
    assert_eq!(resolved.rows[0].duplicate_action, Some(DuplicateAction::Update));
}

#[tokio::test]
async fn test_action_on_new_row_is_contract_violation() {
    let (_db, conn) = create_test_db().unwrap();
    let session = build_session(&conn);

    let preview = session
        .preview_rows(
            "a.csv",
            vec![scholar_row(1, "Ana", "ana@ufmg.br", "11144477735")],
            ImportType::Scholars,
        )
        .await
        .unwrap();

    let mut actions = BTreeMap::new();
    actions.insert(1, DuplicateAction::Update);
    let err = session
        .resolve_duplicates(preview.clone(), &actions)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::ActionOnNewRow { row_number: 1 }));

    let mut unknown = BTreeMap::new();
    unknown.insert(99, DuplicateAction::Skip);
    let err = session.resolve_duplicates(preview, &unknown).await.unwrap_err();
    assert!(matches!(err, ImportError::UnknownRow { row_number: 99 }));
}

#[tokio::test]
async fn test_too_many_rows() {
    let (_db, conn) = create_test_db().unwrap();
    ConfigManager::from_connection(conn.clone())
        .unwrap()
        .set_global_config_value(config_keys::MAX_ROWS, "2")
        .unwrap();
    let session = build_session(&conn);

    let rows = vec![
        scholar_row(1, "Ana", "ana@ufmg.br", "11144477735"),
        scholar_row(2, "Bruno", "bruno@usp.br", "52998224725"),
        scholar_row(3, "Carla", "carla@unb.br", "12345678909"),
    ];
    let err = session
        .preview_rows("grande.csv", rows, ImportType::Scholars)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::TooManyRows { count: 3, max: 2 }));
}

#[tokio::test]
async fn test_batch_preview_isolates_failures() {
    let (_db, conn) = create_test_db().unwrap();
    let session = build_session(&conn);
    let file = write_csv(CLEAN_SCHOLARS_CSV);
    let missing = file.path().with_file_name("nao_existe.csv");

    let results = session
        .batch_preview(
            vec![file.path().to_path_buf(), missing],
            ImportType::Scholars,
        )
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().valid_rows, 2);
    assert!(matches!(results[1], Err(ImportError::FileNotFound(_))));
}

#[tokio::test]
async fn test_commit_deterministic_with_fixed_clock() {
    let (_db, conn) = create_test_db().unwrap();
    let session = build_session(&conn);

    let preview = session
        .preview_rows(
            "a.csv",
            vec![
                scholar_row(1, "Ana", "ana@ufmg.br", "11144477735"),
                scholar_row(2, "Bruno", "invalido", "52998224725"),
            ],
            ImportType::Scholars,
        )
        .await
        .unwrap();

    let clock = fixed_clock();
    let first = commit(&preview, clock.as_ref());
    let second = commit(&preview, clock.as_ref());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first.summary.completed_at, clock.0);
}

#[tokio::test]
async fn test_commit_audit_failure_persists_nothing() {
    let (_db, conn) = create_test_db().unwrap();
    let session = build_session(&conn);
    let file = write_csv(CLEAN_SCHOLARS_CSV);

    let preview = session
        .preview_file(file.path(), ImportType::Scholars)
        .await
        .unwrap();

    conn.lock().unwrap().execute_batch("DROP TABLE audit_log").unwrap();

    let err = session.commit(&preview).await.unwrap_err();
    assert!(matches!(err, ImportError::PersistenceError(_)));

    // 审计失败时批次与索引一并回滚
    assert!(session.import_repo().get_recent_batches(10).await.unwrap().is_empty());
    let existing = ExistingRecordsRepository::new(conn.clone());
    assert_eq!(existing.count_by_type(ImportType::Scholars).unwrap(), 0);

    // 恢复后重试: 一次落库,不会产生重复批次
    ensure_schema(&conn.lock().unwrap()).unwrap();
    let result = session.commit(&preview).await.unwrap();
    assert_eq!(result.imported_count, 2);
    assert_eq!(session.import_repo().get_recent_batches(10).await.unwrap().len(), 1);
    assert_eq!(existing.count_by_type(ImportType::Scholars).unwrap(), 2);
}
