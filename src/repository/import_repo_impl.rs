// ==========================================
// BolsaGO - 导入 Repository 实现
// ==========================================
// 职责: 实现导入提交相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则,只做数据 CRUD
// ==========================================

use crate::domain::audit_log::AuditLog;
use crate::domain::import::{BatchRecord, ImportBatch, ImportResult};
use crate::domain::types::{ImportType, RecordOperation};
use crate::repository::audit_log_repo::insert_on as insert_audit_on;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::existing_records_repo::upsert_on;
use crate::repository::import_repo::{ImportRepository, RecordWrite};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const BATCH_COLUMNS: &str = r#"
    SELECT batch_id, import_type, file_name, total_rows, imported_count,
           rejected_count, success, started_at, completed_at, actor
    FROM import_batch
"#;

fn parse_ts(field: &str, raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("{} ({})", raw, e),
        })
}

fn operation_str(operation: &RecordOperation) -> &'static str {
    match operation {
        RecordOperation::Create => "create",
        RecordOperation::Update { .. } => "update",
    }
}

// import_batch 原始行
struct StoredBatch {
    batch_id: String,
    import_type: String,
    file_name: String,
    total_rows: i64,
    imported_count: i64,
    rejected_count: i64,
    success: bool,
    started_at: String,
    completed_at: String,
    actor: String,
}

impl StoredBatch {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            batch_id: row.get(0)?,
            import_type: row.get(1)?,
            file_name: row.get(2)?,
            total_rows: row.get(3)?,
            imported_count: row.get(4)?,
            rejected_count: row.get(5)?,
            success: row.get::<_, i64>(6)? != 0,
            started_at: row.get(7)?,
            completed_at: row.get(8)?,
            actor: row.get(9)?,
        })
    }

    fn into_batch(self) -> RepositoryResult<ImportBatch> {
        let import_type = self.import_type.parse::<ImportType>().map_err(|e| {
            RepositoryError::FieldValueError {
                field: "import_type".to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(ImportBatch {
            batch_id: self.batch_id,
            import_type,
            file_name: self.file_name,
            total_rows: self.total_rows.max(0) as usize,
            imported_count: self.imported_count.max(0) as usize,
            rejected_count: self.rejected_count.max(0) as usize,
            success: self.success,
            started_at: parse_ts("started_at", &self.started_at)?,
            completed_at: parse_ts("completed_at", &self.completed_at)?,
            actor: self.actor,
        })
    }
}

// ==========================================
// ImportRepositoryImpl
// ==========================================
pub struct ImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ImportRepositoryImpl {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中写入批次
    fn insert_batch_tx(
        tx: &Transaction,
        batch: &ImportBatch,
        result: &ImportResult,
    ) -> RepositoryResult<()> {
        let result_json = serde_json::to_string(result)?;
        tx.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, import_type, file_name, total_rows, imported_count,
                rejected_count, success, started_at, completed_at, actor, result_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.import_type.as_str(),
                batch.file_name,
                batch.total_rows as i64,
                batch.imported_count as i64,
                batch.rejected_count as i64,
                batch.success as i32,
                batch.started_at.to_rfc3339(),
                batch.completed_at.to_rfc3339(),
                batch.actor,
                result_json,
            ],
        )?;
        Ok(())
    }

    /// 在事务中刷新索引并写入批次明细
    fn insert_records_tx(
        tx: &Transaction,
        batch: &ImportBatch,
        writes: &[RecordWrite],
    ) -> RepositoryResult<usize> {
        let mut count = 0;
        for write in writes {
            let record_id = upsert_on(tx, &write.entry, &write.data, batch.completed_at)?;
            tx.execute(
                r#"
                INSERT INTO imported_record (batch_id, row_number, record_id, operation, data_json)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    batch.batch_id,
                    write.row_number as i64,
                    record_id,
                    operation_str(&write.operation),
                    serde_json::to_string(&write.data)?,
                ],
            )?;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl ImportRepository for ImportRepositoryImpl {
    async fn save_import(
        &self,
        batch: ImportBatch,
        result: &ImportResult,
        writes: Vec<RecordWrite>,
        audit: &AuditLog,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::insert_batch_tx(&tx, &batch, result)?;
        let count = Self::insert_records_tx(&tx, &batch, &writes)?;
        insert_audit_on(&tx, audit)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(batch_id = %batch.batch_id, records = count, "导入批次已落库");
        Ok(count)
    }

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE batch_id = ?1", BATCH_COLUMNS);
        let stored = conn
            .query_row(&sql, params![batch_id], StoredBatch::from_row)
            .optional()?;
        stored.map(StoredBatch::into_batch).transpose()
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY completed_at DESC, batch_id LIMIT ?1", BATCH_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let stored = stmt
            .query_map(params![limit as i64], StoredBatch::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        stored.into_iter().map(StoredBatch::into_batch).collect()
    }

    async fn get_batch_result(&self, batch_id: &str) -> RepositoryResult<Option<ImportResult>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT result_json FROM import_batch WHERE batch_id = ?1",
                params![batch_id],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn get_batch_records(&self, batch_id: &str) -> RepositoryResult<Vec<BatchRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT row_number, record_id, operation, data_json
            FROM imported_record
            WHERE batch_id = ?1
            ORDER BY row_number
            "#,
        )?;
        let rows = stmt
            .query_map(params![batch_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(row_number, record_id, operation, data_json)| {
                let operation = match operation.as_str() {
                    "create" => RecordOperation::Create,
                    "update" => RecordOperation::Update {
                        existing_id: record_id.clone(),
                    },
                    other => {
                        return Err(RepositoryError::FieldValueError {
                            field: "operation".to_string(),
                            message: other.to_string(),
                        })
                    }
                };
                Ok(BatchRecord {
                    batch_id: batch_id.to_string(),
                    row_number: row_number.max(0) as usize,
                    record_id,
                    operation,
                    data: serde_json::from_str(&data_json)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit_log::AuditAction;
    use crate::domain::import::{ExistingRecord, FieldMap, ImportSummary, ImportedRecord};
    use chrono::TimeZone;

    fn audit_for(batch: &ImportBatch) -> AuditLog {
        AuditLog {
            log_id: format!("log-{}", batch.batch_id),
            action: AuditAction::BulkImport,
            entity_type: batch.import_type.to_string(),
            entity_id: Some(batch.batch_id.clone()),
            actor: batch.actor.clone(),
            payload_json: None,
            created_at: batch.completed_at,
        }
    }

    fn count(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
        conn.lock()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    fn setup_repo() -> (ImportRepositoryImpl, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (ImportRepositoryImpl::new(conn.clone()), conn)
    }

    fn sample(batch_id: &str, minute: u32) -> (ImportBatch, ImportResult, Vec<RecordWrite>) {
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 10, minute, 0).unwrap();
        let mut data = FieldMap::new();
        data.insert("code".to_string(), "P-01".to_string());
        data.insert("title".to_string(), "Projeto Piloto".to_string());

        let result = ImportResult {
            success: true,
            imported_count: 1,
            rejected_count: 0,
            imported_records: vec![ImportedRecord {
                row_number: 1,
                data: data.clone(),
                operation: RecordOperation::Create,
            }],
            rejected_records: vec![],
            summary: ImportSummary {
                started_at: at,
                completed_at: at,
                import_type: ImportType::Projects,
                file_name: "projetos.csv".to_string(),
                total_processed: 1,
            },
        };
        let writes = vec![RecordWrite {
            row_number: 1,
            operation: RecordOperation::Create,
            entry: ExistingRecord {
                record_id: format!("prj-{}", batch_id),
                import_type: ImportType::Projects,
                natural_key: "P-01".to_string(),
                secondary_key: Some("projeto piloto".to_string()),
                bank_status: None,
            },
            data,
        }];
        let batch = ImportBatch::from_result(batch_id.to_string(), "admin", &result);
        (batch, result, writes)
    }

    #[tokio::test]
    async fn test_save_import_and_query() {
        let (repo, conn) = setup_repo();
        let (batch, result, writes) = sample("b1", 0);

        let audit = audit_for(&batch);
        let count = repo
            .save_import(batch.clone(), &result, writes, &audit)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(self::count(&conn, "audit_log"), 1);

        assert_eq!(repo.get_batch("b1").await.unwrap(), Some(batch));
        assert_eq!(repo.get_batch_result("b1").await.unwrap(), Some(result));

        let records = repo.get_batch_records("b1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_id, "prj-b1");
        assert_eq!(records[0].operation, RecordOperation::Create);

        let indexed: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM existing_record", [], |row| row.get(0))
            .unwrap();
        assert_eq!(indexed, 1);
    }

    #[tokio::test]
    async fn test_replayed_key_reuses_record() {
        let (repo, _conn) = setup_repo();
        let (batch1, result1, writes1) = sample("b1", 0);
        let (batch2, result2, writes2) = sample("b2", 5);
        let (audit1, audit2) = (audit_for(&batch1), audit_for(&batch2));
        repo.save_import(batch1, &result1, writes1, &audit1).await.unwrap();
        repo.save_import(batch2, &result2, writes2, &audit2).await.unwrap();

        let records = repo.get_batch_records("b2").await.unwrap();
        assert_eq!(records[0].record_id, "prj-b1");

        let recent = repo.get_recent_batches(10).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|b| b.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b1"]);
    }

    #[tokio::test]
    async fn test_duplicate_batch_id_rolls_back() {
        let (repo, conn) = setup_repo();
        let (batch, result, writes) = sample("b1", 0);
        let audit = audit_for(&batch);
        repo.save_import(batch.clone(), &result, writes.clone(), &audit)
            .await
            .unwrap();

        let retry = AuditLog {
            log_id: "log-retry".to_string(),
            ..audit
        };
        let err = repo.save_import(batch, &result, writes, &retry).await;
        assert!(matches!(err, Err(RepositoryError::UniqueConstraintViolation(_))));

        assert_eq!(count(&conn, "imported_record"), 1);
        assert_eq!(count(&conn, "audit_log"), 1);
    }

    #[tokio::test]
    async fn test_audit_failure_rolls_back_batch() {
        let (repo, conn) = setup_repo();
        conn.lock()
            .unwrap()
            .execute_batch("DROP TABLE audit_log")
            .unwrap();

        let (batch, result, writes) = sample("b1", 0);
        let audit = audit_for(&batch);
        let err = repo.save_import(batch, &result, writes, &audit).await;
        assert!(err.is_err());

        assert_eq!(count(&conn, "import_batch"), 0);
        assert_eq!(count(&conn, "imported_record"), 0);
        assert_eq!(count(&conn, "existing_record"), 0);
    }

    #[tokio::test]
    async fn test_missing_batch() {
        let (repo, _conn) = setup_repo();
        assert!(repo.get_batch("nada").await.unwrap().is_none());
        assert!(repo.get_batch_result("nada").await.unwrap().is_none());
        assert!(repo.get_batch_records("nada").await.unwrap().is_empty());
    }
}
