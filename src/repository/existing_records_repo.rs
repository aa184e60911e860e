// ==========================================
// BolsaGO - 已存在记录仓储
// ==========================================
// 职责: 已存在记录索引（existing_record 表）的读写
// - ExistingRecordsRepository: SQLite 实现
// - ExistingRecordsIndex: 内存实现（预加载后只读）
// 红线: Repository 不含业务逻辑,只做数据映射
// ==========================================

use crate::domain::import::{ExistingRecord, FieldMap};
use crate::domain::types::{BankDataStatus, ImportType};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::importer_trait::ExistingRecordsLookup;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str =
    "SELECT record_id, import_type, natural_key, secondary_key, bank_status FROM existing_record";

// 数据库原始行（文本列尚未解析为枚举）
struct StoredRow {
    record_id: String,
    import_type: String,
    natural_key: String,
    secondary_key: Option<String>,
    bank_status: Option<String>,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            record_id: row.get(0)?,
            import_type: row.get(1)?,
            natural_key: row.get(2)?,
            secondary_key: row.get(3)?,
            bank_status: row.get(4)?,
        })
    }

    fn into_record(self) -> RepositoryResult<ExistingRecord> {
        let import_type = self.import_type.parse::<ImportType>().map_err(|e| {
            RepositoryError::FieldValueError {
                field: "import_type".to_string(),
                message: e.to_string(),
            }
        })?;
        let bank_status = match self.bank_status {
            Some(raw) => Some(BankDataStatus::parse(&raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "bank_status".to_string(),
                    message: raw.clone(),
                }
            })?),
            None => None,
        };
        Ok(ExistingRecord {
            record_id: self.record_id,
            import_type,
            natural_key: self.natural_key,
            secondary_key: self.secondary_key,
            bank_status,
        })
    }
}

/// 在已有连接/事务上写入索引项
///
/// 自然键已存在时更新原记录（record_id 保持不变）,否则以 entry.record_id 插入
///
/// # 返回
/// - Ok(record_id): 实际落库的记录 ID
pub(crate) fn upsert_on(
    conn: &Connection,
    entry: &ExistingRecord,
    data: &FieldMap,
    updated_at: DateTime<Utc>,
) -> RepositoryResult<String> {
    let data_json = serde_json::to_string(data)?;
    let bank_status = entry.bank_status.map(|s| s.as_str());
    let updated_at = updated_at.to_rfc3339();

    let current: Option<String> = conn
        .query_row(
            "SELECT record_id FROM existing_record WHERE import_type = ?1 AND natural_key = ?2",
            params![entry.import_type.as_str(), entry.natural_key],
            |row| row.get(0),
        )
        .optional()?;

    match current {
        Some(record_id) => {
            conn.execute(
                r#"
                UPDATE existing_record
                SET secondary_key = ?1, bank_status = ?2, data_json = ?3, updated_at = ?4
                WHERE record_id = ?5
                "#,
                params![entry.secondary_key, bank_status, data_json, updated_at, record_id],
            )?;
            Ok(record_id)
        }
        None => {
            conn.execute(
                r#"
                INSERT INTO existing_record (
                    record_id, import_type, natural_key, secondary_key,
                    bank_status, data_json, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    entry.record_id,
                    entry.import_type.as_str(),
                    entry.natural_key,
                    entry.secondary_key,
                    bank_status,
                    data_json,
                    updated_at,
                ],
            )?;
            Ok(entry.record_id.clone())
        }
    }
}

// ==========================================
// ExistingRecordsRepository - SQLite 实现
// ==========================================
pub struct ExistingRecordsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ExistingRecordsRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn query_one<P: rusqlite::Params>(
        &self,
        where_clause: &str,
        params: P,
    ) -> RepositoryResult<Option<ExistingRecord>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE {} LIMIT 1", SELECT_COLUMNS, where_clause);
        let stored = conn
            .query_row(&sql, params, StoredRow::from_row)
            .optional()?;
        stored.map(StoredRow::into_record).transpose()
    }

    /// 写入或更新索引项
    pub fn upsert(
        &self,
        entry: &ExistingRecord,
        data: &FieldMap,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        upsert_on(&conn, entry, data, updated_at)
    }

    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<ExistingRecord>> {
        self.query_one("record_id = ?1", params![record_id])
    }

    pub fn find_natural(
        &self,
        import_type: ImportType,
        natural_key: &str,
    ) -> RepositoryResult<Option<ExistingRecord>> {
        self.query_one(
            "import_type = ?1 AND natural_key = ?2",
            params![import_type.as_str(), natural_key],
        )
    }

    pub fn find_secondary(
        &self,
        import_type: ImportType,
        secondary_key: &str,
    ) -> RepositoryResult<Option<ExistingRecord>> {
        self.query_one(
            "import_type = ?1 AND secondary_key = ?2",
            params![import_type.as_str(), secondary_key],
        )
    }

    /// 读取记录的已存数据
    pub fn find_data(&self, record_id: &str) -> RepositoryResult<Option<FieldMap>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT data_json FROM existing_record WHERE record_id = ?1",
                params![record_id],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// 更新银行数据核验状态
    pub fn set_bank_status(&self, record_id: &str, status: BankDataStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE existing_record SET bank_status = ?1 WHERE record_id = ?2 AND import_type = ?3",
            params![status.as_str(), record_id, ImportType::BankAccounts.as_str()],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "existing_record".to_string(),
                id: record_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn count_by_type(&self, import_type: ImportType) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM existing_record WHERE import_type = ?1",
            params![import_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 预加载指定类型的全部记录到内存索引
    pub fn load_index(&self, import_type: ImportType) -> RepositoryResult<ExistingRecordsIndex> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE import_type = ?1 ORDER BY record_id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let stored = stmt
            .query_map(params![import_type.as_str()], StoredRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let records = stored
            .into_iter()
            .map(StoredRow::into_record)
            .collect::<RepositoryResult<Vec<_>>>()?;
        Ok(ExistingRecordsIndex::from_records(records))
    }
}

fn lookup_failed(import_type: ImportType, err: RepositoryError) -> ImportError {
    ImportError::LookupFailed {
        import_type: import_type.to_string(),
        message: err.to_string(),
    }
}

impl ExistingRecordsLookup for ExistingRecordsRepository {
    fn find_by_natural_key(
        &self,
        import_type: ImportType,
        natural_key: &str,
    ) -> ImporterResult<Option<ExistingRecord>> {
        self.find_natural(import_type, natural_key)
            .map_err(|e| lookup_failed(import_type, e))
    }

    fn find_by_secondary_key(
        &self,
        import_type: ImportType,
        secondary_key: &str,
    ) -> ImporterResult<Option<ExistingRecord>> {
        self.find_secondary(import_type, secondary_key)
            .map_err(|e| lookup_failed(import_type, e))
    }
}

// ==========================================
// ExistingRecordsIndex - 内存实现
// ==========================================
// 构造后只读,可在多个分类任务间共享
#[derive(Debug, Clone, Default)]
pub struct ExistingRecordsIndex {
    by_natural: HashMap<(ImportType, String), ExistingRecord>,
    by_secondary: HashMap<(ImportType, String), String>, // → natural_key
}

impl ExistingRecordsIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ExistingRecord>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.insert(record);
        }
        index
    }

    pub fn insert(&mut self, record: ExistingRecord) {
        if let Some(secondary) = &record.secondary_key {
            self.by_secondary.insert(
                (record.import_type, secondary.clone()),
                record.natural_key.clone(),
            );
        }
        self.by_natural
            .insert((record.import_type, record.natural_key.clone()), record);
    }

    pub fn len(&self) -> usize {
        self.by_natural.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_natural.is_empty()
    }
}

impl ExistingRecordsLookup for ExistingRecordsIndex {
    fn find_by_natural_key(
        &self,
        import_type: ImportType,
        natural_key: &str,
    ) -> ImporterResult<Option<ExistingRecord>> {
        Ok(self
            .by_natural
            .get(&(import_type, natural_key.to_string()))
            .cloned())
    }

    fn find_by_secondary_key(
        &self,
        import_type: ImportType,
        secondary_key: &str,
    ) -> ImporterResult<Option<ExistingRecord>> {
        Ok(self
            .by_secondary
            .get(&(import_type, secondary_key.to_string()))
            .and_then(|natural| self.by_natural.get(&(import_type, natural.clone())))
            .cloned())
    }
}
