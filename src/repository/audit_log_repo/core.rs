use crate::domain::audit_log::AuditLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// AuditLogRepository - 审计日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入审计日志
    ///
    /// # 返回
    /// - `Ok(log_id)`: 成功插入
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, log: &AuditLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_on(&conn, log)?;
        Ok(log.log_id.clone())
    }
}

/// 在给定连接（或事务）上写入审计日志
pub(crate) fn insert_on(conn: &Connection, log: &AuditLog) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO audit_log (
            log_id, action, entity_type, entity_id, actor, payload_json, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            log.log_id,
            log.action.as_str(),
            log.entity_type,
            log.entity_id,
            log.actor,
            log.payload_json.as_ref().map(|v| v.to_string()),
            log.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}
