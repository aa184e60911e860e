use super::core::AuditLogRepository;
use crate::domain::audit_log::{AuditAction, AuditLog};
use crate::repository::error::RepositoryResult;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_AUDIT: &str = r#"
    SELECT log_id, action, entity_type, entity_id, actor, payload_json, created_at
    FROM audit_log
"#;

impl AuditLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, log_id: &str) -> RepositoryResult<Option<AuditLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE log_id = ?", SELECT_AUDIT);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![log_id], map_row) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询指定实体的审计日志（如某个导入批次）
    pub fn find_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepositoryResult<Vec<AuditLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE entity_type = ? AND entity_id = ? ORDER BY created_at DESC",
            SELECT_AUDIT
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![entity_type, entity_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    pub fn find_by_action(&self, action: AuditAction, limit: i32) -> RepositoryResult<Vec<AuditLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE action = ? ORDER BY created_at DESC LIMIT ?",
            SELECT_AUDIT
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![action.as_str(), limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询最近的 N 条日志
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<AuditLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY created_at DESC LIMIT ?", SELECT_AUDIT);
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }
}

fn conversion_error(col: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, message.into())
}

fn map_row(row: &Row) -> SqliteResult<AuditLog> {
    let action_str: String = row.get(1)?;
    let payload_json_str: Option<String> = row.get(5)?;
    let created_at_str: String = row.get(6)?;

    let action = AuditAction::parse(&action_str)
        .ok_or_else(|| conversion_error(1, format!("ação desconhecida: {}", action_str)))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(6, e.to_string()))?;

    // payload 解析失败时按无 payload 处理
    let payload_json = payload_json_str.and_then(|s| serde_json::from_str(&s).ok());

    Ok(AuditLog {
        log_id: row.get(0)?,
        action,
        entity_type: row.get(2)?,
        entity_id: row.get(3)?,
        actor: row.get(4)?,
        payload_json,
        created_at,
    })
}
