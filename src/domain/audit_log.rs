// ==========================================
// BolsaGO - 审计日志领域模型
// ==========================================
// 红线: 每次提交导入必须记录一条审计日志
// 对齐: audit_log 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// AuditLog - 审计日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub log_id: String,              // 日志ID (UUID)
    pub action: AuditAction,         // 操作类型
    pub entity_type: String,         // 实体类型（导入类型等）
    pub entity_id: Option<String>,   // 实体ID（批次ID等）
    pub actor: String,               // 操作人
    pub payload_json: Option<JsonValue>, // 操作摘要 (JSON)
    pub created_at: DateTime<Utc>,
}

// ==========================================
// AuditAction - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    BulkImport,        // 批量导入提交
    DuplicateResolved, // 重复记录处理
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::BulkImport => "bulk_import",
            AuditAction::DuplicateResolved => "duplicate_resolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bulk_import" => Some(AuditAction::BulkImport),
            "duplicate_resolved" => Some(AuditAction::DuplicateResolved),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
