// ==========================================
// BolsaGO - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、CPF 校验
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod audit_log;
pub mod cpf;
pub mod import;
pub mod import_type_config;
pub mod types;

// 重导出核心类型
pub use audit_log::{AuditAction, AuditLog};
pub use import::{
    BatchRecord, ExistingRecord, FieldMap, ImportBatch, ImportPreview, ImportResult, ImportSummary,
    ImportedRecord, InFileDuplicate, ParsedRow, RawRow, RejectedRecord,
};
pub use import_type_config::{import_type_catalog, ImportTypeConfig};
pub use types::{
    BankDataStatus, DuplicateAction, DuplicateStatus, ImportType, ParseTypeError, RecordOperation,
    RejectionKind,
};
