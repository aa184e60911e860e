// ==========================================
// BolsaGO - 导入数据模型
// ==========================================
// 职责: 原始行 / 解析行 / 导入预览 / 导入结果 / 已存在记录
// 生命周期: 预览与解析行只存在于单次导入会话内;导入结果为终态,不再修改
// ==========================================

use crate::domain::types::{
    BankDataStatus, DuplicateAction, DuplicateStatus, ImportType, RecordOperation, RejectionKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 字段名 → 字段值（有序,保证序列化结果稳定）
pub type FieldMap = BTreeMap<String, String>;

// ==========================================
// RawRow - 文件解析产物
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub row_number: usize, // 1 起始,不含表头
    pub fields: FieldMap,
}

impl RawRow {
    pub fn new(row_number: usize, fields: FieldMap) -> Self {
        Self { row_number, fields }
    }
}

// ==========================================
// ParsedRow - 校验后的单行
// ==========================================
// 校验完成后除 duplicate_action 外不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub row_number: usize,
    pub data: FieldMap,       // 原始值
    pub normalized: FieldMap, // 清洗后的已声明字段
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub is_valid: bool, // errors 为空
    pub duplicate_status: DuplicateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_action: Option<DuplicateAction>,
}

impl ParsedRow {
    /// 构造解析行,is_valid 由 errors 派生
    pub fn new(
        row_number: usize,
        data: FieldMap,
        normalized: FieldMap,
        errors: Vec<String>,
        warnings: Vec<String>,
        duplicate_status: DuplicateStatus,
    ) -> Self {
        let is_valid = errors.is_empty();
        Self {
            row_number,
            data,
            normalized,
            errors,
            warnings,
            is_valid,
            duplicate_status,
            duplicate_action: None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        !self.duplicate_status.is_new()
    }
}

// ==========================================
// InFileDuplicate - 同一文件内自然键重复
// ==========================================
// 仅作报告,不改变任何行的校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFileDuplicate {
    pub row_number: usize,
    pub first_row_number: usize,
    pub natural_key: String,
}

// ==========================================
// ImportPreview - 导入预览
// ==========================================
// 不变式: valid_rows + invalid_rows == total_rows == rows.len()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub file_name: String,
    pub import_type: ImportType,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub rows: Vec<ParsedRow>, // 原始文件顺序
    pub in_file_duplicates: Vec<InFileDuplicate>,
}

impl ImportPreview {
    /// 由解析行构造预览,计数全部派生
    pub fn new(
        file_name: impl Into<String>,
        import_type: ImportType,
        rows: Vec<ParsedRow>,
        in_file_duplicates: Vec<InFileDuplicate>,
    ) -> Self {
        let valid_rows = rows.iter().filter(|r| r.is_valid).count();
        Self {
            file_name: file_name.into(),
            import_type,
            total_rows: rows.len(),
            valid_rows,
            invalid_rows: rows.len() - valid_rows,
            rows,
            in_file_duplicates,
        }
    }

    /// 需要调用方决定动作的重复行
    pub fn duplicate_rows(&self) -> impl Iterator<Item = &ParsedRow> {
        self.rows.iter().filter(|r| r.is_duplicate())
    }

    pub fn find_row(&self, row_number: usize) -> Option<&ParsedRow> {
        self.rows.iter().find(|r| r.row_number == row_number)
    }
}

// ==========================================
// 导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedRecord {
    pub row_number: usize,
    pub data: FieldMap,
    pub operation: RecordOperation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub row_number: usize,
    pub data: FieldMap,
    pub reasons: Vec<String>,
    pub kind: RejectionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub import_type: ImportType,
    pub file_name: String,
    pub total_processed: usize,
}

// 不变式:
// - imported_count == imported_records.len()
// - rejected_count == rejected_records.len()
// - imported_count + rejected_count == summary.total_processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: bool,
    pub imported_count: usize,
    pub rejected_count: usize,
    pub imported_records: Vec<ImportedRecord>,
    pub rejected_records: Vec<RejectedRecord>,
    pub summary: ImportSummary,
}

// ==========================================
// ImportBatch - 导入批次
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String, // 批次 ID（UUID）
    pub import_type: ImportType,
    pub file_name: String,
    pub total_rows: usize,
    pub imported_count: usize,
    pub rejected_count: usize,
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub actor: String,
}

impl ImportBatch {
    pub fn from_result(batch_id: String, actor: &str, result: &ImportResult) -> Self {
        Self {
            batch_id,
            import_type: result.summary.import_type,
            file_name: result.summary.file_name.clone(),
            total_rows: result.summary.total_processed,
            imported_count: result.imported_count,
            rejected_count: result.rejected_count,
            success: result.success,
            started_at: result.summary.started_at,
            completed_at: result.summary.completed_at,
            actor: actor.to_string(),
        }
    }
}

// 批次内已落库记录（对齐 imported_record 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub batch_id: String,
    pub row_number: usize,
    pub record_id: String,
    pub operation: RecordOperation,
    pub data: FieldMap,
}

// ==========================================
// ExistingRecord - 已存在记录索引项
// ==========================================
// 由已存在记录查询协作方返回
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRecord {
    pub record_id: String,
    pub import_type: ImportType,
    pub natural_key: String,
    pub secondary_key: Option<String>,
    pub bank_status: Option<BankDataStatus>, // 仅银行账户
}
