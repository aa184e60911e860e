// ==========================================
// BolsaGO - 冲突处理器实现
// ==========================================
// 职责: 自然键/次要键构造、跨库重复探测、同文件内重复检测、重复动作绑定
// 红线: New 行不得绑定动作（契约违规,直接返回错误）
// ==========================================

use crate::domain::import::{FieldMap, ImportPreview, InFileDuplicate, ParsedRow};
use crate::domain::types::{BankDataStatus, DuplicateAction, DuplicateStatus, ImportType};
use crate::i18n::{t, t_with_args};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::importer_trait::ExistingRecordsLookup;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error};

const KEY_SEPARATOR: &str = ":";

// 按字段列表拼接键;任一字段缺失则无键
fn compose_key(fields: &[&str], normalized: &FieldMap) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let parts: Option<Vec<&str>> = fields
        .iter()
        .map(|f| normalized.get(*f).map(String::as_str).filter(|v| !v.is_empty()))
        .collect();
    parts.map(|p| p.join(KEY_SEPARATOR))
}

/// 自然键（scholars/bank_accounts: cpf; projects: code; enrollments: cpf:PROJECT_CODE）
///
/// 使用 normalized 字段,调用方需先执行字段规则
pub fn natural_key(import_type: ImportType, normalized: &FieldMap) -> Option<String> {
    compose_key(import_type.config().natural_key, normalized)
}

/// 次要键（小写比较）;enrollments 无次要键
pub fn secondary_key(import_type: ImportType, normalized: &FieldMap) -> Option<String> {
    compose_key(import_type.config().secondary_key, normalized).map(|k| k.to_lowercase())
}

// ==========================================
// 重复探测结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCheck {
    pub status: DuplicateStatus,
    pub warnings: Vec<String>,
}

pub struct ConflictHandler;

impl ConflictHandler {
    /// 按自然键/次要键探测已存在记录
    ///
    /// # 返回
    /// - Ok(DuplicateCheck): 重复状态 + 附加警告
    /// - Err(LookupFailed): 查询协作方不可用
    pub fn check_duplicates(
        &self,
        import_type: ImportType,
        normalized: &FieldMap,
        existing: &dyn ExistingRecordsLookup,
    ) -> ImporterResult<DuplicateCheck> {
        let mut warnings = Vec::new();
        let mut status = DuplicateStatus::New;

        if let Some(key) = natural_key(import_type, normalized) {
            if let Some(record) = existing.find_by_natural_key(import_type, &key)? {
                warnings.push(t_with_args("duplicate.existing", &[("key", key.as_str())]));
                if record.bank_status == Some(BankDataStatus::Validated) {
                    warnings.push(t("duplicate.validated_bank_data"));
                }
                status = DuplicateStatus::Duplicate {
                    existing_id: record.record_id,
                };
            }
        }

        if let Some(key) = secondary_key(import_type, normalized) {
            if let Some(record) = existing.find_by_secondary_key(import_type, &key)? {
                // 命中同一条记录时不重复提示
                if status.existing_id() != Some(record.record_id.as_str()) {
                    let field = import_type.config().secondary_key.join("+");
                    warnings.push(t_with_args(
                        "duplicate.possible",
                        &[("field", field.as_str()), ("record", record.record_id.as_str())],
                    ));
                }
            }
        }

        Ok(DuplicateCheck { status, warnings })
    }

    /// 检测同一文件内自然键重复
    ///
    /// # 返回
    /// - Vec<InFileDuplicate>: 重复行（不包括第一次出现）
    pub fn detect_in_file_duplicates(
        &self,
        rows: &[ParsedRow],
        import_type: ImportType,
    ) -> Vec<InFileDuplicate> {
        let mut first_occurrence: HashMap<String, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for row in rows {
            let Some(key) = natural_key(import_type, &row.normalized) else {
                continue;
            };
            match first_occurrence.get(&key) {
                Some(first_row) => duplicates.push(InFileDuplicate {
                    row_number: row.row_number,
                    first_row_number: *first_row,
                    natural_key: key,
                }),
                None => {
                    first_occurrence.insert(key, row.row_number);
                }
            }
        }

        if !duplicates.is_empty() {
            debug!(count = duplicates.len(), "同文件内发现重复自然键");
        }
        duplicates
    }

    /// 为重复行绑定动作
    ///
    /// # 参数
    /// - preview: 导入预览（按值消费,返回新预览）
    /// - actions: 行号 → 调用方选择的动作
    /// - default_action: 未指定时使用的动作
    ///
    /// # 返回
    /// - Err(UnknownRow): 行号不存在
    /// - Err(ActionOnNewRow): 动作指向 New 行（契约违规）
    pub fn resolve_duplicates(
        &self,
        mut preview: ImportPreview,
        actions: &BTreeMap<usize, DuplicateAction>,
        default_action: DuplicateAction,
    ) -> ImporterResult<ImportPreview> {
        for (&row_number, action) in actions {
            match preview.find_row(row_number) {
                None => return Err(ImportError::UnknownRow { row_number }),
                Some(row) if !row.is_duplicate() => {
                    error!(row_number, action = %action, "动作不适用于新记录行");
                    return Err(ImportError::ActionOnNewRow { row_number });
                }
                Some(_) => {}
            }
        }

        for row in preview.rows.iter_mut().filter(|r| r.is_duplicate()) {
            let action = actions
                .get(&row.row_number)
                .copied()
                .unwrap_or(default_action);
            row.duplicate_action = Some(action);
        }

        Ok(preview)
    }
}
