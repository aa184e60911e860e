// ==========================================
// BolsaGO - 行分类器
// ==========================================
// 阶段 2: 必填检查 → 未声明字段 → 格式规则 → 重复探测
// 约定: 行级问题写入 errors/warnings;只有协作方失败才返回 Err
// 各行独立分类,互不依赖
// ==========================================

use crate::domain::import::{ImportPreview, ParsedRow, RawRow};
use crate::domain::types::ImportType;
use crate::i18n::t_with_args;
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::error::ImporterResult;
use crate::importer::field_rules::{FieldRules, RowCheck};
use crate::importer::importer_trait::ExistingRecordsLookup;
use tracing::{debug, info};

/// 分类单行
///
/// # 参数
/// - raw: 已完成表头映射的原始行
/// - import_type: 导入类型
/// - existing: 已存在记录查询
/// - rules: 格式规则
///
/// # 返回
/// - Ok(ParsedRow): 校验结果（行级错误在 errors 中）
/// - Err(LookupFailed): 查询协作方失败
pub fn classify_row(
    raw: &RawRow,
    import_type: ImportType,
    existing: &dyn ExistingRecordsLookup,
    rules: &FieldRules,
) -> ImporterResult<ParsedRow> {
    let config = import_type.config();
    let mut check = RowCheck::default();

    for field in config.required_fields {
        let present = raw
            .fields
            .get(*field)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !present {
            check.error(t_with_args("validation.missing_required", &[("field", *field)]));
        }
    }

    for field in raw.fields.keys() {
        if !config.is_declared(field) {
            check.warning(t_with_args("validation.unknown_field", &[("field", field.as_str())]));
        }
    }

    rules.apply(import_type, &raw.fields, &mut check);

    let dup = ConflictHandler.check_duplicates(import_type, &check.normalized, existing)?;
    check.warnings.extend(dup.warnings);

    let row = ParsedRow::new(
        raw.row_number,
        raw.fields.clone(),
        check.normalized,
        check.errors,
        check.warnings,
        dup.status,
    );

    debug!(
        row_number = row.row_number,
        is_valid = row.is_valid,
        errors = row.errors.len(),
        warnings = row.warnings.len(),
        duplicate = row.is_duplicate(),
        "行分类完成"
    );
    Ok(row)
}

/// 分类全部行并构造预览（保持文件顺序）
///
/// 任一行查询失败则整次分类失败
pub fn build_preview(
    file_name: &str,
    rows: &[RawRow],
    import_type: ImportType,
    existing: &dyn ExistingRecordsLookup,
    rules: &FieldRules,
) -> ImporterResult<ImportPreview> {
    let parsed = rows
        .iter()
        .map(|raw| classify_row(raw, import_type, existing, rules))
        .collect::<ImporterResult<Vec<_>>>()?;

    let in_file_duplicates = ConflictHandler.detect_in_file_duplicates(&parsed, import_type);
    let preview = ImportPreview::new(file_name, import_type, parsed, in_file_duplicates);

    info!(
        file_name = %preview.file_name,
        import_type = %import_type,
        total = preview.total_rows,
        valid = preview.valid_rows,
        invalid = preview.invalid_rows,
        in_file_duplicates = preview.in_file_duplicates.len(),
        "导入预览生成完成"
    );
    Ok(preview)
}
