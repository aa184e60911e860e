// ==========================================
// BolsaGO - 提交分区
// ==========================================
// 阶段 3: 预览 → 导入结果（纯函数,不写库）
// 规则:
// - 无效行 → rejected(invalid)
// - 有效重复行且动作为 skip/未指定 → rejected(skipped_duplicate)
// - 其余有效行 → imported(create/update)
// 不变式: imported + rejected == total_processed == preview.total_rows
// ==========================================

use crate::domain::import::{
    ImportPreview, ImportResult, ImportSummary, ImportedRecord, ParsedRow, RejectedRecord,
};
use crate::domain::types::{DuplicateAction, DuplicateStatus, RecordOperation, RejectionKind};
use crate::i18n::t_with_args;
use chrono::{DateTime, Utc};
use tracing::debug;

// ==========================================
// Clock - 时间来源
// ==========================================
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定时钟（测试与重放）
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

enum Outcome {
    Imported(ImportedRecord),
    Rejected(RejectedRecord),
}

fn partition_row(row: &ParsedRow) -> Outcome {
    if !row.is_valid {
        return Outcome::Rejected(RejectedRecord {
            row_number: row.row_number,
            data: row.data.clone(),
            reasons: row.errors.clone(),
            kind: RejectionKind::Invalid,
        });
    }

    let operation = match (&row.duplicate_status, row.duplicate_action) {
        (DuplicateStatus::New, _) => RecordOperation::Create,
        (DuplicateStatus::Duplicate { existing_id }, Some(DuplicateAction::Update)) => {
            RecordOperation::Update {
                existing_id: existing_id.clone(),
            }
        }
        (DuplicateStatus::Duplicate { existing_id }, _) => {
            return Outcome::Rejected(RejectedRecord {
                row_number: row.row_number,
                data: row.data.clone(),
                reasons: vec![t_with_args(
                    "commit.duplicate_skipped",
                    &[("record", existing_id.as_str())],
                )],
                kind: RejectionKind::SkippedDuplicate,
            });
        }
    };

    Outcome::Imported(ImportedRecord {
        row_number: row.row_number,
        data: row.normalized.clone(),
        operation,
    })
}

/// 将预览分区为导入结果
///
/// 相同预览 + 相同时钟 → 相同结果
pub fn commit(preview: &ImportPreview, clock: &dyn Clock) -> ImportResult {
    let started_at = clock.now();

    let mut imported_records = Vec::new();
    let mut rejected_records = Vec::new();
    for row in &preview.rows {
        match partition_row(row) {
            Outcome::Imported(record) => imported_records.push(record),
            Outcome::Rejected(record) => rejected_records.push(record),
        }
    }

    let completed_at = clock.now().max(started_at);
    let success = rejected_records
        .iter()
        .all(|r| r.kind != RejectionKind::Invalid);

    debug!(
        imported = imported_records.len(),
        rejected = rejected_records.len(),
        success,
        "提交分区完成"
    );

    ImportResult {
        success,
        imported_count: imported_records.len(),
        rejected_count: rejected_records.len(),
        summary: ImportSummary {
            started_at,
            completed_at,
            import_type: preview.import_type,
            file_name: preview.file_name.clone(),
            total_processed: preview.rows.len(),
        },
        imported_records,
        rejected_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::FieldMap;
    use crate::domain::types::ImportType;
    use chrono::TimeZone;

    fn row(
        row_number: usize,
        errors: Vec<String>,
        status: DuplicateStatus,
        action: Option<DuplicateAction>,
    ) -> ParsedRow {
        let mut data = FieldMap::new();
        data.insert("code".to_string(), format!("p-{}", row_number));
        let mut normalized = FieldMap::new();
        normalized.insert("code".to_string(), format!("P-{}", row_number));
        let mut row = ParsedRow::new(row_number, data, normalized, errors, vec![], status);
        row.duplicate_action = action;
        row
    }

    fn dup(id: &str) -> DuplicateStatus {
        DuplicateStatus::Duplicate {
            existing_id: id.to_string(),
        }
    }

    fn sample_preview() -> ImportPreview {
        let rows = vec![
            row(1, vec![], DuplicateStatus::New, None),
            row(2, vec!["Campo obrigatório ausente: title".to_string()], DuplicateStatus::New, None),
            row(3, vec![], dup("prj-3"), Some(DuplicateAction::Update)),
            row(4, vec![], dup("prj-4"), Some(DuplicateAction::Skip)),
            row(5, vec![], dup("prj-5"), None),
        ];
        ImportPreview::new("projetos.csv", ImportType::Projects, rows, vec![])
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_commit_partition() {
        let result = commit(&sample_preview(), &clock());

        assert_eq!(result.imported_count, 2);
        assert_eq!(result.rejected_count, 3);
        assert_eq!(result.imported_count + result.rejected_count, result.summary.total_processed);
        assert!(!result.success);

        assert_eq!(result.imported_records[0].operation, RecordOperation::Create);
        assert_eq!(result.imported_records[0].data["code"], "P-1");
        assert_eq!(
            result.imported_records[1].operation,
            RecordOperation::Update { existing_id: "prj-3".to_string() }
        );

        let kinds: Vec<(usize, RejectionKind)> = result
            .rejected_records
            .iter()
            .map(|r| (r.row_number, r.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (2, RejectionKind::Invalid),
                (4, RejectionKind::SkippedDuplicate),
                (5, RejectionKind::SkippedDuplicate),
            ]
        );
        assert_eq!(result.rejected_records[0].data["code"], "p-2");
    }

    #[test]
    fn test_skipped_duplicates_keep_success() {
        let rows = vec![
            row(1, vec![], DuplicateStatus::New, None),
            row(2, vec![], dup("prj-2"), Some(DuplicateAction::Skip)),
        ];
        let preview = ImportPreview::new("projetos.csv", ImportType::Projects, rows, vec![]);
        let result = commit(&preview, &clock());

        assert!(result.success);
        assert_eq!(result.imported_count, 1);
        assert_eq!(result.rejected_count, 1);
    }

    #[test]
    fn test_commit_is_deterministic() {
        let preview = sample_preview();
        let first = serde_json::to_string(&commit(&preview, &clock())).unwrap();
        let second = serde_json::to_string(&commit(&preview, &clock())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_preview() {
        let preview = ImportPreview::new("vazio.csv", ImportType::Scholars, vec![], vec![]);
        let result = commit(&preview, &SystemClock);

        assert!(result.success);
        assert_eq!(result.summary.total_processed, 0);
        assert!(result.summary.completed_at >= result.summary.started_at);
    }
}
