// ==========================================
// BolsaGO - 导入会话
// ==========================================
// 职责: 整合导入流程,从文件到数据库
// 流程: 解析 → 表头映射 → 行分类 → 重复动作绑定 → 提交分区 → 落库 + 审计
// 约定: 预览与解析行只属于本会话;协作方失败以 Err 返回
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::audit_log::{AuditAction, AuditLog};
use crate::domain::import::{ExistingRecord, ImportBatch, ImportPreview, ImportResult, RawRow};
use crate::domain::types::{BankDataStatus, DuplicateAction, ImportType, RecordOperation};
use crate::importer::committer::{self, Clock, SystemClock};
use crate::importer::conflict_handler::{natural_key, secondary_key, ConflictHandler};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::field_rules::FieldRules;
use crate::importer::importer_trait::{ExistingRecordsLookup, FileParser};
use crate::importer::row_classifier::build_preview;
use crate::repository::{AuditLogRepository, ImportRepository, RecordWrite};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 未指定操作人时的默认值
pub const DEFAULT_ACTOR: &str = "system";

// ==========================================
// ImportSession - 导入会话
// ==========================================
pub struct ImportSession<R, C>
where
    R: ImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,
    audit_repo: AuditLogRepository,

    // 配置读取器
    config: C,

    // 协作方
    file_parser: Arc<dyn FileParser>,
    existing: Arc<dyn ExistingRecordsLookup>,

    clock: Arc<dyn Clock>,
    actor: String,
}

impl<R, C> ImportSession<R, C>
where
    R: ImportRepository,
    C: ImportConfigReader,
{
    /// 创建导入会话（系统时钟,操作人 system）
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - audit_repo: 审计日志仓储
    /// - config: 配置读取器
    /// - file_parser: 文件解析器
    /// - existing: 已存在记录查询
    pub fn new(
        import_repo: R,
        audit_repo: AuditLogRepository,
        config: C,
        file_parser: Arc<dyn FileParser>,
        existing: Arc<dyn ExistingRecordsLookup>,
    ) -> Self {
        Self {
            import_repo,
            audit_repo,
            config,
            file_parser,
            existing,
            clock: Arc::new(SystemClock),
            actor: DEFAULT_ACTOR.to_string(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn import_repo(&self) -> &R {
        &self.import_repo
    }

    // ==========================================
    // 预览
    // ==========================================

    /// 解析文件并生成导入预览
    ///
    /// # 返回
    /// - Ok(ImportPreview): 行级问题在各行 errors/warnings 中
    /// - Err: 文件读取/解析失败、行数超限、查询协作方失败
    #[instrument(skip(self, path), fields(path = %path.display(), import_type = %import_type))]
    pub async fn preview_file(
        &self,
        path: &Path,
        import_type: ImportType,
    ) -> ImporterResult<ImportPreview> {
        let parser = Arc::clone(&self.file_parser);
        let owned_path = path.to_path_buf();
        let raw_rows = tokio::task::spawn_blocking(move || parser.parse_to_raw_rows(&owned_path))
            .await
            .map_err(|e| ImportError::InternalError(format!("tarefa de leitura interrompida: {}", e)))?
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                e
            })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        info!(file_name = %file_name, rows = raw_rows.len(), "文件解析完成");
        self.preview_rows(&file_name, raw_rows, import_type).await
    }

    /// 对已解析的原始行生成导入预览
    pub async fn preview_rows(
        &self,
        file_name: &str,
        rows: Vec<RawRow>,
        import_type: ImportType,
    ) -> ImporterResult<ImportPreview> {
        let max_rows = self.config.get_max_rows().await?;
        if rows.len() > max_rows {
            warn!(count = rows.len(), max = max_rows, "文件行数超限");
            return Err(ImportError::TooManyRows {
                count: rows.len(),
                max: max_rows,
            });
        }

        let rules = FieldRules::new(self.config.get_max_duration_months().await?);

        let mapper = FieldMapper;
        let mapped: Vec<RawRow> = rows
            .into_iter()
            .map(|row| mapper.map_row(row, import_type))
            .collect();
        debug!(rows = mapped.len(), "表头映射完成");

        // 行分类可能触发同步查询（SQLite）,放到阻塞线程执行
        let existing = Arc::clone(&self.existing);
        let file_name = file_name.to_string();
        tokio::task::spawn_blocking(move || {
            build_preview(&file_name, &mapped, import_type, existing.as_ref(), &rules)
        })
        .await
        .map_err(|e| ImportError::InternalError(format!("tarefa de validação interrompida: {}", e)))?
    }

    /// 并发预览多个文件
    ///
    /// 单个文件失败不影响其他文件;结果顺序与输入一致
    pub async fn batch_preview(
        &self,
        paths: Vec<PathBuf>,
        import_type: ImportType,
    ) -> Vec<ImporterResult<ImportPreview>> {
        use futures::future::join_all;

        info!(count = paths.len(), "开始批量预览文件");

        let tasks = paths.iter().map(|path| async move {
            let result = self.preview_file(path, import_type).await;
            if let Err(e) = &result {
                error!(file = %path.display(), error = %e, "文件预览失败");
            }
            result
        });
        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量预览完成"
        );
        results
    }

    // ==========================================
    // 重复动作
    // ==========================================

    /// 为重复行绑定动作（未指定的使用配置默认动作）
    pub async fn resolve_duplicates(
        &self,
        preview: ImportPreview,
        actions: &BTreeMap<usize, DuplicateAction>,
    ) -> ImporterResult<ImportPreview> {
        let default_action = self.config.get_default_duplicate_action().await?;
        let resolved = ConflictHandler.resolve_duplicates(preview, actions, default_action)?;

        let (updates, skips) = resolved.duplicate_rows().fold((0, 0), |(u, s), row| {
            match row.duplicate_action {
                Some(DuplicateAction::Update) => (u + 1, s),
                _ => (u, s + 1),
            }
        });

        if updates + skips > 0 {
            let log = AuditLog {
                log_id: Uuid::new_v4().to_string(),
                action: AuditAction::DuplicateResolved,
                entity_type: resolved.import_type.to_string(),
                entity_id: None,
                actor: self.actor.clone(),
                payload_json: Some(json!({
                    "file_name": resolved.file_name,
                    "update": updates,
                    "skip": skips,
                    "default_action": default_action.as_str(),
                })),
                created_at: self.clock.now(),
            };
            self.audit_repo.insert(&log)?;
        }

        info!(updates, skips, default_action = %default_action, "重复记录处理完成");
        Ok(resolved)
    }

    // ==========================================
    // 提交
    // ==========================================

    /// 提交预览: 分区 → 同一事务内落库（批次 + 索引 + 明细 + 审计）
    ///
    /// # 返回
    /// - Ok(ImportResult): 与 committer::commit 的结果一致
    /// - Err(PersistenceError): 事务回滚,批次与审计日志均未写入
    #[instrument(skip(self, preview), fields(batch_id, file_name = %preview.file_name))]
    pub async fn commit(&self, preview: &ImportPreview) -> ImporterResult<ImportResult> {
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let result = committer::commit(preview, self.clock.as_ref());
        let writes = build_writes(preview.import_type, &result)?;

        let log = AuditLog {
            log_id: Uuid::new_v4().to_string(),
            action: AuditAction::BulkImport,
            entity_type: preview.import_type.to_string(),
            entity_id: Some(batch_id.clone()),
            actor: self.actor.clone(),
            payload_json: Some(json!({
                "success": result.success,
                "imported_count": result.imported_count,
                "rejected_count": result.rejected_count,
                "summary": result.summary,
            })),
            created_at: result.summary.completed_at,
        };

        let batch = ImportBatch::from_result(batch_id.clone(), &self.actor, &result);
        let saved = self
            .import_repo
            .save_import(batch, &result, writes, &log)
            .await
            .map_err(|e| {
                error!(error = %e, "导入批次落库失败");
                ImportError::from(e)
            })?;

        info!(
            batch_id = %batch_id,
            imported = result.imported_count,
            rejected = result.rejected_count,
            saved,
            success = result.success,
            "导入提交完成"
        );
        Ok(result)
    }
}

// 导入记录 → 落库指令
fn build_writes(import_type: ImportType, result: &ImportResult) -> ImporterResult<Vec<RecordWrite>> {
    result
        .imported_records
        .iter()
        .map(|record| {
            let key = natural_key(import_type, &record.data).ok_or_else(|| {
                ImportError::InternalError(format!(
                    "linha {} sem chave natural",
                    record.row_number
                ))
            })?;
            let record_id = match &record.operation {
                RecordOperation::Update { existing_id } => existing_id.clone(),
                RecordOperation::Create => Uuid::new_v4().to_string(),
            };
            let bank_status = match import_type {
                ImportType::BankAccounts => Some(BankDataStatus::Pending),
                _ => None,
            };
            Ok(RecordWrite {
                row_number: record.row_number,
                operation: record.operation.clone(),
                entry: ExistingRecord {
                    record_id,
                    import_type,
                    natural_key: key,
                    secondary_key: secondary_key(import_type, &record.data),
                    bank_status,
                },
                data: record.data.clone(),
            })
        })
        .collect()
}
