// ==========================================
// BolsaGO - 导入 Repository Trait
// ==========================================
// 职责: 定义导入提交相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则,只做数据 CRUD
// ==========================================

use crate::domain::audit_log::AuditLog;
use crate::domain::import::{
    BatchRecord, ExistingRecord, FieldMap, ImportBatch, ImportResult,
};
use crate::domain::types::RecordOperation;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// RecordWrite - 单条落库指令
// ==========================================
// entry.record_id: Update 时为已存在记录 ID,Create 时为新生成 ID
#[derive(Debug, Clone, PartialEq)]
pub struct RecordWrite {
    pub row_number: usize,
    pub operation: RecordOperation,
    pub entry: ExistingRecord,
    pub data: FieldMap,
}

// ==========================================
// ImportRepository Trait
// ==========================================
// 实现者: ImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ImportRepository: Send + Sync {
    // ===== 批量写入（事务化）=====

    /// 保存一次导入提交
    ///
    /// 同一事务内: 写批次 → 刷新已存在记录索引 → 写批次明细 → 写审计日志
    ///
    /// # 返回
    /// - Ok(usize): 落库记录数
    /// - Err: 数据库错误（整个事务回滚,审计日志也不写入）
    async fn save_import(
        &self,
        batch: ImportBatch,
        result: &ImportResult,
        writes: Vec<RecordWrite>,
        audit: &AuditLog,
    ) -> RepositoryResult<usize>;

    // ===== 批次查询 =====

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>>;

    /// 查询最近的导入批次（按完成时间倒序）
    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;

    /// 读取批次保存时的完整导入结果
    async fn get_batch_result(&self, batch_id: &str) -> RepositoryResult<Option<ImportResult>>;

    /// 查询批次内已落库记录（按行号）
    async fn get_batch_records(&self, batch_id: &str) -> RepositoryResult<Vec<BatchRecord>>;
}
