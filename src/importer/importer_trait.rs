// ==========================================
// BolsaGO - 导入协作方 Trait
// ==========================================
// 职责: 定义导入流程依赖的外部协作方接口（不包含实现）
// - FileParser: 上传文件 → 有序原始行
// - ExistingRecordsLookup: 按自然键查询已存在记录
// ==========================================

use crate::domain::import::{ExistingRecord, RawRow};
use crate::domain::types::ImportType;
use crate::importer::error::ImporterResult;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行（表头 → 值）
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 按文件顺序排列,row_number 从 1 开始（不含表头）
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImporterResult<Vec<RawRow>>;
}

// ==========================================
// ExistingRecordsLookup Trait
// ==========================================
// 用途: 重复检测（阶段 2）
// 实现者: ExistingRecordsIndex（内存）, ExistingRecordsRepository（SQLite）
// 约束: 只读;同一会话内不同行的查询可并发发起
pub trait ExistingRecordsLookup: Send + Sync {
    /// 按自然键查询
    ///
    /// # 返回
    /// - Ok(Some): 已存在
    /// - Ok(None): 不存在
    /// - Err(LookupFailed): 查询不可用（整次分类作废）
    fn find_by_natural_key(
        &self,
        import_type: ImportType,
        natural_key: &str,
    ) -> ImporterResult<Option<ExistingRecord>>;

    /// 按次要键查询（低置信度重复提示）
    ///
    /// 默认实现不支持次要键,始终返回 None
    fn find_by_secondary_key(
        &self,
        _import_type: ImportType,
        _secondary_key: &str,
    ) -> ImporterResult<Option<ExistingRecord>> {
        Ok(None)
    }
}
