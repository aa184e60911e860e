// ==========================================
// BolsaGO - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::DuplicateAction;
use crate::importer::error::ImporterResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取重复记录的默认处理动作
    ///
    /// # 默认值
    /// - skip
    ///
    /// # 用途
    /// - resolve_duplicates 中调用方未指定动作的重复行
    async fn get_default_duplicate_action(&self) -> ImporterResult<DuplicateAction>;

    /// 获取单个文件允许的最大数据行数
    ///
    /// # 默认值
    /// - 5000
    async fn get_max_rows(&self) -> ImporterResult<usize>;

    /// 获取项目/关联期限上限（月）,超出仅警告
    ///
    /// # 默认值
    /// - 72
    async fn get_max_duration_months(&self) -> ImporterResult<u32>;

    /// 获取界面/消息语言
    ///
    /// # 默认值
    /// - pt-BR
    async fn get_locale(&self) -> ImporterResult<String>;
}
