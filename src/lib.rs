// ==========================================
// BolsaGO - 批量导入核心库
// ==========================================
// 职责: CPF 校验 + 学者/银行账户/项目/关联的批量导入契约
// 技术栈: Rust + SQLite
// 流程: 预览 → 重复处理 → 提交（人工确认后写入）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "pt-BR");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/表结构）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    BankDataStatus, DuplicateAction, DuplicateStatus, ImportType, RecordOperation, RejectionKind,
};

// 领域实体
pub use domain::{ImportPreview, ImportResult, ParsedRow, RawRow};

// 导入
pub use importer::{ImportError, ImportSession, ImporterResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "BolsaGO";
