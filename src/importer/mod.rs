// ==========================================
// BolsaGO - 导入层
// ==========================================
// 职责: 外部文件批量导入（学者 / 银行账户 / 项目 / 关联）
// 支持: Excel, CSV
// 流程: 解析 → 映射 → 校验分类 → 重复处理 → 提交
// ==========================================

// 模块声明
pub mod committer;
pub mod conflict_handler;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod field_rules;
pub mod file_parser;
pub mod import_session;
pub mod importer_trait;
pub mod row_classifier;

// 重导出核心类型
pub use committer::{commit, Clock, FixedClock, SystemClock};
pub use conflict_handler::{natural_key, secondary_key, ConflictHandler};
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImporterResult};
pub use field_mapper::FieldMapper;
pub use field_rules::{FieldRules, RowCheck, DEFAULT_MAX_DURATION_MONTHS};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use import_session::ImportSession;
pub use row_classifier::{build_preview, classify_row};

// 重导出 Trait 接口
pub use importer_trait::{ExistingRecordsLookup, FileParser};
