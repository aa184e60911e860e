// ==========================================
// BolsaGO - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod audit_log_repo;
pub mod error;
pub mod existing_records_repo;
pub mod import_repo;
pub mod import_repo_impl;

// 重导出核心仓储
pub use audit_log_repo::AuditLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use existing_records_repo::{ExistingRecordsIndex, ExistingRecordsRepository};
pub use import_repo::{ImportRepository, RecordWrite};
pub use import_repo_impl::ImportRepositoryImpl;
