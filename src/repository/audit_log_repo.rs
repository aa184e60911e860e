// ==========================================
// BolsaGO - 审计日志数据仓储
// ==========================================
// 对齐: audit_log 表
// 红线: 每次导入提交必须记录
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use self::core::AuditLogRepository;
pub(crate) use self::core::insert_on;
