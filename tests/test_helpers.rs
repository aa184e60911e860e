// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、会话组装、测试文件生成
// ==========================================
#![allow(dead_code)]

use bolsago_import::config::ConfigManager;
use bolsago_import::db::{ensure_schema, open_sqlite_connection};
use bolsago_import::domain::import::{FieldMap, RawRow};
use bolsago_import::importer::{FixedClock, ImportSession, UniversalFileParser};
use bolsago_import::repository::{
    AuditLogRepository, ExistingRecordsRepository, ImportRepositoryImpl,
};
use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub type TestSession = ImportSession<ImportRepositoryImpl, ConfigManager>;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - Arc<Mutex<Connection>>: 共享连接
pub fn create_test_db() -> Result<(NamedTempFile, Arc<Mutex<Connection>>), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, Arc::new(Mutex::new(conn))))
}

/// 固定时钟（2025-03-01 12:00:00 UTC）
pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()))
}

/// 组装导入会话（SQLite 仓储 + 固定时钟）
pub fn build_session(conn: &Arc<Mutex<Connection>>) -> TestSession {
    let config = ConfigManager::from_connection(conn.clone()).unwrap();

    ImportSession::new(
        ImportRepositoryImpl::new(conn.clone()),
        AuditLogRepository::new(conn.clone()),
        config,
        Arc::new(UniversalFileParser),
        Arc::new(ExistingRecordsRepository::new(conn.clone())),
    )
    .with_clock(fixed_clock())
    .with_actor("operador.teste")
}

/// 写入临时 CSV 文件（保留 .csv 扩展名）
pub fn write_csv(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// 构造原始行
pub fn raw_row(row_number: usize, pairs: &[(&str, &str)]) -> RawRow {
    let fields: FieldMap = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    RawRow::new(row_number, fields)
}

/// 合法学者行
pub fn scholar_row(row_number: usize, name: &str, email: &str, cpf: &str) -> RawRow {
    raw_row(
        row_number,
        &[("full_name", name), ("email", email), ("cpf", cpf)],
    )
}
