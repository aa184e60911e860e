// ==========================================
// BolsaGO - 命令行入口
// ==========================================
// 用法:
//   bolsago-import <tipo> <arquivo> [--commit] [--update-duplicates] [--db <caminho>] [--actor <nome>]
// 输出: stdout 为 JSON（预览或导入结果）,日志写 stderr
// ==========================================

use anyhow::{anyhow, Context};
use bolsago_import::config::{ConfigManager, ImportConfigReader};
use bolsago_import::db::{default_db_path, ensure_schema, open_sqlite_connection};
use bolsago_import::domain::types::{DuplicateAction, ImportType};
use bolsago_import::importer::{ImportSession, UniversalFileParser};
use bolsago_import::repository::{
    AuditLogRepository, ExistingRecordsRepository, ImportRepositoryImpl,
};
use bolsago_import::{i18n, logging};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const USAGE: &str = "uso: bolsago-import <scholars|bank_accounts|projects|enrollments> <arquivo> \
[--commit] [--update-duplicates] [--db <caminho>] [--actor <nome>]";

struct CliArgs {
    import_type: ImportType,
    file: PathBuf,
    commit: bool,
    update_duplicates: bool,
    db_path: Option<PathBuf>,
    actor: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut positional = Vec::new();
    let mut commit = false;
    let mut update_duplicates = false;
    let mut db_path = None;
    let mut actor = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--commit" => commit = true,
            "--update-duplicates" => update_duplicates = true,
            "--db" => db_path = Some(PathBuf::from(args.next().context(USAGE)?)),
            "--actor" => actor = Some(args.next().context(USAGE)?),
            "-h" | "--help" => return Err(anyhow!(USAGE)),
            _ => positional.push(arg),
        }
    }

    let [import_type, file]: [String; 2] = positional.try_into().map_err(|_| anyhow!(USAGE))?;

    Ok(CliArgs {
        import_type: import_type.parse()?,
        file: PathBuf::from(file),
        commit,
        update_duplicates,
        db_path,
        actor,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args = parse_args(std::env::args().skip(1))?;

    tracing::info!("==================================================");
    tracing::info!("{} - 批量导入 v{}", bolsago_import::APP_NAME, bolsago_import::VERSION);
    tracing::info!("==================================================");

    let db_path = args.db_path.clone().unwrap_or_else(default_db_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建数据目录: {}", parent.display()))?;
    }
    tracing::info!("使用数据库: {}", db_path.display());

    let conn = open_sqlite_connection(&db_path.to_string_lossy())?;
    ensure_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let config = ConfigManager::from_connection(conn.clone())?;
    i18n::set_locale(&config.get_locale().await?);

    let mut session = ImportSession::new(
        ImportRepositoryImpl::new(conn.clone()),
        AuditLogRepository::new(conn.clone()),
        config,
        Arc::new(UniversalFileParser),
        Arc::new(ExistingRecordsRepository::new(conn.clone())),
    );
    if let Some(actor) = args.actor {
        session = session.with_actor(actor);
    }

    let preview = session.preview_file(&args.file, args.import_type).await?;

    if !args.commit {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    let actions: BTreeMap<usize, DuplicateAction> = if args.update_duplicates {
        preview
            .duplicate_rows()
            .map(|row| (row.row_number, DuplicateAction::Update))
            .collect()
    } else {
        BTreeMap::new()
    };

    let resolved = session.resolve_duplicates(preview, &actions).await?;
    let result = session.commit(&resolved).await?;
    let output = serde_json::json!({ "preview": resolved, "result": result });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !result.success {
        std::process::exit(2);
    }
    Ok(())
}
