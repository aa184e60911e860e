// ==========================================
// BolsaGO - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 行级校验问题是数据（写在 ParsedRow 上）,不走此错误类型;
//       此处只表达协作方失败与调用契约违反
// ==========================================

use crate::domain::types::ParseTypeError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（解析协作方）=====
    #[error("Arquivo não encontrado: {0}")]
    FileNotFound(String),

    #[error("Formato de arquivo não suportado: {0} (apenas .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("Falha ao ler arquivo: {0}")]
    FileReadError(String),

    #[error("Falha ao interpretar planilha Excel: {0}")]
    ExcelParseError(String),

    #[error("Falha ao interpretar CSV: {0}")]
    CsvParseError(String),

    #[error("Arquivo com {count} linhas excede o limite de {max}")]
    TooManyRows { count: usize, max: usize },

    // ===== 已存在记录查询失败（整次分类作废）=====
    #[error("Consulta de registros existentes falhou ({import_type}): {message}")]
    LookupFailed {
        import_type: String,
        message: String,
    },

    // ===== 调用契约违反 =====
    #[error("Tipo de importação desconhecido: {0}")]
    UnknownImportType(String),

    #[error("Ação de duplicidade atribuída a linha nova (linha {row_number})")]
    ActionOnNewRow { row_number: usize },

    #[error("Linha {row_number} não existe na pré-visualização")]
    UnknownRow { row_number: usize },

    // ===== 持久化错误 =====
    #[error("Falha de persistência: {0}")]
    PersistenceError(String),

    #[error("Falha de banco de dados: {0}")]
    DatabaseError(String),

    // ===== 配置错误 =====
    #[error("Falha ao ler configuração (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("Valor de configuração inválido (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error("Erro interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为协作方失败（整次导入无法执行,而不是"部分行无效"）
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::FileReadError(_)
                | ImportError::ExcelParseError(_)
                | ImportError::CsvParseError(_)
                | ImportError::LookupFailed { .. }
                | ImportError::PersistenceError(_)
                | ImportError::DatabaseError(_)
        )
    }

    /// 是否为调用契约违反（编程错误）
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ImportError::UnknownImportType(_)
                | ImportError::ActionOnNewRow { .. }
                | ImportError::UnknownRow { .. }
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::InternalError(err.to_string())
    }
}

// 实现 From<ParseTypeError>
impl From<ParseTypeError> for ImportError {
    fn from(err: ParseTypeError) -> Self {
        match err {
            ParseTypeError::UnknownImportType(value) => ImportError::UnknownImportType(value),
            ParseTypeError::UnknownDuplicateAction(value) => ImportError::ConfigValueError {
                key: "duplicate_action".to_string(),
                value,
                message: "esperado update ou skip".to_string(),
            },
        }
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::PersistenceError(err.to_string())
    }
}

/// Result 类型别名
pub type ImporterResult<T> = Result<T, ImportError>;
