// ==========================================
// BolsaGO - 领域类型定义
// ==========================================
// 职责: 导入类型 / 重复状态 / 重复处理动作 / 银行数据状态
// 红线: 导入类型为封闭枚举,新增类型必须在所有 match 中补齐
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// 解析错误 (Parse Error)
// ==========================================
// 领域枚举从字符串解析失败;导入层在边界处转换为 ImportError
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseTypeError {
    #[error("Tipo de importação desconhecido: {0}")]
    UnknownImportType(String),

    #[error("Ação de duplicidade inválida: {0} (esperado update ou skip)")]
    UnknownDuplicateAction(String),
}

// ==========================================
// 导入类型 (Import Type)
// ==========================================
// 序列化格式: snake_case (与前端选择器一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportType {
    Scholars,     // 学者（受资助人）
    BankAccounts, // 银行账户
    Projects,     // 项目
    Enrollments,  // 学者-项目关联
}

impl ImportType {
    /// 全部导入类型（按界面展示顺序）
    pub const ALL: [ImportType; 4] = [
        ImportType::Scholars,
        ImportType::BankAccounts,
        ImportType::Projects,
        ImportType::Enrollments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportType::Scholars => "scholars",
            ImportType::BankAccounts => "bank_accounts",
            ImportType::Projects => "projects",
            ImportType::Enrollments => "enrollments",
        }
    }
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImportType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "scholars" => Ok(ImportType::Scholars),
            "bank_accounts" => Ok(ImportType::BankAccounts),
            "projects" => Ok(ImportType::Projects),
            "enrollments" => Ok(ImportType::Enrollments),
            other => Err(ParseTypeError::UnknownImportType(other.to_string())),
        }
    }
}

// ==========================================
// 重复状态 (Duplicate Status)
// ==========================================
// New: 未命中已存在记录
// Duplicate: 按自然键命中已存在记录,提交前需要调用方决定动作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateStatus {
    New,
    Duplicate { existing_id: String },
}

impl DuplicateStatus {
    pub fn is_new(&self) -> bool {
        matches!(self, DuplicateStatus::New)
    }

    /// 命中的已存在记录 ID
    pub fn existing_id(&self) -> Option<&str> {
        match self {
            DuplicateStatus::New => None,
            DuplicateStatus::Duplicate { existing_id } => Some(existing_id),
        }
    }
}

// ==========================================
// 重复处理动作 (Duplicate Action)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAction {
    Update, // 用导入数据覆盖已存在记录
    Skip,   // 保留已存在记录,忽略本行
}

impl DuplicateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateAction::Update => "update",
            DuplicateAction::Skip => "skip",
        }
    }
}

impl fmt::Display for DuplicateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DuplicateAction {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "update" => Ok(DuplicateAction::Update),
            "skip" => Ok(DuplicateAction::Skip),
            other => Err(ParseTypeError::UnknownDuplicateAction(other.to_string())),
        }
    }
}

// ==========================================
// 银行数据状态 (Bank Data Status)
// ==========================================
// 导入新建/更新的账户一律为 Pending,等待人工核验
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankDataStatus {
    Pending,
    Validated,
    Rejected,
}

impl BankDataStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankDataStatus::Pending => "pending",
            BankDataStatus::Validated => "validated",
            BankDataStatus::Rejected => "rejected",
        }
    }

    /// 从数据库文本解析;未知值返回 None
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BankDataStatus::Pending),
            "validated" => Some(BankDataStatus::Validated),
            "rejected" => Some(BankDataStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for BankDataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 记录写入方式 (Record Operation)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOperation {
    Create,
    Update { existing_id: String },
}

// ==========================================
// 拒绝原因类别 (Rejection Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    Invalid,          // 行校验失败
    SkippedDuplicate, // 重复记录且选择 skip
}
