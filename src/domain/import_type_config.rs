// ==========================================
// BolsaGO - 导入类型静态配置
// ==========================================
// 职责: 每种导入类型的标签 / 描述 / 必填字段 / 可选字段 / 自然键
// 红线: 进程级只读,启动即确定,不可修改
// ==========================================

use crate::domain::types::ImportType;
use serde::Serialize;

/// 单个导入类型的静态配置
#[derive(Debug, Serialize)]
pub struct ImportTypeConfig {
    pub import_type: ImportType,
    pub label: &'static str,
    pub description: &'static str,
    pub required_fields: &'static [&'static str], // 有序且唯一
    pub optional_fields: &'static [&'static str], // 与必填字段不相交
    pub natural_key: &'static [&'static str],     // 重复检测用自然键（可为组合键）
    pub secondary_key: &'static [&'static str],   // 低置信度重复提示用
}

impl ImportTypeConfig {
    pub fn is_required(&self, field: &str) -> bool {
        self.required_fields.contains(&field)
    }

    /// 字段是否在必填/可选集合中声明
    pub fn is_declared(&self, field: &str) -> bool {
        self.required_fields.contains(&field) || self.optional_fields.contains(&field)
    }

    /// 全部已声明字段（必填在前）
    pub fn declared_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required_fields
            .iter()
            .chain(self.optional_fields.iter())
            .copied()
    }
}

static SCHOLARS: ImportTypeConfig = ImportTypeConfig {
    import_type: ImportType::Scholars,
    label: "Bolsistas",
    description: "Cadastro de bolsistas com nome, e-mail e CPF",
    required_fields: &["full_name", "email", "cpf"],
    optional_fields: &[
        "phone",
        "birth_date",
        "institution",
        "academic_level",
        "lattes_url",
    ],
    natural_key: &["cpf"],
    secondary_key: &["email"],
};

static BANK_ACCOUNTS: ImportTypeConfig = ImportTypeConfig {
    import_type: ImportType::BankAccounts,
    label: "Dados Bancários",
    description: "Contas bancárias dos bolsistas para pagamento",
    required_fields: &["cpf", "bank_code", "bank_name", "agency", "account_number"],
    optional_fields: &["account_type", "pix_key"],
    natural_key: &["cpf"],
    secondary_key: &["bank_code", "agency", "account_number"],
};

static PROJECTS: ImportTypeConfig = ImportTypeConfig {
    import_type: ImportType::Projects,
    label: "Projetos",
    description: "Projetos de pesquisa e extensão com vigência",
    required_fields: &["code", "title", "start_date", "end_date"],
    optional_fields: &["description", "coordinator", "total_budget", "sponsor"],
    natural_key: &["code"],
    secondary_key: &["title"],
};

static ENROLLMENTS: ImportTypeConfig = ImportTypeConfig {
    import_type: ImportType::Enrollments,
    label: "Vínculos",
    description: "Vínculo de bolsista a projeto com modalidade e valor mensal",
    required_fields: &[
        "cpf",
        "project_code",
        "modality",
        "start_date",
        "end_date",
        "monthly_amount",
    ],
    optional_fields: &["total_installments", "notes"],
    natural_key: &["cpf", "project_code"],
    secondary_key: &[],
};

impl ImportType {
    /// 获取导入类型的静态配置
    pub fn config(&self) -> &'static ImportTypeConfig {
        match self {
            ImportType::Scholars => &SCHOLARS,
            ImportType::BankAccounts => &BANK_ACCOUNTS,
            ImportType::Projects => &PROJECTS,
            ImportType::Enrollments => &ENROLLMENTS,
        }
    }
}

/// 全部导入类型配置（供前端选择器渲染）
pub fn import_type_catalog() -> Vec<&'static ImportTypeConfig> {
    ImportType::ALL.iter().map(|t| t.config()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_config_keyed_by_variant() {
        for import_type in ImportType::ALL {
            assert_eq!(import_type.config().import_type, import_type);
        }
    }

    #[test]
    fn test_required_fields_unique_and_disjoint() {
        for config in import_type_catalog() {
            let required: HashSet<_> = config.required_fields.iter().collect();
            assert_eq!(required.len(), config.required_fields.len());

            let optional: HashSet<_> = config.optional_fields.iter().collect();
            assert!(required.is_disjoint(&optional), "{}", config.import_type);
        }
    }

    #[test]
    fn test_keys_are_declared_fields() {
        for config in import_type_catalog() {
            assert!(!config.natural_key.is_empty());
            for field in config.natural_key.iter().chain(config.secondary_key) {
                assert!(config.is_declared(field), "{} / {}", config.import_type, field);
            }
        }
    }

    #[test]
    fn test_scholars_required_fields() {
        let config = ImportType::Scholars.config();
        assert_eq!(config.required_fields, &["full_name", "email", "cpf"]);
        assert!(config.is_required("cpf"));
        assert!(!config.is_required("phone"));
        assert!(config.is_declared("phone"));
        assert!(!config.is_declared("nickname"));
    }
}
