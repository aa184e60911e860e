// ==========================================
// BolsaGO - 字段映射器实现
// ==========================================
// 阶段 1: 源表头 → 标准字段名
// 规则: 小写 + 去首尾空白 + 空格/连字符/点 → '_' + 葡语别名
// ==========================================

use crate::domain::import::{FieldMap, RawRow};
use crate::domain::types::ImportType;

/// 葡语表头别名（已标准化形式 → 标准字段名）
const COMMON_ALIASES: &[(&str, &str)] = &[
    ("nome", "full_name"),
    ("nome_completo", "full_name"),
    ("e_mail", "email"),
    ("telefone", "phone"),
    ("celular", "phone"),
    ("data_de_nascimento", "birth_date"),
    ("data_nascimento", "birth_date"),
    ("instituição", "institution"),
    ("instituicao", "institution"),
    ("nivel_academico", "academic_level"),
    ("nível_acadêmico", "academic_level"),
    ("lattes", "lattes_url"),
    ("codigo_banco", "bank_code"),
    ("código_banco", "bank_code"),
    ("banco", "bank_name"),
    ("nome_banco", "bank_name"),
    ("agencia", "agency"),
    ("agência", "agency"),
    ("conta", "account_number"),
    ("numero_conta", "account_number"),
    ("número_conta", "account_number"),
    ("tipo_conta", "account_type"),
    ("tipo_de_conta", "account_type"),
    ("chave_pix", "pix_key"),
    ("titulo", "title"),
    ("título", "title"),
    ("descricao", "description"),
    ("descrição", "description"),
    ("coordenador", "coordinator"),
    ("orcamento", "total_budget"),
    ("orçamento", "total_budget"),
    ("financiador", "sponsor"),
    ("data_inicio", "start_date"),
    ("data_início", "start_date"),
    ("data_fim", "end_date"),
    ("data_termino", "end_date"),
    ("data_término", "end_date"),
    ("codigo_projeto", "project_code"),
    ("código_projeto", "project_code"),
    ("modalidade", "modality"),
    ("valor_mensal", "monthly_amount"),
    ("parcelas", "total_installments"),
    ("observacoes", "notes"),
    ("observações", "notes"),
];

// "codigo" 在项目导入中指项目代码,在关联导入中指项目代码列
fn type_alias(import_type: ImportType, normalized: &str) -> Option<&'static str> {
    match (import_type, normalized) {
        (ImportType::Projects, "codigo" | "código") => Some("code"),
        (ImportType::Enrollments, "codigo" | "código" | "projeto") => Some("project_code"),
        _ => None,
    }
}

pub struct FieldMapper;

impl FieldMapper {
    /// 标准化表头文本
    pub fn normalize_header(header: &str) -> String {
        let lowered = header.trim().to_lowercase();
        let mut out = String::with_capacity(lowered.len());
        let mut last_underscore = false;
        for c in lowered.chars() {
            if c.is_whitespace() || c == '-' || c == '.' || c == '/' {
                if !last_underscore && !out.is_empty() {
                    out.push('_');
                    last_underscore = true;
                }
            } else {
                out.push(c);
                last_underscore = c == '_';
            }
        }
        out.trim_end_matches('_').to_string()
    }

    /// 表头 → 标准字段名（无别名时返回标准化表头本身）
    pub fn resolve_field_name(import_type: ImportType, header: &str) -> String {
        let normalized = Self::normalize_header(header);
        if let Some(field) = type_alias(import_type, &normalized) {
            return field.to_string();
        }
        COMMON_ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, field)| field.to_string())
            .unwrap_or(normalized)
    }

    /// 映射整行表头
    ///
    /// 多个源表头映射到同一字段时,按源表头字符串排序（FieldMap 的迭代顺序）
    /// 取第一个非空值;与列在文件中的位置无关
    pub fn map_row(&self, row: RawRow, import_type: ImportType) -> RawRow {
        let mut fields = FieldMap::new();
        for (header, value) in row.fields {
            let field = Self::resolve_field_name(import_type, &header);
            match fields.get(&field) {
                Some(existing) if !existing.is_empty() => {}
                _ => {
                    fields.insert(field, value);
                }
            }
        }
        RawRow::new(row.row_number, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(FieldMapper::normalize_header("  Full Name "), "full_name");
        assert_eq!(FieldMapper::normalize_header("E-mail"), "e_mail");
        assert_eq!(FieldMapper::normalize_header("Data  de Nascimento"), "data_de_nascimento");
        assert_eq!(FieldMapper::normalize_header("cpf"), "cpf");
    }

    #[test]
    fn test_resolve_aliases() {
        assert_eq!(FieldMapper::resolve_field_name(ImportType::Scholars, "Nome Completo"), "full_name");
        assert_eq!(FieldMapper::resolve_field_name(ImportType::Scholars, "E-mail"), "email");
        assert_eq!(FieldMapper::resolve_field_name(ImportType::BankAccounts, "Agência"), "agency");
        assert_eq!(FieldMapper::resolve_field_name(ImportType::Projects, "Código"), "code");
        assert_eq!(
            FieldMapper::resolve_field_name(ImportType::Enrollments, "Código"),
            "project_code"
        );
        assert_eq!(FieldMapper::resolve_field_name(ImportType::Scholars, "Apelido"), "apelido");
    }

    #[test]
    fn test_map_row() {
        let mut fields = FieldMap::new();
        fields.insert("Nome".to_string(), "Ana".to_string());
        fields.insert("CPF".to_string(), "111.444.777-35".to_string());
        let mapped = FieldMapper.map_row(RawRow::new(7, fields), ImportType::Scholars);

        assert_eq!(mapped.row_number, 7);
        assert_eq!(mapped.fields.get("full_name"), Some(&"Ana".to_string()));
        assert_eq!(mapped.fields.get("cpf"), Some(&"111.444.777-35".to_string()));
    }

    #[test]
    fn test_map_row_collision_uses_sorted_header_order() {
        // "Nome" < "Nome Completo" < "full_name"（字节序）
        let mut fields = FieldMap::new();
        fields.insert("full_name".to_string(), "Ana".to_string());
        fields.insert("Nome Completo".to_string(), "Carla".to_string());
        fields.insert("Nome".to_string(), "Bia".to_string());
        let mapped = FieldMapper.map_row(RawRow::new(1, fields), ImportType::Scholars);
        assert_eq!(mapped.fields.get("full_name"), Some(&"Bia".to_string()));
        assert_eq!(mapped.fields.len(), 1);

        // 排在前面的空值不会遮蔽后面的非空值
        let mut fields = FieldMap::new();
        fields.insert("Nome".to_string(), String::new());
        fields.insert("full_name".to_string(), "Ana".to_string());
        let mapped = FieldMapper.map_row(RawRow::new(2, fields), ImportType::Scholars);
        assert_eq!(mapped.fields.get("full_name"), Some(&"Ana".to_string()));
    }
}
