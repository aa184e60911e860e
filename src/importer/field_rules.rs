// ==========================================
// BolsaGO - 字段格式规则
// ==========================================
// 阶段 2: 按导入类型执行格式校验,并产出清洗后的字段
// 约定: 只校验出现的字段（缺失由必填检查负责）;
//       错误阻断该行,警告不影响有效性
// ==========================================

use crate::domain::cpf;
use crate::domain::import::FieldMap;
use crate::domain::types::ImportType;
use crate::i18n::t_with_args;
use crate::importer::data_cleaner::DataCleaner;
use chrono::{Datelike, NaiveDate};

/// 默认最长项目/关联期限（月）
pub const DEFAULT_MAX_DURATION_MONTHS: u32 = 72;

/// 已知账户类型（标准化后）
const ACCOUNT_TYPES: &[&str] = &["corrente", "poupanca"];

// ==========================================
// RowCheck - 单行校验累加器
// ==========================================
#[derive(Debug, Default, Clone)]
pub struct RowCheck {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub normalized: FieldMap,
}

impl RowCheck {
    pub fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    pub fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

// ==========================================
// FieldRules - 格式规则
// ==========================================
#[derive(Debug, Clone)]
pub struct FieldRules {
    max_duration_months: u32,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DURATION_MONTHS)
    }
}

impl FieldRules {
    pub fn new(max_duration_months: u32) -> Self {
        Self {
            max_duration_months,
        }
    }

    pub fn max_duration_months(&self) -> u32 {
        self.max_duration_months
    }

    /// 对已声明字段执行格式校验并写入 normalized
    ///
    /// # 参数
    /// - import_type: 导入类型
    /// - fields: 已映射表头的原始字段（只处理已声明且非空的字段）
    /// - check: 累加器
    pub fn apply(&self, import_type: ImportType, fields: &FieldMap, check: &mut RowCheck) {
        let config = import_type.config();
        let cleaner = DataCleaner;

        // 通用: 已声明字段 TRIM 后写入
        for field in config.declared_fields() {
            if let Some(value) = cleaner.normalize_null(fields.get(field).map(String::as_str)) {
                check.normalized.insert(field.to_string(), value);
            }
        }

        match import_type {
            ImportType::Scholars => self.apply_scholar_rules(check),
            ImportType::BankAccounts => self.apply_bank_account_rules(check),
            ImportType::Projects => self.apply_project_rules(check),
            ImportType::Enrollments => self.apply_enrollment_rules(check),
        }
    }

    // ===== 按类型规则 =====

    fn apply_scholar_rules(&self, check: &mut RowCheck) {
        self.check_cpf(check, "cpf");
        self.check_email(check, "email");
        self.check_single_date(check, "birth_date");
        self.check_phone(check, "phone");
    }

    fn apply_bank_account_rules(&self, check: &mut RowCheck) {
        self.check_cpf(check, "cpf");

        if let Some(code) = check.normalized.get("bank_code").cloned() {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_digit()) {
                check.error(t_with_args("validation.invalid_bank_code", &[("value", code.as_str())]));
            }
        }

        if let Some(agency) = check.normalized.get("agency").cloned() {
            if !is_branch_number(&agency, 5) {
                check.error(t_with_args("validation.invalid_agency", &[("value", agency.as_str())]));
            }
        }

        if let Some(account) = check.normalized.get("account_number").cloned() {
            if !is_branch_number(&account, 13) {
                check.error(t_with_args(
                    "validation.invalid_account_number",
                    &[("value", account.as_str())],
                ));
            }
        }

        if let Some(account_type) = check.normalized.get("account_type").cloned() {
            let normalized = account_type.to_lowercase().replace('ç', "c");
            if ACCOUNT_TYPES.contains(&normalized.as_str()) {
                check.normalized.insert("account_type".to_string(), normalized);
            } else {
                check.warning(t_with_args(
                    "validation.unknown_account_type",
                    &[("value", account_type.as_str())],
                ));
            }
        }
    }

    fn apply_project_rules(&self, check: &mut RowCheck) {
        self.uppercase(check, "code");
        self.check_date_range(check);
        self.check_amount(check, "total_budget", AmountRule::NonNegative);
    }

    fn apply_enrollment_rules(&self, check: &mut RowCheck) {
        self.check_cpf(check, "cpf");
        self.uppercase(check, "project_code");
        self.check_date_range(check);
        self.check_amount(check, "monthly_amount", AmountRule::Positive);

        if let Some(value) = check.normalized.get("total_installments").cloned() {
            match DataCleaner.parse_positive_int(&value) {
                Some(n) => {
                    check
                        .normalized
                        .insert("total_installments".to_string(), n.to_string());
                }
                None => check.error(t_with_args(
                    "validation.invalid_integer",
                    &[("field", "total_installments"), ("value", value.as_str())],
                )),
            }
        }
    }

    // ===== 字段级规则 =====

    fn check_cpf(&self, check: &mut RowCheck, field: &str) {
        let Some(value) = check.normalized.get(field).cloned() else {
            return;
        };
        if cpf::is_valid(&value) {
            check.normalized.insert(field.to_string(), cpf::unformat(&value));
        } else {
            check.error(t_with_args(
                "validation.invalid_cpf",
                &[("field", field), ("value", value.as_str())],
            ));
        }
    }

    fn check_email(&self, check: &mut RowCheck, field: &str) {
        let Some(value) = check.normalized.get(field).cloned() else {
            return;
        };
        if is_plausible_email(&value) {
            let cleaned = DataCleaner.clean_text(&value, true);
            check.normalized.insert(field.to_string(), cleaned);
        } else {
            check.error(t_with_args("validation.invalid_email", &[("value", value.as_str())]));
        }
    }

    fn check_phone(&self, check: &mut RowCheck, field: &str) {
        let Some(value) = check.normalized.get(field).cloned() else {
            return;
        };
        let digits = DataCleaner.digits_only(&value);
        if digits.len() == 10 || digits.len() == 11 {
            check.normalized.insert(field.to_string(), digits);
        } else {
            check.warning(t_with_args("validation.suspicious_phone", &[("value", value.as_str())]));
        }
    }

    /// 解析单个日期字段;成功时写回 ISO 格式
    fn check_single_date(&self, check: &mut RowCheck, field: &str) -> Option<NaiveDate> {
        let value = check.normalized.get(field).cloned()?;
        match DataCleaner.parse_date(&value) {
            Some(date) => {
                check
                    .normalized
                    .insert(field.to_string(), date.format("%Y-%m-%d").to_string());
                Some(date)
            }
            None => {
                check.error(t_with_args(
                    "validation.invalid_date",
                    &[("field", field), ("value", value.as_str())],
                ));
                None
            }
        }
    }

    /// start_date / end_date: 各自可解析,且 end >= start;超长期限仅警告
    fn check_date_range(&self, check: &mut RowCheck) {
        let start = self.check_single_date(check, "start_date");
        let end = self.check_single_date(check, "end_date");

        let (Some(start), Some(end)) = (start, end) else {
            return;
        };

        if end < start {
            check.error(t_with_args(
                "validation.date_range",
                &[
                    ("start", start.format("%Y-%m-%d").to_string().as_str()),
                    ("end", end.format("%Y-%m-%d").to_string().as_str()),
                ],
            ));
            return;
        }

        let months = months_between(start, end);
        if months > self.max_duration_months {
            check.warning(t_with_args(
                "validation.duration_exceeded",
                &[
                    ("months", months.to_string().as_str()),
                    ("max", self.max_duration_months.to_string().as_str()),
                ],
            ));
        }
    }

    fn check_amount(&self, check: &mut RowCheck, field: &str, rule: AmountRule) {
        let Some(value) = check.normalized.get(field).cloned() else {
            return;
        };
        let cleaner = DataCleaner;
        let Some(amount) = cleaner.parse_amount(&value) else {
            check.error(t_with_args(
                "validation.invalid_amount",
                &[("field", field), ("value", value.as_str())],
            ));
            return;
        };

        match rule {
            AmountRule::Positive if amount <= 0.0 => check.error(t_with_args(
                "validation.non_positive_amount",
                &[("field", field), ("value", value.as_str())],
            )),
            AmountRule::NonNegative if amount < 0.0 => check.error(t_with_args(
                "validation.negative_amount",
                &[("field", field), ("value", value.as_str())],
            )),
            _ => {
                check
                    .normalized
                    .insert(field.to_string(), cleaner.format_amount(amount));
            }
        }
    }

    fn uppercase(&self, check: &mut RowCheck, field: &str) {
        if let Some(value) = check.normalized.get_mut(field) {
            *value = value.to_uppercase();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum AmountRule {
    Positive,
    NonNegative,
}

// 本地部分非空、域名含点、只有一个 '@'、无空白
fn is_plausible_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

// 数字主体（最多 max_digits 位）+ 可选 "-校验位"（数字或 X）
fn is_branch_number(value: &str, max_digits: usize) -> bool {
    let (body, check_digit) = match value.split_once('-') {
        Some((body, digit)) => (body, Some(digit)),
        None => (value, None),
    };
    let body_ok = !body.is_empty()
        && body.len() <= max_digits
        && body.chars().all(|c| c.is_ascii_digit());
    let digit_ok = match check_digit {
        Some(d) => d.len() == 1 && d.chars().all(|c| c.is_ascii_digit() || c == 'x' || c == 'X'),
        None => true,
    };
    body_ok && digit_ok
}

// 整月数（不足一月的部分不计）
fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if end.day() < start.day() {
        months -= 1;
    }
    months.max(0) as u32
}
