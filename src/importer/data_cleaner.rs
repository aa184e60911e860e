// ==========================================
// BolsaGO - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 日期解析 / 金额解析 / 整数解析
// 约定: 解析失败返回 None,由字段规则决定是否记为行错误
// ==========================================

use chrono::NaiveDate;

/// 支持的日期格式（ISO、巴西格式、紧凑格式）
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y%m%d"];

pub struct DataCleaner;

impl DataCleaner {
    /// 清洗文本字段（TRIM,可选小写）
    pub fn clean_text(&self, value: &str, lowercase: bool) -> String {
        let trimmed = value.trim();
        if lowercase {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        }
    }

    /// 标准化 NULL 值（空字符串/空白 → None）
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 解析日期（YYYY-MM-DD / DD/MM/YYYY / YYYYMMDD）
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    }

    /// 解析金额
    ///
    /// # 支持
    /// - "1500", "1500.00", "1500.5"
    /// - "1.500,00", "R$ 1.500,00"（巴西格式: '.' 为千分位, ',' 为小数点）
    /// - "1.500", "R$ 1.500", "1.234.567"（仅千分位）
    ///
    /// # 返回
    /// - None: 无法解析或有歧义（如 "R$ 1.50"、"1.50.0"）
    pub fn parse_amount(&self, value: &str) -> Option<f64> {
        let trimmed = value.trim();
        let has_currency = trimmed.starts_with("R$");
        let cleaned: String = trimmed
            .trim_start_matches("R$")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return None;
        }

        let normalized = if cleaned.contains(',') {
            cleaned.replace('.', "").replace(',', ".")
        } else if is_thousands_grouped(&cleaned) {
            cleaned.replace('.', "")
        } else if has_currency && cleaned.contains('.') {
            // 货币前缀下 '.' 只能是千分位
            return None;
        } else {
            cleaned
        };

        normalized
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
    }

    /// 金额标准化输出（两位小数）
    pub fn format_amount(&self, amount: f64) -> String {
        format!("{:.2}", amount)
    }

    /// 解析正整数
    pub fn parse_positive_int(&self, value: &str) -> Option<u32> {
        value.trim().parse::<u32>().ok().filter(|n| *n > 0)
    }

    /// 只保留数字
    pub fn digits_only(&self, value: &str) -> String {
        value.chars().filter(|c| c.is_ascii_digit()).collect()
    }
}

// 形如 "1.500" / "12.345.678": 首组 1-3 位,其后每组恰好 3 位
fn is_thousands_grouped(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut groups = digits.split('.');
    let first_ok = groups
        .next()
        .map(|g| (1..=3).contains(&g.len()) && g.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false);
    let mut rest = groups.peekable();
    first_ok
        && rest.peek().is_some()
        && rest.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}
