// ==========================================
// BolsaGO - CPF 标识校验与格式化
// ==========================================
// 职责: CPF 格式化 / 去格式化 / 校验位校验
// 红线: 纯函数,无副作用;校验位算法必须与已存储数据一致
// ==========================================

/// CPF 规范形式的位数
pub const CPF_LENGTH: usize = 11;

/// 格式化为展示形式 `XXX.XXX.XXX-XX`
///
/// 去除所有非数字字符,截断到 11 位后按位置插入分隔符;
/// 不足 11 位时只插入已经需要的分隔符（如 5 位 → `123.45`）。
///
/// # 示例
/// ```
/// use bolsago_import::domain::cpf;
/// assert_eq!(cpf::format("12345678901"), "123.456.789-01");
/// assert_eq!(cpf::format("12345"), "123.45");
/// ```
pub fn format(raw: &str) -> String {
    let digits: Vec<char> = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(CPF_LENGTH)
        .collect();

    let mut out = String::with_capacity(14);
    for (idx, digit) in digits.iter().enumerate() {
        match idx {
            3 | 6 => out.push('.'),
            9 => out.push('-'),
            _ => {}
        }
        out.push(*digit);
    }
    out
}

/// 去格式化: 只保留数字,长度不限
pub fn unformat(display: &str) -> String {
    display.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 是否为十个退化序列之一（全部相同数字）
pub fn is_degenerate(digits: &[u8]) -> bool {
    match digits.first() {
        Some(first) => digits.iter().all(|d| d == first),
        None => false,
    }
}

/// 根据前 9 位计算两位校验位
///
/// # 返回
/// - Some((d1, d2)): 两位校验位
/// - None: 输入不足 9 位或含非数字
pub fn check_digits(first_nine: &str) -> Option<(u8, u8)> {
    let digits = to_digits(first_nine)?;
    if digits.len() < 9 {
        return None;
    }

    let d1 = check_digit(&digits[..9], 10);
    let mut with_first = digits[..9].to_vec();
    with_first.push(d1);
    let d2 = check_digit(&with_first, 11);
    Some((d1, d2))
}

/// 校验 CPF
///
/// # 规则
/// 1. 去除非数字后长度必须为 11
/// 2. 不能是 00000000000 … 99999999999
/// 3. 两位校验位必须与加权和算法一致
pub fn is_valid(raw: &str) -> bool {
    let cleaned = unformat(raw);
    if cleaned.len() != CPF_LENGTH {
        return false;
    }

    let digits: Vec<u8> = cleaned.bytes().map(|b| b - b'0').collect();
    if is_degenerate(&digits) {
        return false;
    }

    if check_digit(&digits[..9], 10) != digits[9] {
        return false;
    }
    check_digit(&digits[..10], 11) == digits[10]
}

// 加权和: 权重从 start_weight 递减; remainder = (sum * 10) % 11, 10/11 视为 0
fn check_digit(digits: &[u8], start_weight: u32) -> u8 {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(idx, d)| u32::from(*d) * (start_weight - idx as u32))
        .sum();

    let remainder = (sum * 10) % 11;
    if remainder >= 10 {
        0
    } else {
        remainder as u8
    }
}

fn to_digits(value: &str) -> Option<Vec<u8>> {
    value
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as u8))
        .collect()
}
