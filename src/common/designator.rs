// ==========================================
// 贴片程序核对系统 - 位号（Reference Designator）工具
// ==========================================
// 职责: 位号区间展开 / 尾号拆分 / 排序键
// 例: "R1-R3,R5" → "R1,R2,R3,R5"
// ==========================================

use crate::common::text::remove_extra_delimiter;

/// 单个区间最大展开跨度（超过视为录入错误,不展开）
const MAX_RANGE_SPAN: u64 = 10_000;

/// 展开位号区间
///
/// # 规则
/// 1. 去除全部空白,合并多余逗号
/// 2. "R1-R5" → "R1,R2,R3,R4,R5"（前缀一致,尾号递增）
/// 3. 终点省略前缀时沿用起点前缀（"R1-5"）
/// 4. 任一区间无法解析（前缀不一致/倒序/无尾号）→ 原样返回清理后的字符串,
///    调用方通过 `has_unexpanded_range` 检出残留 '-'
pub fn expand_designator_series(value: &str) -> String {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = remove_extra_delimiter(&compact, ',');

    let mut expanded = Vec::new();
    for token in cleaned.split(',').filter(|t| !t.is_empty()) {
        match token.split_once('-') {
            None => expanded.push(token.to_string()),
            Some((start, end)) => match expand_range(start, end) {
                Some(series) => expanded.extend(series),
                None => return cleaned,
            },
        }
    }

    expanded.join(",")
}

/// 是否残留未展开的区间标记
pub fn has_unexpanded_range(value: &str) -> bool {
    value.contains('-')
}

/// 拆分逗号串为位号列表（忽略空段）
pub fn split_designators(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// 拆分位号为 (字母前缀, 尾号)
///
/// 例: "R12" → ("R", 12); "L" → ("L", 0)
pub fn split_trailing_number(designator: &str) -> (String, u64) {
    match split_digits(designator) {
        Some((prefix, digits)) => (prefix.to_string(), digits.parse().unwrap_or(0)),
        None => (designator.to_string(), 0),
    }
}

/// 位号排序键: (前缀, 尾号, 原值)
pub fn designator_sort_key(designator: &str) -> (String, u64, String) {
    let (prefix, number) = split_trailing_number(designator);
    (prefix, number, designator.to_string())
}

// 拆出尾部数字段;无尾号返回 None
fn split_digits(value: &str) -> Option<(&str, &str)> {
    let prefix = value.trim_end_matches(|c: char| c.is_ascii_digit());
    if prefix.len() == value.len() {
        None
    } else {
        Some((prefix, &value[prefix.len()..]))
    }
}

fn expand_range(start: &str, end: &str) -> Option<Vec<String>> {
    let (start_prefix, start_digits) = split_digits(start)?;
    let (end_prefix, end_digits) = split_digits(end)?;
    if !end_prefix.is_empty() && end_prefix != start_prefix {
        return None;
    }

    let from: u64 = start_digits.parse().ok()?;
    let to: u64 = end_digits.parse().ok()?;
    if from > to || to - from > MAX_RANGE_SPAN {
        return None;
    }

    // 起点带前导零时保留位宽（"C01-C03" → C01,C02,C03）
    let width = if start_digits.starts_with('0') {
        start_digits.len()
    } else {
        0
    };

    Some(
        (from..=to)
            .map(|n| format!("{}{:0width$}", start_prefix, n, width = width))
            .collect(),
    )
}
