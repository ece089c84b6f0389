// ==========================================
// 贴片程序核对系统 - 文本工具
// ==========================================
// 职责: 标识符标准化 / 分隔串清理 / 分隔串去重
// ==========================================

use std::collections::HashSet;

/// 标准化标识符: TRIM + UPPER + 去前导零
///
/// # 返回
/// - None: 结果为空串或 "NAN"
pub fn normalize_identifier(value: &str) -> Option<String> {
    let upper = value.trim().to_uppercase();
    let stripped = upper.trim_start_matches('0').trim();
    if stripped.is_empty() || stripped == "NAN" {
        None
    } else {
        Some(stripped.to_string())
    }
}

/// 清理多余分隔符（连续分隔符合并、首尾分隔符去除、各段去空白）
///
/// 例: ",R1,,R2 ,," → "R1,R2"
pub fn remove_extra_delimiter(value: &str, delimiter: char) -> String {
    value
        .split(delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

/// 分隔串去重（保留首次出现顺序）
///
/// 例: ("R1,R2,R1", ",") → "R1,R2"
pub fn dedupe_delimited(value: &str, delimiter: &str) -> String {
    let mut seen = HashSet::new();
    value
        .split(delimiter)
        .filter(|token| seen.insert(*token))
        .collect::<Vec<_>>()
        .join(delimiter)
}
