// ==========================================
// 贴片程序核对系统 - 内存料号重映射
// ==========================================
// 料号不含 '-' 视为内存颗粒,按描述重建 520-XXX 料号:
// 1. 描述以 MTC 开头 → 描述按 ':' 分段取倒数第二段
// 2. 否则取描述首个 '-' 段（去空白）的末 3 个字符,
//    在首个 非数字→数字 边界处拆为 head / digits:
//    - digits 非空          → 520-{digits}
//    - 描述以 MT2 开头       → 520-{head 末 2 位}
//    - 其他                 → 520-{head}
// 规则为固定业务规则,待业务方确认,不做泛化
// ==========================================

use crate::common::normalize_identifier;

pub const MEMORY_PART_PREFIX: &str = "520-";
const MTC_PREFIX: &str = "MTC";
const MT2_PREFIX: &str = "MT2";

/// 重映射结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryRemap {
    /// 料号含 '-',保持不变
    Kept(String),
    /// 重建后的料号
    Remapped(String),
    /// MTC 描述分段不足,无法重建
    Unresolved,
}

impl MemoryRemap {
    pub fn component(&self) -> Option<&str> {
        match self {
            MemoryRemap::Kept(c) | MemoryRemap::Remapped(c) => Some(c),
            MemoryRemap::Unresolved => None,
        }
    }
}

/// 按描述重映射料号
///
/// # 参数
/// - component: 已标准化料号
/// - description: 物料描述
pub fn remap_memory_component(component: &str, description: &str) -> MemoryRemap {
    if component.contains('-') {
        return MemoryRemap::Kept(component.to_string());
    }

    if description.starts_with(MTC_PREFIX) {
        let segments: Vec<&str> = description.split(':').collect();
        if segments.len() < 2 {
            return MemoryRemap::Unresolved;
        }
        return match normalize_identifier(segments[segments.len() - 2]) {
            Some(id) => MemoryRemap::Remapped(id),
            None => MemoryRemap::Unresolved,
        };
    }

    let first_segment = description.split('-').next().unwrap_or("").trim();
    let tail = last_chars(first_segment, 3);
    let (head, digits) = split_at_digit_boundary(&tail);

    let suffix = if !digits.is_empty() {
        digits
    } else if description.starts_with(MT2_PREFIX) {
        last_chars(&head, 2)
    } else {
        head
    };

    MemoryRemap::Remapped(format!("{}{}", MEMORY_PART_PREFIX, suffix))
}

fn last_chars(value: &str, count: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    chars[chars.len().saturating_sub(count)..].iter().collect()
}

/// 在首个 非数字→数字 边界处拆分;无边界时 digits 为空
///
/// 例: "G16" → ("G", "16"); "4GB" → ("4GB", "")
fn split_at_digit_boundary(value: &str) -> (String, String) {
    let chars: Vec<char> = value.chars().collect();
    let boundary = chars
        .windows(2)
        .position(|w| !w[0].is_ascii_digit() && w[1].is_ascii_digit())
        .map(|i| i + 1);

    match boundary {
        Some(at) => (
            chars[..at].iter().collect(),
            chars[at..].iter().collect(),
        ),
        None => (value.to_string(), String::new()),
    }
}
