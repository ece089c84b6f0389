// ==========================================
// 贴片程序核对系统 - 料号排除规则
// ==========================================
// 不参与贴装核对的料号:
// - 前缀 590/550/540/542/561/562/ECN（半成品、包材、ECN 记录）
// - BOM 中前缀 511 且描述含 "TH AE"/"THAE" 的插件料
// ==========================================

use crate::domain::types::MaterialGroup;

pub const DEFAULT_EXCLUDED_PREFIXES: [&str; 7] = ["590", "550", "540", "542", "561", "562", "ECN"];
pub const THROUGH_HOLE_PREFIX: &str = "511";
pub const THROUGH_HOLE_MARKERS: [&str; 2] = ["TH AE", "THAE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRules {
    pub excluded_prefixes: Vec<String>,
    pub through_hole_prefix: String,
    pub through_hole_markers: Vec<String>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES.iter().map(|p| p.to_string()).collect(),
            through_hole_prefix: THROUGH_HOLE_PREFIX.to_string(),
            through_hole_markers: THROUGH_HOLE_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl ExclusionRules {
    /// 料号是否排除
    ///
    /// # 参数
    /// - group: 物料分组（插件料规则仅作用于 BOM）
    /// - component: 已标准化料号
    /// - desc: 料号描述
    pub fn is_excluded(&self, group: MaterialGroup, component: &str, desc: &str) -> bool {
        if self
            .excluded_prefixes
            .iter()
            .any(|p| component.starts_with(p.as_str()))
        {
            return true;
        }

        group == MaterialGroup::Bom
            && component.starts_with(self.through_hole_prefix.as_str())
            && self
                .through_hole_markers
                .iter()
                .any(|m| desc.contains(m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_exclusion() {
        let rules = ExclusionRules::default();
        assert!(rules.is_excluded(MaterialGroup::Bom, "590-12345", ""));
        assert!(rules.is_excluded(MaterialGroup::Mcto, "ECN123", ""));
        assert!(!rules.is_excluded(MaterialGroup::Bom, "520-00042", "DRAM"));
    }

    #[test]
    fn test_through_hole_only_for_bom() {
        let rules = ExclusionRules::default();
        assert!(rules.is_excluded(MaterialGroup::Bom, "511-001", "CONN TH AE 2P"));
        assert!(rules.is_excluded(MaterialGroup::Bom, "511-001", "CONN THAE"));
        assert!(!rules.is_excluded(MaterialGroup::Mcto, "511-001", "CONN TH AE 2P"));
        assert!(!rules.is_excluded(MaterialGroup::Bom, "511-001", "CONN SMD"));
    }
}
