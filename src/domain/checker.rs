// ==========================================
// 贴片程序核对系统 - 核对结果模型
// ==========================================
// CheckerVerdict: 单个位号的判定（带标签枚举）
// CheckerRow:     一行核对结果（范围 + 料号 聚合后）
// CheckerRecord:  SCRIPT_OUTPUT 输出行（列名固定）
// ==========================================

use crate::domain::mapping::BoardMapping;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SCRIPT_OUTPUT 列顺序
pub const CHECKER_COLUMNS: [&str; 15] = [
    "BOM",
    "MCTO",
    "PV",
    "PNP_PROGRAM_SIDE1",
    "PNP_PROGRAM_SIDE2",
    "COMPONENT",
    "COMPDESC",
    "QUANTITY",
    "DESIGNATOR",
    "REFDES_QTY",
    "PROGRAM_QTY",
    "SAP_QTY_TALLY?",
    "PROGRAM_QTY_TALLY?",
    "CHECKER",
    "LOCATION",
];

pub const BOTH_SIDES_CONFLICT_TEXT: &str = "Something wrong, both side mounting the same designator";
pub const BOTH_SIDES_EXTRA_CONFLICT_TEXT: &str =
    "Something wrong, both side extra mounting the same designator";
pub const NOT_FOUND_TEXT: &str = "Not found";

// ==========================================
// BoardSide - 板面
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BoardSide {
    Side1,
    Side2,
}

impl BoardSide {
    /// 贴装前缀,例: "Mount at Side 1 on " / "Extra Mount at Side 2 on "
    pub fn mount_prefix(&self, extra: bool) -> String {
        let lead = if extra { "Extra Mount" } else { "Mount" };
        format!("{} at {} on ", lead, self)
    }
}

impl fmt::Display for BoardSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardSide::Side1 => write!(f, "Side 1"),
            BoardSide::Side2 => write!(f, "Side 2"),
        }
    }
}

// ==========================================
// CheckerVerdict - 位号判定
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CheckerVerdict {
    MountedSide1 { board: String },
    MountedSide2 { board: String },
    BothSidesConflict,
    NotFound,
}

impl CheckerVerdict {
    /// 渲染判定文本
    ///
    /// # 参数
    /// - extra: 是否多贴件（文本前缀 "Extra Mount"）
    pub fn render(&self, extra: bool) -> String {
        match self {
            CheckerVerdict::MountedSide1 { board } => {
                format!("{}Board {}", BoardSide::Side1.mount_prefix(extra), board)
            }
            CheckerVerdict::MountedSide2 { board } => {
                format!("{}Board {}", BoardSide::Side2.mount_prefix(extra), board)
            }
            CheckerVerdict::BothSidesConflict if extra => BOTH_SIDES_EXTRA_CONFLICT_TEXT.to_string(),
            CheckerVerdict::BothSidesConflict => BOTH_SIDES_CONFLICT_TEXT.to_string(),
            CheckerVerdict::NotFound => NOT_FOUND_TEXT.to_string(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        matches!(
            self,
            CheckerVerdict::MountedSide1 { .. } | CheckerVerdict::MountedSide2 { .. }
        )
    }
}

/// 判定排序去重（按 CHECKER 文本字典序,与输出文本一致）
pub fn sort_verdicts(verdicts: &mut Vec<CheckerVerdict>, extra: bool) {
    verdicts.sort_by_cached_key(|v| v.render(extra));
    verdicts.dedup();
}

// ==========================================
// CheckerRow - 核对结果行
// ==========================================
// 每个 (映射行, 料号, 描述, 数量) 一行;verdicts/location_lines 已排序去重
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerRow {
    pub mapping: BoardMapping,
    pub component_id: String,
    pub component_desc: String,
    pub quantity: i64,
    pub designator_list: Vec<String>,
    pub refdes_qty: i64,
    pub program_qty: i64,
    pub sap_qty_tally: bool,
    pub program_qty_tally: bool,
    pub verdicts: Vec<CheckerVerdict>,
    pub location_lines: Vec<String>,
    pub extra: bool, // 多贴件行
}

impl CheckerRow {
    /// CHECKER 列文本（每行一条判定）
    pub fn checker_text(&self) -> String {
        self.verdicts
            .iter()
            .map(|v| v.render(self.extra))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn location_text(&self) -> String {
        self.location_lines.join("\n")
    }

    pub fn to_record(&self) -> CheckerRecord {
        CheckerRecord {
            bom: self.mapping.bom_id.clone(),
            mcto: self.mapping.mcto_id.clone(),
            pv: self.mapping.variant.clone(),
            program_side1: self.mapping.program_side1.clone(),
            program_side2: self.mapping.program_side2.clone().unwrap_or_default(),
            component: self.component_id.clone(),
            component_desc: self.component_desc.clone(),
            quantity: self.quantity,
            designator: self.designator_list.join(","),
            refdes_qty: self.refdes_qty,
            program_qty: self.program_qty,
            sap_qty_tally: yes_no(self.sap_qty_tally).to_string(),
            program_qty_tally: yes_no(self.program_qty_tally).to_string(),
            checker: self.checker_text(),
            location: self.location_text(),
        }
    }
}

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

// ==========================================
// CheckerRecord - 输出行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerRecord {
    #[serde(rename = "BOM")]
    pub bom: String,
    #[serde(rename = "MCTO")]
    pub mcto: String,
    #[serde(rename = "PV")]
    pub pv: String,
    #[serde(rename = "PNP_PROGRAM_SIDE1")]
    pub program_side1: String,
    #[serde(rename = "PNP_PROGRAM_SIDE2")]
    pub program_side2: String,
    #[serde(rename = "COMPONENT")]
    pub component: String,
    #[serde(rename = "COMPDESC")]
    pub component_desc: String,
    #[serde(rename = "QUANTITY")]
    pub quantity: i64,
    #[serde(rename = "DESIGNATOR")]
    pub designator: String,
    #[serde(rename = "REFDES_QTY")]
    pub refdes_qty: i64,
    #[serde(rename = "PROGRAM_QTY")]
    pub program_qty: i64,
    #[serde(rename = "SAP_QTY_TALLY?")]
    pub sap_qty_tally: String,
    #[serde(rename = "PROGRAM_QTY_TALLY?")]
    pub program_qty_tally: String,
    #[serde(rename = "CHECKER")]
    pub checker: String,
    #[serde(rename = "LOCATION")]
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_render_regular_and_extra() {
        let verdict = CheckerVerdict::MountedSide1 {
            board: "1,2".to_string(),
        };
        assert_eq!(verdict.render(false), "Mount at Side 1 on Board 1,2");
        assert_eq!(verdict.render(true), "Extra Mount at Side 1 on Board 1,2");

        let verdict = CheckerVerdict::MountedSide2 {
            board: "3".to_string(),
        };
        assert_eq!(verdict.render(false), "Mount at Side 2 on Board 3");
    }

    #[test]
    fn test_verdict_render_conflict_and_not_found() {
        assert_eq!(
            CheckerVerdict::BothSidesConflict.render(false),
            BOTH_SIDES_CONFLICT_TEXT
        );
        assert_eq!(
            CheckerVerdict::BothSidesConflict.render(true),
            BOTH_SIDES_EXTRA_CONFLICT_TEXT
        );
        assert_eq!(CheckerVerdict::NotFound.render(true), "Not found");
        assert!(!CheckerVerdict::NotFound.is_mounted());
    }

    #[test]
    fn test_sorted_verdicts_match_checker_text() {
        let mut verdicts = vec![
            CheckerVerdict::BothSidesConflict,
            CheckerVerdict::NotFound,
            CheckerVerdict::MountedSide1 {
                board: "1".to_string(),
            },
            CheckerVerdict::NotFound,
        ];
        sort_verdicts(&mut verdicts, false);
        assert_eq!(
            verdicts,
            vec![
                CheckerVerdict::MountedSide1 {
                    board: "1".to_string(),
                },
                CheckerVerdict::NotFound,
                CheckerVerdict::BothSidesConflict,
            ]
        );

        let row = CheckerRow {
            mapping: BoardMapping {
                bom_id: "590-1".to_string(),
                mcto_id: "705043".to_string(),
                variant: "1".to_string(),
                program_side1: "P1".to_string(),
                program_side2: None,
            },
            component_id: "R1".to_string(),
            component_desc: "RES".to_string(),
            quantity: 2,
            designator_list: vec!["R1".to_string(), "R2".to_string()],
            refdes_qty: 2,
            program_qty: 1,
            sap_qty_tally: true,
            program_qty_tally: false,
            verdicts,
            location_lines: vec![],
            extra: false,
        };
        assert_eq!(
            row.checker_text(),
            format!("Mount at Side 1 on Board 1\nNot found\n{}", BOTH_SIDES_CONFLICT_TEXT)
        );

        let record = row.to_record();
        assert_eq!(record.program_side2, "");
        assert_eq!(record.sap_qty_tally, "Yes");
        assert_eq!(record.program_qty_tally, "No");
        assert_eq!(record.designator, "R1,R2");
    }
}
