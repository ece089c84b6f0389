// ==========================================
// 贴片程序核对系统 - 贴片程序领域模型
// ==========================================
// FeederLane:        料站/料道定义（每个程序文件）
// PickAction:        吸取动作（每个程序文件）
// PlacementEvent:    动作 ⋈ 料道 后的贴装事件（程序 DETAIL 表）
// PlacementSummary:  按 (程序, 料号, 位号, 外形) 汇总（程序 SUMMARY 表）
// ProgramQuantityIndex: (程序, 料号) → 位号数
// ==========================================

use crate::domain::types::ProgramFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ==========================================
// FeederLane - 料道定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeederLane {
    pub program_name: String,
    pub machine_id: String,
    pub section: String,
    pub trolley_type: String,
    pub feeder_number: String,
    pub feeder_type: String,
    pub lane_number: String,
    pub component_id: String,
    pub shape: String,
}

/// 料道连接键: (程序, 机台, 区段, 料站, 料道)
pub type LaneKey = (String, String, String, String, String);

impl FeederLane {
    pub fn key(&self) -> LaneKey {
        (
            self.program_name.clone(),
            self.machine_id.clone(),
            self.section.clone(),
            self.feeder_number.clone(),
            self.lane_number.clone(),
        )
    }
}

// ==========================================
// PickAction - 吸取动作
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PickAction {
    pub program_name: String,
    pub machine_id: String,
    pub section: String,
    pub robot_number: String,
    pub head_number: String,
    pub designator: String,
    pub board_number: String,
    pub feeder_number: String,
    pub lane_number: String,
}

impl PickAction {
    pub fn lane_key(&self) -> LaneKey {
        (
            self.program_name.clone(),
            self.machine_id.clone(),
            self.section.clone(),
            self.feeder_number.clone(),
            self.lane_number.clone(),
        )
    }
}

// ==========================================
// BoardComponent - 板面元件清单（仅 .pp7 提供）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardComponent {
    pub program_name: String,
    pub component_id: String,
    pub designator: String,
    pub board_number: String,
}

// ==========================================
// ProgramFile - 单个程序文件解析结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ProgramFile {
    pub path: PathBuf,
    pub format: ProgramFormat,
    pub program_name: String,
    pub machine_id: String,
    pub cycle_time: Option<String>, // 秒,已插入小数点
    pub board_components: Vec<BoardComponent>,
    pub feeder_lanes: Vec<FeederLane>,
    pub picks: Vec<PickAction>,
}

// ==========================================
// PlacementEvent - 贴装事件
// ==========================================
// 不变式: 每个事件唯一对应一个 component_id + shape
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlacementEvent {
    pub program_name: String,
    pub machine_id: String,
    pub section: String,
    pub feeder_number: String,
    pub lane_number: String,
    pub robot_number: String,
    pub head_number: String,
    pub component_id: String,
    pub designator: String,
    pub board_number: String,
    pub feeder_type: String,
    pub trolley_type: String,
    pub shape: String,
}

/// 贴装事件去重键: (程序, 机台, 料号, 位号, 拼板号)
pub type PlacementKey = (String, String, String, String, String);

impl PlacementEvent {
    pub fn dedupe_key(&self) -> PlacementKey {
        (
            self.program_name.clone(),
            self.machine_id.clone(),
            self.component_id.clone(),
            self.designator.clone(),
            self.board_number.clone(),
        )
    }

    /// 贴装位置描述
    ///
    /// 例: "Board: 1, Machine: 3, Section: 1, Feeder: 12, Lane: 1, Robot: 2, Head: 1 (TAPE8, TROLLEY)"
    pub fn location(&self) -> String {
        format!(
            "Board: {}, Machine: {}, Section: {}, Feeder: {}, Lane: {}, Robot: {}, Head: {} ({}, {})",
            self.board_number,
            self.machine_id,
            self.section,
            self.feeder_number,
            self.lane_number,
            self.robot_number,
            self.head_number,
            self.feeder_type,
            self.trolley_type
        )
    }
}

// ==========================================
// PlacementSummary - 程序汇总行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlacementSummary {
    pub program_name: String,
    pub component_id: String,
    pub designator: String,
    pub shape: String,
    pub board_numbers: Vec<String>, // 已排序
    pub locations: Vec<String>,     // 已排序
}

impl PlacementSummary {
    /// 拼板号（逗号连接）
    pub fn board_text(&self) -> String {
        self.board_numbers.join(",")
    }

    /// 位置描述（换行连接）
    pub fn location_text(&self) -> String {
        self.locations.join("\n")
    }
}

// ==========================================
// ProgramQuantityIndex - 程序用量索引
// ==========================================
// (程序名, 料号) → 去重位号数;构造后只读
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramQuantityIndex {
    counts: BTreeMap<(String, String), i64>,
}

impl ProgramQuantityIndex {
    pub fn from_counts(counts: BTreeMap<(String, String), i64>) -> Self {
        Self { counts }
    }

    /// 查询用量,缺失视为 0
    pub fn quantity(&self, program: &str, component: &str) -> i64 {
        self.counts
            .get(&(program.to_string(), component.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// 两面用量之和（第二面可空）
    pub fn combined_quantity(&self, side1: &str, side2: Option<&str>, component: &str) -> i64 {
        self.quantity(side1, component) + side2.map_or(0, |p| self.quantity(p, component))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(String, String), &i64)> {
        self.counts.iter()
    }
}
