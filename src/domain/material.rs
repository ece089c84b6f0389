// ==========================================
// 贴片程序核对系统 - 物料领域模型
// ==========================================
// MaterialRow:         导入层输出（BOM 行 / MCTO 行）
// ScopedMaterial:      范围关联输出（挂上 BOM/MCTO/PV 范围）
// MappedMaterial:      重映射输出（料号重映射 + 挂上两面程序）
// ExpandedMaterial:    展开输出（一位号一行）
// ==========================================

use crate::domain::mapping::{BoardMapping, MaterialScope};
use crate::domain::types::MaterialGroup;
use serde::{Deserialize, Serialize};

// ==========================================
// MaterialRow - BOM/MCTO 行
// ==========================================
// 不变式: quantity >= 0; designator_list 去重、大写、非空
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialRow {
    pub bom_id: Option<String>,  // BOM 行必填
    pub mcto_id: Option<String>, // MCTO 行必填
    pub variant: Option<String>, // MCTO 行必填（PV）
    pub component_id: String,
    pub component_desc: String,
    pub quantity: i64,
    pub designator_list: Vec<String>,
}

// ==========================================
// ScopedMaterial - 范围关联输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedMaterial {
    pub scope: MaterialScope,
    pub group: MaterialGroup,
    pub component_id: String,
    pub component_desc: String,
    pub quantity: i64,
    pub designator_list: Vec<String>,
}

// ==========================================
// MappedMaterial - 重映射输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MappedMaterial {
    pub mapping: BoardMapping,
    pub component_id: String,
    pub component_desc: String,
    pub quantity: i64,
    pub designator_list: Vec<String>,
}

// ==========================================
// ExpandedMaterial - 展开输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpandedMaterial {
    pub mapping: BoardMapping,
    pub component_id: String,
    pub component_desc: String,
    pub quantity: i64,
    pub designator: String,
}

/// 期望位号键: (映射行, 料号, 位号)
pub type ExpectedKey = (BoardMapping, String, String);

impl ExpandedMaterial {
    pub fn key(&self) -> ExpectedKey {
        (
            self.mapping.clone(),
            self.component_id.clone(),
            self.designator.clone(),
        )
    }
}
