// ==========================================
// 贴片程序核对系统 - 板/程序映射模型
// ==========================================
// 来源: CHECKER 表（BOM, MCTO, PV, PNP_PROGRAM_SIDE1, PNP_PROGRAM_SIDE2）
// 生命周期: 每次运行加载一次,之后只读
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// MaterialScope - 物料范围键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialScope {
    pub bom_id: String,
    pub mcto_id: String,
    pub variant: String,
}

// ==========================================
// BoardMapping - 映射行
// ==========================================
// program_side2 可为空（单面板）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoardMapping {
    pub bom_id: String,
    pub mcto_id: String,
    pub variant: String,
    pub program_side1: String,
    pub program_side2: Option<String>,
}

impl BoardMapping {
    pub fn scope(&self) -> MaterialScope {
        MaterialScope {
            bom_id: self.bom_id.clone(),
            mcto_id: self.mcto_id.clone(),
            variant: self.variant.clone(),
        }
    }

    /// 程序是否为本映射的第一面
    pub fn is_side1(&self, program: &str) -> bool {
        self.program_side1 == program
    }

    /// 程序是否为本映射的第二面
    pub fn is_side2(&self, program: &str) -> bool {
        self.program_side2.as_deref() == Some(program)
    }
}

// ==========================================
// BoardMappingTable - 映射表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BoardMappingTable {
    rows: Vec<BoardMapping>,
}

impl BoardMappingTable {
    /// 构造映射表（按首次出现去重）
    pub fn new(rows: Vec<BoardMapping>) -> Self {
        let mut unique: Vec<BoardMapping> = Vec::with_capacity(rows.len());
        for row in rows {
            if !unique.contains(&row) {
                unique.push(row);
            }
        }
        Self { rows: unique }
    }

    pub fn rows(&self) -> &[BoardMapping] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 去重后的物料范围（BOM, MCTO, PV）
    pub fn scopes(&self) -> Vec<MaterialScope> {
        let mut scopes: Vec<MaterialScope> = self.rows.iter().map(BoardMapping::scope).collect();
        scopes.sort();
        scopes.dedup();
        scopes
    }

    /// 某范围下的全部映射行
    pub fn for_scope<'a>(&'a self, scope: &'a MaterialScope) -> impl Iterator<Item = &'a BoardMapping> {
        self.rows.iter().filter(move |m| {
            m.bom_id == scope.bom_id && m.mcto_id == scope.mcto_id && m.variant == scope.variant
        })
    }

    pub fn selected_boms(&self) -> Vec<String> {
        sorted_unique(self.rows.iter().map(|m| m.bom_id.clone()))
    }

    pub fn selected_mctos(&self) -> Vec<String> {
        sorted_unique(self.rows.iter().map(|m| m.mcto_id.clone()))
    }

    /// 第一面 ∪ 第二面程序名
    pub fn selected_programs(&self) -> Vec<String> {
        sorted_unique(self.rows.iter().flat_map(|m| {
            std::iter::once(m.program_side1.clone()).chain(m.program_side2.clone())
        }))
    }
}

fn sorted_unique(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut values: Vec<String> = values.collect();
    values.sort();
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(bom: &str, side1: &str, side2: Option<&str>) -> BoardMapping {
        BoardMapping {
            bom_id: bom.to_string(),
            mcto_id: "705043".to_string(),
            variant: "1".to_string(),
            program_side1: side1.to_string(),
            program_side2: side2.map(str::to_string),
        }
    }

    #[test]
    fn test_table_dedupes_keeping_first() {
        let table = BoardMappingTable::new(vec![
            mapping("590-1", "P1", Some("P2")),
            mapping("590-1", "P1", Some("P2")),
            mapping("590-2", "P3", None),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].program_side1, "P1");
    }

    #[test]
    fn test_selected_programs_skips_missing_side2() {
        let table = BoardMappingTable::new(vec![
            mapping("590-1", "P1", Some("P2")),
            mapping("590-2", "P3", None),
        ]);
        assert_eq!(table.selected_programs(), vec!["P1", "P2", "P3"]);
        assert_eq!(table.scopes().len(), 2);
    }
}
