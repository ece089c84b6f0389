// ==========================================
// 贴片程序核对系统 - 核对引擎
// ==========================================
// 一、数量核对
//   refdes_qty  = 位号数
//   program_qty = 用量(side1, 料号) + 用量(side2, 料号),缺失为 0
// 二、逐位号判定
//   两面都有 → BothSidesConflict
//   仅 side1 → MountedSide1(board)
//   仅 side2 → MountedSide2(board)
//   都没有   → NotFound
// ==========================================

use crate::common::designator_sort_key;
use crate::domain::checker::{
    sort_verdicts, BoardSide, CheckerRow, CheckerVerdict, BOTH_SIDES_CONFLICT_TEXT,
    NOT_FOUND_TEXT,
};
use crate::domain::mapping::BoardMapping;
use crate::domain::material::MappedMaterial;
use crate::domain::program::{PlacementSummary, ProgramQuantityIndex};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

// ==========================================
// PlacementLookup - (程序, 料号, 位号) → 汇总行
// ==========================================
// 同一位号可能因外形不同对应多条汇总行
#[derive(Debug, Default)]
pub struct PlacementLookup<'a> {
    by_key: HashMap<(String, String, String), Vec<&'a PlacementSummary>>,
}

impl<'a> PlacementLookup<'a> {
    pub fn new(summaries: &'a [PlacementSummary]) -> Self {
        let mut by_key: HashMap<(String, String, String), Vec<&'a PlacementSummary>> = HashMap::new();
        for summary in summaries {
            by_key
                .entry((
                    summary.program_name.clone(),
                    summary.component_id.clone(),
                    summary.designator.clone(),
                ))
                .or_default()
                .push(summary);
        }
        Self { by_key }
    }

    pub fn find(&self, program: &str, component: &str, designator: &str) -> &[&'a PlacementSummary] {
        self.by_key
            .get(&(program.to_string(), component.to_string(), designator.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// 单个位号的判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignatorCheck {
    pub verdicts: Vec<CheckerVerdict>,
    pub location_lines: Vec<String>,
}

/// 数量核对结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityCheck {
    pub refdes_qty: i64,
    pub program_qty: i64,
    pub sap_qty_tally: bool,
    pub program_qty_tally: bool,
}

// 输出聚合键: (映射行, 料号, 描述, 数量, refdes_qty, program_qty, 两个 tally)
type RowKey = (BoardMapping, String, String, i64, i64, i64, bool, bool);

#[derive(Debug, Default)]
struct RowAccumulator {
    designators: Vec<String>,
    verdicts: Vec<CheckerVerdict>,
    location_lines: Vec<String>,
}

// ==========================================
// Reconciler
// ==========================================
pub struct Reconciler<'a> {
    lookup: PlacementLookup<'a>,
    index: &'a ProgramQuantityIndex,
}

impl<'a> Reconciler<'a> {
    pub fn new(summaries: &'a [PlacementSummary], index: &'a ProgramQuantityIndex) -> Self {
        Self {
            lookup: PlacementLookup::new(summaries),
            index,
        }
    }

    pub fn lookup(&self) -> &PlacementLookup<'a> {
        &self.lookup
    }

    /// 两面程序用量之和
    pub fn program_qty(&self, mapping: &BoardMapping, component: &str) -> i64 {
        self.index
            .combined_quantity(&mapping.program_side1, mapping.program_side2.as_deref(), component)
    }

    /// 数量核对
    pub fn check_quantity(&self, material: &MappedMaterial) -> QuantityCheck {
        let refdes_qty = material.designator_list.len() as i64;
        let program_qty = self.program_qty(&material.mapping, &material.component_id);
        QuantityCheck {
            refdes_qty,
            program_qty,
            sap_qty_tally: material.quantity == refdes_qty,
            program_qty_tally: material.quantity == program_qty,
        }
    }

    /// 单个位号判定
    ///
    /// # 参数
    /// - extra: 多贴件（位置前缀 "Extra Mount"）
    pub fn check_designator(
        &self,
        mapping: &BoardMapping,
        component: &str,
        designator: &str,
        extra: bool,
    ) -> DesignatorCheck {
        let side1 = self.lookup.find(&mapping.program_side1, component, designator);
        let side2 = mapping
            .program_side2
            .as_deref()
            .map(|p| self.lookup.find(p, component, designator))
            .unwrap_or(&[]);

        match (side1.is_empty(), side2.is_empty()) {
            (false, false) => DesignatorCheck {
                verdicts: vec![CheckerVerdict::BothSidesConflict],
                location_lines: vec![BOTH_SIDES_CONFLICT_TEXT.to_string()],
            },
            (false, true) => mounted(BoardSide::Side1, side1, extra),
            (true, false) => mounted(BoardSide::Side2, side2, extra),
            (true, true) => DesignatorCheck {
                verdicts: vec![CheckerVerdict::NotFound],
                location_lines: vec![NOT_FOUND_TEXT.to_string()],
            },
        }
    }

    /// 核对全部物料行
    ///
    /// # 返回
    /// 按聚合键排序的核对结果行
    pub fn reconcile(&self, materials: &[MappedMaterial]) -> Vec<CheckerRow> {
        let mut groups: BTreeMap<RowKey, RowAccumulator> = BTreeMap::new();

        for material in materials {
            let qty = self.check_quantity(material);
            let key: RowKey = (
                material.mapping.clone(),
                material.component_id.clone(),
                material.component_desc.clone(),
                material.quantity,
                qty.refdes_qty,
                qty.program_qty,
                qty.sap_qty_tally,
                qty.program_qty_tally,
            );
            let acc = groups.entry(key).or_default();

            for designator in &material.designator_list {
                let check =
                    self.check_designator(&material.mapping, &material.component_id, designator, false);
                acc.designators.push(designator.clone());
                acc.verdicts.extend(check.verdicts);
                acc.location_lines.extend(check.location_lines);
            }
        }

        let rows: Vec<CheckerRow> = groups
            .into_iter()
            .map(|(key, acc)| {
                let (mapping, component_id, component_desc, quantity, refdes_qty, program_qty, sap, program) =
                    key;
                build_row(
                    mapping,
                    component_id,
                    component_desc,
                    quantity,
                    QuantityCheck {
                        refdes_qty,
                        program_qty,
                        sap_qty_tally: sap,
                        program_qty_tally: program,
                    },
                    acc,
                    false,
                )
            })
            .collect();

        let not_found = rows
            .iter()
            .filter(|r| r.verdicts.contains(&CheckerVerdict::NotFound))
            .count();
        info!(rows = rows.len(), rows_with_not_found = not_found, "核对完成");
        rows
    }
}

// 单面贴装: 每条汇总行一个判定,位置逐行加前缀
fn mounted(side: BoardSide, summaries: &[&PlacementSummary], extra: bool) -> DesignatorCheck {
    let prefix = side.mount_prefix(extra);
    let verdicts = summaries
        .iter()
        .map(|s| match side {
            BoardSide::Side1 => CheckerVerdict::MountedSide1 { board: s.board_text() },
            BoardSide::Side2 => CheckerVerdict::MountedSide2 { board: s.board_text() },
        })
        .collect();
    let location_lines = summaries
        .iter()
        .flat_map(|s| s.locations.iter().map(|l| format!("{}{}", prefix, l)))
        .collect();

    DesignatorCheck {
        verdicts,
        location_lines,
    }
}

// 聚合行收尾: 位号按 (前缀, 尾号) 排序去重,判定与位置排序去重
fn build_row(
    mapping: BoardMapping,
    component_id: String,
    component_desc: String,
    quantity: i64,
    qty: QuantityCheck,
    acc: RowAccumulator,
    extra: bool,
) -> CheckerRow {
    let RowAccumulator {
        mut designators,
        mut verdicts,
        mut location_lines,
    } = acc;

    designators.sort_by_key(|d| designator_sort_key(d));
    designators.dedup();
    sort_verdicts(&mut verdicts, extra);
    location_lines.sort();
    location_lines.dedup();

    debug!(
        bom = %mapping.bom_id,
        component = %component_id,
        designators = designators.len(),
        extra = extra,
        "核对行生成"
    );

    CheckerRow {
        mapping,
        component_id,
        component_desc,
        quantity,
        designator_list: designators,
        refdes_qty: qty.refdes_qty,
        program_qty: qty.program_qty,
        sap_qty_tally: qty.sap_qty_tally,
        program_qty_tally: qty.program_qty_tally,
        verdicts,
        location_lines,
        extra,
    }
}

/// 多贴件行构造（多贴件检测使用）
pub(crate) fn build_extra_row(
    reconciler: &Reconciler,
    mapping: BoardMapping,
    component_id: String,
    designators: Vec<String>,
) -> CheckerRow {
    let program_qty = reconciler.program_qty(&mapping, &component_id);
    let mut acc = RowAccumulator::default();
    for designator in &designators {
        let check = reconciler.check_designator(&mapping, &component_id, designator, true);
        acc.verdicts.extend(check.verdicts);
        acc.location_lines.extend(check.location_lines);
    }
    acc.designators = designators;

    build_row(
        mapping,
        component_id,
        String::new(),
        0,
        QuantityCheck {
            refdes_qty: 0,
            program_qty,
            sap_qty_tally: program_qty == 0,
            program_qty_tally: program_qty == 0,
        },
        acc,
        true,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn mapping(side2: Option<&str>) -> BoardMapping {
        BoardMapping {
            bom_id: "123".into(),
            mcto_id: "705".into(),
            variant: "1".into(),
            program_side1: "P1".into(),
            program_side2: side2.map(str::to_string),
        }
    }

    fn summary(program: &str, component: &str, designator: &str, board: &str) -> PlacementSummary {
        PlacementSummary {
            program_name: program.into(),
            component_id: component.into(),
            designator: designator.into(),
            shape: "0402".into(),
            board_numbers: vec![board.into()],
            locations: vec![format!("Board: {}, Machine: 3", board)],
        }
    }

    fn index(entries: &[(&str, &str, i64)]) -> ProgramQuantityIndex {
        let counts: BTreeMap<(String, String), i64> = entries
            .iter()
            .map(|(p, c, n)| ((p.to_string(), c.to_string()), *n))
            .collect();
        ProgramQuantityIndex::from_counts(counts)
    }

    fn material(designators: &[&str], quantity: i64, side2: Option<&str>) -> MappedMaterial {
        MappedMaterial {
            mapping: mapping(side2),
            component_id: "R1".into(),
            component_desc: "RES".into(),
            quantity,
            designator_list: designators.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn test_mounted_side1_with_matching_quantities() {
        let summaries = vec![summary("P1", "R1", "R1", "1"), summary("P1", "R1", "R2", "1")];
        let idx = index(&[("P1", "R1", 2)]);
        let reconciler = Reconciler::new(&summaries, &idx);

        let rows = reconciler.reconcile(&[material(&["R2", "R1"], 2, None)]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.refdes_qty, 2);
        assert_eq!(row.program_qty, 2);
        assert!(row.sap_qty_tally && row.program_qty_tally);
        assert_eq!(row.designator_list, vec!["R1", "R2"]);
        assert_eq!(row.checker_text(), "Mount at Side 1 on Board 1");
        assert_eq!(row.location_lines, vec!["Mount at Side 1 on Board: 1, Machine: 3"]);
    }

    #[test]
    fn test_both_sides_conflict() {
        let summaries = vec![summary("P1", "R1", "R1", "1"), summary("P2", "R1", "R1", "1")];
        let idx = index(&[("P1", "R1", 1), ("P2", "R1", 1)]);
        let reconciler = Reconciler::new(&summaries, &idx);

        let check = reconciler.check_designator(&mapping(Some("P2")), "R1", "R1", false);
        assert_eq!(check.verdicts, vec![CheckerVerdict::BothSidesConflict]);
        assert_eq!(check.location_lines, vec![BOTH_SIDES_CONFLICT_TEXT]);

        let rows = reconciler.reconcile(&[material(&["R1"], 1, Some("P2"))]);
        assert_eq!(rows[0].program_qty, 2);
        assert!(!rows[0].program_qty_tally);
    }

    #[test]
    fn test_side2_and_not_found() {
        let summaries = vec![summary("P2", "R1", "R1", "2")];
        let idx = index(&[("P2", "R1", 1)]);
        let reconciler = Reconciler::new(&summaries, &idx);

        let rows = reconciler.reconcile(&[material(&["R1", "R3"], 3, Some("P2"))]);
        let row = &rows[0];
        assert!(!row.sap_qty_tally);
        assert_eq!(row.checker_text(), "Mount at Side 2 on Board 2\nNot found");
    }

    #[test]
    fn test_verdict_order_matches_checker_text() {
        // R1 两面均贴装,R3 未找到
        let summaries = vec![summary("P1", "R1", "R1", "1"), summary("P2", "R1", "R1", "1")];
        let idx = index(&[("P1", "R1", 1), ("P2", "R1", 1)]);
        let reconciler = Reconciler::new(&summaries, &idx);

        let rows = reconciler.reconcile(&[material(&["R1", "R3"], 2, Some("P2"))]);
        let row = &rows[0];
        assert_eq!(
            row.verdicts,
            vec![CheckerVerdict::NotFound, CheckerVerdict::BothSidesConflict]
        );
        let rendered: Vec<String> = row.verdicts.iter().map(|v| v.render(false)).collect();
        assert_eq!(row.checker_text(), rendered.join("\n"));
        assert_eq!(
            row.checker_text(),
            format!("Not found\n{}", BOTH_SIDES_CONFLICT_TEXT)
        );
    }

    #[test]
    fn test_extra_row_prefix() {
        let summaries = vec![summary("P1", "R9", "R9", "1")];
        let idx = index(&[("P1", "R9", 1)]);
        let reconciler = Reconciler::new(&summaries, &idx);

        let row = build_extra_row(&reconciler, mapping(None), "R9".into(), vec!["R9".into()]);
        assert!(row.extra);
        assert_eq!(row.quantity, 0);
        assert_eq!(row.refdes_qty, 0);
        assert_eq!(row.program_qty, 1);
        assert!(!row.sap_qty_tally);
        assert!(row.checker_text().starts_with("Extra Mount at Side 1 on Board 1"));
        assert!(row.location_lines[0].starts_with("Extra Mount at Side 1 on "));
    }
}
