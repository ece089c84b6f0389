// ==========================================
// 贴片程序核对系统 - 多贴件检测
// ==========================================
// 汇总行 → 程序作为 side1 或 side2 出现的映射行
// 与期望位号表按 (映射行, 料号, 位号) 反连接,剩余即多贴件
// 多贴件: quantity = 0, refdes_qty = 0, 描述为空, 判定前缀 "Extra Mount"
// ==========================================

use crate::common::designator_sort_key;
use crate::domain::checker::CheckerRow;
use crate::domain::mapping::{BoardMapping, BoardMappingTable};
use crate::domain::material::{ExpandedMaterial, ExpectedKey};
use crate::domain::program::PlacementSummary;
use crate::engine::reconciliation::{build_extra_row, Reconciler};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// 多贴件候选: (映射行, 料号, 位号)
pub fn find_extra_placements(
    mapping: &BoardMappingTable,
    summaries: &[PlacementSummary],
    expected: &[ExpandedMaterial],
) -> Vec<ExpectedKey> {
    let expected: HashSet<ExpectedKey> = expected.iter().map(ExpandedMaterial::key).collect();

    let mut extras: Vec<ExpectedKey> = summaries
        .iter()
        .flat_map(|s| {
            mapping
                .rows()
                .iter()
                .filter(move |m| m.is_side1(&s.program_name) || m.is_side2(&s.program_name))
                .map(move |m| (m.clone(), s.component_id.clone(), s.designator.clone()))
        })
        .filter(|key| !expected.contains(key))
        .collect();

    extras.sort();
    extras.dedup();
    extras
}

/// 生成多贴件核对行（每个 映射行 + 料号 一行）
pub fn detect_extra_parts(
    reconciler: &Reconciler,
    mapping: &BoardMappingTable,
    summaries: &[PlacementSummary],
    expected: &[ExpandedMaterial],
) -> Vec<CheckerRow> {
    let extras = find_extra_placements(mapping, summaries, expected);

    let mut groups: BTreeMap<(BoardMapping, String), Vec<String>> = BTreeMap::new();
    for (m, component, designator) in extras {
        groups.entry((m, component)).or_default().push(designator);
    }

    let rows: Vec<CheckerRow> = groups
        .into_iter()
        .map(|((m, component), mut designators)| {
            designators.sort_by_key(|d| designator_sort_key(d));
            build_extra_row(reconciler, m, component, designators)
        })
        .collect();

    if rows.is_empty() {
        info!("无多贴件");
    } else {
        info!(rows = rows.len(), "检出多贴件");
    }
    rows
}
