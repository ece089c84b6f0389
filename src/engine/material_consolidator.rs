// ==========================================
// 贴片程序核对系统 - 物料合并
// ==========================================
// 1. BOM 行 ⋈ 映射范围（bom_id）,MCTO 行 ⋈ 映射范围（mcto_id, PV）
// 2. 内存料号重映射,再 ⋈ 映射行挂上两面程序
// 3. 按位号展开为一位号一行
// ==========================================

use crate::domain::mapping::{BoardMappingTable, MaterialScope};
use crate::domain::material::{ExpandedMaterial, MappedMaterial, MaterialRow, ScopedMaterial};
use crate::domain::types::MaterialGroup;
use crate::engine::error::{CheckerError, CheckerResult};
use crate::engine::memory_part::{remap_memory_component, MemoryRemap};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// 物料合并结果
#[derive(Debug, Clone, Default)]
pub struct ConsolidatedMaterials {
    /// 位号列表形式（输出聚合用）
    pub mapped: Vec<MappedMaterial>,
    /// 一位号一行（逐位号比对用）
    pub expanded: Vec<ExpandedMaterial>,
}

// ==========================================
// MaterialConsolidator
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialConsolidator;

impl MaterialConsolidator {
    pub fn new() -> Self {
        Self
    }

    /// 范围关联 → 料号重映射 → 位号展开
    ///
    /// # 返回
    /// - Err(Integrity): BOM 或 MCTO 与映射范围无交集
    pub fn consolidate(
        &self,
        mapping: &BoardMappingTable,
        bom_rows: &[MaterialRow],
        mcto_rows: &[MaterialRow],
    ) -> CheckerResult<ConsolidatedMaterials> {
        let scoped = self.scope_materials(mapping, bom_rows, mcto_rows)?;
        let mapped = self.attach_programs(mapping, self.remap_memory_parts(scoped));
        let expanded = self.expand_designators(&mapped);

        info!(
            mapped = mapped.len(),
            expanded = expanded.len(),
            "物料合并完成"
        );
        Ok(ConsolidatedMaterials { mapped, expanded })
    }

    /// 物料行挂上映射范围
    pub fn scope_materials(
        &self,
        mapping: &BoardMappingTable,
        bom_rows: &[MaterialRow],
        mcto_rows: &[MaterialRow],
    ) -> CheckerResult<Vec<ScopedMaterial>> {
        let scopes = mapping.scopes();

        let bom = join_scopes(&scopes, bom_rows, MaterialGroup::Bom, |scope, row| {
            row.bom_id.as_deref() == Some(scope.bom_id.as_str())
        });
        if bom.is_empty() {
            return Err(CheckerError::integrity(
                "BOM 行与映射表无交集（BOM 号不匹配）",
            ));
        }

        let mcto = join_scopes(&scopes, mcto_rows, MaterialGroup::Mcto, |scope, row| {
            row.mcto_id.as_deref() == Some(scope.mcto_id.as_str())
                && row.variant.as_deref() == Some(scope.variant.as_str())
        });
        if mcto.is_empty() {
            return Err(CheckerError::integrity(
                "MCTO 行与映射表无交集（MCTO 号/PV 不匹配）",
            ));
        }

        info!(bom = bom.len(), mcto = mcto.len(), "物料范围关联完成");
        Ok(bom.into_iter().chain(mcto).collect())
    }

    /// 内存料号重映射
    ///
    /// MTC 描述无法解析的行告警丢弃
    pub fn remap_memory_parts(&self, rows: Vec<ScopedMaterial>) -> Vec<ScopedMaterial> {
        let mut remapped = 0usize;
        let mut result = Vec::with_capacity(rows.len());

        for mut row in rows {
            match remap_memory_component(&row.component_id, &row.component_desc) {
                MemoryRemap::Kept(_) => {}
                MemoryRemap::Remapped(component) => {
                    debug!(from = %row.component_id, to = %component, "内存料号重映射");
                    row.component_id = component;
                    remapped += 1;
                }
                MemoryRemap::Unresolved => {
                    warn!(
                        component = %row.component_id,
                        desc = %row.component_desc,
                        "MTC 描述无法解析内存料号,已丢弃"
                    );
                    continue;
                }
            }
            result.push(row);
        }

        info!(rows = result.len(), remapped = remapped, "内存料号重映射完成");
        result
    }

    /// 按范围挂上映射行的两面程序,去重并排序
    pub fn attach_programs(&self, mapping: &BoardMappingTable, rows: Vec<ScopedMaterial>) -> Vec<MappedMaterial> {
        let mut mapped: Vec<MappedMaterial> = rows
            .iter()
            .flat_map(|row| {
                mapping.for_scope(&row.scope).map(move |m| MappedMaterial {
                    mapping: m.clone(),
                    component_id: row.component_id.clone(),
                    component_desc: row.component_desc.clone(),
                    quantity: row.quantity,
                    designator_list: row.designator_list.clone(),
                })
            })
            .collect();

        mapped.sort();
        mapped.dedup();
        mapped
    }

    /// 一位号一行
    pub fn expand_designators(&self, mapped: &[MappedMaterial]) -> Vec<ExpandedMaterial> {
        mapped
            .iter()
            .flat_map(|m| {
                m.designator_list.iter().map(move |d| ExpandedMaterial {
                    mapping: m.mapping.clone(),
                    component_id: m.component_id.clone(),
                    component_desc: m.component_desc.clone(),
                    quantity: m.quantity,
                    designator: d.clone(),
                })
            })
            .collect()
    }
}

// 物料行 ⋈ 范围（去重,保留首次出现顺序）
fn join_scopes<F>(
    scopes: &[MaterialScope],
    rows: &[MaterialRow],
    group: MaterialGroup,
    matches: F,
) -> Vec<ScopedMaterial>
where
    F: Fn(&MaterialScope, &MaterialRow) -> bool,
{
    let mut seen = HashSet::new();
    let mut joined = Vec::new();

    for scope in scopes {
        for row in rows.iter().filter(|r| matches(scope, *r)) {
            let scoped = ScopedMaterial {
                scope: scope.clone(),
                group,
                component_id: row.component_id.clone(),
                component_desc: row.component_desc.clone(),
                quantity: row.quantity,
                designator_list: row.designator_list.clone(),
            };
            if seen.insert(scoped.clone()) {
                joined.push(scoped);
            }
        }
    }

    debug!(group = %group, rows = rows.len(), joined = joined.len(), "范围关联");
    joined
}
