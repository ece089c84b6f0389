// ==========================================
// 贴片程序核对系统 - 贴片程序规整
// ==========================================
// 输入: 各程序文件的料道定义 + 吸取动作
// 输出:
// - DETAIL:  动作 ⋈ 料道（程序, 机台, 区段, 料站, 料道）,
//            按 (程序, 机台, 料号, 位号, 拼板号) 去重保留最后一条并排序
// - SUMMARY: 按 (程序, 料号, 位号, 外形) 汇总拼板号与位置
// - ProgramQuantityIndex: (程序, 料号) → 去重位号数
// ==========================================

use crate::common::designator_sort_key;
use crate::domain::program::{
    FeederLane, LaneKey, PlacementEvent, PlacementKey, PlacementSummary, ProgramFile,
    ProgramQuantityIndex,
};
use crate::engine::error::{CheckerError, CheckerResult};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

/// 程序规整结果
#[derive(Debug, Clone, Default)]
pub struct ProgramTables {
    pub detail: Vec<PlacementEvent>,
    pub summary: Vec<PlacementSummary>,
    pub quantity_index: ProgramQuantityIndex,
}

// ==========================================
// ProgramNormalizer
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramNormalizer;

impl ProgramNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 规整全部程序文件
    ///
    /// # 返回
    /// - Err(Integrity): 同一料道键存在冲突定义
    pub fn normalize(&self, files: &[ProgramFile]) -> CheckerResult<ProgramTables> {
        let detail = self.join_events(files)?;
        self.log_unpicked_components(files, &detail);

        let summary = self.summarize(&detail);
        let quantity_index = self.quantity_index(&detail);

        info!(
            files = files.len(),
            events = detail.len(),
            summary_rows = summary.len(),
            index_entries = quantity_index.len(),
            "贴片程序规整完成"
        );

        Ok(ProgramTables {
            detail,
            summary,
            quantity_index,
        })
    }

    /// 动作 ⋈ 料道,去重保留最后一条,按去重键排序
    pub fn join_events(&self, files: &[ProgramFile]) -> CheckerResult<Vec<PlacementEvent>> {
        let lanes = self.index_lanes(files)?;

        let mut events: BTreeMap<PlacementKey, PlacementEvent> = BTreeMap::new();
        let mut unmatched = 0usize;

        for pick in files.iter().flat_map(|f| f.picks.iter()) {
            let Some(lane) = lanes.get(&pick.lane_key()) else {
                unmatched += 1;
                debug!(
                    program = %pick.program_name,
                    designator = %pick.designator,
                    section = %pick.section,
                    feeder = %pick.feeder_number,
                    lane = %pick.lane_number,
                    "吸取动作无对应料道"
                );
                continue;
            };

            let event = PlacementEvent {
                program_name: pick.program_name.clone(),
                machine_id: pick.machine_id.clone(),
                section: pick.section.clone(),
                feeder_number: pick.feeder_number.clone(),
                lane_number: pick.lane_number.clone(),
                robot_number: pick.robot_number.clone(),
                head_number: pick.head_number.clone(),
                component_id: lane.component_id.clone(),
                designator: pick.designator.clone(),
                board_number: pick.board_number.clone(),
                feeder_type: lane.feeder_type.clone(),
                trolley_type: lane.trolley_type.clone(),
                shape: lane.shape.clone(),
            };
            events.insert(event.dedupe_key(), event);
        }

        if unmatched > 0 {
            warn!(unmatched = unmatched, "部分吸取动作未匹配到料道,已忽略");
        }

        Ok(events.into_values().collect())
    }

    // 料道键 → 料道定义;完全相同的重复定义合并,不同定义为完整性失败
    fn index_lanes<'a>(&self, files: &'a [ProgramFile]) -> CheckerResult<HashMap<LaneKey, &'a FeederLane>> {
        let mut lanes: HashMap<LaneKey, &FeederLane> = HashMap::new();
        for lane in files.iter().flat_map(|f| f.feeder_lanes.iter()) {
            match lanes.get(&lane.key()) {
                Some(existing) if *existing != lane => {
                    return Err(CheckerError::integrity(format!(
                        "料道定义冲突: program={}, machine={}, section={}, feeder={}, lane={} ({} / {})",
                        lane.program_name,
                        lane.machine_id,
                        lane.section,
                        lane.feeder_number,
                        lane.lane_number,
                        existing.component_id,
                        lane.component_id
                    )));
                }
                Some(_) => {}
                None => {
                    lanes.insert(lane.key(), lane);
                }
            }
        }
        Ok(lanes)
    }

    /// 按 (程序, 料号, 位号, 外形) 汇总
    pub fn summarize(&self, detail: &[PlacementEvent]) -> Vec<PlacementSummary> {
        let mut groups: BTreeMap<(String, String, String, String), (Vec<String>, Vec<String>)> =
            BTreeMap::new();

        for event in detail {
            let entry = groups
                .entry((
                    event.program_name.clone(),
                    event.component_id.clone(),
                    event.designator.clone(),
                    event.shape.clone(),
                ))
                .or_default();
            entry.0.push(event.board_number.clone());
            entry.1.push(event.location());
        }

        groups
            .into_iter()
            .map(|((program_name, component_id, designator, shape), (mut boards, mut locations))| {
                boards.sort_by_key(|b| designator_sort_key(b));
                boards.dedup();
                locations.sort();
                locations.dedup();
                PlacementSummary {
                    program_name,
                    component_id,
                    designator,
                    shape,
                    board_numbers: boards,
                    locations,
                }
            })
            .collect()
    }

    /// 用量索引: (程序, 料号) → 去重位号数
    pub fn quantity_index(&self, detail: &[PlacementEvent]) -> ProgramQuantityIndex {
        let mut designators: BTreeMap<(String, String), BTreeSet<&str>> = BTreeMap::new();
        for event in detail {
            designators
                .entry((event.program_name.clone(), event.component_id.clone()))
                .or_default()
                .insert(event.designator.as_str());
        }

        ProgramQuantityIndex::from_counts(
            designators
                .into_iter()
                .map(|(key, set)| (key, set.len() as i64))
                .collect(),
        )
    }

    // .pp7 板面清单中有但未被吸取的元件
    fn log_unpicked_components(&self, files: &[ProgramFile], detail: &[PlacementEvent]) {
        let placed: HashSet<(&str, &str, &str)> = detail
            .iter()
            .map(|e| (e.program_name.as_str(), e.component_id.as_str(), e.designator.as_str()))
            .collect();

        for file in files {
            let unpicked: Vec<String> = file
                .board_components
                .iter()
                .filter(|c| {
                    !placed.contains(&(
                        c.program_name.as_str(),
                        c.component_id.as_str(),
                        c.designator.as_str(),
                    ))
                })
                .map(|c| format!("{}:{}", c.component_id, c.designator))
                .collect();

            if !unpicked.is_empty() {
                warn!(
                    program = %file.program_name,
                    count = unpicked.len(),
                    components = ?unpicked,
                    "板面元件未被吸取"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::program::{BoardComponent, PickAction};
    use crate::domain::types::ProgramFormat;
    use std::path::PathBuf;

    fn lane(feeder: &str, component: &str, shape: &str) -> FeederLane {
        FeederLane {
            program_name: "P1".into(),
            machine_id: "3".into(),
            section: "1".into(),
            trolley_type: "T".into(),
            feeder_number: feeder.into(),
            feeder_type: "TAPE8".into(),
            lane_number: "1".into(),
            component_id: component.into(),
            shape: shape.into(),
        }
    }

    fn pick(feeder: &str, designator: &str, board: &str, head: &str) -> PickAction {
        PickAction {
            program_name: "P1".into(),
            machine_id: "3".into(),
            section: "1".into(),
            robot_number: "1".into(),
            head_number: head.into(),
            designator: designator.into(),
            board_number: board.into(),
            feeder_number: feeder.into(),
            lane_number: "1".into(),
        }
    }

    fn file(lanes: Vec<FeederLane>, picks: Vec<PickAction>) -> ProgramFile {
        ProgramFile {
            path: PathBuf::from("P1.pp7"),
            format: ProgramFormat::Pp7V1,
            program_name: "P1".into(),
            machine_id: "3".into(),
            cycle_time: None,
            board_components: vec![BoardComponent {
                program_name: "P1".into(),
                component_id: "C9".into(),
                designator: "C9".into(),
                board_number: "1".into(),
            }],
            feeder_lanes: lanes,
            picks,
        }
    }

    #[test]
    fn test_join_dedupes_keeping_last_and_drops_unmatched() {
        let files = vec![file(
            vec![lane("10", "R1", "0402")],
            vec![
                pick("10", "R1", "1", "1"),
                pick("10", "R1", "1", "2"),
                pick("10", "R2", "1", "1"),
                pick("99", "R3", "1", "1"),
            ],
        )];

        let detail = ProgramNormalizer.join_events(&files).unwrap();
        assert_eq!(detail.len(), 2);
        assert_eq!(detail[0].designator, "R1");
        assert_eq!(detail[0].head_number, "2");
        assert_eq!(detail[1].designator, "R2");
    }

    #[test]
    fn test_conflicting_lanes_is_integrity_failure() {
        let files = vec![
            file(vec![lane("10", "R1", "0402")], vec![]),
            file(vec![lane("10", "R7", "0402")], vec![]),
        ];
        let err = ProgramNormalizer.join_events(&files).unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn test_identical_lanes_collapse() {
        let files = vec![
            file(vec![lane("10", "R1", "0402")], vec![pick("10", "R1", "1", "1")]),
            file(vec![lane("10", "R1", "0402")], vec![]),
        ];
        assert_eq!(ProgramNormalizer.join_events(&files).unwrap().len(), 1);
    }

    #[test]
    fn test_summary_and_quantity_index() {
        let files = vec![file(
            vec![lane("10", "R1", "0402")],
            vec![
                pick("10", "R1", "2", "1"),
                pick("10", "R1", "10", "1"),
                pick("10", "R1", "1", "1"),
                pick("10", "R2", "1", "1"),
            ],
        )];

        let tables = ProgramNormalizer.normalize(&files).unwrap();
        assert_eq!(tables.detail.len(), 4);
        assert_eq!(tables.summary.len(), 2);
        assert_eq!(tables.summary[0].board_numbers, vec!["1", "2", "10"]);
        assert_eq!(tables.summary[0].locations.len(), 3);
        assert_eq!(tables.quantity_index.quantity("P1", "R1"), 2);
        assert_eq!(tables.quantity_index.quantity("P1", "R9"), 0);
    }

    #[test]
    fn test_quantity_index_is_idempotent() {
        let files = vec![file(
            vec![lane("10", "R1", "0402")],
            vec![pick("10", "R1", "1", "1"), pick("10", "R2", "1", "1")],
        )];
        let detail = ProgramNormalizer.join_events(&files).unwrap();
        let doubled: Vec<PlacementEvent> = detail.iter().chain(detail.iter()).cloned().collect();

        assert_eq!(
            ProgramNormalizer.quantity_index(&detail),
            ProgramNormalizer.quantity_index(&doubled)
        );
    }
}
