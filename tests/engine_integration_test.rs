// ==========================================
// 引擎间集成测试
// ==========================================
// 职责: 验证 ProgramNormalizer → MaterialConsolidator → Reconciler → 多贴件检测 的数据流转
// 场景: 内存构造程序与物料,不涉及文件 I/O
// ==========================================

use pnp_program_checker::common::{
    designator_sort_key, expand_designator_series, split_trailing_number,
};
use pnp_program_checker::domain::{
    BoardMapping, BoardMappingTable, CheckerVerdict, FeederLane, MaterialRow, PickAction,
    ProgramFile,
};
use pnp_program_checker::engine::{
    detect_extra_parts, find_extra_placements, MaterialConsolidator, ProgramNormalizer, Reconciler,
};
use pnp_program_checker::ProgramFormat;
use std::collections::HashSet;
use std::path::PathBuf;

// ==========================================
// 测试辅助函数
// ==========================================

fn mapping(bom: &str, side1: &str, side2: Option<&str>) -> BoardMapping {
    BoardMapping {
        bom_id: bom.to_string(),
        mcto_id: "705043".to_string(),
        variant: "1".to_string(),
        program_side1: side1.to_string(),
        program_side2: side2.map(str::to_string),
    }
}

fn bom_row(bom: &str, component: &str, desc: &str, qty: i64, designators: &[&str]) -> MaterialRow {
    MaterialRow {
        bom_id: Some(bom.to_string()),
        mcto_id: None,
        variant: None,
        component_id: component.to_string(),
        component_desc: desc.to_string(),
        quantity: qty,
        designator_list: designators.iter().map(|d| d.to_string()).collect(),
    }
}

fn mcto_row(component: &str, qty: i64, designators: &[&str]) -> MaterialRow {
    MaterialRow {
        bom_id: None,
        mcto_id: Some("705043".to_string()),
        variant: Some("1".to_string()),
        component_id: component.to_string(),
        component_desc: "IC".to_string(),
        quantity: qty,
        designator_list: designators.iter().map(|d| d.to_string()).collect(),
    }
}

/// 构造程序: 每个 (料号, 位号) 独占一个料道
fn program(name: &str, placements: &[(&str, &str)]) -> ProgramFile {
    let mut file = ProgramFile {
        path: PathBuf::from(format!("{}.pp7", name)),
        format: ProgramFormat::Pp7V1,
        program_name: name.to_string(),
        machine_id: "3".to_string(),
        cycle_time: None,
        board_components: Vec::new(),
        feeder_lanes: Vec::new(),
        picks: Vec::new(),
    };

    for (idx, (component, designator)) in placements.iter().enumerate() {
        let feeder = (idx + 1).to_string();
        file.feeder_lanes.push(FeederLane {
            program_name: name.to_string(),
            machine_id: "3".to_string(),
            section: "1".to_string(),
            trolley_type: "TROLLEY16".to_string(),
            feeder_number: feeder.clone(),
            feeder_type: "TAPE8".to_string(),
            lane_number: "1".to_string(),
            component_id: component.to_string(),
            shape: "0402".to_string(),
        });
        file.picks.push(PickAction {
            program_name: name.to_string(),
            machine_id: "3".to_string(),
            section: "1".to_string(),
            robot_number: "1".to_string(),
            head_number: "1".to_string(),
            designator: designator.to_string(),
            board_number: "1".to_string(),
            feeder_number: feeder,
            lane_number: "1".to_string(),
        });
    }
    file
}

// ==========================================
// 场景测试
// ==========================================

#[test]
fn test_matching_program_and_bom_tally() {
    let table = BoardMappingTable::new(vec![mapping("123", "P1", None)]);
    let files = vec![program("P1", &[("130-R1", "R1"), ("130-R1", "R2"), ("100-U1", "U1")])];

    let tables = ProgramNormalizer::new().normalize(&files).unwrap();
    let materials = MaterialConsolidator::new()
        .consolidate(
            &table,
            &[bom_row("123", "130-R1", "RES", 2, &["R1", "R2"])],
            &[mcto_row("100-U1", 1, &["U1"])],
        )
        .unwrap();

    let reconciler = Reconciler::new(&tables.summary, &tables.quantity_index);
    let rows = reconciler.reconcile(&materials.mapped);
    assert_eq!(rows.len(), 2);

    let r1 = rows.iter().find(|r| r.component_id == "130-R1").unwrap();
    assert_eq!(r1.designator_list, vec!["R1", "R2"]);
    assert_eq!(r1.refdes_qty, 2);
    assert_eq!(r1.program_qty, 2);
    assert!(r1.sap_qty_tally);
    assert!(r1.program_qty_tally);
    assert_eq!(
        r1.verdicts,
        vec![CheckerVerdict::MountedSide1 {
            board: "1".to_string()
        }]
    );

    let extras = detect_extra_parts(&reconciler, &table, &tables.summary, &materials.expanded);
    assert!(extras.is_empty());
}

#[test]
fn test_unlisted_placement_becomes_extra_row() {
    let table = BoardMappingTable::new(vec![mapping("123", "P1", None)]);
    let files = vec![program(
        "P1",
        &[("130-R1", "R1"), ("130-R1", "R2"), ("100-U1", "U1"), ("130-R1", "R9")],
    )];

    let tables = ProgramNormalizer::new().normalize(&files).unwrap();
    let materials = MaterialConsolidator::new()
        .consolidate(
            &table,
            &[bom_row("123", "130-R1", "RES", 2, &["R1", "R2"])],
            &[mcto_row("100-U1", 1, &["U1"])],
        )
        .unwrap();
    let reconciler = Reconciler::new(&tables.summary, &tables.quantity_index);

    // R9 计入程序用量,导致数量不符
    let rows = reconciler.reconcile(&materials.mapped);
    let r1 = rows.iter().find(|r| r.component_id == "130-R1").unwrap();
    assert_eq!(r1.program_qty, 3);
    assert!(!r1.program_qty_tally);

    let extras = detect_extra_parts(&reconciler, &table, &tables.summary, &materials.expanded);
    assert_eq!(extras.len(), 1);
    let extra = &extras[0];
    assert!(extra.extra);
    assert_eq!(extra.quantity, 0);
    assert_eq!(extra.refdes_qty, 0);
    assert_eq!(extra.component_desc, "");
    assert_eq!(extra.designator_list, vec!["R9"]);
    assert_eq!(extra.checker_text(), "Extra Mount at Side 1 on Board 1");
}

#[test]
fn test_memory_part_remap_matches_program_component() {
    let table = BoardMappingTable::new(vec![mapping("123", "P1", None)]);
    let files = vec![program("P1", &[("520-0021", "U5"), ("100-U1", "U1")])];

    let tables = ProgramNormalizer::new().normalize(&files).unwrap();
    let materials = MaterialConsolidator::new()
        .consolidate(
            &table,
            &[bom_row("123", "MT40A512", "MTC:DDR4:520-0021:8GB", 1, &["U5"])],
            &[mcto_row("100-U1", 1, &["U1"])],
        )
        .unwrap();

    let reconciler = Reconciler::new(&tables.summary, &tables.quantity_index);
    let rows = reconciler.reconcile(&materials.mapped);
    let memory = rows.iter().find(|r| r.component_id == "520-0021").unwrap();
    assert!(memory.verdicts.iter().all(CheckerVerdict::is_mounted));

    let extras = detect_extra_parts(&reconciler, &table, &tables.summary, &materials.expanded);
    assert!(extras.is_empty());
}

#[test]
fn test_extra_placements_are_exact_complement() {
    // 两个映射行共用 P1: 同一贴装相对不同 BOM 分别判定
    let table = BoardMappingTable::new(vec![
        mapping("123", "P1", Some("P2")),
        mapping("456", "P1", None),
    ]);
    let files = vec![
        program("P1", &[("130-R1", "R1"), ("130-R1", "R2"), ("100-U1", "U1")]),
        program("P2", &[("140-C1", "C1")]),
    ];
    let tables = ProgramNormalizer::new().normalize(&files).unwrap();
    let materials = MaterialConsolidator::new()
        .consolidate(
            &table,
            &[
                bom_row("123", "130-R1", "RES", 2, &["R1", "R2"]),
                bom_row("456", "130-R1", "RES", 1, &["R1"]),
            ],
            &[mcto_row("100-U1", 1, &["U1"])],
        )
        .unwrap();

    let extras = find_extra_placements(&table, &tables.summary, &materials.expanded);
    let expected: HashSet<_> = materials.expanded.iter().map(|m| m.key()).collect();

    // 多贴件与期望位号无交集
    assert!(extras.iter().all(|key| !expected.contains(key)));

    // 多贴件 ∪ (期望 ∩ 程序) = 程序覆盖的全部 (映射行, 料号, 位号)
    let mut placed: HashSet<_> = HashSet::new();
    for summary in &tables.summary {
        for m in table.rows() {
            if m.is_side1(&summary.program_name) || m.is_side2(&summary.program_name) {
                placed.insert((m.clone(), summary.component_id.clone(), summary.designator.clone()));
            }
        }
    }
    let mut union: HashSet<_> = extras.iter().cloned().collect();
    union.extend(placed.iter().filter(|k| expected.contains(*k)).cloned());
    assert_eq!(union, placed);

    let extra_designators: Vec<(String, String)> = extras
        .iter()
        .map(|(m, _, d)| (m.bom_id.clone(), d.clone()))
        .collect();
    assert_eq!(
        extra_designators,
        vec![
            ("123".to_string(), "C1".to_string()),
            ("456".to_string(), "R2".to_string()),
        ]
    );
}

#[test]
fn test_both_sides_conflict_verdict() {
    let table = BoardMappingTable::new(vec![mapping("123", "P1", Some("P2"))]);
    let files = vec![
        program("P1", &[("130-R1", "R1"), ("100-U1", "U1")]),
        program("P2", &[("130-R1", "R1")]),
    ];
    let tables = ProgramNormalizer::new().normalize(&files).unwrap();
    let reconciler = Reconciler::new(&tables.summary, &tables.quantity_index);

    let check = reconciler.check_designator(&table.rows()[0], "130-R1", "R1", false);
    assert_eq!(check.verdicts, vec![CheckerVerdict::BothSidesConflict]);
    assert_eq!(
        check.location_lines,
        vec!["Something wrong, both side mounting the same designator".to_string()]
    );

    let check = reconciler.check_designator(&table.rows()[0], "100-U1", "U1", false);
    assert!(check.location_lines[0].starts_with("Mount at Side 1 on Board: 1"));

    let check = reconciler.check_designator(&table.rows()[0], "100-U1", "U9", false);
    assert_eq!(check.verdicts, vec![CheckerVerdict::NotFound]);
}

#[test]
fn test_normalize_is_idempotent_over_duplicate_files() {
    let file = program("P1", &[("130-R1", "R1"), ("130-R1", "R2")]);
    let normalizer = ProgramNormalizer::new();

    let once = normalizer.normalize(&[file.clone()]).unwrap();
    let twice = normalizer.normalize(&[file.clone(), file]).unwrap();
    assert_eq!(once.detail, twice.detail);
    assert_eq!(once.summary, twice.summary);
    assert_eq!(once.quantity_index, twice.quantity_index);
}

// ==========================================
// 位号工具
// ==========================================

#[test]
fn test_designator_expansion_and_ordering() {
    assert_eq!(expand_designator_series("R1-R3,R5"), "R1,R2,R3,R5");
    assert_eq!(expand_designator_series(" C1 - 3 ,, C7 "), "C1,C2,C3,C7");
    // 无法展开的区间原样保留 '-'
    assert!(expand_designator_series("R1-R3A").contains('-'));

    let (prefix, number) = split_trailing_number("R12");
    assert_eq!((prefix.as_str(), number), ("R", 12));
    let (prefix, number) = split_trailing_number("L");
    assert_eq!((prefix.as_str(), number), ("L", 0));

    let mut designators = vec!["R10", "C2", "R2", "R1"];
    designators.sort_by_key(|d| designator_sort_key(d));
    assert_eq!(designators, vec!["C2", "R1", "R2", "R10"]);
}
