// ==========================================
// 贴片程序核对系统 - 贴片程序解析器
// ==========================================
// .pp7 (http://api.assembleon.com/pp7/v1)
//   General@cycleTime, 机台固定为 3
//   Board@id → 程序名; Board/Component(partNumber, refDes, circuitNumber)
//   FeedSection(number, type)/Feeder(slotNumber, type)/FeederLane(number, partNumber, shapeId)
//   Pick(feedSectionNumber, robotNumber, headNumber, refDes, circuitNumber,
//        feederSlotNumber, feederLaneNumber)
// .pp  (http://api.assembleon.com/pp/v2)
//   General@positionInLine → 机台, General@cycleTime
//   Section(number)/Trolley(type)/Feeder(number, type)/Lane(number, partNumber, shapeId)
//   Actions(robotNumber)/Index/Pick(refDes, circuitNumber, feederNumber, laneNumber)
//   每个 Actions 为一个 robot,每区段 4 个 robot,每 robot 1 个 head
// ==========================================

use crate::common::normalize_identifier;
use crate::domain::program::{BoardComponent, FeederLane, PickAction, ProgramFile};
use crate::domain::types::ProgramFormat;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_scanner::program_format;
use futures::future::join_all;
use roxmltree::{Document, Node, ParsingOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// .pp7 机台号
pub const PP7_MACHINE_ID: &str = "3";
/// .pp 每区段 robot 数
pub const ROBOTS_PER_SECTION: usize = 4;
/// .pp 每 robot head 号
pub const PP_HEAD_NUMBER: &str = "1";

// ==========================================
// ProgramParser
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramParser;

impl ProgramParser {
    /// 解析单个程序文件（按扩展名识别格式）
    pub fn parse_file(&self, path: &Path) -> ImportResult<ProgramFile> {
        let format = program_format(path)
            .ok_or_else(|| ImportError::UnsupportedFormat(path.display().to_string()))?;
        let text = std::fs::read_to_string(path)?;

        self.parse_str(&text, format, path).map_err(|e| match e {
            ImportError::ProgramParseError { message, .. } => ImportError::ProgramParseError {
                file: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// 解析程序 XML 文本
    pub fn parse_str(&self, text: &str, format: ProgramFormat, path: &Path) -> ImportResult<ProgramFile> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(text.trim_start_matches('\u{feff}'), options)?;
        let ns = format.namespace();

        let general = find_element(&doc, ns, "General");
        let cycle_time = general
            .and_then(|g| g.attribute("cycleTime"))
            .map(insert_cycle_time_point);

        let machine_id = match format {
            ProgramFormat::Pp7V1 => PP7_MACHINE_ID.to_string(),
            ProgramFormat::PpV2 => general
                .and_then(|g| g.attribute("positionInLine"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| parse_error("缺少 General@positionInLine"))?,
        };

        // 多个 Board 时以最后一个为准
        let program_name = elements(&doc, ns, "Board")
            .filter_map(|b| b.attribute("id").and_then(normalize_identifier))
            .last()
            .ok_or_else(|| parse_error("缺少 Board@id"))?;

        let mut file = ProgramFile {
            path: path.to_path_buf(),
            format,
            program_name,
            machine_id,
            cycle_time,
            board_components: Vec::new(),
            feeder_lanes: Vec::new(),
            picks: Vec::new(),
        };

        match format {
            ProgramFormat::Pp7V1 => self.parse_pp7(&doc, &mut file),
            ProgramFormat::PpV2 => self.parse_pp(&doc, &mut file),
        }

        debug!(
            program = %file.program_name,
            machine = %file.machine_id,
            format = %format,
            lanes = file.feeder_lanes.len(),
            picks = file.picks.len(),
            "程序文件解析完成"
        );
        Ok(file)
    }

    fn parse_pp7(&self, doc: &Document, file: &mut ProgramFile) {
        let ns = ProgramFormat::Pp7V1.namespace();

        for board in elements(doc, ns, "Board") {
            for component in descendants(board, ns, "Component") {
                let (Some(part), Some(designator)) = (
                    component.attribute("partNumber").and_then(normalize_identifier),
                    component.attribute("refDes").and_then(normalize_identifier),
                ) else {
                    continue;
                };
                file.board_components.push(BoardComponent {
                    program_name: file.program_name.clone(),
                    component_id: part,
                    designator,
                    board_number: attr(component, "circuitNumber"),
                });
            }
        }

        let mut skipped_lanes = 0usize;
        for section in elements(doc, ns, "FeedSection") {
            let section_number = attr(section, "number");
            let trolley_type = attr(section, "type");
            for feeder in descendants(section, ns, "Feeder") {
                let feeder_number = attr(feeder, "slotNumber");
                let feeder_type = attr(feeder, "type");
                for lane in descendants(feeder, ns, "FeederLane") {
                    match build_lane(file, &section_number, &trolley_type, &feeder_number, &feeder_type, lane) {
                        Some(l) => file.feeder_lanes.push(l),
                        None => skipped_lanes += 1,
                    }
                }
            }
        }

        let mut skipped_picks = 0usize;
        for pick in elements(doc, ns, "Pick") {
            let action = required(pick, "feedSectionNumber").and_then(|section| {
                Some(PickAction {
                    program_name: file.program_name.clone(),
                    machine_id: file.machine_id.clone(),
                    section,
                    robot_number: required(pick, "robotNumber")?,
                    head_number: required(pick, "headNumber")?,
                    designator: pick.attribute("refDes").and_then(normalize_identifier)?,
                    board_number: required(pick, "circuitNumber")?,
                    feeder_number: required(pick, "feederSlotNumber")?,
                    lane_number: required(pick, "feederLaneNumber")?,
                })
            });
            match action {
                Some(a) => file.picks.push(a),
                None => skipped_picks += 1,
            }
        }

        warn_skipped(file, skipped_lanes, skipped_picks);
    }

    fn parse_pp(&self, doc: &Document, file: &mut ProgramFile) {
        let ns = ProgramFormat::PpV2.namespace();

        let mut skipped_lanes = 0usize;
        for section in elements(doc, ns, "Section") {
            let section_number = attr(section, "number");
            for trolley in descendants(section, ns, "Trolley") {
                let trolley_type = attr(trolley, "type");
                for feeder in descendants(trolley, ns, "Feeder") {
                    let feeder_number = attr(feeder, "number");
                    let feeder_type = attr(feeder, "type");
                    for lane in descendants(feeder, ns, "Lane") {
                        match build_lane(file, &section_number, &trolley_type, &feeder_number, &feeder_type, lane) {
                            Some(l) => file.feeder_lanes.push(l),
                            None => skipped_lanes += 1,
                        }
                    }
                }
            }
        }

        // 区段号: 先取当前值,每满 ROBOTS_PER_SECTION 个 Actions 递增
        let mut skipped_picks = 0usize;
        let mut section_number = 1usize;
        for (idx, actions) in elements(doc, ns, "Actions").enumerate() {
            let section = section_number.to_string();
            if (idx + 1) % ROBOTS_PER_SECTION == 0 {
                section_number += 1;
            }
            let robot_number = attr(actions, "robotNumber");

            for index in descendants(actions, ns, "Index") {
                for pick in descendants(index, ns, "Pick") {
                    let action = pick.attribute("refDes").and_then(normalize_identifier).and_then(|designator| {
                        Some(PickAction {
                            program_name: file.program_name.clone(),
                            machine_id: file.machine_id.clone(),
                            section: section.clone(),
                            robot_number: robot_number.clone(),
                            head_number: PP_HEAD_NUMBER.to_string(),
                            designator,
                            board_number: required(pick, "circuitNumber")?,
                            feeder_number: required(pick, "feederNumber")?,
                            lane_number: required(pick, "laneNumber")?,
                        })
                    });
                    match action {
                        Some(a) => file.picks.push(a),
                        None => skipped_picks += 1,
                    }
                }
            }
        }

        warn_skipped(file, skipped_lanes, skipped_picks);
    }
}

/// 并发解析程序文件（blocking 线程池）,解析失败的文件告警跳过
///
/// # 返回
/// - 按输入路径顺序排列的解析结果
pub async fn parse_program_files(paths: Vec<PathBuf>) -> ImportResult<Vec<ProgramFile>> {
    let tasks = paths.into_iter().map(|path| {
        tokio::task::spawn_blocking(move || {
            let result = ProgramParser.parse_file(&path);
            (path, result)
        })
    });

    let mut files = Vec::new();
    for joined in join_all(tasks).await {
        let (path, result) = joined?;
        match result {
            Ok(file) => {
                info!(file = %path.display(), program = %file.program_name, "程序文件读取完成");
                files.push(file);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "程序文件解析失败,已跳过");
            }
        }
    }
    Ok(files)
}

/// cycleTime 在末 3 位前插入小数点（毫秒 → 秒）
///
/// 例: "12345" → "12.345"; "45" → ".45"
pub fn insert_cycle_time_point(raw: &str) -> String {
    let raw = raw.trim();
    let chars: Vec<char> = raw.chars().collect();
    let split = chars.len().saturating_sub(3);
    let head: String = chars[..split].iter().collect();
    let tail: String = chars[split..].iter().collect();
    format!("{}.{}", head, tail)
}

fn parse_error(message: &str) -> ImportError {
    ImportError::ProgramParseError {
        file: String::new(),
        message: message.to_string(),
    }
}

// 元素名匹配: 本地名一致,命名空间为指定值或缺省
fn is_element(node: &Node, ns: &str, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace().map_or(true, |n| n == ns)
}

fn elements<'a, 'input>(
    doc: &'a Document<'input>,
    ns: &'a str,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    doc.descendants().filter(move |n| is_element(n, ns, name))
}

fn descendants<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    ns: &'a str,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.descendants().filter(move |n| is_element(n, ns, name))
}

fn find_element<'a, 'input>(doc: &'a Document<'input>, ns: &'a str, name: &'a str) -> Option<Node<'a, 'input>> {
    elements(doc, ns, name).last()
}

// 可选属性,缺省为空串
fn attr(node: Node, name: &str) -> String {
    node.attribute(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

// 必填属性,缺失或空白为 None
fn required(node: Node, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn build_lane(
    file: &ProgramFile,
    section: &str,
    trolley_type: &str,
    feeder_number: &str,
    feeder_type: &str,
    lane: Node,
) -> Option<FeederLane> {
    if section.is_empty() || feeder_number.is_empty() {
        return None;
    }
    Some(FeederLane {
        program_name: file.program_name.clone(),
        machine_id: file.machine_id.clone(),
        section: section.to_string(),
        trolley_type: trolley_type.to_string(),
        feeder_number: feeder_number.to_string(),
        feeder_type: feeder_type.to_string(),
        lane_number: required(lane, "number")?,
        component_id: lane.attribute("partNumber").and_then(normalize_identifier)?,
        shape: attr(lane, "shapeId"),
    })
}

fn warn_skipped(file: &ProgramFile, skipped_lanes: usize, skipped_picks: usize) {
    if skipped_lanes > 0 || skipped_picks > 0 {
        warn!(
            program = %file.program_name,
            file = %file.path.display(),
            skipped_lanes = skipped_lanes,
            skipped_picks = skipped_picks,
            "料道/吸取动作缺少必填属性,已跳过"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PP7: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Program xmlns="http://api.assembleon.com/pp7/v1">
  <General cycleTime="23456"/>
  <Board id="p1-top">
    <Component partNumber="R1" refDes="R1" circuitNumber="1"/>
    <Component partNumber="R1" refDes="R2" circuitNumber="1"/>
  </Board>
  <FeedSection number="1" type="TROLLEY16">
    <Feeder slotNumber="12" type="TAPE8">
      <FeederLane number="1" partNumber="R1" shapeId="0402"/>
      <FeederLane number="2" shapeId="0402"/>
    </Feeder>
  </FeedSection>
  <Pick feedSectionNumber="1" robotNumber="2" headNumber="1" refDes="R1" circuitNumber="1" feederSlotNumber="12" feederLaneNumber="1"/>
  <Pick feedSectionNumber="1" robotNumber="2" headNumber="2" refDes="R2" circuitNumber="1" feederSlotNumber="12" feederLaneNumber="1"/>
  <Pick feedSectionNumber="1" robotNumber="2" headNumber="2" circuitNumber="1" feederSlotNumber="12" feederLaneNumber="1"/>
</Program>"#;

    fn pp_v2(actions: usize) -> String {
        let mut xml = String::from(
            r#"<Program xmlns="http://api.assembleon.com/pp/v2">
  <General positionInLine="2" cycleTime="9000"/>
  <Board id="P2-BOT"/>
  <Section number="1"><Trolley type="T1"><Feeder number="5" type="TAPE12">
    <Lane number="1" partNumber="C1" shapeId="0603"/>
  </Feeder></Trolley></Section>
"#,
        );
        for robot in 1..=actions {
            xml.push_str(&format!(
                r#"  <Actions robotNumber="{0}"><Index><Pick refDes="C{0}" circuitNumber="1" feederNumber="5" laneNumber="1"/></Index></Actions>
"#,
                robot
            ));
        }
        xml.push_str("</Program>");
        xml
    }

    #[test]
    fn test_parse_pp7() {
        let file = ProgramParser
            .parse_str(PP7, ProgramFormat::Pp7V1, Path::new("P1-TOP.pp7"))
            .unwrap();

        assert_eq!(file.program_name, "P1-TOP");
        assert_eq!(file.machine_id, "3");
        assert_eq!(file.cycle_time.as_deref(), Some("23.456"));
        assert_eq!(file.board_components.len(), 2);
        // 缺 partNumber 的料道被跳过
        assert_eq!(file.feeder_lanes.len(), 1);
        assert_eq!(file.feeder_lanes[0].trolley_type, "TROLLEY16");
        // 缺 refDes 的动作被跳过
        assert_eq!(file.picks.len(), 2);
        assert_eq!(file.picks[1].head_number, "2");
    }

    #[test]
    fn test_parse_pp_assigns_sections_per_four_robots() {
        let xml = pp_v2(6);
        let file = ProgramParser
            .parse_str(&xml, ProgramFormat::PpV2, Path::new("P2-BOT.pp"))
            .unwrap();

        assert_eq!(file.machine_id, "2");
        assert_eq!(file.picks.len(), 6);
        let sections: Vec<&str> = file.picks.iter().map(|p| p.section.as_str()).collect();
        assert_eq!(sections, vec!["1", "1", "1", "1", "2", "2"]);
        assert!(file.picks.iter().all(|p| p.head_number == "1"));
        assert_eq!(file.picks[4].robot_number, "5");
    }

    #[test]
    fn test_parse_pp_requires_position_in_line() {
        let xml = r#"<Program xmlns="http://api.assembleon.com/pp/v2"><General/><Board id="P"/></Program>"#;
        let result = ProgramParser.parse_str(xml, ProgramFormat::PpV2, Path::new("P.pp"));
        assert!(matches!(result, Err(ImportError::ProgramParseError { .. })));
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let result = ProgramParser.parse_str("<Program>", ProgramFormat::Pp7V1, Path::new("x.pp7"));
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_cycle_time_point() {
        assert_eq!(insert_cycle_time_point("12345"), "12.345");
        assert_eq!(insert_cycle_time_point("45"), ".45");
    }

    #[tokio::test]
    async fn test_parse_program_files_skips_broken_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("P1-TOP.pp7");
        let bad = dir.path().join("P1-BOT.pp7");
        std::fs::write(&good, PP7).unwrap();
        std::fs::write(&bad, "<Program").unwrap();

        let files = parse_program_files(vec![bad, good]).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].program_name, "P1-TOP");
    }
}
