// ==========================================
// 贴片程序核对系统 - 输入文件扫描
// ==========================================
// BOM_590 / MCTO: 仅扫描当前目录的 .csv,文件名包含任一选中号
// PNP_PROGRAM:    递归扫描 .pp / .pp7,文件名包含任一选中程序名
// 结果按路径排序,保证合并顺序稳定
// ==========================================

use crate::domain::types::ProgramFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// 扫描导出文件（不递归）
///
/// # 参数
/// - dir: BOM_590 或 MCTO 目录
/// - ids: 选中的 BOM/MCTO 号
pub fn scan_export_files(dir: &Path, ids: &[String]) -> Vec<PathBuf> {
    scan(dir, 1, |name| {
        has_extension(name, "csv") && ids.iter().any(|id| name.contains(id.as_str()))
    })
}

/// 扫描贴片程序文件（递归子目录）
///
/// # 参数
/// - dir: PNP_PROGRAM 目录
/// - programs: 选中的程序名
pub fn scan_program_files(dir: &Path, programs: &[String]) -> Vec<PathBuf> {
    scan(dir, usize::MAX, |name| {
        program_format(Path::new(name)).is_some()
            && programs.iter().any(|p| name.contains(p.as_str()))
    })
}

/// 按扩展名识别程序格式
pub fn program_format(path: &Path) -> Option<ProgramFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ProgramFormat::from_extension)
}

fn has_extension(name: &str, ext: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(ext))
}

fn scan(dir: &Path, max_depth: usize, matches: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "目录不存在,跳过扫描");
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "目录项读取失败,已跳过");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_str().map_or(false, &matches))
        .map(|e| e.into_path())
        .collect();

    files.sort();
    debug!(dir = %dir.display(), count = files.len(), "扫描完成");
    files
}
