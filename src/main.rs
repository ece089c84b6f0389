// ==========================================
// 贴片程序核对系统 - 命令行入口
// ==========================================
// 用法:
//   pnp-program-checker [工作目录]
// 工作目录缺省为可执行文件所在目录
// 退出码: 0 成功 / 2 数据完整性失败 / 1 非预期失败
// ==========================================

use anyhow::Context;
use pnp_program_checker::config::WorkspacePaths;
use pnp_program_checker::engine::error::EXIT_UNEXPECTED;
use pnp_program_checker::engine::CheckerPipeline;
use pnp_program_checker::logging;
use pnp_program_checker::report::CsvReportSink;
use std::process::ExitCode;

fn resolve_workspace() -> anyhow::Result<WorkspacePaths> {
    match std::env::args().nth(1).filter(|a| !a.trim().is_empty()) {
        Some(base) => Ok(WorkspacePaths::new(base)),
        None => WorkspacePaths::from_executable().context("无法定位可执行文件所在目录"),
    }
}

fn main() -> ExitCode {
    let paths = match resolve_workspace() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::from(EXIT_UNEXPECTED as u8);
        }
    };

    // 日志级别来自 settings,需在初始化日志前预读
    let settings = CheckerPipeline::preload_settings(&paths);
    let directive = settings.filter_directive();
    if let Err(e) = logging::init(&paths.log_file(), &directive) {
        logging::init_console(&directive);
        tracing::warn!(file = %paths.log_file().display(), error = %e, "日志文件无法创建,仅输出到控制台");
    }

    tracing::info!("==================================================");
    tracing::info!("{} v{}", pnp_program_checker::APP_NAME, pnp_program_checker::VERSION);
    tracing::info!("工作目录: {}", paths.base().display());
    tracing::info!("==================================================");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "异步运行时初始化失败");
            return ExitCode::from(EXIT_UNEXPECTED as u8);
        }
    };

    let sink = CsvReportSink::new(&paths);
    let pipeline = CheckerPipeline::new(paths);

    match runtime.block_on(pipeline.run(&sink)) {
        Ok(summary) => {
            tracing::info!(
                run_id = %summary.run_id,
                output = %sink.checker_path().display(),
                "运行成功结束"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(exit_code = e.exit_code(), "运行失败: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
