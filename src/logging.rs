// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 输出: 控制台 + Log/PNP_PROGRAM_CHECKER.log（每次运行覆盖）
// 级别: RUST_LOG 优先,其次 settings 中的 LOG_LEVEL
// ==========================================

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志系统
///
/// # 参数
/// - log_file: 日志文件路径（目录不存在时创建,文件截断）
/// - default_directive: 未设置 RUST_LOG 时的过滤指令,例如 "info"
///
/// # 示例
/// ```no_run
/// use pnp_program_checker::logging;
/// logging::init(std::path::Path::new("Log/PNP_PROGRAM_CHECKER.log"), "info").unwrap();
/// ```
pub fn init(log_file: &Path, default_directive: &str) -> io::Result<()> {
    if let Some(dir) = log_file.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = File::create(log_file)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_line_number(true))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_writer(Arc::new(file)),
        )
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}

/// 仅控制台输出（日志文件无法创建时使用）
pub fn init_console(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init();
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
