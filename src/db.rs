// ==========================================
// 贴片程序核对系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一 busy_timeout,避免 SAP 镜像库被其他进程写入时偶发 busy 错误
// - 核对流程只读,连接以只读方式打开
// ==========================================

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置（读写,测试建库用）
pub fn open_sqlite_connection(db_path: impl AsRef<Path>) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 以只读方式打开 SQLite 连接（库文件必须已存在）
pub fn open_sqlite_readonly(db_path: impl AsRef<Path>) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
    )?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_readonly_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sap.db");
        {
            let conn = open_sqlite_connection(&path).unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER);").unwrap();
        }

        let conn = open_sqlite_readonly(&path).unwrap();
        assert!(conn.execute("INSERT INTO t (x) VALUES (1)", []).is_err());
    }

    #[test]
    fn test_readonly_requires_existing_file() {
        let dir = TempDir::new().unwrap();
        assert!(open_sqlite_readonly(dir.path().join("missing.db")).is_err());
    }
}
