// ==========================================
// 贴片程序核对系统 - SAP 数据库来源
// ==========================================
// SAP_SOURCE = db
// 表: SAP_BOM_item / SAP_BOM_header / material_master
// BOM:  material_group_code = '590'
// MCTO: material_group_code in ('MCTO', '002', 'MFGPN'),物料号去掉 '000000000000'
// ==========================================
// 连接由 DatabaseSource 独占持有,drop 或 close() 时释放
// 内置驱动: SQLite（rusqlite）; mysql / mssql 仅识别,连接时报错
// ==========================================

use crate::config::{DbSettings, ExclusionRules};
use crate::db::open_sqlite_readonly;
use crate::domain::material::MaterialRow;
use crate::domain::types::{DbType, MaterialGroup};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::material_source_trait::{DataCleaner as DataCleanerTrait, MaterialSource};
use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{debug, info, warn};

const BOM_QUERY: &str = "
    SELECT CAST(bh.SAP_mat_no AS TEXT),
           CAST(bi.compnt_no AS TEXT),
           CAST(bi.compnt_desc AS TEXT),
           CAST(bi.compnt_qty AS REAL),
           CAST(bi.item_text AS TEXT)
    FROM SAP_BOM_item bi
    INNER JOIN SAP_BOM_header bh ON bi.BOM_no = bh.BOM_no
    INNER JOIN material_master mm ON bh.SAP_mat_no = mm.material_no
    WHERE mm.material_group_code IN ('590')
      AND bh.SAP_mat_no IN ({ids})";

const MCTO_QUERY: &str = "
    SELECT REPLACE(CAST(bh.SAP_mat_no AS TEXT), '000000000000', ''),
           CAST(bi.alt_BOM_type AS TEXT),
           CAST(bi.compnt_no AS TEXT),
           CAST(bi.compnt_desc AS TEXT),
           CAST(bi.compnt_qty AS REAL),
           CAST(bi.item_text AS TEXT)
    FROM SAP_BOM_item bi
    INNER JOIN SAP_BOM_header bh
        ON bi.BOM_no = bh.BOM_no AND bi.alt_BOM_type = bh.alt_BOM_type
    INNER JOIN material_master mm ON bh.SAP_mat_no = mm.material_no
    WHERE mm.material_group_code IN ('MCTO', '002', 'MFGPN')
      AND REPLACE(CAST(bh.SAP_mat_no AS TEXT), '000000000000', '') IN ({ids})";

// 查询原始行（清洗前）
#[derive(Debug, Clone)]
struct SapLineItem {
    scope_id: Option<String>,
    variant: Option<String>,
    component: Option<String>,
    description: Option<String>,
    quantity: Option<f64>,
    designator: Option<String>,
}

// ==========================================
// DatabaseSource
// ==========================================
pub struct DatabaseSource {
    conn: Mutex<Connection>,
    settings: DbSettings,
    rules: ExclusionRules,
    cleaner: DataCleaner,
}

impl DatabaseSource {
    /// 建立数据库连接
    ///
    /// # 返回
    /// - Err(DatabaseConnectionError): 驱动不支持或连接失败
    pub fn connect(settings: &DbSettings, rules: ExclusionRules) -> ImportResult<Self> {
        let conn = match settings.db_type {
            DbType::Sqlite => open_sqlite_readonly(&settings.database).map_err(|e| {
                ImportError::DatabaseConnectionError(format!(
                    "database={}: {}",
                    settings.database, e
                ))
            })?,
            DbType::Mysql | DbType::Mssql => {
                return Err(ImportError::DatabaseConnectionError(format!(
                    "未内置 {} 驱动（host={}, database={}）",
                    settings.db_type, settings.host, settings.database
                )))
            }
        };

        info!(
            db_type = %settings.db_type,
            database = %settings.database,
            "数据库已连接"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            settings: settings.clone(),
            rules,
            cleaner: DataCleaner,
        })
    }

    /// 显式关闭连接
    pub fn close(self) -> ImportResult<()> {
        let conn = self.conn.into_inner().unwrap_or_else(|p| p.into_inner());
        conn.close().map_err(|(_, e)| ImportError::from(e))?;
        info!(database = %self.settings.database, "数据库连接已关闭");
        Ok(())
    }

    fn query_line_items(&self, group: MaterialGroup, ids: &[String]) -> ImportResult<Vec<SapLineItem>> {
        let template = match group {
            MaterialGroup::Bom => BOM_QUERY,
            MaterialGroup::Mcto => MCTO_QUERY,
        };
        let sql = template.replace("{ids}", &vec!["?"; ids.len()].join(", "));

        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
        let mut stmt = conn.prepare(&sql)?;

        let items = match group {
            MaterialGroup::Bom => stmt
                .query_map(params_from_iter(ids.iter()), |row| {
                    Ok(SapLineItem {
                        scope_id: row.get(0)?,
                        variant: None,
                        component: row.get(1)?,
                        description: row.get(2)?,
                        quantity: row.get(3)?,
                        designator: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?,
            MaterialGroup::Mcto => stmt
                .query_map(params_from_iter(ids.iter()), |row| {
                    Ok(SapLineItem {
                        scope_id: row.get(0)?,
                        variant: row.get(1)?,
                        component: row.get(2)?,
                        description: row.get(3)?,
                        quantity: row.get(4)?,
                        designator: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?,
        };

        info!(group = %group, rows = items.len(), "SAP 查询完成");
        Ok(items)
    }

    // 标准化 → 丢弃含空字段行 → 排除规则 → 数量换算 → 位号展开（残留区间直接报错）
    fn clean_line_items(&self, group: MaterialGroup, items: Vec<SapLineItem>) -> ImportResult<Vec<MaterialRow>> {
        let mut rows: Vec<MaterialRow> = Vec::with_capacity(items.len());
        let mut seen: HashSet<MaterialRow> = HashSet::with_capacity(items.len());
        let total = items.len();

        for (index, item) in items.into_iter().enumerate() {
            let scope_id = self.cleaner.normalize_null(item.scope_id.as_deref());
            let variant = self.cleaner.normalize_null(item.variant.as_deref());
            let component = self.cleaner.normalize_null(item.component.as_deref());
            let description = self.cleaner.normalize_null(item.description.as_deref());
            let designator = self.cleaner.normalize_null(item.designator.as_deref());

            let (scope_id, component, description, quantity, designator) =
                match (scope_id, component, description, item.quantity, designator) {
                    (Some(s), Some(c), Some(d), Some(q), Some(r)) => (s, c, d, q, r),
                    _ => continue,
                };
            if group == MaterialGroup::Mcto && variant.is_none() {
                continue;
            }

            if self.rules.is_excluded(group, &component, &description) {
                continue;
            }

            let designator_list = self.cleaner.clean_designators(&designator)?;
            let quantity = match self.cleaner.convert_tray_quantity(quantity, index + 1) {
                Ok(q) => q,
                Err(e) => {
                    warn!(group = %group, component = %component, error = %e, "SAP 数量非法,跳过该行");
                    continue;
                }
            };

            let row = match group {
                MaterialGroup::Bom => MaterialRow {
                    bom_id: Some(scope_id),
                    mcto_id: None,
                    variant: None,
                    component_id: component,
                    component_desc: description,
                    quantity,
                    designator_list,
                },
                MaterialGroup::Mcto => MaterialRow {
                    bom_id: None,
                    mcto_id: Some(scope_id),
                    variant,
                    component_id: component,
                    component_desc: description,
                    quantity,
                    designator_list,
                },
            };
            if seen.insert(row.clone()) {
                rows.push(row);
            }
        }

        debug!(group = %group, total = total, kept = rows.len(), "SAP 行清洗完成");
        Ok(rows)
    }

    fn fetch_group(&self, group: MaterialGroup, ids: &[String]) -> ImportResult<Vec<MaterialRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let items = self.query_line_items(group, ids)?;
        self.clean_line_items(group, items)
    }
}

#[async_trait]
impl MaterialSource for DatabaseSource {
    async fn fetch_bom(&self, bom_ids: &[String]) -> ImportResult<Vec<MaterialRow>> {
        self.fetch_group(MaterialGroup::Bom, bom_ids)
    }

    async fn fetch_mcto(&self, mcto_ids: &[String]) -> ImportResult<Vec<MaterialRow>> {
        self.fetch_group(MaterialGroup::Mcto, mcto_ids)
    }

    fn describe(&self) -> String {
        format!(
            "db({}, database={})",
            self.settings.db_type, self.settings.database
        )
    }
}
