use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

use super::{RunSummary, Storage};
use crate::error::{Result, ScraperError};
use crate::observability::metrics;
use crate::types::{OutlierFences, ProductDataset, ProductRecord};

const BACKEND: &str = "sqlite";

const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    CREATE TABLE IF NOT EXISTS products (
        position                INTEGER PRIMARY KEY,
        name                    TEXT NOT NULL,
        current_price           REAL NOT NULL,
        previous_price          REAL NOT NULL,
        price_change            REAL NOT NULL,
        price_change_percentage REAL NOT NULL,
        is_outlier              INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS pipeline_runs (
        id            TEXT PRIMARY KEY,
        created_at    TEXT NOT NULL,
        product_count INTEGER NOT NULL,
        outlier_count INTEGER NOT NULL,
        fingerprint   TEXT NOT NULL,
        q1            REAL,
        q3            REAL,
        iqr           REAL,
        fence_lower   REAL,
        fence_upper   REAL
    );
"#;

const LATEST_RUN_SQL: &str = "SELECT id, created_at, product_count, outlier_count, fingerprint, \
     q1, q3, iqr, fence_lower, fence_upper \
     FROM pipeline_runs ORDER BY rowid DESC LIMIT 1";

/// SQLite-backed product store. The connection is shared behind a mutex and
/// every query runs on the blocking thread pool.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA)?;
        info!("Opened SQLite product store at {}", db_path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| ScraperError::Storage("sqlite connection lock poisoned".to_string()))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| ScraperError::Storage(format!("blocking task failed: {}", e)))?
    }
}

fn write_snapshot(conn: &mut Connection, dataset: &ProductDataset, summary: &RunSummary) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM products", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO products (position, name, current_price, previous_price, \
             price_change, price_change_percentage, is_outlier) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (position, r) in dataset.records().iter().enumerate() {
            stmt.execute(params![
                position as i64,
                r.name,
                r.current_price,
                r.previous_price,
                r.price_change,
                r.price_change_percentage,
                r.is_outlier,
            ])?;
        }
    }

    let fences = dataset.fences();
    tx.execute(
        "INSERT INTO pipeline_runs (id, created_at, product_count, outlier_count, fingerprint, \
         q1, q3, iqr, fence_lower, fence_upper) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            summary.run_id.to_string(),
            summary.created_at.to_rfc3339(),
            summary.product_count as i64,
            summary.outlier_count as i64,
            summary.fingerprint,
            fences.map(|f| f.q1),
            fences.map(|f| f.q3),
            fences.map(|f| f.iqr),
            fences.map(|f| f.lower),
            fences.map(|f| f.upper),
        ],
    )?;
    tx.commit()?;
    Ok(())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ProductRecord> {
    Ok(ProductRecord {
        name: row.get(0)?,
        current_price: row.get(1)?,
        previous_price: row.get(2)?,
        price_change: row.get(3)?,
        price_change_percentage: row.get(4)?,
        is_outlier: row.get(5)?,
    })
}

struct StoredRun {
    summary: RunSummary,
    fences: Option<OutlierFences>,
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String, i64, i64, String, [Option<f64>; 5])> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        [row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?],
    ))
}

fn read_latest_run(conn: &Connection) -> Result<Option<StoredRun>> {
    let raw = conn.query_row(LATEST_RUN_SQL, [], run_from_row).optional()?;
    let Some((id, created_at, product_count, outlier_count, fingerprint, f)) = raw else {
        return Ok(None);
    };

    let run_id = id
        .parse::<Uuid>()
        .map_err(|e| ScraperError::Storage(format!("invalid run id '{}': {}", id, e)))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| ScraperError::Storage(format!("invalid run timestamp '{}': {}", created_at, e)))?
        .with_timezone(&Utc);
    let fences = match f {
        [Some(q1), Some(q3), Some(iqr), Some(lower), Some(upper)] => Some(OutlierFences { q1, q3, iqr, lower, upper }),
        _ => None,
    };

    Ok(Some(StoredRun {
        summary: RunSummary {
            run_id,
            created_at,
            product_count: product_count as usize,
            outlier_count: outlier_count as usize,
            fingerprint,
        },
        fences,
    }))
}

fn read_snapshot(conn: &Connection) -> Result<ProductDataset> {
    let mut stmt = conn.prepare(
        "SELECT name, current_price, previous_price, price_change, price_change_percentage, is_outlier \
         FROM products ORDER BY position",
    )?;
    let records = stmt
        .query_map([], record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let fences = read_latest_run(conn)?.and_then(|run| run.fences);
    Ok(ProductDataset::new(records, fences))
}

#[async_trait]
impl Storage for SqliteStorage {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn save(&self, dataset: Arc<ProductDataset>) -> Result<RunSummary> {
        let summary = RunSummary::for_dataset(&dataset)?;
        let stored = summary.clone();
        let result = self
            .with_conn(move |conn| write_snapshot(conn, &dataset, &stored))
            .await;

        match result {
            Ok(()) => {
                debug!("Replaced products table with {} rows (run {})", summary.product_count, summary.run_id);
                metrics::storage::save_success(BACKEND);
                Ok(summary)
            }
            Err(e) => {
                metrics::storage::save_error(BACKEND);
                Err(e)
            }
        }
    }

    async fn load_all(&self) -> Result<Arc<ProductDataset>> {
        metrics::storage::load(BACKEND);
        let dataset = self.with_conn(|conn| read_snapshot(conn)).await?;
        Ok(Arc::new(dataset))
    }

    async fn latest_run(&self) -> Result<Option<RunSummary>> {
        let run = self.with_conn(|conn| read_latest_run(conn)).await?;
        Ok(run.map(|r| r.summary))
    }
}
