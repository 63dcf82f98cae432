//! SQLite-backed order store.
//!
//! Orders live in a single table; gateway meta entries (payment addresses,
//! offered blockchains, last applied platform status) are a JSON object in
//! the `meta` column, read and written through the [`PaymentOrder`] trait.

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use open_gateway::{OrderStatus, PaymentOrder};

use crate::error::ServerError;

/// One row of the orders table.
#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub id: i64,
    pub order_key: String,
    pub total: String,
    pub currency: String,
    pub status: OrderStatus,
    pub archived: bool,
    /// Unix time payment completion fired; set at most once.
    pub paid_at: Option<i64>,
    meta: serde_json::Map<String, serde_json::Value>,
}

/// SQLite database wrapper shared across workers.
#[derive(Clone)]
pub struct OrderStore {
    conn: Arc<Mutex<Connection>>,
}

impl OrderStore {
    pub fn open(path: &str) -> Result<Self, ServerError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;

        // Payment records; keep them out of other local users' reach.
        #[cfg(unix)]
        if path != ":memory:" {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
                tracing::warn!(
                    path = %path,
                    error = %e,
                    "failed to set order database file permissions to 0600"
                );
            }
        }

        Ok(store)
    }

    fn init_schema(&self) -> Result<(), ServerError> {
        let conn = self.lock()?;

        // Enable WAL mode for better concurrent read/write performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_key TEXT UNIQUE NOT NULL,
                total TEXT NOT NULL,
                currency TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                meta TEXT NOT NULL DEFAULT '{}',
                archived INTEGER NOT NULL DEFAULT 0,
                paid_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status, archived)",
            [],
        )?;

        Ok(())
    }

    /// Fetch the order for `order_key`, creating it in `pending` if it does
    /// not exist yet. Retried checkouts reuse the existing row.
    pub fn create_or_fetch(
        &self,
        order_key: &str,
        total: &str,
        currency: &str,
    ) -> Result<StoredOrder, ServerError> {
        let conn = self.lock()?;
        let now = unix_now();

        conn.execute(
            r#"
            INSERT OR IGNORE INTO orders (order_key, total, currency, status, meta, created_at, updated_at)
            VALUES (?1, ?2, ?3, 'pending', '{}', ?4, ?4)
            "#,
            params![order_key, total, currency, now],
        )?;

        let order = Self::query_by_key(&conn, order_key)?;
        order.ok_or_else(|| ServerError::Internal(format!("order {order_key} vanished after insert")))
    }

    pub fn fetch_by_key(&self, order_key: &str) -> Result<Option<StoredOrder>, ServerError> {
        let conn = self.lock()?;
        Self::query_by_key(&conn, order_key)
    }

    /// Orders the sweep looks at: still pending and not archived.
    pub fn list_pending(&self) -> Result<Vec<StoredOrder>, ServerError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, order_key, total, currency, status, meta, archived, paid_at
            FROM orders
            WHERE status = 'pending' AND archived = 0
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map([], Self::row_to_raw)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::hydrate).collect()
    }

    pub fn count_pending(&self) -> Result<i64, ServerError> {
        let conn = self.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE status = 'pending' AND archived = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Persist the mutable fields of an order.
    pub fn save(&self, order: &StoredOrder) -> Result<(), ServerError> {
        let conn = self.lock()?;
        let meta = serde_json::to_string(&order.meta)
            .map_err(|e| ServerError::Internal(format!("meta serialization: {e}")))?;

        conn.execute(
            r#"
            UPDATE orders
            SET status = ?1, meta = ?2, paid_at = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
            params![
                order.status.as_str(),
                meta,
                order.paid_at,
                unix_now(),
                order.id
            ],
        )?;
        Ok(())
    }

    /// Exclude an order from future sweeps without touching its status.
    pub fn archive(&self, order_key: &str) -> Result<bool, ServerError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE orders SET archived = 1, updated_at = ?1 WHERE order_key = ?2",
            params![unix_now(), order_key],
        )?;
        Ok(changed > 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ServerError> {
        self.conn
            .lock()
            .map_err(|_| ServerError::Internal("order store lock poisoned".to_string()))
    }

    fn query_by_key(conn: &Connection, order_key: &str) -> Result<Option<StoredOrder>, ServerError> {
        let raw = conn
            .query_row(
                r#"
                SELECT id, order_key, total, currency, status, meta, archived, paid_at
                FROM orders
                WHERE order_key = ?1
                "#,
                params![order_key],
                Self::row_to_raw,
            )
            .optional()?;

        raw.map(Self::hydrate).transpose()
    }

    #[allow(clippy::type_complexity)]
    fn row_to_raw(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(i64, String, String, String, String, String, i32, Option<i64>)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
        ))
    }

    fn hydrate(
        raw: (i64, String, String, String, String, String, i32, Option<i64>),
    ) -> Result<StoredOrder, ServerError> {
        let (id, order_key, total, currency, status, meta, archived, paid_at) = raw;

        let status: OrderStatus = status
            .parse()
            .map_err(|_| ServerError::Internal(format!("order {id} has unknown status {status}")))?;
        let meta = serde_json::from_str(&meta)
            .map_err(|e| ServerError::Internal(format!("order {id} has corrupt meta: {e}")))?;

        Ok(StoredOrder {
            id,
            order_key,
            total,
            currency,
            status,
            archived: archived == 1,
            paid_at,
            meta,
        })
    }
}

impl PaymentOrder for StoredOrder {
    fn order_id(&self) -> u64 {
        self.id as u64
    }

    fn order_key(&self) -> &str {
        &self.order_key
    }

    fn total(&self) -> &str {
        &self.total
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn meta(&self, key: &str) -> Option<String> {
        self.meta
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn set_meta(&mut self, key: &str, value: &str) {
        self.meta
            .insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }

    fn set_status(&mut self, status: OrderStatus, note: &str) {
        tracing::info!(
            order = %self.order_key,
            from = %self.status,
            to = %status,
            note,
            "order status change"
        );
        self.status = status;
    }

    fn mark_payment_complete(&mut self) {
        if self.paid_at.is_none() {
            self.paid_at = Some(unix_now());
            tracing::info!(order = %self.order_key, "payment complete");
        }
    }
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
