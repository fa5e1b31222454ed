//! SQLite-backed door store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Attendance, DoorSale, DoorStore, NewDoorSale, NewPreorder, Preorder, StoreError};

const DATE_FORMAT: &str = "%Y-%m-%d";

const PREORDER_COLUMNS: &str = "id, full_name, quantity, checked_in_count, final_price, payment_method, date, created_at, updated_at, user_id";
const DOOR_SALE_COLUMNS: &str =
    "id, full_name, quantity, final_price, payment_method, date, created_at, updated_at, user_id";
const ATTENDANCE_COLUMNS: &str = "id, count, timestamp, created_at, updated_at, user_id";

/// SQLite-backed store for preorders, door sales and attendances.
pub struct SqliteDoorStore {
    conn: Mutex<Connection>,
}

impl SqliteDoorStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS preorders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name TEXT NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity >= 1),
                checked_in_count INTEGER,
                final_price INTEGER NOT NULL,
                payment_method TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                user_id INTEGER
            );

            CREATE TABLE IF NOT EXISTS door_sales (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name TEXT NOT NULL CHECK (full_name <> ''),
                quantity INTEGER NOT NULL CHECK (quantity >= 1),
                final_price INTEGER NOT NULL,
                payment_method TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                user_id INTEGER
            );

            CREATE TABLE IF NOT EXISTS attendances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                count INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                user_id INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_preorders_full_name ON preorders(full_name);
            CREATE INDEX IF NOT EXISTS idx_door_sales_date ON door_sales(date DESC, id DESC);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_date(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_preorder(row: &Row) -> rusqlite::Result<Preorder> {
    Ok(Preorder {
        id: row.get(0)?,
        full_name: row.get(1)?,
        quantity: row.get(2)?,
        checked_in_count: row.get(3)?,
        final_price: row.get(4)?,
        payment_method: row.get(5)?,
        date: parse_date(6, &row.get::<_, String>(6)?)?,
        created_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
        updated_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
        user_id: row.get(9)?,
    })
}

fn row_to_door_sale(row: &Row) -> rusqlite::Result<DoorSale> {
    Ok(DoorSale {
        id: row.get(0)?,
        full_name: row.get(1)?,
        quantity: row.get(2)?,
        final_price: row.get(3)?,
        payment_method: row.get(4)?,
        date: parse_date(5, &row.get::<_, String>(5)?)?,
        created_at: parse_timestamp(6, &row.get::<_, String>(6)?)?,
        updated_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
        user_id: row.get(8)?,
    })
}

fn row_to_attendance(row: &Row) -> rusqlite::Result<Attendance> {
    Ok(Attendance {
        id: row.get(0)?,
        count: row.get(1)?,
        timestamp: parse_timestamp(2, &row.get::<_, String>(2)?)?,
        created_at: parse_timestamp(3, &row.get::<_, String>(3)?)?,
        updated_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
        user_id: row.get(5)?,
    })
}

// Statement helpers take `&Connection` so they run the same inside a transaction.

fn update_checked(conn: &Connection, id: i64, new_count: i64) -> Result<Preorder, StoreError> {
    let changed = conn.execute(
        "UPDATE preorders SET checked_in_count = ?, updated_at = ? WHERE id = ?",
        params![new_count, Utc::now().to_rfc3339(), id],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound(id));
    }

    let sql = format!("SELECT {} FROM preorders WHERE id = ?", PREORDER_COLUMNS);
    conn.query_row(&sql, params![id], row_to_preorder)
        .optional()?
        .ok_or(StoreError::NotFound(id))
}

fn insert_door_sale(conn: &Connection, sale: &NewDoorSale) -> Result<DoorSale, StoreError> {
    let now = Utc::now().to_rfc3339();
    let today = Local::now().date_naive().format(DATE_FORMAT).to_string();

    conn.execute(
        "INSERT INTO door_sales (full_name, quantity, final_price, payment_method, date, created_at, updated_at, user_id) VALUES (?, ?, ?, ?, ?, ?, ?, NULL)",
        params![
            sale.full_name,
            sale.quantity,
            sale.final_price,
            sale.payment_method,
            today,
            now,
            now,
        ],
    )?;

    let id = conn.last_insert_rowid();
    let sql = format!("SELECT {} FROM door_sales WHERE id = ?", DOOR_SALE_COLUMNS);
    Ok(conn.query_row(&sql, params![id], row_to_door_sale)?)
}

fn append_attendance(conn: &Connection, delta: i64) -> Result<Attendance, StoreError> {
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO attendances (count, timestamp, created_at, updated_at, user_id) VALUES (?, ?, ?, ?, NULL)",
        params![delta, now, now, now],
    )?;

    let id = conn.last_insert_rowid();
    let sql = format!("SELECT {} FROM attendances WHERE id = ?", ATTENDANCE_COLUMNS);
    Ok(conn.query_row(&sql, params![id], row_to_attendance)?)
}

#[async_trait]
impl DoorStore for SqliteDoorStore {
    async fn fetch_preorders(&self) -> Result<Vec<Preorder>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM preorders ORDER BY full_name ASC, id ASC",
            PREORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_preorder)?;
        let preorders = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(preorders)
    }

    async fn create_preorder(&self, preorder: &NewPreorder) -> Result<Preorder, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO preorders (full_name, quantity, checked_in_count, final_price, payment_method, date, created_at, updated_at, user_id) VALUES (?, ?, NULL, ?, ?, ?, ?, ?, NULL)",
            params![
                preorder.full_name,
                preorder.quantity,
                preorder.final_price,
                preorder.payment_method,
                preorder.date.format(DATE_FORMAT).to_string(),
                now,
                now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        let sql = format!("SELECT {} FROM preorders WHERE id = ?", PREORDER_COLUMNS);
        Ok(conn.query_row(&sql, params![id], row_to_preorder)?)
    }

    async fn set_preorder_checked(&self, id: i64, new_count: i64) -> Result<Preorder, StoreError> {
        let conn = self.lock()?;
        update_checked(&conn, id, new_count)
    }

    async fn fetch_door_sales(&self) -> Result<Vec<DoorSale>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM door_sales ORDER BY date DESC, id DESC",
            DOOR_SALE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_door_sale)?;
        let sales = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sales)
    }

    async fn create_door_sale(&self, sale: &NewDoorSale) -> Result<DoorSale, StoreError> {
        let conn = self.lock()?;
        insert_door_sale(&conn, sale)
    }

    async fn insert_attendance(&self, delta: i64) -> Result<Attendance, StoreError> {
        let conn = self.lock()?;
        append_attendance(&conn, delta)
    }

    async fn fetch_attendances(&self) -> Result<Vec<Attendance>, StoreError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM attendances ORDER BY id ASC", ATTENDANCE_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_attendance)?;
        let entries = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    async fn check_in_with_ledger(
        &self,
        id: i64,
        new_count: i64,
        delta: i64,
    ) -> Result<(Preorder, Option<Attendance>), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let preorder = update_checked(&tx, id, new_count)?;
        let entry = if delta > 0 {
            Some(append_attendance(&tx, delta)?)
        } else {
            None
        };

        tx.commit()?;
        Ok((preorder, entry))
    }

    async fn create_door_sale_with_ledger(
        &self,
        sale: &NewDoorSale,
    ) -> Result<(DoorSale, Attendance), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let created = insert_door_sale(&tx, sale)?;
        let entry = append_attendance(&tx, sale.quantity)?;

        tx.commit()?;
        Ok((created, entry))
    }
}
