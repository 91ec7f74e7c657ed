//! SQLite-backed passenger repository

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Params, Row, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::errors::StorageError;
use crate::domain::entities::{Notification, NotificationDto, Passenger};
use crate::domain::traits::PassengerRepository;

const SCHEMA_SQL: &str = r"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS passenger (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL,
        flight_id INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS notification (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        message TEXT NOT NULL,
        passenger_id INTEGER NOT NULL,
        FOREIGN KEY (passenger_id) REFERENCES passenger(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_passenger_flight ON passenger(flight_id);
    CREATE INDEX IF NOT EXISTS idx_notification_passenger ON notification(passenger_id);
";

const PASSENGER_COLUMNS: &str = "id, first_name, last_name, email, flight_id";

/// Passenger repository over a single SQLite connection.
///
/// Every call runs in its own transaction on the blocking thread pool.
#[derive(Clone)]
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        tracing::info!(path = %path.display(), "Opened passenger database");
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` inside a transaction off the async scheduler. The transaction
    /// commits only if `f` succeeds.
    async fn with_transaction<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = conn.lock().map_err(|_| StorageError::Poisoned)?;
            let tx = conn.transaction()?;
            let out = f(&tx)?;
            tx.commit()?;
            Ok(out)
        })
        .await?
    }
}

fn passenger_from_row(row: &Row<'_>) -> rusqlite::Result<Passenger> {
    Ok(Passenger {
        id: Some(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        flight_id: row.get(4)?,
        notifications: Vec::new(),
    })
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: Some(row.get(0)?),
        message: row.get(1)?,
        passenger_id: Some(row.get(2)?),
    })
}

fn notifications_for(
    conn: &Connection,
    passenger_id: i64,
) -> Result<Vec<Notification>, StorageError> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, message, passenger_id FROM notification WHERE passenger_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map([passenger_id], notification_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Query passengers and load each one's notifications.
fn query_passengers<P: Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> Result<Vec<Passenger>, StorageError> {
    let sql = format!("SELECT {} FROM passenger {} ORDER BY id", PASSENGER_COLUMNS, filter);
    let mut stmt = conn.prepare(&sql)?;
    let mut passengers = stmt
        .query_map(params, passenger_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for passenger in &mut passengers {
        if let Some(id) = passenger.id {
            passenger.notifications = notifications_for(conn, id)?;
        }
    }
    Ok(passengers)
}

/// Write the passenger row and its attached notifications, then reload the
/// full notification set so the result matches what a later read returns.
fn upsert_passenger(
    conn: &Connection,
    mut passenger: Passenger,
) -> Result<Passenger, StorageError> {
    let id = match passenger.id {
        None => {
            conn.execute(
                "INSERT INTO passenger (first_name, last_name, email, flight_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    passenger.first_name,
                    passenger.last_name,
                    passenger.email,
                    passenger.flight_id
                ],
            )?;
            conn.last_insert_rowid()
        }
        Some(id) => {
            conn.execute(
                "INSERT INTO passenger (id, first_name, last_name, email, flight_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    email = excluded.email,
                    flight_id = excluded.flight_id",
                params![
                    id,
                    passenger.first_name,
                    passenger.last_name,
                    passenger.email,
                    passenger.flight_id
                ],
            )?;
            id
        }
    };
    passenger.id = Some(id);

    for notification in &passenger.notifications {
        match notification.id {
            None => {
                conn.execute(
                    "INSERT INTO notification (message, passenger_id) VALUES (?1, ?2)",
                    params![notification.message, id],
                )?;
            }
            Some(notification_id) => {
                conn.execute(
                    "INSERT INTO notification (id, message, passenger_id) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                        message = excluded.message,
                        passenger_id = excluded.passenger_id",
                    params![notification_id, notification.message, id],
                )?;
            }
        }
    }
    passenger.notifications = notifications_for(conn, id)?;
    Ok(passenger)
}

#[async_trait]
impl PassengerRepository for SqliteRepository {
    async fn persist(&self, passenger: Passenger) -> Result<Passenger, StorageError> {
        self.with_transaction(move |tx| upsert_passenger(tx, passenger)).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Passenger>, StorageError> {
        self.with_transaction(move |tx| {
            let passenger = tx
                .query_row(
                    &format!("SELECT {} FROM passenger WHERE id = ?1", PASSENGER_COLUMNS),
                    [id],
                    passenger_from_row,
                )
                .optional()?;

            match passenger {
                Some(mut passenger) => {
                    passenger.notifications = notifications_for(tx, id)?;
                    Ok(Some(passenger))
                }
                None => Ok(None),
            }
        })
        .await
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, StorageError> {
        self.with_transaction(move |tx| {
            tx.execute("DELETE FROM notification WHERE passenger_id = ?1", [id])?;
            let rows = tx.execute("DELETE FROM passenger WHERE id = ?1", [id])?;
            Ok(rows > 0)
        })
        .await
    }

    async fn delete_all(&self) -> Result<u64, StorageError> {
        self.with_transaction(|tx| {
            tx.execute("DELETE FROM notification", [])?;
            let rows = tx.execute("DELETE FROM passenger", [])?;
            Ok(rows as u64)
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Passenger>, StorageError> {
        self.with_transaction(|tx| query_passengers(tx, "", [])).await
    }

    async fn find_passengers_for_flight(
        &self,
        flight_id: i64,
    ) -> Result<Vec<Passenger>, StorageError> {
        self.with_transaction(move |tx| query_passengers(tx, "WHERE flight_id = ?1", [flight_id]))
            .await
    }

    async fn find_notifications_for_passenger(
        &self,
        passenger_id: i64,
    ) -> Result<Vec<Notification>, StorageError> {
        self.with_transaction(move |tx| notifications_for(tx, passenger_id)).await
    }

    async fn add_notification_by_flight_id(
        &self,
        flight_id: i64,
        notification: &Notification,
    ) -> Result<(), StorageError> {
        let notification = notification.clone();
        let written = self
            .with_transaction(move |tx| {
                let mut stmt =
                    tx.prepare("SELECT id FROM passenger WHERE flight_id = ?1 ORDER BY id")?;
                let passenger_ids = stmt
                    .query_map([flight_id], |row| row.get::<_, i64>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                let mut insert =
                    tx.prepare("INSERT INTO notification (message, passenger_id) VALUES (?1, ?2)")?;
                for passenger_id in &passenger_ids {
                    let copy = notification.copy_for(*passenger_id);
                    insert.execute(params![copy.message, passenger_id])?;
                }
                Ok(passenger_ids.len())
            })
            .await?;

        tracing::debug!(flight_id, written, "Notification fanned out");
        Ok(())
    }

    async fn find_notifications_with_email(&self) -> Result<Vec<NotificationDto>, StorageError> {
        self.with_transaction(|tx| {
            let mut stmt = tx.prepare(
                "SELECT n.message, p.email FROM notification n
                 JOIN passenger p ON p.id = n.passenger_id
                 ORDER BY n.id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(NotificationDto {
                    message: row.get(0)?,
                    email: row.get(1)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }
}
