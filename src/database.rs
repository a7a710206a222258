//! SQLite storage for captured buttons and settings.
//!
//! Implements [`ButtonRepository`] over a single connection. The
//! `pressed_keys` column holds a JSON array; screenshots are stored as raw
//! pixel blobs next to their dimensions.

use crate::config::{CAPTURE_MODE_KEY, RECORD_BUTTONS_KEY};
use crate::error::{KeycatError, Result};
use crate::store::{Button, ButtonRepository};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Database wrapper with thread-safe connection.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens or creates the database at the configured location.
    ///
    /// See [`crate::config::database_path`].
    pub fn open() -> Result<Self> {
        Self::open_at(crate::config::database_path())
    }

    /// Opens or creates the database at `path`, creating parent directories.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = ?path, "Opening database");

        let conn = Connection::open(path)?;

        // WAL keeps readers unblocked while the recorder writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| KeycatError::LockPoisoned("database connection"))
    }

    /// Initializes the database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            -- Captured clicks
            CREATE TABLE IF NOT EXISTS buttons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                click_x INTEGER NOT NULL,
                click_y INTEGER NOT NULL,
                pressed_keys TEXT NOT NULL DEFAULT '[]',
                screenshot_width INTEGER,
                screenshot_height INTEGER,
                screenshot BLOB,
                created_at TEXT NOT NULL
            );

            -- Configuration settings
            CREATE TABLE IF NOT EXISTS config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                description TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_buttons_created ON buttons(created_at);
            "#,
        )?;

        // Seed default config if empty
        let config_count: i64 = conn.query_row("SELECT COUNT(*) FROM config", [], |r| r.get(0))?;
        if config_count == 0 {
            let now = Utc::now().to_rfc3339();
            let defaults = [
                (
                    CAPTURE_MODE_KEY,
                    "fullscreen",
                    "Screenshot on left click: none | fullscreen",
                ),
                (
                    RECORD_BUTTONS_KEY,
                    "true",
                    "Persist every left click as a button record",
                ),
            ];

            for (key, value, description) in defaults {
                conn.execute(
                    "INSERT INTO config (key, value, description, updated_at) VALUES (?1, ?2, ?3, ?4)",
                    params![key, value, description, &now],
                )?;
            }

            tracing::info!("Added {} default config settings", defaults.len());
        }

        tracing::debug!("Database schema initialized");
        Ok(())
    }

    // === Config Methods ===

    /// Gets a configuration value by key.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        match conn.query_row(
            "SELECT value FROM config WHERE key = ?1",
            params![key],
            |row| row.get(0),
        ) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Sets a configuration value, inserting the key if it is new.
    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO config (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, &now],
        )?;
        Ok(())
    }

    /// Gets all config settings as (key, value, description).
    pub fn get_all_config(&self) -> Result<Vec<(String, String, Option<String>)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, value, description FROM config ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of stored buttons.
    pub fn button_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM buttons", [], |r| r.get(0))?)
    }
}

fn insert_button(conn: &Connection, button: &Button) -> Result<i64> {
    let keys = serde_json::to_string(&button.pressed_keys)?;
    conn.execute(
        "INSERT INTO buttons (click_x, click_y, pressed_keys, screenshot_width, screenshot_height, screenshot, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            button.click_x,
            button.click_y,
            keys,
            button.screenshot_width,
            button.screenshot_height,
            button.screenshot,
            button.created_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Raw column values; JSON and timestamp parsing happen outside the
/// rusqlite row callback so their errors keep their own variants.
struct ButtonRow {
    id: i64,
    click_x: i32,
    click_y: i32,
    pressed_keys: String,
    screenshot_width: Option<u32>,
    screenshot_height: Option<u32>,
    screenshot: Option<Vec<u8>>,
    created_at: String,
}

impl ButtonRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            click_x: row.get(1)?,
            click_y: row.get(2)?,
            pressed_keys: row.get(3)?,
            screenshot_width: row.get(4)?,
            screenshot_height: row.get(5)?,
            screenshot: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_button(self) -> Result<Button> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| KeycatError::CorruptRecord {
                table: "buttons",
                reason: format!("created_at {:?}: {}", self.created_at, e),
            })?
            .with_timezone(&Utc);

        Ok(Button {
            id: Some(self.id),
            click_x: self.click_x,
            click_y: self.click_y,
            pressed_keys: serde_json::from_str(&self.pressed_keys)?,
            screenshot_width: self.screenshot_width,
            screenshot_height: self.screenshot_height,
            screenshot: self.screenshot,
            created_at,
        })
    }
}

impl ButtonRepository for Database {
    fn find_all_buttons(&self) -> Result<Vec<Button>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, click_x, click_y, pressed_keys, screenshot_width, screenshot_height, screenshot, created_at
             FROM buttons ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], ButtonRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(ButtonRow::into_button).collect()
    }

    fn save_button(&self, button: &Button) -> Result<i64> {
        let conn = self.lock()?;
        let id = insert_button(&conn, button)?;
        tracing::debug!(id, x = button.click_x, y = button.click_y, "Saved button");
        Ok(id)
    }

    fn save_buttons(&self, buttons: &[Button]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for button in buttons {
            insert_button(&tx, button)?;
        }
        tx.commit()?;
        tracing::debug!(count = buttons.len(), "Saved buttons");
        Ok(buttons.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Screenshot;
    use crate::events::MouseEvent;

    fn button(x: i32, y: i32, keys: Vec<u32>) -> Button {
        Button::from_mouse_event(&MouseEvent::new(x, y, None), keys)
    }

    #[test]
    fn test_create_database() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.button_count().unwrap(), 0);
        assert!(db.find_all_buttons().unwrap().is_empty());
    }

    #[test]
    fn test_default_config_seeded() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(
            db.get_config(CAPTURE_MODE_KEY).unwrap().as_deref(),
            Some("fullscreen")
        );
        assert_eq!(db.get_all_config().unwrap().len(), 2);
        assert_eq!(db.get_config("missing").unwrap(), None);
    }

    #[test]
    fn test_set_config_upserts() {
        let db = Database::open_in_memory().unwrap();

        db.set_config(CAPTURE_MODE_KEY, "none").unwrap();
        db.set_config("extra", "1").unwrap();

        assert_eq!(db.get_config(CAPTURE_MODE_KEY).unwrap().as_deref(), Some("none"));
        assert_eq!(db.get_config("extra").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_save_and_retrieve_button() {
        let db = Database::open_in_memory().unwrap();
        let shot = Screenshot::new(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let original = Button::from_mouse_event(&MouseEvent::new(10, 15, Some(shot)), vec![37, 30]);

        let id = db.save_button(&original).unwrap();
        assert!(id > 0);

        let buttons = db.find_all_buttons().unwrap();
        assert_eq!(buttons.len(), 1);

        let stored = &buttons[0];
        assert_eq!(stored.id, Some(id));
        assert_eq!((stored.click_x, stored.click_y), (10, 15));
        assert_eq!(stored.pressed_keys, vec![37, 30]);
        assert_eq!(stored.screenshot_width, Some(1));
        assert_eq!(stored.screenshot_height, Some(2));
        assert_eq!(stored.screenshot, original.screenshot);
        assert_eq!(
            stored.created_at.timestamp_micros(),
            original.created_at.timestamp_micros()
        );
    }

    #[test]
    fn test_save_buttons_bulk() {
        let db = Database::open_in_memory().unwrap();
        let batch = vec![button(1, 1, vec![]), button(2, 2, vec![37]), button(3, 3, vec![])];

        let saved = db.save_buttons(&batch).unwrap();

        assert_eq!(saved, 3);
        let stored = db.find_all_buttons().unwrap();
        let coords: Vec<_> = stored.iter().map(|b| b.click_x).collect();
        assert_eq!(coords, vec![1, 2, 3]);
        assert!(stored.iter().all(|b| b.screenshot.is_none()));
    }

    #[test]
    fn test_corrupt_timestamp_is_reported() {
        let db = Database::open_in_memory().unwrap();
        db.save_button(&button(1, 1, vec![])).unwrap();
        db.lock()
            .unwrap()
            .execute("UPDATE buttons SET created_at = 'yesterday'", [])
            .unwrap();

        let err = db.find_all_buttons().unwrap_err();

        assert!(matches!(
            err,
            KeycatError::CorruptRecord {
                table: "buttons",
                ..
            }
        ));
    }

    #[test]
    fn test_open_at_creates_file() {
        let dir = std::env::temp_dir().join(format!("keycat-db-test-{}", std::process::id()));
        let path = dir.join("nested").join("buttons.db");

        {
            let db = Database::open_at(&path).unwrap();
            db.save_button(&button(5, 6, vec![])).unwrap();
        }

        let reopened = Database::open_at(&path).unwrap();
        assert_eq!(reopened.button_count().unwrap(), 1);

        drop(reopened);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
