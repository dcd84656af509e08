//! SQLite-backed session persistence so a restarted client stays signed in.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

const SESSION_KEY: &str = "session";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl Session {
    pub fn is_expired(&self, now_unix: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now_unix)
    }
}

pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Open (or create) `gastoagil.db` inside `dir`.
    pub fn open(dir: &str) -> Result<Self, String> {
        let dir_path = Path::new(dir);
        std::fs::create_dir_all(dir_path).map_err(|e| e.to_string())?;
        let db_path = dir_path.join("gastoagil.db");
        log::debug!("session store path={:?}", db_path);
        let conn = Connection::open(&db_path).map_err(|e| e.to_string())?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory().map_err(|e| e.to_string())?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, String> {
        conn.execute_batch("CREATE TABLE IF NOT EXISTS config (key TEXT PRIMARY KEY, value TEXT);")
            .map_err(|e| e.to_string())?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_db<F, T>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self.conn.lock().map_err(|_| "Session store poisoned".to_string())?;
        f(&conn).map_err(|e| e.to_string())
    }

    pub fn config_get(&self, key: &str) -> Result<Option<String>, String> {
        self.with_db(|conn| {
            let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
            let mut rows = stmt.query(params![key])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(row.get(0)?));
            }
            Ok(None)
        })
    }

    pub fn config_set(&self, key: &str, value: &str) -> Result<(), String> {
        self.with_db(|conn| {
            conn.execute(
                "INSERT INTO config (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
            Ok(())
        })
    }

    pub fn config_remove(&self, key: &str) -> Result<(), String> {
        self.with_db(|conn| {
            conn.execute("DELETE FROM config WHERE key = ?1", params![key])?;
            Ok(())
        })
    }

    pub fn load(&self) -> Result<Option<Session>, String> {
        match self.config_get(SESSION_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| e.to_string()),
            None => Ok(None),
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), String> {
        let raw = serde_json::to_string(session).map_err(|e| e.to_string())?;
        self.config_set(SESSION_KEY, &raw)
    }

    pub fn clear(&self) -> Result<(), String> {
        self.config_remove(SESSION_KEY)
    }
}
