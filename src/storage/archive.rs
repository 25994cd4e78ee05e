//! Archive of labeled batches: one CSV per batch under a timestamped name, indexed in SQLite with
//! label counts and a SHA-256 of the content.

use crate::record::LabelSummary;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

const INDEX_DB: &str = "index.db";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive io: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive index: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("invalid archive name: {0}")]
    InvalidName(String),
    #[error("archive index lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedBatch {
    pub name: String,
    pub created_at: i64,
    pub rows: usize,
    pub nap: usize,
    pub benign: usize,
    pub malicious: usize,
    pub sha256: String,
}

pub struct BatchArchive {
    dir: PathBuf,
    conn: Mutex<Connection>,
}

impl BatchArchive {
    /// Open or create the archive directory and its index.
    pub fn open(dir: &Path) -> Result<Self, ArchiveError> {
        fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(INDEX_DB))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS batches (
                name TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL,
                rows INTEGER NOT NULL,
                nap INTEGER NOT NULL,
                benign INTEGER NOT NULL,
                malicious INTEGER NOT NULL,
                sha256 TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_batches_created ON batches(created_at);
            "#,
        )?;
        Ok(Self {
            dir: dir.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `csv` as `classified_<UTC timestamp>.csv` and index it.
    pub fn store(&self, csv: &str, summary: &LabelSummary) -> Result<ArchivedBatch, ArchiveError> {
        let now = Utc::now();
        let conn = self.conn.lock().map_err(|_| ArchiveError::Poisoned)?;
        let name = self.next_name(&conn, &format!("classified_{}", now.format("%Y%m%d_%H%M%S")))?;

        // Write to a temp file first so a half-written batch never carries a listed name.
        let tmp = TempFile(self.dir.join(format!(".{name}.tmp")));
        {
            let mut f = fs::File::create(&tmp.0)?;
            f.write_all(csv.as_bytes())?;
            f.sync_all()?;
        }
        let path = self.dir.join(&name);
        fs::rename(&tmp.0, &path)?;

        let entry = ArchivedBatch {
            name,
            created_at: now.timestamp_millis(),
            rows: summary.rows,
            nap: summary.nap,
            benign: summary.benign,
            malicious: summary.malicious,
            sha256: hex::encode(Sha256::digest(csv.as_bytes())),
        };
        let indexed = conn.execute(
            "INSERT INTO batches (name, created_at, rows, nap, benign, malicious, sha256)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.name,
                entry.created_at,
                entry.rows as i64,
                entry.nap as i64,
                entry.benign as i64,
                entry.malicious as i64,
                entry.sha256
            ],
        );
        if let Err(e) = indexed {
            // An unindexed file could never be listed or read back.
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }
        Ok(entry)
    }

    /// `<stem>.csv`, or `<stem>_N.csv` where N continues from the names already indexed under
    /// this stem. Stray files on disk are stepped over.
    fn next_name(&self, conn: &Connection, stem: &str) -> Result<String, ArchiveError> {
        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM batches WHERE name = ?1 OR name LIKE ?2 ESCAPE '\\'",
            params![format!("{stem}.csv"), format!("{}\\_%.csv", stem.replace('_', "\\_"))],
            |row| row.get(0),
        )?;
        let mut n = taken;
        loop {
            let name = match n {
                0 => format!("{stem}.csv"),
                n => format!("{stem}_{n}.csv"),
            };
            if !self.dir.join(&name).exists() && !is_indexed(conn, &name)? {
                return Ok(name);
            }
            n += 1;
        }
    }

    /// Newest first.
    pub fn list(&self) -> Result<Vec<ArchivedBatch>, ArchiveError> {
        let conn = self.conn.lock().map_err(|_| ArchiveError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT name, created_at, rows, nap, benign, malicious, sha256
             FROM batches ORDER BY created_at DESC, name DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ArchivedBatch {
                name: row.get(0)?,
                created_at: row.get(1)?,
                rows: row.get::<_, i64>(2)? as usize,
                nap: row.get::<_, i64>(3)? as usize,
                benign: row.get::<_, i64>(4)? as usize,
                malicious: row.get::<_, i64>(5)? as usize,
                sha256: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Contents of an indexed batch; `None` if the name is not in the index.
    pub fn read(&self, name: &str) -> Result<Option<String>, ArchiveError> {
        if !is_plain_name(name) {
            return Err(ArchiveError::InvalidName(name.to_string()));
        }
        let known = {
            let conn = self.conn.lock().map_err(|_| ArchiveError::Poisoned)?;
            is_indexed(&conn, name)?
        };
        if !known {
            return Ok(None);
        }
        match fs::read_to_string(self.dir.join(name)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_indexed(conn: &Connection, name: &str) -> Result<bool, ArchiveError> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM batches WHERE name = ?1)",
        params![name],
        |row| row.get(0),
    )?)
}

/// Best-effort removal on drop; after a successful rename there is nothing left to remove.
struct TempFile(PathBuf);

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
