// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Security audit trail — append-only SQLite log of trust-layer events and
// the manual-review queue for implausible check-ins.
//
// Schema:
//   security_audit(
//     id         INTEGER PRIMARY KEY AUTOINCREMENT,
//     timestamp  TEXT    NOT NULL,   -- RFC 3339
//     action     TEXT    NOT NULL,   -- SecurityAction::as_str()
//     subject    TEXT    NOT NULL,   -- search hash or entity id, never plaintext
//     success    INTEGER NOT NULL,   -- 0 = failure / flagged, 1 = success
//     details    TEXT
//   )

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, Row, params};
use sentinella_core::error::{Result, SentinellaError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS security_audit (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp  TEXT    NOT NULL,
    action     TEXT    NOT NULL,
    subject    TEXT    NOT NULL,
    success    INTEGER NOT NULL,
    details    TEXT
);
CREATE INDEX IF NOT EXISTS security_audit_subject ON security_audit(subject);";

fn db_err(e: rusqlite::Error) -> SentinellaError {
    SentinellaError::Database(e.to_string())
}

/// Kinds of events the trust layer records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityAction {
    PiiEncrypt,
    PiiDecryptFailed,
    TokenIssued,
    TokenRejected,
    CheckinFlagged,
}

impl SecurityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PiiEncrypt => "pii_encrypt",
            Self::PiiDecryptFailed => "pii_decrypt_failed",
            Self::TokenIssued => "token_issued",
            Self::TokenRejected => "token_rejected",
            Self::CheckinFlagged => "checkin_flagged",
        }
    }
}

/// A single row of the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub subject: String,
    pub success: bool,
    pub details: Option<String>,
}

impl AuditEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            action: row.get(2)?,
            subject: row.get(3)?,
            success: row.get::<_, i32>(4)? != 0,
            details: row.get(5)?,
        })
    }
}

/// Append-only audit log backed by SQLite.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `path`, in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        debug!("audit log opened");
        Ok(Self { conn })
    }

    /// Open an in-memory audit database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self { conn })
    }

    /// Append one event. `subject` must already be non-identifying
    /// (a search hash, an entity id, a token nonce).
    #[instrument(skip(self, details), fields(action = action.as_str()))]
    pub fn record(
        &self,
        action: SecurityAction,
        subject: &str,
        success: bool,
        details: Option<&str>,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO security_audit (timestamp, action, subject, success, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    Utc::now().to_rfc3339(),
                    action.as_str(),
                    subject,
                    i32::from(success),
                    details
                ],
            )
            .map_err(db_err)?;
        debug!("audit entry recorded");
        Ok(())
    }

    /// All entries for `subject`, oldest first.
    pub fn entries_for_subject(&self, subject: &str) -> Result<Vec<AuditEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, subject, success, details
                 FROM security_audit
                 WHERE subject = ?1
                 ORDER BY id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![subject], AuditEntry::from_row)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Flagged check-ins awaiting manual review, newest first.
    pub fn flagged_checkins(&self, limit: u32) -> Result<Vec<AuditEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, subject, success, details
                 FROM security_audit
                 WHERE action = ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(
                params![SecurityAction::CheckinFlagged.as_str(), limit],
                AuditEntry::from_row,
            )
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<AuditEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, subject, success, details
                 FROM security_audit
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![limit], AuditEntry::from_row)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    pub fn count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM security_audit", [], |row| row.get(0))
            .map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_log() -> AuditLog {
        AuditLog::open_in_memory().expect("open in-memory audit log")
    }

    #[test]
    fn record_and_count() {
        let log = make_log();
        assert_eq!(log.count().unwrap(), 0);

        log.record(SecurityAction::PiiEncrypt, "abc123", true, None)
            .unwrap();
        log.record(SecurityAction::TokenIssued, "nonce-1", true, Some("stall 7"))
            .unwrap();

        assert_eq!(log.count().unwrap(), 2);
    }

    #[test]
    fn entries_for_subject() {
        let log = make_log();
        log.record(SecurityAction::PiiEncrypt, "aaa", true, None).unwrap();
        log.record(SecurityAction::TokenIssued, "bbb", true, None).unwrap();
        log.record(SecurityAction::PiiDecryptFailed, "aaa", false, Some("tag mismatch"))
            .unwrap();

        let entries = log.entries_for_subject("aaa").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "pii_encrypt");
        assert!(entries[0].success);
        assert_eq!(entries[1].action, "pii_decrypt_failed");
        assert!(!entries[1].success);
        assert_eq!(entries[1].details.as_deref(), Some("tag mismatch"));
    }

    #[test]
    fn review_queue_only_holds_flagged_checkins() {
        let log = make_log();
        log.record(SecurityAction::CheckinFlagged, "vendor-1", false, Some("412 km/h"))
            .unwrap();
        log.record(SecurityAction::TokenRejected, "vendor-1", false, Some("token expired"))
            .unwrap();
        log.record(SecurityAction::CheckinFlagged, "vendor-2", false, None)
            .unwrap();

        let flagged = log.flagged_checkins(10).unwrap();
        assert_eq!(flagged.len(), 2);
        assert_eq!(flagged[0].subject, "vendor-2");
        assert_eq!(flagged[1].subject, "vendor-1");
    }

    #[test]
    fn recent_entries_ordering() {
        let log = make_log();
        for i in 0..5 {
            log.record(SecurityAction::TokenIssued, &format!("nonce_{i}"), true, None)
                .unwrap();
        }

        let recent = log.recent_entries(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].id > recent[1].id);
        assert!(recent[1].id > recent[2].id);
    }

    #[test]
    fn file_backed_log_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");
        {
            let log = AuditLog::open(&path).unwrap();
            log.record(SecurityAction::TokenRejected, "n", false, None).unwrap();
        }
        let log = AuditLog::open(&path).unwrap();
        assert_eq!(log.count().unwrap(), 1);
    }
}
