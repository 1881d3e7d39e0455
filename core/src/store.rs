//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The orchestrator never touches SQL; the host persists what it drains.

use crate::{
    error::SimResult,
    event::EventLogEntry,
    persistence::WorkerRecord,
    types::Day,
};
use rusqlite::{params, Connection, OptionalExtension};

pub struct StaffStore {
    conn: Connection,
}

impl StaffStore {
    /// Open (or create) the simulation database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str, started_at: i64) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, started_at],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, day, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.run_id, entry.day as i64, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    pub fn events_for_day(&self, run_id: &str, day: Day) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, day, event_type, payload
             FROM event_log WHERE run_id = ?1 AND day = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, day as i64], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    day:        row.get::<_, i64>(2)? as u64,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> SimResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    // ── Roster snapshots ───────────────────────────────────────

    pub fn save_roster(&self, run_id: &str, day: Day, records: &[WorkerRecord]) -> SimResult<()> {
        let json = serde_json::to_string(records)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO roster_snapshot (run_id, day, records_json) VALUES (?1, ?2, ?3)",
            params![run_id, day as i64, json],
        )?;
        Ok(())
    }

    /// The most recent snapshot at or before `day`.
    pub fn latest_roster(&self, run_id: &str, day: Day) -> SimResult<Option<(Day, Vec<WorkerRecord>)>> {
        let row = self
            .conn
            .query_row(
                "SELECT day, records_json FROM roster_snapshot
                 WHERE run_id = ?1 AND day <= ?2
                 ORDER BY day DESC LIMIT 1",
                params![run_id, day as i64],
                |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match row {
            Some((day, json)) => Ok(Some((day, serde_json::from_str(&json)?))),
            None => Ok(None),
        }
    }
}
