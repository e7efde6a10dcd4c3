//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! four tables: `events`, `intervals`, `link_states` and `flow_samples`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{EventRow, FlowSampleRow, IntervalRow, LinkStateRow, OutputResult};

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS events (
                 tick      INTEGER NOT NULL,
                 time_secs INTEGER NOT NULL,
                 kind      TEXT    NOT NULL,
                 agent_id  INTEGER NOT NULL,
                 link_id   INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS intervals (
                 tick                INTEGER PRIMARY KEY,
                 time_secs           INTEGER NOT NULL,
                 vehicles_on_network INTEGER NOT NULL,
                 departed            INTEGER NOT NULL,
                 arrived             INTEGER NOT NULL,
                 stuck               INTEGER NOT NULL,
                 rejections          INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS link_states (
                 tick         INTEGER NOT NULL,
                 link_id      INTEGER NOT NULL,
                 vehicles     INTEGER NOT NULL,
                 occupied_pcu REAL    NOT NULL,
                 storage_pcu  REAL    NOT NULL,
                 discharged   REAL    NOT NULL,
                 flow_budget  REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS flow_samples (
                 tick             INTEGER NOT NULL,
                 mode_id          INTEGER NOT NULL,
                 number_of_agents INTEGER NOT NULL,
                 density          REAL    NOT NULL,
                 flow             REAL    NOT NULL,
                 speed_kmh        REAL    NOT NULL,
                 permanent        INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO events (tick, time_secs, kind, agent_id, link_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![row.tick, row.time_secs, row.kind, row.agent_id, row.link_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_interval(&mut self, row: &IntervalRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO intervals \
             (tick, time_secs, vehicles_on_network, departed, arrived, stuck, rejections) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                row.tick,
                row.time_secs,
                row.vehicles_on_network,
                row.departed,
                row.arrived,
                row.stuck,
                row.rejections,
            ],
        )?;
        Ok(())
    }

    fn write_link_states(&mut self, rows: &[LinkStateRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO link_states \
                 (tick, link_id, vehicles, occupied_pcu, storage_pcu, discharged, flow_budget) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.tick,
                    row.link_id,
                    row.vehicles,
                    row.occupied_pcu,
                    row.storage_pcu,
                    row.discharged,
                    row.flow_budget,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_flow_samples(&mut self, rows: &[FlowSampleRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO flow_samples \
                 (tick, mode_id, number_of_agents, density, flow, speed_kmh, permanent) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.tick,
                    row.mode_id,
                    row.number_of_agents,
                    row.density,
                    row.flow,
                    row.speed_kmh,
                    row.permanent as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
