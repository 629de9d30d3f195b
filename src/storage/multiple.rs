// Multi-kart sessions: session -> drivers -> laps

use log::{debug, info};
use rusqlite::params;

use crate::errors::KartTimerError;
use crate::storage::MultipleSessionStore;
use crate::storage::database::{
    Database, delete_by_id, insert_laps, insert_row, query_rows, read_error, write_error,
};
use crate::storage::types::{
    DriverRemoval, MultipleDriverEntry, MultipleLap, MultipleSession, NewMultipleSession,
};

const INSERT_SESSION: &str = "INSERT INTO multipleSessions (sessionName) VALUES (?1)";
const INSERT_DRIVER: &str =
    "INSERT INTO multipleDrivers (multipleSessionId, driverName, kartNumber) VALUES (?1, ?2, ?3)";
const INSERT_LAP: &str =
    "INSERT INTO multipleLaps (multipleDriverId, lapTime, lapNumber) VALUES (?1, ?2, ?3)";
const SELECT_SESSIONS: &str =
    "SELECT id, sessionName, createdAt FROM multipleSessions ORDER BY createdAt DESC, id DESC";
const SELECT_SESSION: &str = "SELECT id, sessionName, createdAt FROM multipleSessions WHERE id = ?1";
const SELECT_DRIVERS: &str = "SELECT id, driverName, kartNumber FROM multipleDrivers
    WHERE multipleSessionId = ?1 ORDER BY id ASC";
const SELECT_LAPS: &str = "SELECT id, lapTime, lapNumber FROM multipleLaps
    WHERE multipleDriverId = ?1 ORDER BY lapNumber ASC";
const DELETE_SESSION: &str = "DELETE FROM multipleSessions WHERE id = ?1";
const DELETE_DRIVER: &str = "DELETE FROM multipleDrivers WHERE id = ?1 AND multipleSessionId = ?2";
const COUNT_DRIVERS: &str = "SELECT COUNT(*) FROM multipleDrivers WHERE multipleSessionId = ?1";

impl Database {
    fn multiple_session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MultipleSession> {
        Ok(MultipleSession {
            id: row.get(0)?,
            session_name: row.get(1)?,
            created_at: row.get(2)?,
            drivers: Vec::new(),
        })
    }

    fn hydrate_multiple_session(
        &self,
        mut session: MultipleSession,
    ) -> Result<MultipleSession, KartTimerError> {
        let drivers = query_rows(
            &self.conn,
            "load multiple session drivers",
            SELECT_DRIVERS,
            params![session.id],
            |row| {
                Ok(MultipleDriverEntry {
                    id: row.get(0)?,
                    driver_name: row.get(1)?,
                    kart_number: row.get(2)?,
                    laps: Vec::new(),
                })
            },
        )?;

        session.drivers = drivers
            .into_iter()
            .map(|mut driver| {
                driver.laps = query_rows(
                    &self.conn,
                    "load multiple session laps",
                    SELECT_LAPS,
                    params![driver.id],
                    |row| {
                        Ok(MultipleLap {
                            id: row.get(0)?,
                            lap_time: row.get(1)?,
                            lap_number: row.get(2)?,
                        })
                    },
                )?;
                Ok(driver)
            })
            .collect::<Result<Vec<_>, KartTimerError>>()?;
        Ok(session)
    }
}

impl MultipleSessionStore for Database {
    fn create_multiple_session(
        &mut self,
        session: &NewMultipleSession,
    ) -> Result<i64, KartTimerError> {
        session.validate()?;

        let tx = self
            .conn
            .transaction()
            .map_err(write_error("begin multiple session transaction"))?;
        let session_id = insert_row(
            &tx,
            "insert multiple session",
            INSERT_SESSION,
            params![session.session_name],
        )?;
        for driver in &session.drivers {
            let driver_id = insert_row(
                &tx,
                "insert multiple session driver",
                INSERT_DRIVER,
                params![session_id, driver.driver_name, driver.kart_number],
            )?;
            insert_laps(&tx, INSERT_LAP, driver_id, &driver.laps)?;
        }
        tx.commit().map_err(write_error("commit multiple session"))?;

        info!(
            "Saved multiple session {} '{}' with {} drivers",
            session_id,
            session.session_name,
            session.drivers.len()
        );
        Ok(session_id)
    }

    fn list_multiple_sessions(&self) -> Result<Vec<MultipleSession>, KartTimerError> {
        let sessions = query_rows(
            &self.conn,
            "list multiple sessions",
            SELECT_SESSIONS,
            [],
            Self::multiple_session_from_row,
        )?;
        debug!("Loaded {} multiple sessions", sessions.len());

        sessions
            .into_iter()
            .map(|session| self.hydrate_multiple_session(session))
            .collect()
    }

    fn get_multiple_session(&self, id: i64) -> Result<Option<MultipleSession>, KartTimerError> {
        query_rows(
            &self.conn,
            "load multiple session",
            SELECT_SESSION,
            params![id],
            Self::multiple_session_from_row,
        )?
        .into_iter()
        .next()
        .map(|session| self.hydrate_multiple_session(session))
        .transpose()
    }

    fn delete_multiple_session(&mut self, id: i64) -> Result<bool, KartTimerError> {
        let removed = delete_by_id(&self.conn, "delete multiple session", DELETE_SESSION, id)?;
        if removed {
            info!("Deleted multiple session {}", id);
        }
        Ok(removed)
    }

    fn delete_multiple_driver(
        &mut self,
        session_id: i64,
        driver_id: i64,
    ) -> Result<DriverRemoval, KartTimerError> {
        let tx = self
            .conn
            .transaction()
            .map_err(write_error("begin driver removal"))?;

        let removed = tx
            .execute(DELETE_DRIVER, params![driver_id, session_id])
            .map_err(write_error("delete multiple session driver"))?;
        if removed == 0 {
            debug!("No driver {} in multiple session {}", driver_id, session_id);
            return Ok(DriverRemoval::NotFound);
        }

        let remaining: i64 = tx
            .query_row(COUNT_DRIVERS, params![session_id], |row| row.get(0))
            .map_err(read_error("count multiple session drivers"))?;
        let outcome = if remaining == 0 {
            tx.execute(DELETE_SESSION, params![session_id])
                .map_err(write_error("delete empty multiple session"))?;
            DriverRemoval::SessionRemoved
        } else {
            DriverRemoval::DriverRemoved
        };
        tx.commit().map_err(write_error("commit driver removal"))?;

        info!(
            "Removed driver {} from multiple session {} ({:?})",
            driver_id, session_id, outcome
        );
        Ok(outcome)
    }

    fn delete_all_multiple_sessions(&mut self) -> Result<usize, KartTimerError> {
        let removed = self
            .conn
            .execute("DELETE FROM multipleSessions", [])
            .map_err(write_error("delete all multiple sessions"))?;
        info!("Deleted {} multiple sessions", removed);
        Ok(removed)
    }
}
