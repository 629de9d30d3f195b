// Single-driver sessions and their laps

use log::{debug, info};
use rusqlite::params;

use crate::errors::KartTimerError;
use crate::storage::SessionStore;
use crate::storage::database::{
    Database, delete_by_id, insert_laps, insert_row, query_rows, write_error,
};
use crate::storage::types::{Lap, NewSession, Session, WeatherCondition};

const INSERT_SESSION: &str =
    "INSERT INTO sessions (sessionName, driverName, kartNumber, isWet) VALUES (?1, ?2, ?3, ?4)";
const INSERT_LAP: &str = "INSERT INTO laps (sessionId, lapTime, lapNumber) VALUES (?1, ?2, ?3)";
const SELECT_SESSIONS: &str = "SELECT id, sessionName, driverName, kartNumber, isWet, createdAt
    FROM sessions ORDER BY createdAt DESC, id DESC LIMIT ?1";
const SELECT_SESSION: &str = "SELECT id, sessionName, driverName, kartNumber, isWet, createdAt
    FROM sessions WHERE id = ?1";
const SELECT_LAPS: &str =
    "SELECT id, lapTime, lapNumber FROM laps WHERE sessionId = ?1 ORDER BY lapNumber ASC";
const DELETE_SESSION: &str = "DELETE FROM sessions WHERE id = ?1";

impl Database {
    fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
        Ok(Session {
            id: row.get(0)?,
            session_name: row.get(1)?,
            driver_name: row.get(2)?,
            kart_number: row.get(3)?,
            weather: WeatherCondition::from_code(row.get::<_, Option<i64>>(4)?.unwrap_or(0)),
            created_at: row.get(5)?,
            laps: Vec::new(),
        })
    }

    fn hydrate_session(&self, mut session: Session) -> Result<Session, KartTimerError> {
        session.laps = query_rows(
            &self.conn,
            "load session laps",
            SELECT_LAPS,
            params![session.id],
            |row| {
                Ok(Lap {
                    id: row.get(0)?,
                    lap_time: row.get(1)?,
                    lap_number: row.get(2)?,
                })
            },
        )?;
        Ok(session)
    }
}

impl SessionStore for Database {
    fn create_session(&mut self, session: &NewSession) -> Result<i64, KartTimerError> {
        session.validate()?;

        let tx = self
            .conn
            .transaction()
            .map_err(write_error("begin session transaction"))?;
        let session_id = insert_row(
            &tx,
            "insert session",
            INSERT_SESSION,
            params![
                session.session_name,
                session.driver_name,
                session.kart_number,
                session.weather.code()
            ],
        )?;
        insert_laps(&tx, INSERT_LAP, session_id, &session.laps)?;
        tx.commit().map_err(write_error("commit session"))?;

        info!(
            "Saved session {} '{}' for {} with {} laps",
            session_id,
            session.session_name,
            session.driver_name,
            session.laps.len()
        );
        Ok(session_id)
    }

    fn list_sessions(&self) -> Result<Vec<Session>, KartTimerError> {
        let sessions = query_rows(
            &self.conn,
            "list sessions",
            SELECT_SESSIONS,
            params![self.session_list_limit as i64],
            Self::session_from_row,
        )?;
        debug!("Loaded {} sessions", sessions.len());

        sessions
            .into_iter()
            .map(|session| self.hydrate_session(session))
            .collect()
    }

    fn get_session(&self, id: i64) -> Result<Option<Session>, KartTimerError> {
        let session = query_rows(
            &self.conn,
            "load session",
            SELECT_SESSION,
            params![id],
            Self::session_from_row,
        )?
        .into_iter()
        .next();

        session.map(|s| self.hydrate_session(s)).transpose()
    }

    fn delete_session(&mut self, id: i64) -> Result<bool, KartTimerError> {
        let removed = delete_by_id(&self.conn, "delete session", DELETE_SESSION, id)?;
        if removed {
            info!("Deleted session {}", id);
        } else {
            debug!("No session {} to delete", id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::count_rows;

    fn practice(name: &str, laps: Vec<f64>) -> NewSession {
        NewSession {
            session_name: name.to_string(),
            driver_name: "Alice".to_string(),
            kart_number: "7".to_string(),
            weather: WeatherCondition::Dry,
            laps,
        }
    }

    #[test]
    fn test_create_and_list_round_trip() {
        let mut db = Database::open_in_memory().unwrap();
        let input = NewSession {
            weather: WeatherCondition::Greasy,
            ..practice("Practice", vec![31.2, 30.9, 31.5])
        };

        let id = db.create_session(&input).unwrap();
        let sessions = db.list_sessions().unwrap();

        assert_eq!(sessions.len(), 1);
        let stored = &sessions[0];
        assert_eq!(stored.id, id);
        assert_eq!(stored.session_name, "Practice");
        assert_eq!(stored.driver_name, "Alice");
        assert_eq!(stored.kart_number, "7");
        assert_eq!(stored.weather, WeatherCondition::Greasy);
        let times: Vec<f64> = stored.laps.iter().map(|l| l.lap_time).collect();
        assert_eq!(times, vec![31.2, 30.9, 31.5]);
        let numbers: Vec<u32> = stored.laps.iter().map(|l| l.lap_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_most_recent_session_listed_first() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_session(&practice("Morning", vec![33.0])).unwrap();
        db.create_session(&practice("Afternoon", vec![32.0])).unwrap();
        let latest = db
            .create_session(&practice("Practice", vec![31.2, 30.9, 31.5]))
            .unwrap();

        let sessions = db.list_sessions().unwrap();
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].id, latest);
        assert_eq!(sessions[0].session_name, "Practice");
        assert_eq!(sessions[2].session_name, "Morning");
    }

    #[test]
    fn test_list_honors_limit() {
        let mut db = Database::open_in_memory().unwrap().with_session_list_limit(3);
        for i in 0..5 {
            db.create_session(&practice(&format!("Run {}", i), vec![30.0]))
                .unwrap();
        }

        let sessions = db.list_sessions().unwrap();
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].session_name, "Run 4");
    }

    #[test]
    fn test_delete_cascades_to_laps() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db
            .create_session(&practice("Practice", vec![31.2, 30.9, 31.5]))
            .unwrap();
        let kept = db.create_session(&practice("Other", vec![32.0])).unwrap();

        assert!(db.delete_session(id).unwrap());

        assert_eq!(
            count_rows(&db.conn, "SELECT COUNT(*) FROM laps WHERE sessionId = ?1", id),
            0
        );
        assert_eq!(
            count_rows(&db.conn, "SELECT COUNT(*) FROM laps WHERE sessionId = ?1", kept),
            1
        );
        let sessions = db.list_sessions().unwrap();
        assert!(sessions.iter().all(|s| s.id != id));
    }

    #[test]
    fn test_delete_missing_session() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(!db.delete_session(99).unwrap());
    }

    #[test]
    fn test_get_session() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db.create_session(&practice("Practice", vec![31.2])).unwrap();

        let session = db.get_session(id).unwrap().unwrap();
        assert_eq!(session.laps.len(), 1);
        assert!(db.get_session(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_session_without_laps() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db.create_session(&practice("Warmup", vec![])).unwrap();
        let session = db.get_session(id).unwrap().unwrap();
        assert!(session.laps.is_empty());
    }

    #[test]
    fn test_invalid_session_rejected_before_storage() {
        let mut db = Database::open_in_memory().unwrap();
        let result = db.create_session(&practice("", vec![31.0]));

        assert!(matches!(
            result,
            Err(KartTimerError::ConstraintViolation { .. })
        ));
        assert!(db.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_failed_lap_insert_rolls_back_session() {
        let mut db = Database::open_in_memory().unwrap();
        db.conn
            .execute_batch(
                "CREATE TRIGGER reject_slow_laps BEFORE INSERT ON laps
                 WHEN NEW.lapTime > 1000
                 BEGIN SELECT RAISE(ABORT, 'lap too slow'); END;",
            )
            .unwrap();

        let result = db.create_session(&practice("Broken", vec![31.0, 5000.0]));

        match result {
            Err(err @ KartTimerError::WriteFailed { .. }) => assert!(err.is_retryable()),
            other => panic!("expected WriteFailed, got {:?}", other),
        }
        assert!(db.list_sessions().unwrap().is_empty());
        assert_eq!(
            count_rows(&db.conn, "SELECT COUNT(*) FROM laps WHERE lapTime > ?1", 0),
            0
        );
    }
}
