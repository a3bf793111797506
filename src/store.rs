//! Alarm store
//!
//! SQLite-backed persistence for alarms. The repeat set and script list are
//! stored as JSON columns; a saved alarm must load back with every field
//! identical.

use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::alarm::{Alarm, AlarmId, AlertType, DismissType, WeeklyRepeat};
use crate::error::{AlarmError, AlarmResult};

/// Source of alarms for the dismissal flow
#[async_trait]
pub trait AlarmRepository: Send + Sync {
    /// Load one alarm by id
    async fn alarm(&self, id: AlarmId) -> AlarmResult<Alarm>;
}

pub struct AlarmStore {
    db_path: PathBuf,
}

impl AlarmStore {
    pub fn open(db_path: PathBuf) -> AlarmResult<Self> {
        let store = Self { db_path };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> AlarmResult<()> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = self.connection()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS alarms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hour INTEGER NOT NULL,
                minute INTEGER NOT NULL,
                repeat_days TEXT NOT NULL,
                label TEXT NOT NULL,
                enabled INTEGER NOT NULL,
                alert_type TEXT NOT NULL,
                ringtone TEXT NOT NULL,
                dismiss_type TEXT NOT NULL,
                scripts TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn connection(&self) -> AlarmResult<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Insert a new alarm, returning its assigned id
    pub fn insert(&self, alarm: &Alarm) -> AlarmResult<AlarmId> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO alarms (hour, minute, repeat_days, label, enabled, alert_type, ringtone, dismiss_type, scripts)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                alarm.hour,
                alarm.minute,
                serde_json::to_string(&alarm.weekly_repeat)?,
                alarm.label,
                alarm.enabled,
                alarm.alert_type.to_string(),
                alarm.ringtone,
                alarm.dismiss_type.to_string(),
                serde_json::to_string(&alarm.say_it_scripts)?,
            ],
        )?;
        let id = AlarmId(conn.last_insert_rowid());
        debug!("stored alarm {} ({}:{:02})", id, alarm.hour, alarm.minute);
        Ok(id)
    }

    /// Overwrite an existing alarm
    pub fn update(&self, alarm: &Alarm) -> AlarmResult<()> {
        let conn = self.connection()?;
        let changed = conn.execute(
            "UPDATE alarms SET hour = ?, minute = ?, repeat_days = ?, label = ?, enabled = ?,
                    alert_type = ?, ringtone = ?, dismiss_type = ?, scripts = ?
             WHERE id = ?",
            params![
                alarm.hour,
                alarm.minute,
                serde_json::to_string(&alarm.weekly_repeat)?,
                alarm.label,
                alarm.enabled,
                alarm.alert_type.to_string(),
                alarm.ringtone,
                alarm.dismiss_type.to_string(),
                serde_json::to_string(&alarm.say_it_scripts)?,
                alarm.id.0,
            ],
        )?;
        if changed == 0 {
            return Err(AlarmError::NotFound(alarm.id));
        }
        Ok(())
    }

    pub fn get(&self, id: AlarmId) -> AlarmResult<Alarm> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                "SELECT id, hour, minute, repeat_days, label, enabled, alert_type, ringtone, dismiss_type, scripts
                 FROM alarms WHERE id = ?",
                params![id.0],
                AlarmRow::read,
            )
            .optional()?;

        match row {
            Some(row) => row.into_alarm(),
            None => Err(AlarmError::NotFound(id)),
        }
    }

    pub fn all(&self) -> AlarmResult<Vec<Alarm>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, hour, minute, repeat_days, label, enabled, alert_type, ringtone, dismiss_type, scripts
             FROM alarms ORDER BY hour, minute, id",
        )?;
        let rows = stmt.query_map([], AlarmRow::read)?;

        let mut alarms = Vec::new();
        for row in rows {
            alarms.push(row?.into_alarm()?);
        }
        Ok(alarms)
    }

    pub fn set_enabled(&self, id: AlarmId, enabled: bool) -> AlarmResult<()> {
        let conn = self.connection()?;
        let changed = conn.execute(
            "UPDATE alarms SET enabled = ? WHERE id = ?",
            params![enabled, id.0],
        )?;
        if changed == 0 {
            return Err(AlarmError::NotFound(id));
        }
        Ok(())
    }

    /// Remove an alarm. The caller is responsible for cancelling any
    /// pending wake-up registered for it.
    pub fn delete(&self, id: AlarmId) -> AlarmResult<()> {
        let conn = self.connection()?;
        let changed = conn.execute("DELETE FROM alarms WHERE id = ?", params![id.0])?;
        if changed == 0 {
            return Err(AlarmError::NotFound(id));
        }
        debug!("deleted alarm {}", id);
        Ok(())
    }
}

#[async_trait]
impl AlarmRepository for AlarmStore {
    async fn alarm(&self, id: AlarmId) -> AlarmResult<Alarm> {
        self.get(id)
    }
}

/// Raw row values, converted to the domain type outside the rusqlite closure
struct AlarmRow {
    id: i64,
    hour: u8,
    minute: u8,
    repeat_days: String,
    label: String,
    enabled: bool,
    alert_type: String,
    ringtone: String,
    dismiss_type: String,
    scripts: String,
}

impl AlarmRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            hour: row.get(1)?,
            minute: row.get(2)?,
            repeat_days: row.get(3)?,
            label: row.get(4)?,
            enabled: row.get(5)?,
            alert_type: row.get(6)?,
            ringtone: row.get(7)?,
            dismiss_type: row.get(8)?,
            scripts: row.get(9)?,
        })
    }

    fn into_alarm(self) -> AlarmResult<Alarm> {
        let mut alarm = Alarm::new(self.hour, self.minute)?;
        alarm.id = AlarmId(self.id);
        alarm.weekly_repeat = serde_json::from_str::<WeeklyRepeat>(&self.repeat_days)?;
        alarm.label = self.label;
        alarm.enabled = self.enabled;
        alarm.alert_type = AlertType::from_str(&self.alert_type)?;
        alarm.ringtone = self.ringtone;
        alarm.dismiss_type = DismissType::from_str(&self.dismiss_type)?;
        alarm.say_it_scripts = serde_json::from_str::<Vec<String>>(&self.scripts)?;
        Ok(alarm)
    }
}
