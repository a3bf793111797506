//! Alarm domain model
//!
//! The persisted alarm entity plus its value types: weekly repeat set,
//! alert type, dismissal type.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AlarmError, AlarmResult};

/// Opaque alarm identity (SQLite rowid). Zero means "not yet stored".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct AlarmId(pub i64);

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Day of week with ISO codes, Monday = 1 through Sunday = 7.
///
/// A domain enum rather than `chrono::Weekday` so the repeat set can be an
/// ordered set and serialize alongside the rest of the alarm.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// ISO weekday number, Monday = 1 … Sunday = 7
    pub fn iso_number(self) -> u8 {
        match self {
            Weekday::Monday => 1,
            Weekday::Tuesday => 2,
            Weekday::Wednesday => 3,
            Weekday::Thursday => 4,
            Weekday::Friday => 5,
            Weekday::Saturday => 6,
            Weekday::Sunday => 7,
        }
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// The set of weekdays an alarm repeats on. Empty means one-time.
///
/// Value type, compared by content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRepeat {
    days: BTreeSet<Weekday>,
}

impl WeeklyRepeat {
    /// One-time alarm (no repeat days)
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Self {
        Self {
            days: days.into_iter().collect(),
        }
    }

    pub fn everyday() -> Self {
        Self::new(Weekday::ALL)
    }

    pub fn is_repeating(&self) -> bool {
        !self.days.is_empty()
    }

    pub fn is_everyday(&self) -> bool {
        self.days.len() == Weekday::ALL.len()
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    pub fn days(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.days.iter().copied()
    }

    /// Earliest repeat day strictly after `day` in ISO order, if any
    pub fn first_after(&self, day: Weekday) -> Option<Weekday> {
        self.days.iter().copied().find(|d| *d > day)
    }

    /// Earliest repeat day in ISO order
    pub fn first(&self) -> Option<Weekday> {
        self.days.iter().next().copied()
    }
}

/// How the alarm alerts when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Sound,
    Vibrate,
    SoundAndVibrate,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertType::Sound => "sound",
            AlertType::Vibrate => "vibrate",
            AlertType::SoundAndVibrate => "sound_and_vibrate",
        };
        f.write_str(name)
    }
}

impl FromStr for AlertType {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sound" => Ok(AlertType::Sound),
            "vibrate" => Ok(AlertType::Vibrate),
            "sound_and_vibrate" => Ok(AlertType::SoundAndVibrate),
            other => Err(AlarmError::InvalidAlarm(format!(
                "unknown alert type '{other}'"
            ))),
        }
    }
}

/// How the user dismisses the alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissType {
    /// Recite the alarm's scripts aloud
    SayIt,
    /// Type the scripts
    Typing,
    /// Plain button press
    PushButton,
}

impl fmt::Display for DismissType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DismissType::SayIt => "say_it",
            DismissType::Typing => "typing",
            DismissType::PushButton => "push_button",
        };
        f.write_str(name)
    }
}

impl FromStr for DismissType {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "say_it" => Ok(DismissType::SayIt),
            "typing" => Ok(DismissType::Typing),
            "push_button" => Ok(DismissType::PushButton),
            other => Err(AlarmError::InvalidAlarm(format!(
                "unknown dismiss type '{other}'"
            ))),
        }
    }
}

/// A configured alarm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    /// Hour of day, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
    pub weekly_repeat: WeeklyRepeat,
    pub label: String,
    pub enabled: bool,
    pub alert_type: AlertType,
    /// Ringtone URI
    pub ringtone: String,
    pub dismiss_type: DismissType,
    /// Scripts to recite, in order, when `dismiss_type` is `SayIt`
    pub say_it_scripts: Vec<String>,
}

impl Alarm {
    /// Create an alarm at the given time of day with default settings.
    ///
    /// Rejects out-of-range hour/minute.
    pub fn new(hour: u8, minute: u8) -> AlarmResult<Self> {
        if hour > 23 {
            return Err(AlarmError::InvalidAlarm(format!("hour {hour} out of range")));
        }
        if minute > 59 {
            return Err(AlarmError::InvalidAlarm(format!(
                "minute {minute} out of range"
            )));
        }

        Ok(Self {
            id: AlarmId::default(),
            hour,
            minute,
            weekly_repeat: WeeklyRepeat::none(),
            label: String::new(),
            enabled: true,
            alert_type: AlertType::SoundAndVibrate,
            ringtone: String::new(),
            dismiss_type: DismissType::SayIt,
            say_it_scripts: Vec::new(),
        })
    }

    /// Time of day as a chrono value, seconds zeroed
    pub fn time_of_day(&self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }
}
