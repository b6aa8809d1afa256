use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// unit the user typed the duration in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Seconds,
    #[default]
    Minutes,
}

impl Unit {
    pub const ALL: [Self; 2] = [Self::Minutes, Self::Seconds];

    #[must_use]
    pub fn to_seconds(self, value: u32) -> u64 {
        match self {
            Self::Seconds => u64::from(value),
            Self::Minutes => u64::from(value) * 60,
        }
    }

    /// capitalized name, as shown in the unit selector
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Seconds => "Seconds",
            Self::Minutes => "Minutes",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds => write!(f, "seconds"),
            Self::Minutes => write!(f, "minutes"),
        }
    }
}

/// why a duration typed by the user was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("Invalid input. Please enter a number.")]
    NotANumber(String),
    #[error("Please enter a positive number.")]
    NotPositive(i32),
}

/// parses the duration text field, surrounding whitespace is ignored
pub fn parse_duration(raw: &str) -> Result<u32, InvalidInput> {
    let trimmed = raw.trim();
    let value = trimmed
        .parse::<i32>()
        .map_err(|_| InvalidInput::NotANumber(trimmed.to_string()))?;
    if value <= 0 {
        return Err(InvalidInput::NotPositive(value));
    }
    Ok(value.unsigned_abs())
}

/// formats seconds as `MM:SS`, minutes are not wrapped into hours
#[must_use]
pub fn format_countdown(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// state of the one alarm the controller owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Alarm {
    pub id: u64,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub armed: bool,
    /// the timeout fired, the countdown may still be finishing its last tick
    pub expired: bool,
    pub rings_at: Option<DateTime<Local>>,
}

impl Alarm {
    pub(crate) fn arm(&mut self, id: u64, total_seconds: u64) {
        *self = Self {
            id,
            remaining_seconds: total_seconds,
            total_seconds,
            armed: true,
            expired: false,
            rings_at: i64::try_from(total_seconds)
                .ok()
                .and_then(|secs| Local::now().checked_add_signed(chrono::Duration::seconds(secs))),
        };
    }

    /// whether `id` is the alarm currently counting down
    #[must_use]
    pub const fn is_current(&self, id: u64) -> bool {
        self.armed && self.id == id
    }

    /// takes one second off and returns what is left, or `None` once there is
    /// nothing left to count for alarm `id`
    ///
    /// an expired alarm keeps counting: the tick and the timeout aren't
    /// synchronized, so the last tick may come after the timeout
    pub(crate) fn tick(&mut self, id: u64) -> Option<u64> {
        if self.id != id || !(self.armed || self.expired) || self.remaining_seconds == 0 {
            return None;
        }
        self.remaining_seconds -= 1;
        Some(self.remaining_seconds)
    }

    /// returns false if alarm `id` was already superseded or expired
    pub(crate) fn expire(&mut self, id: u64) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.armed = false;
        self.expired = true;
        true
    }

    /// stops the alarm for good, no further ticks are counted
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
        self.expired = false;
    }
}
