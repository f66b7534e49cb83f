// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Weekly schedule values stored alongside tags and tasks.
//!
//! Both schedule kinds are mappings keyed by a three-letter weekday code.
//! A key that is present with `null` means "explicitly not active that
//! day"; a key that is absent means the same thing implicitly. The two
//! cases are kept apart so a stored schedule reads back exactly as written.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ValidationError;

/// One of the seven weekday keys (`mon` .. `sun`).
///
/// The declaration order matters: it drives `Ord`, so a `BTreeMap` keyed by
/// `WeekdayCode` always iterates Monday first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WeekdayCode {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl WeekdayCode {
    pub const ALL: [WeekdayCode; 7] = [
        WeekdayCode::Mon,
        WeekdayCode::Tue,
        WeekdayCode::Wed,
        WeekdayCode::Thu,
        WeekdayCode::Fri,
        WeekdayCode::Sat,
        WeekdayCode::Sun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeekdayCode::Mon => "mon",
            WeekdayCode::Tue => "tue",
            WeekdayCode::Wed => "wed",
            WeekdayCode::Thu => "thu",
            WeekdayCode::Fri => "fri",
            WeekdayCode::Sat => "sat",
            WeekdayCode::Sun => "sun",
        }
    }
}

impl fmt::Display for WeekdayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Weekday> for WeekdayCode {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => WeekdayCode::Mon,
            Weekday::Tue => WeekdayCode::Tue,
            Weekday::Wed => WeekdayCode::Wed,
            Weekday::Thu => WeekdayCode::Thu,
            Weekday::Fri => WeekdayCode::Fri,
            Weekday::Sat => WeekdayCode::Sat,
            Weekday::Sun => WeekdayCode::Sun,
        }
    }
}

impl From<WeekdayCode> for Weekday {
    fn from(code: WeekdayCode) -> Self {
        match code {
            WeekdayCode::Mon => Weekday::Mon,
            WeekdayCode::Tue => Weekday::Tue,
            WeekdayCode::Wed => Weekday::Wed,
            WeekdayCode::Thu => Weekday::Thu,
            WeekdayCode::Fri => Weekday::Fri,
            WeekdayCode::Sat => Weekday::Sat,
            WeekdayCode::Sun => Weekday::Sun,
        }
    }
}

/// A time of day written as `"HH:MM"` (or `"HH:MM:SS"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    /// Convenience constructor, `None` when the hour or minute is out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map(Self)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.second() == 0 {
            write!(f, "{}", self.0.format("%H:%M"))
        } else {
            write!(f, "{}", self.0.format("%H:%M:%S"))
        }
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|_| {
            serde::de::Error::custom(format!("invalid time of day {raw:?}, expected HH:MM"))
        })
    }
}

/// An activity window, serialized as a two-element array `["06:00", "10:00"]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow(pub TimeOfDay, pub TimeOfDay);

impl TimeWindow {
    pub fn start(&self) -> TimeOfDay {
        self.0
    }

    pub fn end(&self) -> TimeOfDay {
        self.1
    }
}

/// Weekly activity windows of a tag.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ActiveDays(pub BTreeMap<WeekdayCode, Option<TimeWindow>>);

impl ActiveDays {
    /// Parses a client-supplied JSON value, naming `active_days` in the error.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(|e| ValidationError::Schedule {
            field: "active_days",
            reason: e.to_string(),
        })
    }

    pub fn window_on(&self, day: WeekdayCode) -> Option<TimeWindow> {
        self.0.get(&day).copied().flatten()
    }

    pub fn active_weekdays(&self) -> Vec<WeekdayCode> {
        self.0
            .iter()
            .filter_map(|(day, window)| window.map(|_| *day))
            .collect()
    }
}

/// Weekly execution times of a task.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct DaysOfWeek(pub BTreeMap<WeekdayCode, Option<TimeOfDay>>);

impl DaysOfWeek {
    /// Parses a client-supplied JSON value, naming `days_of_week` in the error.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(|e| ValidationError::Schedule {
            field: "days_of_week",
            reason: e.to_string(),
        })
    }

    pub fn time_on(&self, day: WeekdayCode) -> Option<TimeOfDay> {
        self.0.get(&day).copied().flatten()
    }

    pub fn active_weekdays(&self) -> Vec<WeekdayCode> {
        self.0
            .iter()
            .filter_map(|(day, time)| time.map(|_| *day))
            .collect()
    }
}
