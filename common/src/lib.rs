// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod schedule;
mod validation;

pub use schedule::{ActiveDays, DaysOfWeek, TimeOfDay, TimeWindow, WeekdayCode};
pub use validation::{
    MAX_TAG_NAME_LEN, MAX_TASK_NAME_LEN, MAX_USERNAME_LEN, ValidationError, resolve_total_hours,
    validate_tag_name, validate_task_name, validate_username,
};

/// A registered account. Identity and credentials live in the external
/// auth layer; this is the part tags and tasks point at.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    // Reference to an uploaded image, e.g. `avatars/alice.png`.
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user-owned category such as "Morning Routine" or "Work".
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub active_days: Option<ActiveDays>,
}

/// Whether a task runs for a bounded number of hours or indefinitely.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DurationType {
    Finite,
    // Habit-like tasks with no end.
    #[default]
    Infinite,
}

#[allow(clippy::doc_overindented_list_items)]
/// Represents a task within the system.
///
/// - `tags`: ids of the owner's tags attached to this task.
/// - `total_hours`: only set for `DurationType::Finite`.
/// - `created_at` / `updated_at`: managed by the store, never taken
///    from a payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<i64>,
    // Only the day matters, no timezone.
    pub start_date: NaiveDate,
    pub duration_type: DurationType,
    pub total_hours: Option<i64>,
    pub repeat_monthly: bool,
    pub days_of_week: Option<DaysOfWeek>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
pub struct CreateUserPayload {
    pub username: String,
    pub avatar: Option<String>,
}

/// Structure used to receive tag creation data from the API.
/// `active_days` stays raw JSON here so a malformed schedule can be reported
/// as a validation error instead of a generic body rejection.
#[derive(Deserialize, Debug, Default)]
pub struct CreateTagPayload {
    pub name: String,
    pub description: Option<String>,
    pub active_days: Option<serde_json::Value>,
}

/// Partial tag update. Absent fields are left unchanged; `"active_days": null`
/// clears the schedule.
#[derive(Deserialize, Debug, Default)]
pub struct UpdateTagPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub active_days: Option<serde_json::Value>,
}

/// Structure used to receive task creation data from the API.
#[derive(Deserialize, Debug, Default)]
pub struct CreateTaskPayload {
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<Vec<i64>>,
    // Defaults to the current day on the server side.
    pub start_date: Option<NaiveDate>,
    pub duration_type: Option<DurationType>,
    pub total_hours: Option<i64>,
    pub repeat_monthly: Option<bool>,
    pub days_of_week: Option<serde_json::Value>,
}

/// Partial task update. `tags`, when present, replaces the whole set.
#[derive(Deserialize, Debug, Default)]
pub struct UpdateTaskPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub start_date: Option<NaiveDate>,
    pub duration_type: Option<DurationType>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub total_hours: Option<Option<i64>>,
    pub repeat_monthly: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub days_of_week: Option<serde_json::Value>,
}

// Maps a present field (including an explicit `null`) to `Some`, so that
// `#[serde(default)]` alone is what produces `None` for an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
