// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::{StoreError, StoreResult, is_foreign_key_violation};

use std::collections::{BTreeSet, HashMap};

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::{
    CreateTaskPayload, DaysOfWeek, DurationType, Task, UpdateTaskPayload, resolve_total_hours,
    validate_task_name,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

const TASK_COLUMNS: &str = "id, user_id, name, description, start_date, duration_type, total_hours, repeat_monthly, days_of_week, created_at, updated_at";

/// A `tasks` row as stored. Tag links live in `task_tags` and are loaded
/// separately.
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    user_id: i64,
    name: String,
    description: String,
    start_date: NaiveDate,
    duration_type: DurationType,
    total_hours: Option<i64>,
    repeat_monthly: bool,
    days_of_week: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRow {
    fn into_task(self, tags: Vec<i64>) -> anyhow::Result<Task> {
        let days_of_week = self
            .days_of_week
            .as_deref()
            .map(serde_json::from_str::<DaysOfWeek>)
            .transpose()
            .with_context(|| format!("Corrupt days_of_week stored for task {}", self.id))?;

        Ok(Task {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            tags,
            start_date: self.start_date,
            duration_type: self.duration_type,
            total_hours: self.total_hours,
            repeat_monthly: self.repeat_monthly,
            days_of_week,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_days_of_week(value: Option<serde_json::Value>) -> StoreResult<Option<DaysOfWeek>> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => Ok(Some(DaysOfWeek::from_json(value)?)),
    }
}

fn encode_days_of_week(days_of_week: Option<&DaysOfWeek>) -> anyhow::Result<Option<String>> {
    days_of_week
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to serialize days_of_week")
}

/// The timestamp to record for a modification made after `previous`.
/// Always later than `previous`, even if the clock has not moved on.
fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Checks that every tag id belongs to `user_id`; returns them deduplicated
/// and sorted.
async fn ensure_tags_owned(
    conn: &mut SqliteConnection,
    user_id: i64,
    tag_ids: &[i64],
) -> StoreResult<Vec<i64>> {
    let unique: BTreeSet<i64> = tag_ids.iter().copied().collect();
    for &tag_id in &unique {
        let owned: Option<i64> = sqlx::query_scalar("SELECT id FROM tags WHERE id = ? AND user_id = ?")
            .bind(tag_id)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to check tag ownership")?;
        if owned.is_none() {
            return Err(StoreError::NotFound {
                entity: "Tag",
                id: tag_id,
            });
        }
    }
    Ok(unique.into_iter().collect())
}

async fn replace_task_tags(
    conn: &mut SqliteConnection,
    task_id: i64,
    tag_ids: &[i64],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM task_tags WHERE task_id = ?")
        .bind(task_id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear task tags")?;

    for &tag_id in tag_ids {
        sqlx::query("INSERT INTO task_tags (task_id, tag_id) VALUES (?, ?)")
            .bind(task_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .context("Failed to link tag to task")?;
    }
    Ok(())
}

async fn load_tag_ids(conn: &mut SqliteConnection, task_id: i64) -> anyhow::Result<Vec<i64>> {
    sqlx::query_scalar("SELECT tag_id FROM task_tags WHERE task_id = ? ORDER BY tag_id ASC")
        .bind(task_id)
        .fetch_all(conn)
        .await
        .context("Failed to retrieve task tags from DB")
}

async fn fetch_owned_task(
    conn: &mut SqliteConnection,
    user_id: i64,
    task_id: i64,
) -> StoreResult<Task> {
    let row = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND user_id = ?"
    ))
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to retrieve task from DB")?
    .ok_or(StoreError::NotFound {
        entity: "Task",
        id: task_id,
    })?;

    let tags = load_tag_ids(conn, task_id).await?;
    Ok(row.into_task(tags)?)
}

/// Inserts a new task owned by `user_id`, together with its tag links.
pub async fn create_task_in_db(
    pool: &SqlitePool,
    user_id: i64,
    payload: CreateTaskPayload,
) -> StoreResult<Task> {
    let name = validate_task_name(&payload.name)?;
    let duration_type = payload.duration_type.unwrap_or_default();
    let total_hours = resolve_total_hours(duration_type, payload.total_hours)?;
    let days_of_week = parse_days_of_week(payload.days_of_week)?;
    let description = payload.description.unwrap_or_default();
    let repeat_monthly = payload.repeat_monthly.unwrap_or(false);

    let now = Utc::now();
    let start_date = payload.start_date.unwrap_or_else(|| now.date_naive());

    debug!(
        "Insert values: user_id={}, name={}, start_date={}, duration_type={:?}, total_hours={:?}, days_of_week={:?}",
        user_id, name, start_date, duration_type, total_hours, days_of_week
    );

    // Writers take the lock up front so concurrent ones queue on the busy
    // timeout instead of failing to upgrade a read lock.
    let mut tx = pool
        .begin_with("BEGIN IMMEDIATE")
        .await
        .context("Failed to begin transaction")?;

    let tags = match payload.tags {
        Some(ids) => ensure_tags_owned(&mut tx, user_id, &ids).await?,
        None => Vec::new(),
    };

    let id = sqlx::query(
        "INSERT INTO tasks (user_id, name, description, start_date, duration_type, total_hours, repeat_monthly, days_of_week, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&name)
    .bind(&description)
    .bind(start_date)
    .bind(duration_type)
    .bind(total_hours)
    .bind(repeat_monthly)
    .bind(encode_days_of_week(days_of_week.as_ref())?)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            StoreError::NotFound {
                entity: "User",
                id: user_id,
            }
        } else {
            StoreError::Internal(anyhow::Error::new(e).context("Failed to insert task into DB"))
        }
    })?
    .last_insert_rowid();

    replace_task_tags(&mut tx, id, &tags).await?;
    tx.commit().await.context("Failed to commit new task")?;

    Ok(Task {
        id,
        user_id,
        name,
        description,
        tags,
        start_date,
        duration_type,
        total_hours,
        repeat_monthly,
        days_of_week,
        created_at: now,
        updated_at: now,
    })
}

/// Lists a user's tasks by start date, optionally only those carrying `tag_id`.
pub async fn list_tasks_from_db(
    pool: &SqlitePool,
    user_id: i64,
    tag_id: Option<i64>,
) -> StoreResult<Vec<Task>> {
    let rows = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.user_id = ? \
         AND (? IS NULL OR EXISTS (SELECT 1 FROM task_tags tt WHERE tt.task_id = t.id AND tt.tag_id = ?)) \
         ORDER BY t.start_date ASC, t.id ASC"
    ))
    .bind(user_id)
    .bind(tag_id)
    .bind(tag_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve tasks from DB")?;

    let links: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT tt.task_id, tt.tag_id FROM task_tags tt JOIN tasks t ON t.id = tt.task_id WHERE t.user_id = ? ORDER BY tt.task_id ASC, tt.tag_id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve task tags from DB")?;

    let mut tags_by_task: HashMap<i64, Vec<i64>> = HashMap::new();
    for (task_id, tag_id) in links {
        tags_by_task.entry(task_id).or_default().push(tag_id);
    }

    let tasks = rows
        .into_iter()
        .map(|row| {
            let tags = tags_by_task.remove(&row.id).unwrap_or_default();
            row.into_task(tags)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Fetches one task. Another user's task is reported as not found.
pub async fn get_task_from_db(pool: &SqlitePool, user_id: i64, task_id: i64) -> StoreResult<Task> {
    let mut conn = pool
        .acquire()
        .await
        .context("Failed to acquire a DB connection")?;
    fetch_owned_task(&mut conn, user_id, task_id).await
}

/// Applies a partial update to a task owned by `user_id` and refreshes
/// `updated_at`. The duration rules are checked against the merged result.
pub async fn update_task_in_db(
    pool: &SqlitePool,
    user_id: i64,
    task_id: i64,
    payload: UpdateTaskPayload,
) -> StoreResult<Task> {
    debug!("Attempting to update task with ID: {}", task_id);

    let mut tx = pool
        .begin_with("BEGIN IMMEDIATE")
        .await
        .context("Failed to begin transaction")?;
    let mut task = fetch_owned_task(&mut tx, user_id, task_id).await?;

    if let Some(name) = payload.name {
        task.name = validate_task_name(&name)?;
    }
    if let Some(description) = payload.description {
        task.description = description;
    }
    if let Some(start_date) = payload.start_date {
        task.start_date = start_date;
    }
    if let Some(repeat_monthly) = payload.repeat_monthly {
        task.repeat_monthly = repeat_monthly;
    }

    let duration_type = payload.duration_type.unwrap_or(task.duration_type);
    let requested_hours = payload.total_hours.unwrap_or(task.total_hours);
    task.total_hours = resolve_total_hours(duration_type, requested_hours)?;
    task.duration_type = duration_type;

    if let Some(value) = payload.days_of_week {
        task.days_of_week = parse_days_of_week(Some(value))?;
    }

    if let Some(ids) = payload.tags {
        task.tags = ensure_tags_owned(&mut tx, user_id, &ids).await?;
        replace_task_tags(&mut tx, task_id, &task.tags).await?;
    }

    task.updated_at = next_updated_at(task.updated_at);

    sqlx::query(
        "UPDATE tasks SET name = ?, description = ?, start_date = ?, duration_type = ?, total_hours = ?, repeat_monthly = ?, days_of_week = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&task.name)
    .bind(&task.description)
    .bind(task.start_date)
    .bind(task.duration_type)
    .bind(task.total_hours)
    .bind(task.repeat_monthly)
    .bind(encode_days_of_week(task.days_of_week.as_ref())?)
    .bind(task.updated_at)
    .bind(task_id)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("Failed to update task with ID: {task_id}"))?;

    tx.commit().await.context("Failed to commit task update")?;

    info!("Task with ID {} updated successfully.", task_id);
    Ok(task)
}

/// Deletes a task and its tag links.
pub async fn delete_task_from_db(pool: &SqlitePool, user_id: i64, task_id: i64) -> StoreResult<()> {
    debug!("Attempting to delete task with ID: {}", task_id);

    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
        .bind(task_id)
        .bind(user_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete task with ID: {task_id}"))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: "Task",
            id: task_id,
        });
    }

    info!("Deleted task with ID: {}", task_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{
        create_tag_in_db, create_test_user, establish_connection_pool, setup_test_db,
    };
    use common::{CreateTagPayload, TimeOfDay, ValidationError, WeekdayCode};
    use serde_json::json;

    fn workout() -> CreateTaskPayload {
        CreateTaskPayload {
            name: "Workout".to_string(),
            duration_type: Some(DurationType::Finite),
            total_hours: Some(10),
            days_of_week: Some(json!({"mon": "06:00", "wed": "06:00"})),
            ..Default::default()
        }
    }

    async fn create_tag(pool: &SqlitePool, user_id: i64, name: &str) -> i64 {
        create_tag_in_db(
            pool,
            user_id,
            CreateTagPayload {
                name: name.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_create_finite_task_with_schedule() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;

        let created = create_task_in_db(&pool, alice.id, workout()).await.unwrap();
        assert_eq!(created.total_hours, Some(10));
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.start_date, Utc::now().date_naive());
        assert!(!created.repeat_monthly);

        let fetched = get_task_from_db(&pool, alice.id, created.id).await.unwrap();
        assert_eq!(fetched, created);

        let days = fetched.days_of_week.unwrap();
        assert_eq!(days.0.len(), 2);
        assert_eq!(days.time_on(WeekdayCode::Mon), TimeOfDay::from_hm(6, 0));
        assert_eq!(days.time_on(WeekdayCode::Wed), TimeOfDay::from_hm(6, 0));
        // Omitted days stay absent rather than showing up as null.
        assert!(!days.0.contains_key(&WeekdayCode::Sun));
    }

    #[tokio::test]
    async fn test_infinite_task_without_total_hours() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;

        let task = create_task_in_db(
            &pool,
            alice.id,
            CreateTaskPayload {
                name: "Meditate".to_string(),
                duration_type: Some(DurationType::Infinite),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(task.duration_type, DurationType::Infinite);
        assert_eq!(task.total_hours, None);
        assert!(task.days_of_week.is_none());
    }

    #[tokio::test]
    async fn test_finite_task_requires_total_hours() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;

        let err = create_task_in_db(
            &pool,
            alice.id,
            CreateTaskPayload {
                total_hours: None,
                ..workout()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::MissingTotalHours)
        ));

        let err = create_task_in_db(
            &pool,
            alice.id,
            CreateTaskPayload {
                total_hours: Some(-4),
                ..workout()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::NonPositiveTotalHours(-4))
        ));

        assert!(list_tasks_from_db(&pool, alice.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_task_rejects_foreign_tag() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let bobs_tag = create_tag(&pool, bob.id, "Work").await;

        let err = create_task_in_db(
            &pool,
            alice.id,
            CreateTaskPayload {
                tags: Some(vec![bobs_tag]),
                ..workout()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Tag", id } if id == bobs_tag));

        // Nothing half-written.
        assert!(list_tasks_from_db(&pool, alice.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_tag_ids_are_linked_once() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;
        let work = create_tag(&pool, alice.id, "Work").await;
        let health = create_tag(&pool, alice.id, "Health").await;

        let task = create_task_in_db(
            &pool,
            alice.id,
            CreateTaskPayload {
                tags: Some(vec![health, work, health]),
                ..workout()
            },
        )
        .await
        .unwrap();

        let mut expected = vec![work, health];
        expected.sort();
        assert_eq!(task.tags, expected);
        assert_eq!(
            get_task_from_db(&pool, alice.id, task.id).await.unwrap().tags,
            expected
        );
    }

    #[tokio::test]
    async fn test_update_task_refreshes_updated_at() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;
        let created = create_task_in_db(&pool, alice.id, workout()).await.unwrap();

        let first = update_task_in_db(
            &pool,
            alice.id,
            created.id,
            UpdateTaskPayload {
                name: Some("Morning workout".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let second = update_task_in_db(&pool, alice.id, created.id, UpdateTaskPayload::default())
            .await
            .unwrap();

        assert_eq!(first.created_at, created.created_at);
        assert!(first.created_at <= first.updated_at);
        assert!(first.updated_at > created.updated_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.name, "Morning workout");

        let stored = get_task_from_db(&pool, alice.id, created.id).await.unwrap();
        assert_eq!(stored.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn test_update_task_duration_rules() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;
        let task = create_task_in_db(&pool, alice.id, workout()).await.unwrap();

        // Switching to infinite drops the hours.
        let task = update_task_in_db(
            &pool,
            alice.id,
            task.id,
            UpdateTaskPayload {
                duration_type: Some(DurationType::Infinite),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(task.total_hours, None);

        // Back to finite without hours is refused.
        let err = update_task_in_db(
            &pool,
            alice.id,
            task.id,
            UpdateTaskPayload {
                duration_type: Some(DurationType::Finite),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::MissingTotalHours)
        ));

        let task = update_task_in_db(
            &pool,
            alice.id,
            task.id,
            UpdateTaskPayload {
                duration_type: Some(DurationType::Finite),
                total_hours: Some(Some(20)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(task.total_hours, Some(20));

        // Clearing the hours of a finite task is refused too.
        assert!(update_task_in_db(
            &pool,
            alice.id,
            task.id,
            UpdateTaskPayload {
                total_hours: Some(None),
                ..Default::default()
            },
        )
        .await
        .is_err());
    }

    #[tokio::test]
    async fn test_update_task_schedule_and_tags() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;
        let work = create_tag(&pool, alice.id, "Work").await;
        let health = create_tag(&pool, alice.id, "Health").await;
        let task = create_task_in_db(
            &pool,
            alice.id,
            CreateTaskPayload {
                tags: Some(vec![work]),
                ..workout()
            },
        )
        .await
        .unwrap();

        let updated = update_task_in_db(
            &pool,
            alice.id,
            task.id,
            UpdateTaskPayload {
                tags: Some(vec![health]),
                days_of_week: Some(json!({"fri": "18:30", "sun": null})),
                repeat_monthly: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.tags, vec![health]);
        assert!(updated.repeat_monthly);
        let days = updated.days_of_week.clone().unwrap();
        assert_eq!(days.time_on(WeekdayCode::Fri), TimeOfDay::from_hm(18, 30));
        assert_eq!(days.0.get(&WeekdayCode::Sun), Some(&None));
        assert!(!days.0.contains_key(&WeekdayCode::Mon));
        assert_eq!(get_task_from_db(&pool, alice.id, task.id).await.unwrap(), updated);

        let cleared = update_task_in_db(
            &pool,
            alice.id,
            task.id,
            UpdateTaskPayload {
                days_of_week: Some(serde_json::Value::Null),
                tags: Some(Vec::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(cleared.days_of_week.is_none());
        assert!(cleared.tags.is_empty());
    }

    #[tokio::test]
    async fn test_other_users_task_is_not_found() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let task = create_task_in_db(&pool, alice.id, workout()).await.unwrap();

        assert!(matches!(
            get_task_from_db(&pool, bob.id, task.id).await,
            Err(StoreError::NotFound { entity: "Task", .. })
        ));
        assert!(matches!(
            update_task_in_db(&pool, bob.id, task.id, UpdateTaskPayload::default()).await,
            Err(StoreError::NotFound { entity: "Task", .. })
        ));
        assert!(matches!(
            delete_task_from_db(&pool, bob.id, task.id).await,
            Err(StoreError::NotFound { entity: "Task", .. })
        ));
        assert!(matches!(
            update_task_in_db(&pool, alice.id, 999, UpdateTaskPayload::default()).await,
            Err(StoreError::NotFound { entity: "Task", id: 999 })
        ));
    }

    #[tokio::test]
    async fn test_list_tasks_by_start_date_and_tag() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;
        let work = create_tag(&pool, alice.id, "Work").await;

        let later = create_task_in_db(
            &pool,
            alice.id,
            CreateTaskPayload {
                name: "Later".to_string(),
                start_date: NaiveDate::from_ymd_opt(2030, 1, 1),
                tags: Some(vec![work]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let sooner = create_task_in_db(
            &pool,
            alice.id,
            CreateTaskPayload {
                name: "Sooner".to_string(),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let all = list_tasks_from_db(&pool, alice.id, None).await.unwrap();
        assert_eq!(
            all.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![sooner.id, later.id]
        );
        assert_eq!(all[1].tags, vec![work]);

        let tagged = list_tasks_from_db(&pool, alice.id, Some(work)).await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].id, later.id);
    }

    #[tokio::test]
    async fn test_delete_task() {
        let pool = setup_test_db().await.unwrap();
        let alice = create_test_user(&pool, "alice").await;
        let work = create_tag(&pool, alice.id, "Work").await;
        let task = create_task_in_db(
            &pool,
            alice.id,
            CreateTaskPayload {
                tags: Some(vec![work]),
                ..workout()
            },
        )
        .await
        .unwrap();

        delete_task_from_db(&pool, alice.id, task.id).await.unwrap();

        assert!(list_tasks_from_db(&pool, alice.id, None).await.unwrap().is_empty());
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task_tags")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("concurrent.db").display());
        let pool = establish_connection_pool(&url).await.unwrap();

        let alice = create_test_user(&pool, "alice").await;
        let work = create_tag(&pool, alice.id, "Work").await;
        let task = create_task_in_db(&pool, alice.id, workout()).await.unwrap();
        let (user_id, task_id) = (alice.id, task.id);

        let mut handles = Vec::new();
        for i in 0..20 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    let update = UpdateTaskPayload {
                        description: Some(format!("edit {i}")),
                        tags: Some(vec![work]),
                        ..Default::default()
                    };
                    update_task_in_db(&pool, user_id, task_id, update)
                        .await
                        .map(|_| ())
                } else {
                    let payload = CreateTaskPayload {
                        name: format!("Task {i}"),
                        tags: Some(vec![work]),
                        ..Default::default()
                    };
                    create_task_in_db(&pool, user_id, payload).await.map(|_| ())
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let tasks = list_tasks_from_db(&pool, alice.id, Some(work)).await.unwrap();
        assert_eq!(tasks.len(), 11);
        let edited = get_task_from_db(&pool, alice.id, task.id).await.unwrap();
        assert!(edited.description.starts_with("edit "));
        assert!(edited.updated_at > task.updated_at);
    }

    #[test]
    fn test_next_updated_at_is_strictly_later() {
        let future = Utc::now() + Duration::hours(1);
        assert!(next_updated_at(future) > future);
        let past = Utc::now() - Duration::hours(1);
        assert!(next_updated_at(past) > past);
    }
}
