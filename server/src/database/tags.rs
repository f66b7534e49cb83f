// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::{StoreError, StoreResult, is_foreign_key_violation, unique_violation_or};

use anyhow::Context;
use common::{ActiveDays, CreateTagPayload, Tag, UpdateTagPayload, validate_tag_name};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// A `tags` row as stored: `active_days` is JSON text.
#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    id: i64,
    user_id: i64,
    name: String,
    description: String,
    active_days: Option<String>,
}

impl TagRow {
    fn into_tag(self) -> anyhow::Result<Tag> {
        let active_days = self
            .active_days
            .as_deref()
            .map(serde_json::from_str::<ActiveDays>)
            .transpose()
            .with_context(|| format!("Corrupt active_days stored for tag {}", self.id))?;

        Ok(Tag {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            active_days,
        })
    }
}

fn encode_active_days(active_days: Option<&ActiveDays>) -> anyhow::Result<Option<String>> {
    active_days
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to serialize active_days")
}

fn parse_active_days(value: Option<serde_json::Value>) -> StoreResult<Option<ActiveDays>> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => Ok(Some(ActiveDays::from_json(value)?)),
    }
}

fn tag_name_taken(name: &str) -> String {
    format!("You already have a tag named '{name}'.")
}

/// Inserts a new tag owned by `user_id`.
/// Tag names are unique per owner.
pub async fn create_tag_in_db(
    pool: &SqlitePool,
    user_id: i64,
    payload: CreateTagPayload,
) -> StoreResult<Tag> {
    let name = validate_tag_name(&payload.name)?;
    let active_days = parse_active_days(payload.active_days)?;
    let description = payload.description.unwrap_or_default();

    debug!(
        "Insert values: user_id={}, name={}, active_days={:?}",
        user_id, name, active_days
    );

    let id = sqlx::query(
        "INSERT INTO tags (user_id, name, description, active_days) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&name)
    .bind(&description)
    .bind(encode_active_days(active_days.as_ref())?)
    .execute(pool)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            StoreError::NotFound {
                entity: "User",
                id: user_id,
            }
        } else {
            unique_violation_or(e, tag_name_taken(&name), "Failed to insert tag into DB")
        }
    })?
    .last_insert_rowid();

    Ok(Tag {
        id,
        user_id,
        name,
        description,
        active_days,
    })
}

/// Lists the tags of one user, by name.
pub async fn list_tags_from_db(pool: &SqlitePool, user_id: i64) -> StoreResult<Vec<Tag>> {
    let rows = sqlx::query_as::<_, TagRow>(
        "SELECT id, user_id, name, description, active_days FROM tags WHERE user_id = ? ORDER BY name ASC, id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve tags from DB")?;

    let tags = rows
        .into_iter()
        .map(TagRow::into_tag)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(tags)
}

/// Fetches one tag. Another user's tag is reported as not found.
pub async fn get_tag_from_db(pool: &SqlitePool, user_id: i64, tag_id: i64) -> StoreResult<Tag> {
    let row = sqlx::query_as::<_, TagRow>(
        "SELECT id, user_id, name, description, active_days FROM tags WHERE id = ? AND user_id = ?",
    )
    .bind(tag_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to retrieve tag from DB")?
    .ok_or(StoreError::NotFound {
        entity: "Tag",
        id: tag_id,
    })?;

    Ok(row.into_tag()?)
}

/// Applies a partial update to a tag owned by `user_id`.
pub async fn update_tag_in_db(
    pool: &SqlitePool,
    user_id: i64,
    tag_id: i64,
    payload: UpdateTagPayload,
) -> StoreResult<Tag> {
    debug!("Attempting to update tag with ID: {}", tag_id);

    let mut tx = pool
        .begin_with("BEGIN IMMEDIATE")
        .await
        .context("Failed to begin transaction")?;

    let mut tag = sqlx::query_as::<_, TagRow>(
        "SELECT id, user_id, name, description, active_days FROM tags WHERE id = ? AND user_id = ?",
    )
    .bind(tag_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to retrieve tag from DB")?
    .ok_or(StoreError::NotFound {
        entity: "Tag",
        id: tag_id,
    })?
    .into_tag()?;

    if let Some(name) = payload.name {
        tag.name = validate_tag_name(&name)?;
    }
    if let Some(description) = payload.description {
        tag.description = description;
    }
    if let Some(value) = payload.active_days {
        tag.active_days = parse_active_days(Some(value))?;
    }

    sqlx::query("UPDATE tags SET name = ?, description = ?, active_days = ? WHERE id = ?")
        .bind(&tag.name)
        .bind(&tag.description)
        .bind(encode_active_days(tag.active_days.as_ref())?)
        .bind(tag_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation_or(e, tag_name_taken(&tag.name), "Failed to update tag"))?;

    tx.commit().await.context("Failed to commit tag update")?;

    info!("Tag with ID {} updated successfully.", tag_id);
    Ok(tag)
}

/// Deletes a tag. Tasks that carried it lose the link but are kept.
pub async fn delete_tag_from_db(pool: &SqlitePool, user_id: i64, tag_id: i64) -> StoreResult<()> {
    debug!("Attempting to delete tag with ID: {}", tag_id);

    let result = sqlx::query("DELETE FROM tags WHERE id = ? AND user_id = ?")
        .bind(tag_id)
        .bind(user_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete tag with ID: {tag_id}"))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: "Tag",
            id: tag_id,
        });
    }

    info!("Deleted tag with ID: {}", tag_id);
    Ok(())
}
