// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use super::{StoreError, StoreResult, unique_violation_or};

use anyhow::Context;
use chrono::Utc;
use common::{CreateUserPayload, User, validate_username};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Inserts a new user. Usernames are unique across the whole store.
pub async fn create_user_in_db(pool: &SqlitePool, payload: CreateUserPayload) -> StoreResult<User> {
    let username = validate_username(&payload.username)?;
    let created_at = Utc::now();

    debug!(
        "Insert values: username={}, avatar={:?}, created_at={}",
        username, payload.avatar, created_at
    );

    let id = sqlx::query("INSERT INTO users (username, avatar, created_at) VALUES (?, ?, ?)")
        .bind(&username)
        .bind(&payload.avatar)
        .bind(created_at)
        .execute(pool)
        .await
        .map_err(|e| {
            unique_violation_or(
                e,
                format!("Username '{}' is already taken.", username),
                "Failed to insert user into DB",
            )
        })?
        .last_insert_rowid();

    Ok(User {
        id,
        username,
        avatar: payload.avatar,
        created_at,
    })
}

pub async fn get_user_from_db(pool: &SqlitePool, user_id: i64) -> StoreResult<User> {
    sqlx::query_as::<_, User>("SELECT id, username, avatar, created_at FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to retrieve user from DB")?
        .ok_or(StoreError::NotFound {
            entity: "User",
            id: user_id,
        })
}

/// Deletes a user. Their tags, tasks and the links between them go with
/// them through `ON DELETE CASCADE`.
pub async fn delete_user_from_db(pool: &SqlitePool, user_id: i64) -> StoreResult<()> {
    debug!("Attempting to delete user with ID: {}", user_id);

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete user with ID: {user_id}"))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: "User",
            id: user_id,
        });
    }

    info!("Deleted user {} and everything they owned.", user_id);
    Ok(())
}
