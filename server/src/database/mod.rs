// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
mod tags;
mod tasks;
mod users;

pub use tags::{
    create_tag_in_db, delete_tag_from_db, get_tag_from_db, list_tags_from_db, update_tag_in_db,
};
pub use tasks::{
    create_task_in_db, delete_task_from_db, get_task_from_db, list_tasks_from_db, update_task_in_db,
};
pub use users::{create_user_in_db, delete_user_from_db, get_user_from_db};

use std::str::FromStr;

use anyhow::{Context, Result};
use common::ValidationError;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Sqlite, SqlitePool, migrate::MigrateDatabase};
use thiserror::Error;
use tracing::info;

/// Errors returned by the data-access functions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The row does not exist, or belongs to another user.
    #[error("{entity} with ID {id} not found.")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    UniquenessViolation(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            avatar TEXT NULL,
            created_at TIMESTAMP NOT NULL
        );
        "#,
    ),
    (
        "tags",
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            active_days TEXT NULL,
            UNIQUE (user_id, name)
        );
        "#,
    ),
    (
        "tasks",
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            start_date DATE NOT NULL,
            duration_type TEXT NOT NULL DEFAULT 'infinite',
            total_hours INTEGER NULL,
            repeat_monthly BOOLEAN NOT NULL DEFAULT 0,
            days_of_week TEXT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        );
        "#,
    ),
    (
        "task_tags",
        r#"
        CREATE TABLE IF NOT EXISTS task_tags (
            task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (task_id, tag_id)
        );
        "#,
    ),
];

/// Establishes the database connection pool.
/// If the database does not exist, it creates it, then makes sure every
/// table exists.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    // Cascading deletes depend on this pragma, which SQLite applies per connection.
    let options = SqliteConnectOptions::from_str(database_url)
        .context("Invalid database URL")?
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(options)
        .await
        .context("Failed to connect to database")?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Creates the tables if they are missing. Safe to run on every start.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for &(table, ddl) in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create '{table}' table"))?;
        info!("'{}' table is ready.", table);
    }
    Ok(())
}

/// Turns a failed write into `UniquenessViolation` when SQLite rejected it
/// on a UNIQUE constraint, and into `Internal` otherwise.
fn unique_violation_or(err: sqlx::Error, message: String, context: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::UniquenessViolation(message);
        }
    }
    StoreError::Internal(anyhow::Error::new(err).context(context))
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Fresh in-memory database with the full schema, for unit tests.
#[cfg(test)]
pub(crate) async fn setup_test_db() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePool::connect_with(options).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
pub(crate) async fn create_test_user(pool: &SqlitePool, username: &str) -> common::User {
    create_user_in_db(
        pool,
        common::CreateUserPayload {
            username: username.to_string(),
            avatar: None,
        },
    )
    .await
    .expect("Failed to create test user")
}
