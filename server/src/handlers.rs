// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::auth::CurrentUser;
use crate::database;
use crate::error::AppError;
use axum::{
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::Redirect,
};
use common::{
    CreateTagPayload, CreateTaskPayload, CreateUserPayload, Tag, Task, UpdateTagPayload,
    UpdateTaskPayload, User,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info};

/// Handler for the landing page: what this service is.
pub async fn about() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "schedulite",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Personal task and habit scheduling.",
    }))
}

/// `/about` is an alias of the landing page.
pub async fn about_redirect() -> Redirect {
    Redirect::temporary("/")
}

// --- Users ---

/// Handler for registering a new user.
pub async fn create_user(
    State(pool): State<SqlitePool>,
    payload: Result<Json<CreateUserPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(payload) = payload?;
    debug!("Received request to register user: {}", payload.username);

    let user = database::create_user_in_db(&pool, payload).await?;

    info!("User registered successfully with ID: {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(pool): State<SqlitePool>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let Path(user_id) = path?;
    let user = database::get_user_from_db(&pool, user_id).await?;
    Ok(Json(user))
}

/// Handler for deleting an account. Users may only delete themselves; all
/// their tags and tasks are removed with them.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    CurrentUser(current_user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(user_id) = path?;
    if current_user != user_id {
        error!(
            "User {} attempted to delete another user ({}).",
            current_user, user_id
        );
        return Err(AppError::new(
            StatusCode::FORBIDDEN,
            "You can only delete your own account.",
        ));
    }

    database::delete_user_from_db(&pool, user_id).await?;

    info!("User with ID {} deleted successfully.", user_id);
    Ok(StatusCode::NO_CONTENT)
}

// --- Tags ---

/// Handler for listing the caller's tags.
pub async fn list_tags(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Tag>>, AppError> {
    let tags = database::list_tags_from_db(&pool, user_id).await?;
    info!("Successfully retrieved {} tags.", tags.len());
    Ok(Json(tags))
}

/// Handler for creating a new tag.
pub async fn create_tag(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<CreateTagPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let Json(payload) = payload?;
    debug!(
        "Received request to create tag '{}' for user {}",
        payload.name, user_id
    );

    let tag = database::create_tag_in_db(&pool, user_id, payload).await?;

    info!("Tag created successfully with ID: {}", tag.id);
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn get_tag(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Tag>, AppError> {
    let Path(tag_id) = path?;
    let tag = database::get_tag_from_db(&pool, user_id, tag_id).await?;
    Ok(Json(tag))
}

pub async fn update_tag(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTagPayload>, JsonRejection>,
) -> Result<Json<Tag>, AppError> {
    let Path(tag_id) = path?;
    let Json(payload) = payload?;
    let tag = database::update_tag_in_db(&pool, user_id, tag_id, payload).await?;
    Ok(Json(tag))
}

/// Handler for deleting a tag. Tasks that used it are kept.
pub async fn delete_tag(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(tag_id) = path?;
    database::delete_tag_from_db(&pool, user_id, tag_id).await?;
    info!("Tag with ID {} deleted successfully.", tag_id);
    Ok(StatusCode::NO_CONTENT)
}

// --- Tasks ---

/// Query string of `GET /api/tasks`.
#[derive(Deserialize, Debug, Default)]
pub struct TaskListQuery {
    /// Only return tasks carrying this tag.
    pub tag: Option<i64>,
}

/// Handler for listing the caller's tasks.
pub async fn list_tasks(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<TaskListQuery>, QueryRejection>,
) -> Result<Json<Vec<Task>>, AppError> {
    let Query(query) = query?;
    let tasks = database::list_tasks_from_db(&pool, user_id, query.tag).await?;
    info!("Successfully retrieved {} tasks.", tasks.len());
    Ok(Json(tasks))
}

/// Handler for creating a new task.
pub async fn create_task(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<CreateTaskPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let Json(payload) = payload?;
    debug!(
        "Received request to create task '{}' for user {}",
        payload.name, user_id
    );

    let task = database::create_task_in_db(&pool, user_id, payload).await?;

    info!("Task created successfully with ID: {}", task.id);
    // Return a 201 Created status with the new task as JSON.
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Task>, AppError> {
    let Path(task_id) = path?;
    let task = database::get_task_from_db(&pool, user_id, task_id).await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTaskPayload>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let Path(task_id) = path?;
    let Json(payload) = payload?;
    let task = database::update_task_in_db(&pool, user_id, task_id, payload).await?;
    Ok(Json(task))
}

/// Handler for deleting a task by ID.
pub async fn delete_task(
    State(pool): State<SqlitePool>,
    CurrentUser(user_id): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(task_id) = path?;
    database::delete_task_from_db(&pool, user_id, task_id).await?;
    info!("Task with ID {} deleted successfully.", task_id);
    Ok(StatusCode::NO_CONTENT) // 204 No Content for successful deletion
}
