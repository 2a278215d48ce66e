/// Task endpoints
///
/// Every task belongs to exactly one user and every endpoint here only ever
/// sees the caller's own tasks. Someone else's task ID answers 404, exactly
/// like an unknown one.
///
/// - `POST   /tasks`     - Create
/// - `GET    /tasks`     - List (`?completed=&limit=&skip=&sort=`)
/// - `GET    /tasks/:id` - Read
/// - `PATCH  /tasks/:id` - Update `description` and/or `completed`
/// - `DELETE /tasks/:id` - Delete, returning the deleted task

use std::collections::HashMap;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{parse_id, parse_update, JsonBody, QueryParams},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use taskdesk_shared::{
    auth::middleware::AuthContext,
    models::task::{CreateTask, Task, TaskFilter, TaskSort, UpdateTask},
};

/// Fields a task update may touch
pub const UPDATABLE_TASK_FIELDS: &[&str] = &["description", "completed"];

/// Create task request
///
/// There is deliberately no `owner` field: the owner is always the caller.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub description: String,

    #[serde(default)]
    pub completed: Option<bool>,
}

/// Task update request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub description: Option<String>,
    pub completed: Option<bool>,
}

fn check_description(description: &str) -> ApiResult<()> {
    if description.trim().is_empty() {
        return Err(ApiError::invalid_field(
            "description",
            "Description is required",
        ));
    }
    Ok(())
}

fn parse_bool_param(name: &str, value: &str) -> ApiResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ApiError::invalid_field(
            name,
            format!("'{}' must be true or false", name),
        )),
    }
}

fn parse_count_param(name: &str, value: &str) -> ApiResult<i64> {
    value
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| {
            ApiError::invalid_field(name, format!("'{}' must be a non-negative integer", name))
        })
}

/// Query parameter value, treating `?name=` like an absent parameter
fn query_param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Builds a listing filter from query parameters
///
/// Unrecognized or empty parameters are ignored; recognized ones with bad
/// values are a 400.
pub fn task_filter_from_query(params: &HashMap<String, String>) -> ApiResult<TaskFilter> {
    let completed = query_param(params, "completed")
        .map(|v| parse_bool_param("completed", v))
        .transpose()?;

    let limit = query_param(params, "limit")
        .map(|v| parse_count_param("limit", v))
        .transpose()?;

    let skip = query_param(params, "skip")
        .map(|v| parse_count_param("skip", v))
        .transpose()?;

    let sort = query_param(params, "sort")
        .or_else(|| query_param(params, "sortBy"))
        .map(|v| v.parse::<TaskSort>())
        .transpose()?;

    Ok(TaskFilter {
        completed,
        limit,
        skip,
        sort,
    })
}

/// Create a task owned by the caller
///
/// ```text
/// POST /tasks
/// { "description": "buy milk" }
/// ```
///
/// Responds 201 with the stored task; `completed` defaults to false.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    check_description(&req.description)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            description: req.description,
            completed: req.completed,
            owner: auth.user.id,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, user_id = %auth.user.id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// List the caller's tasks
///
/// ```text
/// GET /tasks?completed=true&limit=10&skip=20&sort=createdAt_desc
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    QueryParams(params): QueryParams,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = task_filter_from_query(&params)?;

    let tasks = Task::list_by_owner(&state.db, auth.user.id, &filter).await?;

    tracing::debug!(
        user_id = %auth.user.id,
        count = tasks.len(),
        sort = %filter.sort.unwrap_or_default(),
        "Tasks listed"
    );

    Ok(Json(tasks))
}

/// Read one of the caller's tasks
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_id(&id, "Task")?;

    let task = Task::find_by_id_and_owner(&state.db, task_id, auth.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Update one of the caller's tasks
///
/// Only `description` and `completed` may be sent; anything else rejects the
/// whole request.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> ApiResult<Json<Task>> {
    let req: UpdateTaskRequest = parse_update(body, UPDATABLE_TASK_FIELDS)?;

    if let Some(description) = req.description.as_deref() {
        check_description(description)?;
    }

    let task_id = parse_id(&id, "Task")?;

    let task = Task::update_by_id_and_owner(
        &state.db,
        task_id,
        auth.user.id,
        UpdateTask {
            description: req.description,
            completed: req.completed,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::debug!(task_id = %task.id, "Task updated");

    Ok(Json(task))
}

/// Delete one of the caller's tasks, returning it
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_id(&id, "Task")?;

    let task = Task::delete_by_id_and_owner(&state.db, task_id, auth.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %task.id, user_id = %auth.user.id, "Task deleted");

    Ok(Json(task))
}
