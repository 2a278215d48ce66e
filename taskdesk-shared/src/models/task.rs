/// Task model and database operations
///
/// Every query in this module that touches an existing task filters on the
/// owner as well as the ID. A task that belongs to someone else is
/// indistinguishable from one that doesn't exist.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     description TEXT NOT NULL CHECK (length(description) > 0),
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     owner UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::task::{CreateTask, Task, TaskFilter};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let task = Task::create(&pool, CreateTask {
///     description: "buy milk".to_string(),
///     completed: None,
///     owner,
/// }).await?;
/// assert!(!task.completed);
///
/// let open = Task::list_by_owner(&pool, owner, &TaskFilter {
///     completed: Some(false),
///     limit: Some(10),
///     sort: Some("createdAt_desc".parse()?),
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, description, completed, owner, created_at, updated_at";

/// Task model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// What needs doing
    pub description: String,

    /// Whether it has been done
    pub completed: bool,

    /// User who owns the task; fixed at creation
    pub owner: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Task description
    pub description: String,

    /// Initial completion flag (defaults to false)
    pub completed: Option<bool>,

    /// Owning user
    pub owner: Uuid,
}

/// Input for updating an existing task
///
/// The owner is not updatable.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New description
    pub description: Option<String>,

    /// New completion flag
    pub completed: Option<bool>,
}

/// Column a task listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Description,
    Completed,
}

impl TaskSortField {
    /// SQL column name
    pub fn column(&self) -> &'static str {
        match self {
            TaskSortField::CreatedAt => "created_at",
            TaskSortField::UpdatedAt => "updated_at",
            TaskSortField::Description => "description",
            TaskSortField::Completed => "completed",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Ordering for a task listing
///
/// Parsed from `<field>_<direction>` or `<field>:<direction>`, e.g.
/// `createdAt_desc`, `updated_at:asc`, `completed_-1`. A bare field name sorts
/// ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskSort {
    pub field: TaskSortField,
    pub direction: SortDirection,
}

/// Error parsing a sort expression
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseSortError {
    #[error("sort expression is empty")]
    Empty,

    #[error("cannot sort tasks by '{0}'")]
    UnknownField(String),

    #[error("unknown sort direction '{0}'")]
    UnknownDirection(String),
}

impl FromStr for TaskSortField {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" => Ok(TaskSortField::CreatedAt),
            "updatedAt" | "updated_at" => Ok(TaskSortField::UpdatedAt),
            "description" => Ok(TaskSortField::Description),
            "completed" => Ok(TaskSortField::Completed),
            other => Err(ParseSortError::UnknownField(other.to_string())),
        }
    }
}

impl FromStr for SortDirection {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(SortDirection::Asc),
            "desc" | "descending" | "-1" => Ok(SortDirection::Desc),
            _ => Err(ParseSortError::UnknownDirection(s.to_string())),
        }
    }
}

impl FromStr for TaskSort {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseSortError::Empty);
        }

        // Field names may themselves contain '_', so split on the last separator
        // and only accept the split when the tail is a direction.
        if let Some((field, direction)) = s.rsplit_once(['_', ':']) {
            if let Ok(direction) = direction.parse::<SortDirection>() {
                return Ok(TaskSort {
                    field: field.parse()?,
                    direction,
                });
            }
        }

        Ok(TaskSort {
            field: s.parse()?,
            direction: SortDirection::Asc,
        })
    }
}

impl fmt::Display for TaskSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}",
            self.field.column(),
            self.direction.as_sql().to_ascii_lowercase()
        )
    }
}

/// Filter, ordering and pagination for [`Task::list_by_owner`]
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Only tasks with this completion flag
    pub completed: Option<bool>,

    /// Maximum number of tasks; `None` or 0 means no limit
    pub limit: Option<i64>,

    /// Number of tasks to skip
    pub skip: Option<i64>,

    /// Ordering; defaults to creation time ascending
    pub sort: Option<TaskSort>,
}

impl Task {
    /// Creates a new task for `data.owner`
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the owner doesn't exist.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (description, completed, owner)
            VALUES ($1, $2, $3)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.description.trim())
        .bind(data.completed.unwrap_or(false))
        .bind(data.owner)
        .fetch_one(pool)
        .await?;

        tracing::debug!(task_id = %task.id, owner = %task.owner, "Task created");

        Ok(task)
    }

    /// Finds a task by ID, only if it belongs to `owner`
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND owner = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    /// Lists the tasks of `owner` matching `filter`
    ///
    /// Ties on the sort column are broken by ID so that pages are stable.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner = "
        ));
        query.push_bind(owner);

        if let Some(completed) = filter.completed {
            query.push(" AND completed = ").push_bind(completed);
        }

        // Column and direction come from closed enums, never from raw input
        let sort = filter.sort.unwrap_or_default();
        query
            .push(" ORDER BY ")
            .push(sort.field.column())
            .push(" ")
            .push(sort.direction.as_sql())
            .push(", id ASC");

        if let Some(limit) = filter.limit.filter(|limit| *limit > 0) {
            query.push(" LIMIT ").push_bind(limit);
        }
        if let Some(skip) = filter.skip.filter(|skip| *skip > 0) {
            query.push(" OFFSET ").push_bind(skip);
        }

        query.build_query_as::<Task>().fetch_all(pool).await
    }

    /// Updates a task owned by `owner`
    ///
    /// Returns `None` if no such task exists for this owner.
    pub async fn update_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(description) = data.description {
            query
                .push(", description = ")
                .push_bind(description.trim().to_string());
        }
        if let Some(completed) = data.completed {
            query.push(", completed = ").push_bind(completed);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(" AND owner = ").push_bind(owner);
        query.push(" RETURNING ").push(TASK_COLUMNS);

        query.build_query_as::<Task>().fetch_optional(pool).await
    }

    /// Deletes a task owned by `owner`, returning the deleted record
    pub async fn delete_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 AND owner = $2 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }
}
