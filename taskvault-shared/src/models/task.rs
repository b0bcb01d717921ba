/// Task model and owner-scoped database operations
///
/// Every query in this module embeds the owner in its predicate, so a task
/// belonging to another user behaves exactly like a task that does not
/// exist. Mutations that must check-then-act (update, delete) run both steps
/// inside one transaction with a row lock, so a concurrent request cannot
/// delete or change the task between the check and the act. The transaction
/// rolls back on every early-exit path, including caller cancellation,
/// because sqlx rolls back a dropped, uncommitted transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title TEXT NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started yet
    Pending,

    /// Being worked on
    InProgress,

    /// Done
    Completed,
}

impl TaskStatus {
    /// All valid statuses, in wire form
    pub const VALID: [&'static str; 3] = ["pending", "in-progress", "completed"];

    /// Converts status to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parses a wire string into a status
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in-progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// Sortable columns for task listing
///
/// A closed set: the variant maps to a column name, so user input can never
/// reach the ORDER BY clause directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Title,
    Status,
    CreatedAt,
}

impl SortBy {
    /// Parses a query-string value
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "title" => Some(SortBy::Title),
            "status" => Some(SortBy::Status),
            "created_at" => Some(SortBy::CreatedAt),
            _ => None,
        }
    }

    /// The whitelisted column name for ORDER BY
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortBy::Title => "title",
            SortBy::Status => "status",
            SortBy::CreatedAt => "created_at",
        }
    }
}

/// Sort direction for task listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses a query-string value
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    /// The SQL keyword for ORDER BY
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated listing parameters
///
/// Constructed by the task service after input validation; the store trusts
/// these values as-is.
#[derive(Debug, Clone)]
pub struct TaskQuery {
    /// Page number, 1-based
    pub page: i64,

    /// Page size
    pub limit: i64,

    /// Sort column
    pub sort_by: SortBy,

    /// Sort direction
    pub sort_order: SortOrder,

    /// Optional exact status filter
    pub status: Option<TaskStatus>,

    /// Optional case-insensitive title substring filter
    pub title: Option<String>,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            sort_by: SortBy::CreatedAt,
            sort_order: SortOrder::Desc,
            status: None,
            title: None,
        }
    }
}

impl TaskQuery {
    /// Rows to skip for the requested page
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task id
    pub id: Uuid,

    /// Owning user; immutable after creation
    pub user_id: Uuid,

    /// Task title (trimmed length >= 3, enforced by the service layer)
    pub title: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Current status
    pub status: TaskStatus,

    /// When the task was created; the implicit ordering key
    pub created_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// Fields are pre-validated by the service layer.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

/// Field changes for an update
///
/// `None` leaves a field untouched. For `description` the inner option is
/// the stored value, so `Some(None)` clears it (full-replace semantics).
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

const TASK_COLUMNS: &str = "id, user_id, title, description, status, created_at";

impl Task {
    /// Creates a task for an owner
    ///
    /// A plain insert needs no ownership pre-check, so this runs as a single
    /// atomic statement.
    pub async fn create(pool: &PgPool, owner: Uuid, data: NewTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, status, created_at
            "#,
        )
        .bind(owner)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by id, scoped to its owner
    ///
    /// Returns `None` both when the id does not exist and when it belongs to
    /// someone else; callers cannot tell the difference.
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, created_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists one page of an owner's tasks
    ///
    /// Filters, sort column, and direction come from the validated
    /// `TaskQuery`; the sort fragments are whitelisted enum values.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner: Uuid,
        query: &TaskQuery,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut sql = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
        let mut bind_count = 1;

        if query.status.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND status = ${}", bind_count));
        }
        if query.title.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND title ILIKE '%' || ${} || '%'", bind_count));
        }

        sql.push_str(&format!(
            " ORDER BY {} {} LIMIT ${} OFFSET ${}",
            query.sort_by.as_sql(),
            query.sort_order.as_sql(),
            bind_count + 1,
            bind_count + 2,
        ));

        let mut q = sqlx::query_as::<_, Task>(&sql).bind(owner);

        if let Some(status) = query.status {
            q = q.bind(status);
        }
        if let Some(ref title) = query.title {
            q = q.bind(title.clone());
        }

        let tasks = q.bind(query.limit).bind(query.offset()).fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Counts an owner's tasks under the same filters as `list_by_owner`
    pub async fn count_by_owner(
        pool: &PgPool,
        owner: Uuid,
        query: &TaskQuery,
    ) -> Result<i64, sqlx::Error> {
        let mut sql = String::from("SELECT COUNT(*) FROM tasks WHERE user_id = $1");
        let mut bind_count = 1;

        if query.status.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND status = ${}", bind_count));
        }
        if query.title.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND title ILIKE '%' || ${} || '%'", bind_count));
        }

        let mut q = sqlx::query_as::<_, (i64,)>(&sql).bind(owner);

        if let Some(status) = query.status {
            q = q.bind(status);
        }
        if let Some(ref title) = query.title {
            q = q.bind(title.clone());
        }

        let (count,) = q.fetch_one(pool).await?;

        Ok(count)
    }

    /// Updates a task inside one transaction, scoped to its owner
    ///
    /// Locks the owning row with `FOR UPDATE`, applies the changes, and
    /// commits. Returns `None` without mutating anything when no owning row
    /// exists (the transaction is dropped, which rolls it back).
    pub async fn update_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let existing = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, created_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        if changes.is_empty() {
            tx.commit().await?;
            return Ok(Some(existing));
        }

        let mut sets = Vec::new();
        let mut bind_count = 2;

        if changes.title.is_some() {
            bind_count += 1;
            sets.push(format!("title = ${}", bind_count));
        }
        if changes.description.is_some() {
            bind_count += 1;
            sets.push(format!("description = ${}", bind_count));
        }
        if changes.status.is_some() {
            bind_count += 1;
            sets.push(format!("status = ${}", bind_count));
        }

        let sql = format!(
            "UPDATE tasks SET {} WHERE id = $1 AND user_id = $2 RETURNING {}",
            sets.join(", "),
            TASK_COLUMNS,
        );

        let mut q = sqlx::query_as::<_, Task>(&sql).bind(id).bind(owner);

        if let Some(title) = changes.title {
            q = q.bind(title);
        }
        if let Some(description) = changes.description {
            q = q.bind(description);
        }
        if let Some(status) = changes.status {
            q = q.bind(status);
        }

        let task = q.fetch_one(&mut *tx).await?;

        tx.commit().await?;

        Ok(Some(task))
    }

    /// Deletes a task inside one transaction, scoped to its owner
    ///
    /// Returns `false` when no owning row existed; nothing is deleted and
    /// the transaction rolls back on drop.
    pub async fn delete_owned(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM tasks WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in-progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(TaskStatus::from_str("pending"), Some(TaskStatus::Pending));
        assert_eq!(
            TaskStatus::from_str("in-progress"),
            Some(TaskStatus::InProgress)
        );
        assert_eq!(
            TaskStatus::from_str("completed"),
            Some(TaskStatus::Completed)
        );
        assert_eq!(TaskStatus::from_str("archived"), None);
        assert_eq!(TaskStatus::from_str("PENDING"), None);
        assert_eq!(TaskStatus::from_str(""), None);
    }

    #[test]
    fn test_status_serde_wire_form() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");

        let status: TaskStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, TaskStatus::Pending);

        assert!(serde_json::from_str::<TaskStatus>("\"archived\"").is_err());
    }

    #[test]
    fn test_sort_by_whitelist() {
        assert_eq!(SortBy::from_str("title"), Some(SortBy::Title));
        assert_eq!(SortBy::from_str("status"), Some(SortBy::Status));
        assert_eq!(SortBy::from_str("created_at"), Some(SortBy::CreatedAt));
        assert_eq!(SortBy::from_str("user_id"), None);
        assert_eq!(SortBy::from_str("created_at; DROP TABLE tasks"), None);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::from_str("asc"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::from_str("desc"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::from_str("descending"), None);

        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
        assert_eq!(SortOrder::Desc.as_sql(), "DESC");
    }

    #[test]
    fn test_query_defaults_and_offset() {
        let query = TaskQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert_eq!(query.sort_by, SortBy::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert_eq!(query.offset(), 0);

        let query = TaskQuery {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(TaskChanges::default().is_empty());

        let changes = TaskChanges {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        assert!(!changes.is_empty());

        // Clearing the description counts as a change
        let changes = TaskChanges {
            description: Some(None),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
