/// Task access-control and validation layer
///
/// Every task operation goes through `TaskService`. The service validates
/// input, scopes the store operation to the verified caller, and keeps the
/// cache consistent with the store:
///
/// - Single-task reads consult the cache first and fall back to the store,
///   repopulating the cache on a miss. A cached entry is only returned when
///   its embedded owner matches the caller.
/// - Listing always queries the store (the cache is not authoritative for
///   aggregate views) and opportunistically refreshes the cache entry for
///   every task returned.
/// - Writes go through the store first, then synchronously update or remove
///   the cache entry, so a read immediately after a write never observes the
///   pre-write state.
///
/// Ownership mismatches and nonexistent tasks are both reported as
/// `ServiceError::NotFound`; callers never learn whether a foreign task
/// exists.
///
/// # Example
///
/// ```no_run
/// use taskvault_shared::tasks::{TaskDraft, TaskService};
/// use uuid::Uuid;
///
/// # async fn example(service: TaskService, owner: Uuid) -> anyhow::Result<()> {
/// let task = service
///     .create_task(
///         owner,
///         TaskDraft {
///             title: "Buy milk".to_string(),
///             description: None,
///             status: "pending".to_string(),
///         },
///     )
///     .await?;
///
/// let fetched = service.get_task(owner, task.id).await?;
/// assert_eq!(fetched.title, "Buy milk");
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::TaskCache;
use crate::error::{ServiceError, ServiceResult};
use crate::models::task::{
    NewTask, SortBy, SortOrder, Task, TaskChanges, TaskQuery, TaskStatus,
};

/// Default page size for listing
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound on page size; larger requests are clamped
pub const MAX_PAGE_SIZE: i64 = 100;

/// Unvalidated input for creating a task
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
}

/// Unvalidated field changes for an update
///
/// `None` means the field is untouched. `description: Some(None)` clears the
/// stored description (full-replace semantics).
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
}

/// Unvalidated listing parameters, straight from the query string
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
}

/// One page of tasks with the effective paging values
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Mediates all task operations for authenticated callers
///
/// Holds the injected store pool and cache handles; cloning is cheap and
/// every clone shares the same underlying connections.
#[derive(Clone)]
pub struct TaskService {
    pool: PgPool,
    cache: TaskCache,
}

impl TaskService {
    /// Creates a service over an existing pool and cache
    pub fn new(pool: PgPool, cache: TaskCache) -> Self {
        Self { pool, cache }
    }

    /// Creates a task for the caller
    ///
    /// Title and status are validated before the store is touched. The new
    /// row is inserted atomically and then written through to the cache.
    pub async fn create_task(&self, owner: Uuid, draft: TaskDraft) -> ServiceResult<Task> {
        validate_title(&draft.title)?;
        let status = parse_status(&draft.status)?;

        let task = Task::create(
            &self.pool,
            owner,
            NewTask {
                title: draft.title,
                description: draft.description,
                status,
            },
        )
        .await?;

        self.cache.put(&task).await?;

        Ok(task)
    }

    /// Lists one page of the caller's tasks
    ///
    /// Always authoritative: the store is queried for both the page and the
    /// total count. Each returned task's cache entry is refreshed as a side
    /// effect.
    pub async fn list_tasks(&self, owner: Uuid, filter: TaskFilter) -> ServiceResult<TaskPage> {
        let query = build_query(filter)?;

        let total = Task::count_by_owner(&self.pool, owner, &query).await?;
        let tasks = Task::list_by_owner(&self.pool, owner, &query).await?;

        for task in &tasks {
            self.cache.put(task).await?;
        }

        Ok(TaskPage {
            tasks,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    /// Fetches a single task owned by the caller
    ///
    /// The cache is consulted first; an entry is trusted only after its
    /// embedded owner matches the caller, and may be stale by up to the TTL.
    /// On a miss (or an owner mismatch) the store is queried with the owner
    /// in the predicate, and a hit repopulates the cache.
    pub async fn get_task(&self, owner: Uuid, task_id: Uuid) -> ServiceResult<Task> {
        if let Some(cached) = self.cache.get(task_id).await? {
            if cached.user_id == owner {
                return Ok(cached);
            }
        }

        let task = Task::find_by_id_and_owner(&self.pool, task_id, owner)
            .await?
            .ok_or(ServiceError::NotFound)?;

        self.cache.put(&task).await?;

        Ok(task)
    }

    /// Applies a partial or full update to a task owned by the caller
    ///
    /// Present fields are validated first; the ownership check and the write
    /// then run inside one store transaction. On commit the updated row is
    /// written through to the cache, so a following `get_task` cannot return
    /// pre-update data.
    pub async fn update_task(
        &self,
        owner: Uuid,
        task_id: Uuid,
        patch: TaskPatch,
    ) -> ServiceResult<Task> {
        if let Some(ref title) = patch.title {
            validate_title(title)?;
        }
        let status = match patch.status {
            Some(ref s) => Some(parse_status(s)?),
            None => None,
        };

        let changes = TaskChanges {
            title: patch.title,
            description: patch.description,
            status,
        };

        let task = Task::update_owned(&self.pool, task_id, owner, changes)
            .await?
            .ok_or(ServiceError::NotFound)?;

        self.cache.put(&task).await?;

        Ok(task)
    }

    /// Deletes a task owned by the caller
    ///
    /// The existence and ownership check runs in the same transaction as the
    /// delete. Returns `false` when no owning row existed. On success the
    /// cache entry is removed unconditionally.
    pub async fn delete_task(&self, owner: Uuid, task_id: Uuid) -> ServiceResult<bool> {
        let deleted = Task::delete_owned(&self.pool, task_id, owner).await?;

        if deleted {
            self.cache.invalidate(task_id).await?;
        }

        Ok(deleted)
    }
}

fn validate_title(title: &str) -> ServiceResult<()> {
    if title.trim().chars().count() < 3 {
        return Err(ServiceError::InvalidInput(
            "Title must be at least 3 characters".to_string(),
        ));
    }
    Ok(())
}

fn parse_status(status: &str) -> ServiceResult<TaskStatus> {
    TaskStatus::from_str(status).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "Status must be one of {}",
            TaskStatus::VALID.join(", ")
        ))
    })
}

fn build_query(filter: TaskFilter) -> ServiceResult<TaskQuery> {
    let page = filter.page.unwrap_or(1);
    if page < 1 {
        return Err(ServiceError::InvalidInput(
            "Page must be at least 1".to_string(),
        ));
    }

    let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit < 1 {
        return Err(ServiceError::InvalidInput(
            "Limit must be at least 1".to_string(),
        ));
    }
    let limit = limit.min(MAX_PAGE_SIZE);

    let sort_by = match filter.sort_by.as_deref() {
        None => SortBy::CreatedAt,
        Some(s) => SortBy::from_str(s).ok_or_else(|| {
            ServiceError::InvalidInput(
                "Sort field must be one of title, status, created_at".to_string(),
            )
        })?,
    };

    let sort_order = match filter.sort_order.as_deref() {
        None => SortOrder::Desc,
        Some(s) => SortOrder::from_str(s).ok_or_else(|| {
            ServiceError::InvalidInput("Sort order must be asc or desc".to_string())
        })?,
    };

    let status = match filter.status.as_deref() {
        None => None,
        Some(s) => Some(parse_status(s)?),
    };

    Ok(TaskQuery {
        page,
        limit,
        sort_by,
        sort_order,
        status,
        title: filter.title,
    })
}
