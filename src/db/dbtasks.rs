use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Error as SqlxError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;
use uuid::Uuid;

use crate::models::{CommentModel, Identity, ReactionModel, TaskModel, TaskStatus};

// Global database instance
static DB: OnceCell<Arc<DbTasks>> = OnceCell::const_new();

/// Initialize the global database connection
pub async fn init_db(database_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = DbTasks::new(database_url).await?;
    DB.set(Arc::new(db))
        .map_err(|_| "Database already initialized")?;
    Ok(())
}

/// Get the global database instance
pub fn get_db() -> Option<Arc<DbTasks>> {
    DB.get().cloned()
}

/// Which listing a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskBoard {
    Private,
    Community,
}

impl TaskBoard {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskBoard::Private => "private",
            TaskBoard::Community => "community",
        }
    }
}

/// User row from database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Task row joined with its author
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub owner: Uuid,
    pub owner_name: String,
    pub owner_email: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRow {
    pub fn into_model(self, reactions: Vec<ReactionModel>) -> TaskModel {
        TaskModel {
            id: self.id,
            user: Identity {
                id: self.owner,
                full_name: self.owner_name,
                email: self.owner_email,
            },
            title: self.title,
            description: self.description,
            status: TaskStatus::parse(&self.status).unwrap_or_default(),
            reactions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Comment row joined with its author
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub task: Uuid,
    pub author: Uuid,
    pub author_name: String,
    pub author_email: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl CommentRow {
    pub fn into_model(self) -> CommentModel {
        CommentModel {
            id: self.id,
            task_id: self.task,
            user: Identity {
                id: self.author,
                full_name: self.author_name,
                email: self.author_email,
            },
            text: self.body,
            created_at: self.created_at,
        }
    }
}

/// Reaction row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReactionRow {
    pub task: Uuid,
    #[sqlx(rename = "user")]
    pub user_id: Uuid,
    pub emoji: String,
}

const TASK_COLUMNS: &str = r#"
    t.id, t.owner, u.full_name AS owner_name, u.email AS owner_email,
    t.title, t.description, t.status, t.created_at, t.updated_at
"#;

/// Database connection pool
pub struct DbTasks {
    pool: PgPool,
}

impl DbTasks {
    /// Create a new database connection pool
    pub async fn new(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    pub async fn create_user(
        &self,
        full_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow, SqlxError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (full_name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(full_name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>, SqlxError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Tasks on a board, newest first. `owner` scopes the private listing to
    /// its caller; the community board is shared.
    pub async fn list_tasks(&self, board: TaskBoard, owner: Option<Uuid>) -> Result<Vec<TaskRow>, SqlxError> {
        let sql = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            JOIN users u ON u.id = t.owner
            WHERE t.board = $1 AND ($2::uuid IS NULL OR t.owner = $2)
            ORDER BY t.created_at DESC
            "#
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(board.as_str())
            .bind(owner)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_task(&self, board: TaskBoard, task_id: Uuid) -> Result<Option<TaskRow>, SqlxError> {
        let sql = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            JOIN users u ON u.id = t.owner
            WHERE t.board = $1 AND t.id = $2
            "#
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(board.as_str())
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_task(
        &self,
        board: TaskBoard,
        owner: Uuid,
        title: &str,
        description: &str,
        status: TaskStatus,
    ) -> Result<TaskRow, SqlxError> {
        let mut tx = self.pool.begin().await?;

        let task_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (owner, title, description, status, board)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(owner)
        .bind(title)
        .bind(description)
        .bind(status.as_str())
        .bind(board.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks t JOIN users u ON u.id = t.owner WHERE t.id = $1"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("Task '{}' created on {} board", task_id, board.as_str());
        Ok(row)
    }

    /// Partial update scoped to the task's owner, like the original
    /// find-and-update. Returns None when no owned task matched.
    pub async fn update_task(
        &self,
        board: TaskBoard,
        owner: Uuid,
        task_id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        status: Option<TaskStatus>,
    ) -> Result<Option<TaskRow>, SqlxError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE tasks SET
                title = COALESCE($4, title),
                description = COALESCE($5, description),
                status = COALESCE($6, status),
                updated_at = now()
            WHERE id = $1 AND owner = $2 AND board = $3
            RETURNING id
            "#,
        )
        .bind(task_id)
        .bind(owner)
        .bind(board.as_str())
        .bind(title)
        .bind(description)
        .bind(status.map(|s| s.as_str()))
        .fetch_optional(&mut *tx)
        .await?;

        let row = match updated {
            Some(id) => {
                let sql = format!(
                    "SELECT {TASK_COLUMNS} FROM tasks t JOIN users u ON u.id = t.owner WHERE t.id = $1"
                );
                Some(
                    sqlx::query_as::<_, TaskRow>(&sql)
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?,
                )
            }
            None => None,
        };

        tx.commit().await?;
        Ok(row)
    }

    /// Delete an owned task. Returns false when nothing matched.
    pub async fn delete_task(&self, board: TaskBoard, owner: Uuid, task_id: Uuid) -> Result<bool, SqlxError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner = $2 AND board = $3")
            .bind(task_id)
            .bind(owner)
            .bind(board.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn reactions_for_tasks(&self, task_ids: &[Uuid]) -> Result<Vec<ReactionRow>, SqlxError> {
        sqlx::query_as::<_, ReactionRow>(
            r#"SELECT task, "user", emoji FROM task_reactions WHERE task = ANY($1) ORDER BY created_at"#,
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_comments(&self, task_id: Uuid) -> Result<Vec<CommentRow>, SqlxError> {
        sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.task, c.author, u.full_name AS author_name, u.email AS author_email,
                   c.body, c.created_at
            FROM task_comments c
            JOIN users u ON u.id = c.author
            WHERE c.task = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_comment(&self, task_id: Uuid, author: Uuid, body: &str) -> Result<CommentRow, SqlxError> {
        let mut tx = self.pool.begin().await?;

        let comment_id: Uuid = sqlx::query_scalar(
            "INSERT INTO task_comments (task, author, body) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(task_id)
        .bind(author)
        .bind(body)
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.task, c.author, u.full_name AS author_name, u.email AS author_email,
                   c.body, c.created_at
            FROM task_comments c
            JOIN users u ON u.id = c.author
            WHERE c.id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Idempotent reaction insert. Returns true only when a row was added.
    pub async fn add_reaction(&self, task_id: Uuid, user_id: Uuid, emoji: &str) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            r#"
            INSERT INTO task_reactions (task, "user", emoji)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(emoji)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Idempotent reaction removal. Returns true only when a row was removed.
    pub async fn remove_reaction(&self, task_id: Uuid, user_id: Uuid, emoji: &str) -> Result<bool, SqlxError> {
        let result = sqlx::query(r#"DELETE FROM task_reactions WHERE task = $1 AND "user" = $2 AND emoji = $3"#)
            .bind(task_id)
            .bind(user_id)
            .bind(emoji)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
