use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskInstanceRow {
    pub task_id: Uuid,
    pub flow_instance_id: Uuid,
    pub stage_id: Uuid,
    pub assigned_to_user_id: Uuid,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Open task joined with its stage and flow names, for the "My Tasks" view
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssignedTaskRow {
    pub task_id: Uuid,
    pub flow_instance_id: Uuid,
    pub stage_id: Uuid,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub stage_name: String,
    pub flow_name: String,
}

pub struct TaskInstanceRepo;

impl TaskInstanceRepo {
    pub async fn create(
        pool: &PgPool,
        flow_instance_id: Uuid,
        stage_id: Uuid,
        assigned_to_user_id: Uuid,
    ) -> Result<Uuid> {
        let task_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO task_instance (task_id, flow_instance_id, stage_id, assigned_to_user_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(task_id)
        .bind(flow_instance_id)
        .bind(stage_id)
        .bind(assigned_to_user_id)
        .execute(pool)
        .await
        .context("Failed to create task instance")?;
        Ok(task_id)
    }

    pub async fn get(pool: &PgPool, task_id: Uuid) -> Result<Option<TaskInstanceRow>> {
        let row = sqlx::query_as::<_, TaskInstanceRow>(
            "SELECT task_id, flow_instance_id, stage_id, assigned_to_user_id, status, started_at, completed_at, created_at FROM task_instance WHERE task_id = $1",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get task instance")?;
        Ok(row)
    }

    pub async fn set_status(pool: &PgPool, task_id: Uuid, status: &str) -> Result<()> {
        sqlx::query(
            r#"UPDATE task_instance SET
                   status = $2,
                   started_at = CASE WHEN $2 = 'in_progress' AND started_at IS NULL THEN NOW() ELSE started_at END,
                   completed_at = CASE WHEN $2 IN ('completed', 'rejected') THEN NOW() ELSE completed_at END
               WHERE task_id = $1"#,
        )
        .bind(task_id)
        .bind(status)
        .execute(pool)
        .await
        .context("Failed to update task status")?;
        Ok(())
    }

    /// Open tasks (pending or in progress) assigned to a user, oldest first
    pub async fn list_by_assignee(pool: &PgPool, user_id: Uuid) -> Result<Vec<AssignedTaskRow>> {
        let rows = sqlx::query_as::<_, AssignedTaskRow>(
            r#"SELECT t.task_id, t.flow_instance_id, t.stage_id, t.status, t.started_at, t.created_at,
                      s.name AS stage_name, f.name AS flow_name
               FROM task_instance t
               JOIN stage s ON s.stage_id = t.stage_id
               JOIN flow_instance i ON i.flow_instance_id = t.flow_instance_id
               JOIN flow_template f ON f.flow_template_id = i.flow_template_id
               WHERE t.assigned_to_user_id = $1 AND t.status IN ('pending', 'in_progress')
               ORDER BY t.created_at"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list assigned tasks")?;
        Ok(rows)
    }
}
