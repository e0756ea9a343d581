use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StageRow {
    pub stage_id: Uuid,
    pub flow_template_id: Uuid,
    pub name: String,
    pub position: i32,
    pub description: Option<String>,
    pub assignment_type: String,
    pub assignment_target_id: Option<Uuid>,
    pub is_approval_stage: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStage {
    pub flow_template_id: Uuid,
    pub name: String,
    pub position: i32,
    pub description: Option<String>,
    pub assignment_type: String,
    pub assignment_target_id: Option<Uuid>,
    pub is_approval_stage: bool,
}

/// Partial update; `None` fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct StageUpdate {
    pub name: Option<String>,
    pub position: Option<i32>,
    pub description: Option<String>,
    pub assignment_type: Option<String>,
    pub assignment_target_id: Option<Uuid>,
    pub is_approval_stage: Option<bool>,
}

pub struct StageRepo;

impl StageRepo {
    pub async fn create(pool: &PgPool, stage: &NewStage) -> Result<Uuid> {
        let stage_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO stage (stage_id, flow_template_id, name, position, description, assignment_type, assignment_target_id, is_approval_stage) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(stage_id)
        .bind(stage.flow_template_id)
        .bind(&stage.name)
        .bind(stage.position)
        .bind(&stage.description)
        .bind(&stage.assignment_type)
        .bind(stage.assignment_target_id)
        .bind(stage.is_approval_stage)
        .execute(pool)
        .await
        .context("Failed to create stage")?;
        Ok(stage_id)
    }

    pub async fn get(pool: &PgPool, stage_id: Uuid) -> Result<Option<StageRow>> {
        let row = sqlx::query_as::<_, StageRow>(
            "SELECT stage_id, flow_template_id, name, position, description, assignment_type, assignment_target_id, is_approval_stage, created_at, updated_at FROM stage WHERE stage_id = $1",
        )
        .bind(stage_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get stage")?;
        Ok(row)
    }

    pub async fn list_by_template(pool: &PgPool, flow_template_id: Uuid) -> Result<Vec<StageRow>> {
        let rows = sqlx::query_as::<_, StageRow>(
            "SELECT stage_id, flow_template_id, name, position, description, assignment_type, assignment_target_id, is_approval_stage, created_at, updated_at FROM stage WHERE flow_template_id = $1 ORDER BY position",
        )
        .bind(flow_template_id)
        .fetch_all(pool)
        .await
        .context("Failed to list stages")?;
        Ok(rows)
    }

    pub async fn update(
        pool: &PgPool,
        stage_id: Uuid,
        update: &StageUpdate,
    ) -> Result<Option<StageRow>> {
        let row = sqlx::query_as::<_, StageRow>(
            r#"UPDATE stage SET
                   name = COALESCE($2, name),
                   position = COALESCE($3, position),
                   description = COALESCE($4, description),
                   assignment_type = COALESCE($5, assignment_type),
                   assignment_target_id = COALESCE($6, assignment_target_id),
                   is_approval_stage = COALESCE($7, is_approval_stage),
                   updated_at = NOW()
               WHERE stage_id = $1
               RETURNING stage_id, flow_template_id, name, position, description, assignment_type, assignment_target_id, is_approval_stage, created_at, updated_at"#,
        )
        .bind(stage_id)
        .bind(&update.name)
        .bind(update.position)
        .bind(&update.description)
        .bind(&update.assignment_type)
        .bind(update.assignment_target_id)
        .bind(update.is_approval_stage)
        .fetch_optional(pool)
        .await
        .context("Failed to update stage")?;
        Ok(row)
    }

    pub async fn delete(pool: &PgPool, stage_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stage WHERE stage_id = $1")
            .bind(stage_id)
            .execute(pool)
            .await
            .context("Failed to delete stage")?;
        Ok(result.rows_affected() > 0)
    }
}
