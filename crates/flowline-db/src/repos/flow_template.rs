use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FlowTemplateRow {
    pub flow_template_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by_user_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List item including the number of stages, for overview views
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FlowTemplateListRow {
    pub flow_template_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub stage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct FlowTemplateRepo;

impl FlowTemplateRepo {
    pub async fn create(
        pool: &PgPool,
        name: &str,
        description: Option<&str>,
        created_by_user_id: Uuid,
    ) -> Result<Uuid> {
        let flow_template_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO flow_template (flow_template_id, name, description, created_by_user_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(flow_template_id)
        .bind(name)
        .bind(description)
        .bind(created_by_user_id)
        .execute(pool)
        .await
        .context("Failed to create flow template")?;
        Ok(flow_template_id)
    }

    pub async fn get(pool: &PgPool, flow_template_id: Uuid) -> Result<Option<FlowTemplateRow>> {
        let row = sqlx::query_as::<_, FlowTemplateRow>(
            "SELECT flow_template_id, name, description, created_by_user_id, is_active, created_at, updated_at FROM flow_template WHERE flow_template_id = $1",
        )
        .bind(flow_template_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get flow template")?;
        Ok(row)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<FlowTemplateListRow>> {
        let rows = sqlx::query_as::<_, FlowTemplateListRow>(
            r#"SELECT f.flow_template_id, f.name, f.description, f.is_active,
                      COUNT(s.stage_id) AS stage_count, f.created_at, f.updated_at
               FROM flow_template f
               LEFT JOIN stage s ON s.flow_template_id = f.flow_template_id
               GROUP BY f.flow_template_id
               ORDER BY f.created_at DESC"#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to list flow templates")?;
        Ok(rows)
    }

    /// Partial update; `None` fields keep their current value
    pub async fn update(
        pool: &PgPool,
        flow_template_id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<FlowTemplateRow>> {
        let row = sqlx::query_as::<_, FlowTemplateRow>(
            r#"UPDATE flow_template SET
                   name = COALESCE($2, name),
                   description = COALESCE($3, description),
                   is_active = COALESCE($4, is_active),
                   updated_at = NOW()
               WHERE flow_template_id = $1
               RETURNING flow_template_id, name, description, created_by_user_id, is_active, created_at, updated_at"#,
        )
        .bind(flow_template_id)
        .bind(name)
        .bind(description)
        .bind(is_active)
        .fetch_optional(pool)
        .await
        .context("Failed to update flow template")?;
        Ok(row)
    }

    pub async fn delete(pool: &PgPool, flow_template_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM flow_template WHERE flow_template_id = $1")
            .bind(flow_template_id)
            .execute(pool)
            .await
            .context("Failed to delete flow template")?;
        Ok(result.rows_affected() > 0)
    }
}
