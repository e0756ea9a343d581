use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FlowInstanceRow {
    pub flow_instance_id: Uuid,
    pub flow_template_id: Uuid,
    pub requester_user_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub struct FlowInstanceRepo;

impl FlowInstanceRepo {
    pub async fn create(
        pool: &PgPool,
        flow_template_id: Uuid,
        requester_user_id: Uuid,
    ) -> Result<Uuid> {
        let flow_instance_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO flow_instance (flow_instance_id, flow_template_id, requester_user_id) VALUES ($1, $2, $3)",
        )
        .bind(flow_instance_id)
        .bind(flow_template_id)
        .bind(requester_user_id)
        .execute(pool)
        .await
        .context("Failed to create flow instance")?;
        Ok(flow_instance_id)
    }

    pub async fn get(pool: &PgPool, flow_instance_id: Uuid) -> Result<Option<FlowInstanceRow>> {
        let row = sqlx::query_as::<_, FlowInstanceRow>(
            "SELECT flow_instance_id, flow_template_id, requester_user_id, status, created_at FROM flow_instance WHERE flow_instance_id = $1",
        )
        .bind(flow_instance_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get flow instance")?;
        Ok(row)
    }
}
