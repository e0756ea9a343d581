use crate::state::AppState;
use crate::web::api::middleware::AuthUser;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use flowline_common::models::auth::User;
use flowline_db::{TaskInstanceRepo, UserRepo, UserRow};
use serde_json::json;
use std::sync::Arc;

fn user_response(row: &UserRow) -> User {
    User {
        user_id: row.user_id,
        name: row.name.clone(),
        email: row.email.clone(),
        role: row.role.clone(),
        is_active: row.is_active,
        created_at: row.created_at,
    }
}

/// GET /api/users - List active users
#[tracing::instrument(skip(state, _auth))]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> impl IntoResponse {
    match UserRepo::list_active(&state.pool).await {
        Ok(users) => Json(users.iter().map(user_response).collect::<Vec<_>>()).into_response(),
        Err(e) => {
            tracing::error!("Failed to list users: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response()
        }
    }
}

/// GET /api/users/me - Current user information
#[tracing::instrument(skip(auth))]
pub async fn me(auth: AuthUser) -> impl IntoResponse {
    Json(user_response(&auth.0))
}

/// GET /api/users/me/tasks - Tasks currently assigned to the caller
#[tracing::instrument(skip(state, auth))]
pub async fn my_tasks(State(state): State<Arc<AppState>>, auth: AuthUser) -> impl IntoResponse {
    let user = &auth.0;
    let tasks = match TaskInstanceRepo::list_by_assignee(&state.pool, user.user_id).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to list assigned tasks: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response();
        }
    };

    let tasks_json: Vec<serde_json::Value> = tasks
        .iter()
        .map(|t| {
            json!({
                "task_id": t.task_id,
                "flow_instance_id": t.flow_instance_id,
                "stage_id": t.stage_id,
                "flow_name": t.flow_name,
                "stage_name": t.stage_name,
                "status": t.status,
                "started_at": t.started_at,
                "created_at": t.created_at,
            })
        })
        .collect();

    Json(json!({
        "user": {
            "user_id": user.user_id,
            "email": user.email,
            "name": user.name,
            "role": user.role,
        },
        "tasks": tasks_json,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_user_response_drops_password_hash() {
        let row = UserRow {
            user_id: Uuid::new_v4(),
            name: Some("Alice".to_string()),
            email: "alice@example.com".to_string(),
            password_hash: Some("secret-hash".to_string()),
            role: "member".to_string(),
            is_active: true,
            created_at: Utc::now(),
            last_login_at: None,
        };

        let user = user_response(&row);
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, "member");

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
    }
}
