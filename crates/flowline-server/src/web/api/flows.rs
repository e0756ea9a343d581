use crate::state::AppState;
use crate::web::api::middleware::AuthUser;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use flowline_db::{FlowTemplateRepo, FlowTemplateRow, NewStage, StageRepo, StageRow, StageUpdate};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateFlowRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFlowRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStageRequest {
    pub name: String,
    #[serde(rename = "order")]
    pub position: i32,
    pub description: Option<String>,
    pub assignment_type: String,
    pub assignment_target_id: Option<Uuid>,
    #[serde(default)]
    pub is_approval_stage: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStageRequest {
    pub name: Option<String>,
    #[serde(rename = "order")]
    pub position: Option<i32>,
    pub description: Option<String>,
    pub assignment_type: Option<String>,
    pub assignment_target_id: Option<Uuid>,
    pub is_approval_stage: Option<bool>,
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, Response> {
    raw.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("Invalid {} ID", what)})),
        )
            .into_response()
    })
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": format!("{} not found", what)})),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
        .into_response()
}

fn stage_json(stage: &StageRow) -> serde_json::Value {
    json!({
        "stage_id": stage.stage_id,
        "flow_template_id": stage.flow_template_id,
        "name": stage.name,
        "order": stage.position,
        "description": stage.description,
        "assignment_type": stage.assignment_type,
        "assignment_target_id": stage.assignment_target_id,
        "is_approval_stage": stage.is_approval_stage,
        "created_at": stage.created_at,
        "updated_at": stage.updated_at,
    })
}

fn flow_json(flow: &FlowTemplateRow, stages: &[StageRow]) -> serde_json::Value {
    json!({
        "flow_template_id": flow.flow_template_id,
        "name": flow.name,
        "description": flow.description,
        "created_by_user_id": flow.created_by_user_id,
        "is_active": flow.is_active,
        "stages": stages.iter().map(stage_json).collect::<Vec<_>>(),
        "created_at": flow.created_at,
        "updated_at": flow.updated_at,
    })
}

/// GET /api/flows - List flow templates with stage counts
#[tracing::instrument(skip(state, _auth))]
pub async fn list_flows(State(state): State<Arc<AppState>>, _auth: AuthUser) -> impl IntoResponse {
    match FlowTemplateRepo::list(&state.pool).await {
        Ok(flows) => {
            let items: Vec<serde_json::Value> = flows
                .iter()
                .map(|f| {
                    json!({
                        "flow_template_id": f.flow_template_id,
                        "name": f.name,
                        "description": f.description,
                        "is_active": f.is_active,
                        "stage_count": f.stage_count,
                        "created_at": f.created_at,
                        "updated_at": f.updated_at,
                    })
                })
                .collect();
            Json(items).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to list flow templates: {:#}", e);
            internal_error()
        }
    }
}

/// GET /api/flows/:id - Flow template detail with ordered stages
#[tracing::instrument(skip(state, _auth))]
pub async fn get_flow(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let flow_id = match parse_id(&id, "flow") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let flow = match FlowTemplateRepo::get(&state.pool, flow_id).await {
        Ok(Some(f)) => f,
        Ok(None) => return not_found("Flow"),
        Err(e) => {
            tracing::error!("Failed to get flow template: {:#}", e);
            return internal_error();
        }
    };

    match StageRepo::list_by_template(&state.pool, flow_id).await {
        Ok(stages) => Json(flow_json(&flow, &stages)).into_response(),
        Err(e) => {
            tracing::error!("Failed to list stages: {:#}", e);
            internal_error()
        }
    }
}

/// POST /api/flows - Create a flow template
#[tracing::instrument(skip(state, auth, req))]
pub async fn create_flow(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateFlowRequest>,
) -> impl IntoResponse {
    let flow_id = match FlowTemplateRepo::create(
        &state.pool,
        &req.name,
        req.description.as_deref(),
        auth.0.user_id,
    )
    .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to create flow template: {:#}", e);
            return internal_error();
        }
    };

    match FlowTemplateRepo::get(&state.pool, flow_id).await {
        Ok(Some(flow)) => (StatusCode::CREATED, Json(flow_json(&flow, &[]))).into_response(),
        Ok(None) => internal_error(),
        Err(e) => {
            tracing::error!("Failed to get flow template: {:#}", e);
            internal_error()
        }
    }
}

/// PUT /api/flows/:id - Partially update a flow template
#[tracing::instrument(skip(state, _auth, req))]
pub async fn update_flow(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateFlowRequest>,
) -> impl IntoResponse {
    let flow_id = match parse_id(&id, "flow") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let flow = match FlowTemplateRepo::update(
        &state.pool,
        flow_id,
        req.name.as_deref(),
        req.description.as_deref(),
        req.is_active,
    )
    .await
    {
        Ok(Some(f)) => f,
        Ok(None) => return not_found("Flow"),
        Err(e) => {
            tracing::error!("Failed to update flow template: {:#}", e);
            return internal_error();
        }
    };

    match StageRepo::list_by_template(&state.pool, flow_id).await {
        Ok(stages) => Json(flow_json(&flow, &stages)).into_response(),
        Err(e) => {
            tracing::error!("Failed to list stages: {:#}", e);
            internal_error()
        }
    }
}

/// DELETE /api/flows/:id
#[tracing::instrument(skip(state, _auth))]
pub async fn delete_flow(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let flow_id = match parse_id(&id, "flow") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match FlowTemplateRepo::delete(&state.pool, flow_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found("Flow"),
        Err(e) => {
            tracing::error!("Failed to delete flow template: {:#}", e);
            internal_error()
        }
    }
}

/// POST /api/flows/:id/stages - Add a stage to a flow template
#[tracing::instrument(skip(state, _auth, req))]
pub async fn create_stage(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<CreateStageRequest>,
) -> impl IntoResponse {
    let flow_id = match parse_id(&id, "flow") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match FlowTemplateRepo::get(&state.pool, flow_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found("Flow"),
        Err(e) => {
            tracing::error!("Failed to get flow template: {:#}", e);
            return internal_error();
        }
    }

    let new_stage = NewStage {
        flow_template_id: flow_id,
        name: req.name,
        position: req.position,
        description: req.description,
        assignment_type: req.assignment_type,
        assignment_target_id: req.assignment_target_id,
        is_approval_stage: req.is_approval_stage,
    };

    let stage_id = match StageRepo::create(&state.pool, &new_stage).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to create stage: {:#}", e);
            return internal_error();
        }
    };

    match StageRepo::get(&state.pool, stage_id).await {
        Ok(Some(stage)) => (StatusCode::CREATED, Json(stage_json(&stage))).into_response(),
        Ok(None) => internal_error(),
        Err(e) => {
            tracing::error!("Failed to get stage: {:#}", e);
            internal_error()
        }
    }
}

/// Look up a stage and check it belongs to the flow in the path
async fn stage_in_flow(
    state: &AppState,
    flow_id: Uuid,
    stage_id: Uuid,
) -> Result<StageRow, Response> {
    match StageRepo::get(&state.pool, stage_id).await {
        Ok(Some(stage)) if stage.flow_template_id == flow_id => Ok(stage),
        Ok(_) => Err(not_found("Stage")),
        Err(e) => {
            tracing::error!("Failed to get stage: {:#}", e);
            Err(internal_error())
        }
    }
}

/// PUT /api/flows/:id/stages/:stage_id - Partially update a stage
#[tracing::instrument(skip(state, _auth, req))]
pub async fn update_stage(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path((id, stage_id)): Path<(String, String)>,
    Json(req): Json<UpdateStageRequest>,
) -> impl IntoResponse {
    let flow_id = match parse_id(&id, "flow") {
        Ok(id) => id,
        Err(response) => return response,
    };
    let stage_id = match parse_id(&stage_id, "stage") {
        Ok(id) => id,
        Err(response) => return response,
    };

    if let Err(response) = stage_in_flow(&state, flow_id, stage_id).await {
        return response;
    }

    let update = StageUpdate {
        name: req.name,
        position: req.position,
        description: req.description,
        assignment_type: req.assignment_type,
        assignment_target_id: req.assignment_target_id,
        is_approval_stage: req.is_approval_stage,
    };

    match StageRepo::update(&state.pool, stage_id, &update).await {
        Ok(Some(stage)) => Json(stage_json(&stage)).into_response(),
        Ok(None) => not_found("Stage"),
        Err(e) => {
            tracing::error!("Failed to update stage: {:#}", e);
            internal_error()
        }
    }
}

/// DELETE /api/flows/:id/stages/:stage_id
#[tracing::instrument(skip(state, _auth))]
pub async fn delete_stage(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path((id, stage_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let flow_id = match parse_id(&id, "flow") {
        Ok(id) => id,
        Err(response) => return response,
    };
    let stage_id = match parse_id(&stage_id, "stage") {
        Ok(id) => id,
        Err(response) => return response,
    };

    if let Err(response) = stage_in_flow(&state, flow_id, stage_id).await {
        return response;
    }

    match StageRepo::delete(&state.pool, stage_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found("Stage"),
        Err(e) => {
            tracing::error!("Failed to delete stage: {:#}", e);
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_valid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "flow").unwrap(), id);
    }

    #[test]
    fn test_parse_id_invalid_is_bad_request() {
        let response = parse_id("42", "flow").unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_stage_json_renames_position_to_order() {
        let stage = StageRow {
            stage_id: Uuid::new_v4(),
            flow_template_id: Uuid::new_v4(),
            name: "Review".to_string(),
            position: 3,
            description: None,
            assignment_type: "role".to_string(),
            assignment_target_id: None,
            is_approval_stage: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let value = stage_json(&stage);
        assert_eq!(value["order"], 3);
        assert!(value.get("position").is_none());
    }
}
