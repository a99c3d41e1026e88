//! Action discovery and invocation endpoints
//!
//! - `GET /actions` - Metadata of every registered action
//! - `GET /actions/{id}` - Metadata of one action (id or legacy alias)
//! - `POST /actions/{id}` - Run an action against a conversation state

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::core::{ConversationState, Emission, Invocation, Secret};
use crate::errors::ActionError;
use crate::registry::ActionMetadata;
use crate::state::AppState;

/// Response for GET /actions
#[derive(Debug, Serialize)]
pub struct ActionListResponse {
    pub actions: Vec<ActionMetadata>,
    pub total_count: usize,
}

/// Body of POST /actions/{id}
#[derive(Debug, Default, Deserialize)]
pub struct InvokeRequest {
    #[serde(default)]
    pub state: ConversationState,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub secret: Option<Secret>,
}

/// The updated state plus whatever the action asked the engine to do.
#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    pub state: ConversationState,
    pub emissions: Vec<Emission>,
}

pub async fn list_actions(State(state): State<Arc<AppState>>) -> Json<ActionListResponse> {
    let actions = state.registry.list();
    Json(ActionListResponse {
        total_count: actions.len(),
        actions,
    })
}

pub async fn get_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ActionMetadata>, StatusCode> {
    state
        .registry
        .get(&id)
        .map(|action| Json(action.metadata()))
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn invoke_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, ActionError> {
    let InvokeRequest {
        state: mut conversation,
        args,
        secret,
    } = request;
    let invocation = Invocation { args, secret };

    state
        .registry
        .execute(&id, &mut conversation, invocation)
        .await?;

    let emissions = std::mem::take(&mut conversation.emissions);
    info!(action = %id, emissions = emissions.len(), "Action completed");
    Ok(Json(InvokeResponse {
        state: conversation,
        emissions,
    }))
}
