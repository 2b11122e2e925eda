//! Manager-prompt flow: a support manager instructs the backend, which may
//! draft, publish or annotate knowledge-base articles.

pub mod dispatch;
pub mod store;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::actions::{client_facing, Action};
use crate::context::{assemble_transcript, PromptTurn};
use crate::core::shared::models::NewManagerResponse;
use crate::core::shared::state::AppState;
use crate::core::shared::{DeskError, FatalError};
use crate::llm::{ManagerPromptBody, ReasoningBackend};

pub use dispatch::{dispatch_article_actions, ArticleDispatchSummary};
pub use store::KnowledgeStore;

const FATAL_DETAILS: &str = "Error processing request";

#[derive(Debug, Clone, Deserialize)]
pub struct HandleManagerPromptRequest {
    pub prompt_id: Uuid,
    pub conversation_id: Uuid,
    pub prompt: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandleManagerPromptResponse {
    pub success: bool,
    pub response: String,
    pub actions: Vec<Action>,
}

/// Runs the manager-prompt pipeline. Unlike the user-message flow, a backend
/// failure is fatal here. The response row and article mutations commit
/// together.
pub async fn process_manager_prompt<S>(
    store: &mut S,
    backend: &dyn ReasoningBackend,
    bot_id: Uuid,
    request: &HandleManagerPromptRequest,
) -> Result<HandleManagerPromptResponse, DeskError>
where
    S: KnowledgeStore + Send,
{
    let prior = store.conversation_history(request.conversation_id, request.prompt_id)?;
    let body = ManagerPromptBody {
        prompt_id: request.prompt_id,
        conversation_id: request.conversation_id,
        prompt: request.prompt.clone(),
        created_at: request.created_at,
        chat_history: assemble_transcript(prior, PromptTurn::prompt(&request.prompt)),
    };
    debug!("Chat history has {} turn(s)", body.chat_history.len());

    let reply = backend.manager_prompt(&body).await?;
    info!(
        "Backend replied with {} action(s) for prompt {}",
        reply.actions.len(),
        request.prompt_id
    );

    let summary = store.in_transaction(|tx| {
        tx.insert_manager_response(&NewManagerResponse::new(request.prompt_id, &reply.text))?;
        dispatch_article_actions(tx, bot_id, &reply.actions)
    })?;
    info!(
        "Conversation {}: applied {} action(s), skipped {}",
        request.conversation_id, summary.applied, summary.skipped
    );

    Ok(HandleManagerPromptResponse {
        success: true,
        response: reply.text,
        actions: client_facing(reply.actions),
    })
}

pub async fn handle_manager_prompt(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<HandleManagerPromptRequest>, JsonRejection>,
) -> Response {
    match run(&state, payload).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            error!("Error processing request: {e}");
            FatalError::new(e, FATAL_DETAILS).into_response()
        }
    }
}

async fn run(
    state: &AppState,
    payload: Result<Json<HandleManagerPromptRequest>, JsonRejection>,
) -> Result<HandleManagerPromptResponse, DeskError> {
    let Json(request) = payload.map_err(|e| DeskError::InvalidRequest(e.body_text()))?;
    debug!(
        "Request payload: prompt_id={} conversation_id={} created_at={}",
        request.prompt_id, request.conversation_id, request.created_at
    );

    let mut conn = state.conn.get()?;
    process_manager_prompt(
        &mut *conn,
        state.backend.as_ref(),
        state.config.default_bot_id,
        &request,
    )
    .await
}
