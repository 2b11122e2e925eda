//! User-message flow: a customer writes on a ticket, the reasoning backend
//! answers, and its actions are applied to the ticket.

pub mod dispatch;
pub mod store;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::actions::guard::guard_reply;
use crate::actions::{client_facing, Action};
use crate::context::{assemble_transcript, TicketTurn};
use crate::core::shared::models::NewMessage;
use crate::core::shared::state::AppState;
use crate::core::shared::{DeskError, FatalError};
use crate::llm::{ReasoningBackend, UserMessageBody};

pub use dispatch::{dispatch_ticket_actions, DispatchSummary, TicketContext};
pub use store::TicketStore;

const FATAL_DETAILS: &str = "Fatal error in edge function";

#[derive(Debug, Clone, Deserialize)]
pub struct HandleMessageRequest {
    pub message_id: Uuid,
    pub ticket_id: Uuid,
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandleMessageResponse {
    pub success: bool,
    pub message: String,
    pub actions: Vec<Action>,
}

/// Runs the whole user-message pipeline on one store handle.
///
/// Backend failures never fail the request: the escalation guard replaces
/// them with a fallback reply. All writes (actions plus the system reply)
/// commit together.
pub async fn process_user_message<S>(
    store: &mut S,
    backend: &dyn ReasoningBackend,
    bot_id: Uuid,
    request: &HandleMessageRequest,
) -> Result<HandleMessageResponse, DeskError>
where
    S: TicketStore + Send,
{
    let prior = store.ticket_history(request.ticket_id, request.message_id)?;
    let inbound = TicketTurn::customer(
        request.message_id,
        request.ticket_id,
        &request.message,
        request.user_id,
    );
    let body = UserMessageBody {
        messages: assemble_transcript(prior, inbound),
    };
    debug!("Transcript has {} turn(s)", body.messages.len());

    let reply = guard_reply(backend.user_message(&body).await);

    let ctx = TicketContext {
        ticket_id: request.ticket_id,
        bot_id,
    };
    let summary = store.in_transaction(|tx| {
        let summary = dispatch_ticket_actions(tx, &ctx, &reply.actions)?;
        tx.insert_message(&NewMessage::system_reply(
            request.ticket_id,
            &reply.text,
            bot_id,
        ))?;
        Ok(summary)
    })?;
    info!(
        "Ticket {}: applied {} action(s), skipped {}",
        request.ticket_id, summary.applied, summary.skipped
    );

    Ok(HandleMessageResponse {
        success: true,
        message: reply.text,
        actions: client_facing(reply.actions),
    })
}

pub async fn handle_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<HandleMessageRequest>, JsonRejection>,
) -> Response {
    info!("Starting request processing");
    match run(&state, payload).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            error!("Fatal error in handle-message: {e}");
            FatalError::new(e, FATAL_DETAILS).with_stack().into_response()
        }
    }
}

async fn run(
    state: &AppState,
    payload: Result<Json<HandleMessageRequest>, JsonRejection>,
) -> Result<HandleMessageResponse, DeskError> {
    let Json(request) = payload.map_err(|e| DeskError::InvalidRequest(e.body_text()))?;
    debug!(
        "Request payload: message_id={} ticket_id={} user_id={}",
        request.message_id, request.ticket_id, request.user_id
    );

    // Held until the response is built; dropping it returns it to the pool.
    let mut conn = state.conn.get()?;
    process_user_message(
        &mut *conn,
        state.backend.as_ref(),
        state.config.default_bot_id,
        &request,
    )
    .await
}
