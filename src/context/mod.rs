//! Conversation transcripts sent to the reasoning backend.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::shared::models::{MessageRow, SENDER_CUSTOMER};

/// One turn of a ticket conversation, in the shape the backend's
/// user-message endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketTurn {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub message: String,
    pub created_by: Option<Uuid>,
    pub bot_id: Option<Uuid>,
    pub sender_type: String,
    pub is_system_message: bool,
}

impl TicketTurn {
    pub fn customer(id: Uuid, ticket_id: Uuid, message: &str, user_id: Uuid) -> Self {
        Self {
            id,
            ticket_id,
            message: message.to_string(),
            created_by: Some(user_id),
            bot_id: None,
            sender_type: SENDER_CUSTOMER.to_string(),
            is_system_message: false,
        }
    }
}

impl From<MessageRow> for Dated<TicketTurn> {
    fn from(row: MessageRow) -> Self {
        Dated {
            created_at: row.created_at,
            entry: TicketTurn {
                id: row.id,
                ticket_id: row.ticket_id,
                message: row.message,
                created_by: row.created_by,
                bot_id: row.bot_id,
                sender_type: row.sender_type,
                is_system_message: row.is_system_message,
            },
        }
    }
}

/// One turn of a manager conversation: a prompt or a system response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptTurn {
    pub message: String,
    pub is_system_message: bool,
}

impl PromptTurn {
    pub fn prompt(message: &str) -> Self {
        Self {
            message: message.to_string(),
            is_system_message: false,
        }
    }

    pub fn response(message: &str) -> Self {
        Self {
            message: message.to_string(),
            is_system_message: true,
        }
    }
}

/// A stored turn together with the timestamp used to order it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dated<T> {
    pub created_at: DateTime<Utc>,
    pub entry: T,
}

impl<T> Dated<T> {
    pub fn new(created_at: DateTime<Utc>, entry: T) -> Self {
        Self { created_at, entry }
    }
}

/// Orders prior turns by creation time (stable for equal timestamps) and
/// appends the inbound item as the final entry.
pub fn assemble_transcript<T>(mut prior: Vec<Dated<T>>, inbound: T) -> Vec<T> {
    prior.sort_by_key(|turn| turn.created_at);
    let mut transcript: Vec<T> = prior.into_iter().map(|turn| turn.entry).collect();
    transcript.push(inbound);
    transcript
}
