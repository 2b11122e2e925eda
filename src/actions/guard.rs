//! Escalation safety net for the user-message flow.
//!
//! Whatever the backend does, a customer who needs a human must end up with
//! an `escalate` action that can be applied. The backend may send one, flag
//! the reply, word the reply as a hand-off, or send an `escalate` entry whose
//! fields do not fit; a failed call falls back to a canned reply.

use log::{info, warn};

use super::{Action, DEFAULT_CATEGORY};
use crate::llm::{BackendError, BackendReply};

pub const FALLBACK_REPLY: &str =
    "I'm having trouble processing your request. A human agent will assist you shortly.";
pub const AUTO_ESCALATION_REASON: &str = "Auto-escalation from system message or API response";
pub const FAILURE_CATEGORY: &str = "technical";

const ESCALATION_KEYWORDS: [&str; 5] = [
    "escalate",
    "escalated",
    "human agent",
    "support representative",
    "real person",
];

/// The reply text and action list after the guard has run.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardedReply {
    pub text: String,
    pub actions: Vec<Action>,
    pub fell_back: bool,
}

pub fn mentions_escalation(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ESCALATION_KEYWORDS.iter().any(|word| lowered.contains(word))
}

pub fn guard_reply(outcome: Result<BackendReply, BackendError>) -> GuardedReply {
    match outcome {
        Ok(reply) => {
            let mut actions = reply.actions;
            let untyped_escalation = actions
                .iter()
                .any(|a| a.kind() == "escalate" && !a.is_escalation());
            if untyped_escalation {
                warn!("Backend sent an escalate action that cannot be applied as is");
            }
            let should_escalate =
                reply.escalate || untyped_escalation || mentions_escalation(&reply.text);
            if should_escalate && !actions.iter().any(Action::is_escalation) {
                info!("Adding escalate action: the backend asked for a human");
                actions.push(Action::escalate(AUTO_ESCALATION_REASON, DEFAULT_CATEGORY));
            }
            GuardedReply {
                text: reply.text,
                actions,
                fell_back: false,
            }
        }
        Err(e) => {
            warn!("Reasoning backend failed, using fallback reply: {e}");
            GuardedReply {
                text: FALLBACK_REPLY.to_string(),
                actions: vec![Action::escalate(format!("API error: {e}"), FAILURE_CATEGORY)],
                fell_back: true,
            }
        }
    }
}
