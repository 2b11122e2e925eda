//! Maps user-message actions onto ticket mutations.

use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use super::store::TicketStore;
use crate::actions::{
    Action, KnownAction, TicketRequest, CLOSED_STATUS, DEFAULT_CATEGORY,
    DEFAULT_STATUS, ESCALATION_PRIORITY, NEW_TICKET_PRIORITY,
};
use crate::core::shared::models::{Author, NewTicket, NewTicketNote, TicketEscalation};
use crate::core::shared::utils::truncate_chars;
use crate::core::shared::DeskError;

pub const TICKET_NAME_MAX_CHARS: usize = 100;
pub const UNKNOWN_TICKET_NAME: &str = "Unknown";

/// The ticket the conversation belongs to and the bot acting on it.
#[derive(Debug, Clone, Copy)]
pub struct TicketContext {
    pub ticket_id: Uuid,
    pub bot_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub applied: usize,
    pub skipped: usize,
    pub created_tickets: Vec<Uuid>,
}

/// Applies each action in order. The first failing mutation stops the run
/// and its error is returned; unknown or incomplete actions are skipped.
pub fn dispatch_ticket_actions<S: TicketStore>(
    store: &mut S,
    ctx: &TicketContext,
    actions: &[Action],
) -> Result<DispatchSummary, DeskError> {
    let mut summary = DispatchSummary::default();

    for action in actions {
        info!("Processing action: {}", action.kind());
        let applied = match action.known() {
            Some(known) => apply(store, ctx, known, &mut summary)?,
            None => {
                warn!("Unknown action: {}", action.kind());
                false
            }
        };
        if applied {
            summary.applied += 1;
        } else {
            summary.skipped += 1;
        }
    }

    Ok(summary)
}

fn apply<S: TicketStore>(
    store: &mut S,
    ctx: &TicketContext,
    action: &KnownAction,
    summary: &mut DispatchSummary,
) -> Result<bool, DeskError> {
    match action {
        KnownAction::FeatureRequest(request) | KnownAction::Feedback(request) => {
            let ticket = new_ticket(request, ctx.bot_id);
            store.create_ticket(&ticket)?;
            info!("Created {} ticket {}", action.kind(), ticket.id);
            summary.created_tickets.push(ticket.id);
            Ok(true)
        }
        KnownAction::Escalate(escalation) => {
            let meta = escalation.metadata.clone().unwrap_or_default();
            let changes = TicketEscalation {
                priority: or_default(meta.priority.as_deref(), ESCALATION_PRIORITY),
                status: or_default(meta.status.as_deref(), DEFAULT_STATUS),
                category: or_default(meta.category.as_deref(), DEFAULT_CATEGORY),
            };
            info!(
                "Escalating ticket {} ({})",
                ctx.ticket_id,
                escalation.reason.as_deref().unwrap_or("no reason given")
            );
            expect_row(store.escalate_ticket(ctx.ticket_id, &changes)?, ctx.ticket_id)?;
            Ok(true)
        }
        KnownAction::UpdateStatus(change) => {
            let Some(status) = change.status.as_deref() else {
                warn!("Skipping update_status without a status");
                return Ok(false);
            };
            let resolved = status == CLOSED_STATUS;
            expect_row(
                store.set_ticket_status(ctx.ticket_id, status, resolved)?,
                ctx.ticket_id,
            )?;
            Ok(true)
        }
        KnownAction::AddNote(note) => {
            let Some(content) = note.note.as_deref() else {
                warn!("Skipping add_note without a note");
                return Ok(false);
            };
            store.add_ticket_note(&NewTicketNote::new(
                ctx.ticket_id,
                content,
                Author::Bot(ctx.bot_id),
            ))?;
            Ok(true)
        }
        KnownAction::UpdateName(rename) => {
            let Some(name) = rename.name.as_deref() else {
                warn!("Skipping update_name without a name");
                return Ok(false);
            };
            expect_row(store.rename_ticket(ctx.ticket_id, name)?, ctx.ticket_id)?;
            Ok(true)
        }
        KnownAction::SearchKb(search) | KnownAction::SearchInfo(search) => {
            info!(
                "Search results for {}: {}",
                action.kind(),
                search
                    .results
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "none".to_string())
            );
            Ok(true)
        }
        KnownAction::WriteArticle(_)
        | KnownAction::UpdateArticleStatus(_)
        | KnownAction::AddArticleNote(_) => {
            warn!("Unknown action: {}", action.kind());
            Ok(false)
        }
    }
}

fn new_ticket(request: &TicketRequest, bot_id: Uuid) -> NewTicket {
    let meta = request.metadata.clone().unwrap_or_default();
    let name = request
        .message
        .as_deref()
        .filter(|m| !m.is_empty())
        .map(|m| truncate_chars(m, TICKET_NAME_MAX_CHARS))
        .unwrap_or_else(|| UNKNOWN_TICKET_NAME.to_string());
    let now = Utc::now();
    NewTicket {
        id: Uuid::new_v4(),
        name,
        status: or_default(meta.status.as_deref(), DEFAULT_STATUS),
        category: or_default(meta.category.as_deref(), DEFAULT_CATEGORY),
        priority: or_default(meta.priority.as_deref(), NEW_TICKET_PRIORITY),
        assigned_to: Some(bot_id),
        resolved: false,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn or_default(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}

fn expect_row(updated: usize, ticket_id: Uuid) -> Result<(), DeskError> {
    if updated == 0 {
        warn!("No ticket found with ID: {ticket_id}");
        return Err(DeskError::not_found("Ticket", ticket_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::parse_actions;
    use crate::tests::test_util::MemoryStore;
    use serde_json::json;

    fn setup() -> (MemoryStore, TicketContext) {
        let mut store = MemoryStore::default();
        let ticket_id = store.seed_ticket("Login broken");
        let ctx = TicketContext {
            ticket_id,
            bot_id: Uuid::new_v4(),
        };
        (store, ctx)
    }

    #[test]
    fn test_feedback_then_escalate_targets_original_ticket() {
        let (mut store, ctx) = setup();
        let actions = parse_actions(Some(json!([
            {"action": "feedback", "message": "X".repeat(150)},
            {"action": "escalate"}
        ])));

        let summary = dispatch_ticket_actions(&mut store, &ctx, &actions).unwrap();

        assert_eq!(summary.applied, 2);
        assert_eq!(summary.created_tickets.len(), 1);
        let created = store.ticket(summary.created_tickets[0]).unwrap();
        assert_eq!(created.name.chars().count(), TICKET_NAME_MAX_CHARS);
        assert_eq!(created.priority, NEW_TICKET_PRIORITY);
        assert_eq!(created.assigned_to, Some(ctx.bot_id));
        assert_eq!(created.status, DEFAULT_STATUS);

        let original = store.ticket(ctx.ticket_id).unwrap();
        assert_eq!(original.priority, ESCALATION_PRIORITY);
        assert_eq!(original.category, DEFAULT_CATEGORY);
        assert_eq!(original.assigned_to, None);
    }

    #[test]
    fn test_feature_request_without_message_is_unknown_named() {
        let (mut store, ctx) = setup();
        let actions = parse_actions(Some(json!([
            {"action": "feature_request", "metadata": {"priority": "medium", "category": "ux"}}
        ])));
        let summary = dispatch_ticket_actions(&mut store, &ctx, &actions).unwrap();
        let created = store.ticket(summary.created_tickets[0]).unwrap();
        assert_eq!(created.name, UNKNOWN_TICKET_NAME);
        assert_eq!(created.priority, "medium");
        assert_eq!(created.category, "ux");
    }

    #[test]
    fn test_feedback_with_database_style_timestamps_creates_ticket() {
        let (mut store, ctx) = setup();
        let actions = parse_actions(Some(json!([
            {"action": "feedback", "message": "Checkout is slow",
             "metadata": {"category": "performance", "created_at": "2024-06-01 09:00:00",
                          "updated_at": "not a date"}}
        ])));
        let summary = dispatch_ticket_actions(&mut store, &ctx, &actions).unwrap();
        assert_eq!(summary.applied, 1);
        let created = store.ticket(summary.created_tickets[0]).unwrap();
        assert_eq!(created.name, "Checkout is slow");
        assert_eq!(created.category, "performance");
    }

    #[test]
    fn test_update_status_closed_resolves() {
        let (mut store, ctx) = setup();
        let actions = parse_actions(Some(json!([{"action": "update_status", "status": "closed"}])));
        dispatch_ticket_actions(&mut store, &ctx, &actions).unwrap();
        let ticket = store.ticket(ctx.ticket_id).unwrap();
        assert_eq!(ticket.status, "closed");
        assert!(ticket.resolved);

        let actions = parse_actions(Some(json!([{"action": "update_status", "status": "open"}])));
        dispatch_ticket_actions(&mut store, &ctx, &actions).unwrap();
        assert!(!store.ticket(ctx.ticket_id).unwrap().resolved);
    }

    #[test]
    fn test_note_and_rename() {
        let (mut store, ctx) = setup();
        let actions = parse_actions(Some(json!([
            {"action": "add_note", "note": "Customer on premium plan"},
            {"action": "update_name", "name": "Cannot log in on mobile"}
        ])));
        dispatch_ticket_actions(&mut store, &ctx, &actions).unwrap();

        assert_eq!(store.ticket(ctx.ticket_id).unwrap().name, "Cannot log in on mobile");
        assert_eq!(store.ticket_notes.len(), 1);
        let note = &store.ticket_notes[0];
        assert_eq!(note.bot_id, Some(ctx.bot_id));
        assert_eq!(note.created_by, None);
    }

    #[test]
    fn test_unknown_incomplete_and_search_actions_do_not_write() {
        let (mut store, ctx) = setup();
        let before = store.clone();
        let actions = parse_actions(Some(json!([
            {"action": "dance"},
            {"action": "update_name"},
            {"action": "search_kb", "results": ["a"]},
            {"action": "write_article", "article": {"title": "t", "content": "c", "status": "draft"}}
        ])));

        let summary = dispatch_ticket_actions(&mut store, &ctx, &actions).unwrap();

        assert_eq!(summary.applied, 1);
        assert_eq!(summary.skipped, 3);
        assert_eq!(store, before);
    }

    #[test]
    fn test_missing_ticket_stops_the_run() {
        let mut store = MemoryStore::default();
        let ctx = TicketContext {
            ticket_id: Uuid::new_v4(),
            bot_id: Uuid::new_v4(),
        };
        let actions = parse_actions(Some(json!([
            {"action": "escalate"},
            {"action": "feedback", "message": "never created"}
        ])));

        let err = dispatch_ticket_actions(&mut store, &ctx, &actions).unwrap_err();

        assert!(matches!(err, DeskError::TargetNotFound { entity: "Ticket", .. }));
        assert!(store.tickets.is_empty());
    }
}
