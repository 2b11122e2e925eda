use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::context::{Dated, TicketTurn};
use crate::core::shared::models::{
    MessageRow, NewMessage, NewTicket, NewTicketNote, TicketEscalation,
};
use crate::core::shared::schema::{messages, ticket_notes, tickets};
use crate::core::shared::{DeskError, Transactional};

/// Storage used by the user-message flow. Update methods return the number
/// of rows they touched so callers can detect a missing ticket.
pub trait TicketStore: Transactional {
    /// Prior turns of a ticket, leaving out the inbound message itself.
    fn ticket_history(
        &mut self,
        ticket_id: Uuid,
        inbound_message_id: Uuid,
    ) -> Result<Vec<Dated<TicketTurn>>, DeskError>;

    fn create_ticket(&mut self, ticket: &NewTicket) -> Result<(), DeskError>;

    fn escalate_ticket(
        &mut self,
        ticket_id: Uuid,
        escalation: &TicketEscalation,
    ) -> Result<usize, DeskError>;

    fn set_ticket_status(
        &mut self,
        ticket_id: Uuid,
        status: &str,
        resolved: bool,
    ) -> Result<usize, DeskError>;

    fn rename_ticket(&mut self, ticket_id: Uuid, name: &str) -> Result<usize, DeskError>;

    fn add_ticket_note(&mut self, note: &NewTicketNote) -> Result<(), DeskError>;

    fn insert_message(&mut self, message: &NewMessage) -> Result<(), DeskError>;
}

impl TicketStore for PgConnection {
    fn ticket_history(
        &mut self,
        ticket_id: Uuid,
        inbound_message_id: Uuid,
    ) -> Result<Vec<Dated<TicketTurn>>, DeskError> {
        let rows: Vec<MessageRow> = messages::table
            .filter(messages::ticket_id.eq(ticket_id))
            .filter(messages::id.ne(inbound_message_id))
            .order(messages::created_at.asc())
            .select(MessageRow::as_select())
            .load(self)?;
        Ok(rows.into_iter().map(Dated::from).collect())
    }

    fn create_ticket(&mut self, ticket: &NewTicket) -> Result<(), DeskError> {
        diesel::insert_into(tickets::table)
            .values(ticket)
            .execute(self)?;
        Ok(())
    }

    fn escalate_ticket(
        &mut self,
        ticket_id: Uuid,
        escalation: &TicketEscalation,
    ) -> Result<usize, DeskError> {
        let updated = diesel::update(tickets::table.find(ticket_id))
            .set((
                tickets::priority.eq(&escalation.priority),
                tickets::status.eq(&escalation.status),
                tickets::category.eq(&escalation.category),
                tickets::assigned_to.eq(None::<Uuid>),
                tickets::updated_at.eq(Utc::now()),
            ))
            .execute(self)?;
        Ok(updated)
    }

    fn set_ticket_status(
        &mut self,
        ticket_id: Uuid,
        status: &str,
        resolved: bool,
    ) -> Result<usize, DeskError> {
        let updated = diesel::update(tickets::table.find(ticket_id))
            .set((
                tickets::status.eq(status),
                tickets::resolved.eq(resolved),
                tickets::updated_at.eq(Utc::now()),
            ))
            .execute(self)?;
        Ok(updated)
    }

    fn rename_ticket(&mut self, ticket_id: Uuid, name: &str) -> Result<usize, DeskError> {
        let updated = diesel::update(tickets::table.find(ticket_id))
            .set((tickets::name.eq(name), tickets::updated_at.eq(Utc::now())))
            .execute(self)?;
        Ok(updated)
    }

    fn add_ticket_note(&mut self, note: &NewTicketNote) -> Result<(), DeskError> {
        diesel::insert_into(ticket_notes::table)
            .values(note)
            .execute(self)?;
        Ok(())
    }

    fn insert_message(&mut self, message: &NewMessage) -> Result<(), DeskError> {
        diesel::insert_into(messages::table)
            .values(message)
            .execute(self)?;
        Ok(())
    }
}
