use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::{Mutex, Once};
use uuid::Uuid;

use crate::context::{Dated, PromptTurn, TicketTurn};
use crate::core::shared::models::{
    ArticleStatusChangeset, NewArticle, NewArticleNote, NewManagerResponse, NewMessage,
    NewTicket, NewTicketNote, TicketEscalation, SENDER_CUSTOMER, SENDER_EMPLOYEE,
};
use crate::core::shared::{DeskError, Transactional};
use crate::kb::KnowledgeStore;
use crate::llm::{
    BackendError, BackendReply, ManagerPromptBody, ReasoningBackend, ReplyPayload,
    UserMessageBody,
};
use crate::tickets::TicketStore;

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPrompt {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory stand-in for the Postgres tables. A failed transaction restores
/// the snapshot taken when it began.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    pub tickets: Vec<NewTicket>,
    pub messages: Vec<NewMessage>,
    pub ticket_notes: Vec<NewTicketNote>,
    pub articles: Vec<NewArticle>,
    pub article_notes: Vec<NewArticleNote>,
    pub prompts: Vec<StoredPrompt>,
    pub responses: Vec<NewManagerResponse>,
}

impl MemoryStore {
    pub fn seed_ticket(&mut self, name: &str) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.tickets.push(NewTicket {
            id,
            name: name.to_string(),
            status: "open".to_string(),
            category: "support".to_string(),
            priority: "low".to_string(),
            assigned_to: Some(Uuid::new_v4()),
            resolved: false,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn ticket(&self, id: Uuid) -> Option<&NewTicket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    fn ticket_mut(&mut self, id: Uuid) -> Option<&mut NewTicket> {
        self.tickets.iter_mut().find(|t| t.id == id)
    }

    pub fn seed_message(
        &mut self,
        ticket_id: Uuid,
        text: &str,
        is_system: bool,
        at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let (sender_type, created_by, bot_id) = if is_system {
            (SENDER_EMPLOYEE, None, Some(Uuid::new_v4()))
        } else {
            (SENDER_CUSTOMER, Some(Uuid::new_v4()), None)
        };
        self.messages.push(NewMessage {
            id,
            ticket_id,
            message: text.to_string(),
            created_by,
            bot_id,
            sender_type: sender_type.to_string(),
            is_system_message: is_system,
            created_at: at,
        });
        id
    }

    pub fn seed_message_with_id(
        &mut self,
        id: Uuid,
        ticket_id: Uuid,
        text: &str,
        at: DateTime<Utc>,
    ) {
        self.messages.push(NewMessage {
            id,
            ticket_id,
            message: text.to_string(),
            created_by: Some(Uuid::new_v4()),
            bot_id: None,
            sender_type: SENDER_CUSTOMER.to_string(),
            is_system_message: false,
            created_at: at,
        });
    }

    pub fn messages_for(&self, ticket_id: Uuid) -> Vec<&NewMessage> {
        self.messages
            .iter()
            .filter(|m| m.ticket_id == ticket_id)
            .collect()
    }

    pub fn seed_article(&mut self, title: &str, status: &str) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.articles.push(NewArticle {
            id,
            title: title.to_string(),
            description: None,
            content: format!("{title} body"),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
            published_at: None,
            view_count: 0,
            is_faq: false,
            category: None,
            slug: None,
            bot_id: None,
        });
        id
    }

    pub fn article(&self, id: Uuid) -> Option<&NewArticle> {
        self.articles.iter().find(|a| a.id == id)
    }

    pub fn seed_prompt(&mut self, conversation_id: Uuid, prompt: &str, at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.seed_prompt_with_id(id, conversation_id, prompt, at);
        id
    }

    pub fn seed_prompt_with_id(
        &mut self,
        id: Uuid,
        conversation_id: Uuid,
        prompt: &str,
        at: DateTime<Utc>,
    ) {
        self.prompts.push(StoredPrompt {
            id,
            conversation_id,
            prompt: prompt.to_string(),
            created_at: at,
        });
    }

    pub fn seed_response(&mut self, prompt_id: Uuid, response: &str, at: DateTime<Utc>) {
        let mut row = NewManagerResponse::new(prompt_id, response);
        row.created_at = at;
        self.responses.push(row);
    }
}

impl Transactional for MemoryStore {
    fn in_transaction<T, F>(&mut self, f: F) -> Result<T, DeskError>
    where
        F: FnOnce(&mut Self) -> Result<T, DeskError>,
    {
        let snapshot = self.clone();
        let outcome = f(self);
        if outcome.is_err() {
            *self = snapshot;
        }
        outcome
    }
}

impl TicketStore for MemoryStore {
    fn ticket_history(
        &mut self,
        ticket_id: Uuid,
        inbound_message_id: Uuid,
    ) -> Result<Vec<Dated<TicketTurn>>, DeskError> {
        Ok(self
            .messages
            .iter()
            .filter(|m| m.ticket_id == ticket_id && m.id != inbound_message_id)
            .map(|m| {
                Dated::new(
                    m.created_at,
                    TicketTurn {
                        id: m.id,
                        ticket_id: m.ticket_id,
                        message: m.message.clone(),
                        created_by: m.created_by,
                        bot_id: m.bot_id,
                        sender_type: m.sender_type.clone(),
                        is_system_message: m.is_system_message,
                    },
                )
            })
            .collect())
    }

    fn create_ticket(&mut self, ticket: &NewTicket) -> Result<(), DeskError> {
        self.tickets.push(ticket.clone());
        Ok(())
    }

    fn escalate_ticket(
        &mut self,
        ticket_id: Uuid,
        escalation: &TicketEscalation,
    ) -> Result<usize, DeskError> {
        Ok(match self.ticket_mut(ticket_id) {
            Some(ticket) => {
                ticket.priority = escalation.priority.clone();
                ticket.status = escalation.status.clone();
                ticket.category = escalation.category.clone();
                ticket.assigned_to = None;
                ticket.updated_at = Utc::now();
                1
            }
            None => 0,
        })
    }

    fn set_ticket_status(
        &mut self,
        ticket_id: Uuid,
        status: &str,
        resolved: bool,
    ) -> Result<usize, DeskError> {
        Ok(match self.ticket_mut(ticket_id) {
            Some(ticket) => {
                ticket.status = status.to_string();
                ticket.resolved = resolved;
                ticket.updated_at = Utc::now();
                1
            }
            None => 0,
        })
    }

    fn rename_ticket(&mut self, ticket_id: Uuid, name: &str) -> Result<usize, DeskError> {
        Ok(match self.ticket_mut(ticket_id) {
            Some(ticket) => {
                ticket.name = name.to_string();
                ticket.updated_at = Utc::now();
                1
            }
            None => 0,
        })
    }

    fn add_ticket_note(&mut self, note: &NewTicketNote) -> Result<(), DeskError> {
        self.ticket_notes.push(note.clone());
        Ok(())
    }

    fn insert_message(&mut self, message: &NewMessage) -> Result<(), DeskError> {
        // Mirrors the foreign key on messages.ticket_id.
        if self.ticket(message.ticket_id).is_none() {
            return Err(DeskError::Database(diesel::result::Error::NotFound));
        }
        self.messages.push(message.clone());
        Ok(())
    }
}

impl KnowledgeStore for MemoryStore {
    fn conversation_history(
        &mut self,
        conversation_id: Uuid,
        inbound_prompt_id: Uuid,
    ) -> Result<Vec<Dated<PromptTurn>>, DeskError> {
        let in_conversation: Vec<&StoredPrompt> = self
            .prompts
            .iter()
            .filter(|p| p.conversation_id == conversation_id)
            .collect();
        let prompts = in_conversation
            .iter()
            .filter(|p| p.id != inbound_prompt_id)
            .map(|p| Dated::new(p.created_at, PromptTurn::prompt(&p.prompt)));
        let responses = self
            .responses
            .iter()
            .filter(|r| in_conversation.iter().any(|p| p.id == r.prompt_id))
            .map(|r| Dated::new(r.created_at, PromptTurn::response(&r.response)));
        Ok(prompts.chain(responses).collect())
    }

    fn insert_manager_response(&mut self, response: &NewManagerResponse) -> Result<(), DeskError> {
        self.responses.push(response.clone());
        Ok(())
    }

    fn create_article(&mut self, article: &NewArticle) -> Result<(), DeskError> {
        self.articles.push(article.clone());
        Ok(())
    }

    fn update_article_status(
        &mut self,
        article_id: Uuid,
        changes: &ArticleStatusChangeset,
    ) -> Result<usize, DeskError> {
        Ok(match self.articles.iter_mut().find(|a| a.id == article_id) {
            Some(article) => {
                article.status = changes.status.clone();
                article.updated_at = changes.updated_at;
                if let Some(published_at) = changes.published_at {
                    article.published_at = Some(published_at);
                }
                1
            }
            None => 0,
        })
    }

    fn add_article_note(&mut self, note: &NewArticleNote) -> Result<(), DeskError> {
        self.article_notes.push(note.clone());
        Ok(())
    }
}

enum Script {
    Reply(Value),
    Fail(Mutex<Option<BackendError>>),
}

/// Reasoning backend that answers every call from a fixed script and records
/// the bodies it was sent.
pub struct ScriptedBackend {
    script: Script,
    user_bodies: Mutex<Vec<UserMessageBody>>,
    manager_bodies: Mutex<Vec<ManagerPromptBody>>,
}

impl ScriptedBackend {
    pub fn replying(payload: Value) -> Self {
        Self::with_script(Script::Reply(payload))
    }

    /// Fails the first call with `error`; later calls fail to decode.
    pub fn failing(error: BackendError) -> Self {
        Self::with_script(Script::Fail(Mutex::new(Some(error))))
    }

    fn with_script(script: Script) -> Self {
        setup();
        Self {
            script,
            user_bodies: Mutex::new(Vec::new()),
            manager_bodies: Mutex::new(Vec::new()),
        }
    }

    pub fn user_bodies(&self) -> Vec<UserMessageBody> {
        self.user_bodies.lock().unwrap().clone()
    }

    pub fn manager_bodies(&self) -> Vec<ManagerPromptBody> {
        self.manager_bodies.lock().unwrap().clone()
    }

    fn answer(&self) -> Result<BackendReply, BackendError> {
        match &self.script {
            Script::Reply(payload) => serde_json::from_value::<ReplyPayload>(payload.clone())
                .map(BackendReply::from)
                .map_err(|e| BackendError::Decode(e.to_string())),
            Script::Fail(error) => Err(error
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| BackendError::Decode("script exhausted".to_string()))),
        }
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedBackend {
    async fn user_message(&self, body: &UserMessageBody) -> Result<BackendReply, BackendError> {
        self.user_bodies.lock().unwrap().push(body.clone());
        self.answer()
    }

    async fn manager_prompt(
        &self,
        body: &ManagerPromptBody,
    ) -> Result<BackendReply, BackendError> {
        self.manager_bodies.lock().unwrap().push(body.clone());
        self.answer()
    }
}
