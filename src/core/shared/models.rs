use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    article_notes, articles, manager_responses, messages, ticket_notes, tickets,
};

pub const SENDER_CUSTOMER: &str = "customer";
pub const SENDER_EMPLOYEE: &str = "employee";

/// Who wrote a message or note. Maps onto the `(created_by, bot_id)` column
/// pair, so exactly one of the two is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User(Uuid),
    Bot(Uuid),
}

impl Author {
    pub fn created_by(self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(id),
            Self::Bot(_) => None,
        }
    }

    pub fn bot_id(self) -> Option<Uuid> {
        match self {
            Self::User(_) => None,
            Self::Bot(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = tickets)]
pub struct NewTicket {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub category: String,
    pub priority: String,
    pub assigned_to: Option<Uuid>,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field values applied to the owning ticket by an `escalate` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketEscalation {
    pub priority: String,
    pub status: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = messages)]
pub struct MessageRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub message: String,
    pub created_by: Option<Uuid>,
    pub bot_id: Option<Uuid>,
    pub sender_type: String,
    pub is_system_message: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub message: String,
    pub created_by: Option<Uuid>,
    pub bot_id: Option<Uuid>,
    pub sender_type: String,
    pub is_system_message: bool,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn system_reply(ticket_id: Uuid, text: &str, bot_id: Uuid) -> Self {
        let author = Author::Bot(bot_id);
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            message: text.to_string(),
            created_by: author.created_by(),
            bot_id: author.bot_id(),
            sender_type: SENDER_EMPLOYEE.to_string(),
            is_system_message: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = ticket_notes)]
pub struct NewTicketNote {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub content: String,
    pub created_by: Option<Uuid>,
    pub bot_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl NewTicketNote {
    pub fn new(ticket_id: Uuid, content: &str, author: Author) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            content: content.to_string(),
            created_by: author.created_by(),
            bot_id: author.bot_id(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = articles)]
pub struct NewArticle {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i32,
    pub is_faq: bool,
    pub category: Option<String>,
    pub slug: Option<String>,
    pub bot_id: Option<Uuid>,
}

/// Partial article update. `published_at` is only written when present;
/// diesel skips `None` fields when building the `SET` list.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = articles)]
pub struct ArticleStatusChangeset {
    pub status: String,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = article_notes)]
pub struct NewArticleNote {
    pub id: Uuid,
    pub article_id: Uuid,
    pub content: String,
    pub created_by: Option<Uuid>,
    pub bot_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl NewArticleNote {
    pub fn new(article_id: Uuid, content: &str, author: Author, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            article_id,
            content: content.to_string(),
            created_by: author.created_by(),
            bot_id: author.bot_id(),
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = manager_responses)]
pub struct NewManagerResponse {
    pub id: Uuid,
    pub prompt_id: Uuid,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl NewManagerResponse {
    pub fn new(prompt_id: Uuid, response: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt_id,
            response: response.to_string(),
            created_at: Utc::now(),
        }
    }
}
