//! Actions returned by the reasoning backend.
//!
//! The backend sends a JSON list of objects tagged by their `action` field.
//! Every entry is kept exactly as received so the client sees what the backend
//! sent. Recognised kinds whose fields fit also carry a typed
//! [`KnownAction`]; the rest are logged and skipped by the dispatchers.

pub mod guard;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const DEFAULT_STATUS: &str = "fresh";
pub const DEFAULT_CATEGORY: &str = "general";
pub const NEW_TICKET_PRIORITY: &str = "low";
pub const ESCALATION_PRIORITY: &str = "high";
pub const CLOSED_STATUS: &str = "closed";

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M%#z"];
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses the timestamp forms Postgres accepts for `timestamptz` input.
/// Values without an offset are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Some(at) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(at.with_timezone(&Utc));
    }
    if let Some(at) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(at.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

/// An optional timestamp field. Anything that does not read as a timestamp
/// counts as absent instead of rejecting the whole action.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => {
            let parsed = parse_timestamp(&raw);
            if parsed.is_none() {
                debug!("Ignoring unreadable timestamp {raw:?}");
            }
            parsed
        }
        Some(other) => {
            debug!("Ignoring non-string timestamp {other}");
            None
        }
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ActionMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ActionMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rename {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Search {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticlePayload {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
    pub status: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub view_count: i32,
    #[serde(default)]
    pub is_faq: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article: Option<ArticlePayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleStatusChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ActionMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ActionMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum KnownAction {
    FeatureRequest(TicketRequest),
    Feedback(TicketRequest),
    Escalate(Escalation),
    UpdateStatus(StatusChange),
    AddNote(TicketNote),
    UpdateName(Rename),
    SearchKb(Search),
    SearchInfo(Search),
    WriteArticle(ArticleDraft),
    UpdateArticleStatus(ArticleStatusChange),
    AddArticleNote(ArticleNote),
}

impl KnownAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FeatureRequest(_) => "feature_request",
            Self::Feedback(_) => "feedback",
            Self::Escalate(_) => "escalate",
            Self::UpdateStatus(_) => "update_status",
            Self::AddNote(_) => "add_note",
            Self::UpdateName(_) => "update_name",
            Self::SearchKb(_) => "search_kb",
            Self::SearchInfo(_) => "search_info",
            Self::WriteArticle(_) => "write_article",
            Self::UpdateArticleStatus(_) => "update_article_status",
            Self::AddArticleNote(_) => "add_article_note",
        }
    }
}

/// One entry of the backend's action list: the object as received, plus its
/// typed form when the kind is known and the fields fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    raw: Value,
    known: Option<KnownAction>,
}

impl Action {
    pub fn from_value(raw: Value) -> Self {
        let known = match KnownAction::deserialize(&raw) {
            Ok(known) => Some(known),
            Err(e) => {
                debug!("Keeping action untyped: {e}");
                None
            }
        };
        Self { raw, known }
    }

    /// Escalation carrying the given reason with high priority and a fresh status.
    pub fn escalate(reason: impl Into<String>, category: &str) -> Self {
        Self::from_known(KnownAction::Escalate(Escalation {
            reason: Some(reason.into()),
            metadata: Some(ActionMetadata {
                priority: Some(ESCALATION_PRIORITY.to_string()),
                status: Some(DEFAULT_STATUS.to_string()),
                category: Some(category.to_string()),
                ..ActionMetadata::default()
            }),
        }))
    }

    fn from_known(known: KnownAction) -> Self {
        Self {
            raw: serde_json::to_value(&known).unwrap_or_default(),
            known: Some(known),
        }
    }

    pub fn known(&self) -> Option<&KnownAction> {
        self.known.as_ref()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn kind(&self) -> &str {
        match &self.known {
            Some(known) => known.kind(),
            None => self
                .raw
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or("<missing>"),
        }
    }

    /// True only for an escalation that can actually be applied.
    pub fn is_escalation(&self) -> bool {
        matches!(self.known, Some(KnownAction::Escalate(_)))
    }

    /// Search actions only inform the backend's own reasoning; they are never
    /// returned to the client.
    pub fn is_internal(&self) -> bool {
        matches!(self.kind(), "search_kb" | "search_info")
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Reads the backend's `actions` field; anything other than a list yields
/// no actions.
pub fn parse_actions(raw: Option<Value>) -> Vec<Action> {
    match raw {
        Some(Value::Array(items)) => items.into_iter().map(Action::from_value).collect(),
        Some(other) => {
            debug!("Ignoring non-list actions field: {other}");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// The actions a client is allowed to see.
pub fn client_facing(actions: Vec<Action>) -> Vec<Action> {
    actions.into_iter().filter(|a| !a.is_internal()).collect()
}
