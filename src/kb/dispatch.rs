//! Maps manager-prompt actions onto article mutations.

use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use super::store::KnowledgeStore;
use crate::actions::{Action, ArticleNote, ArticlePayload, ArticleStatusChange, KnownAction};
use crate::core::shared::models::{Author, ArticleStatusChangeset, NewArticle, NewArticleNote};
use crate::core::shared::DeskError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleDispatchSummary {
    pub applied: usize,
    pub skipped: usize,
    pub created_articles: Vec<Uuid>,
}

/// Applies each action in order, stopping at the first failed mutation.
pub fn dispatch_article_actions<S: KnowledgeStore>(
    store: &mut S,
    bot_id: Uuid,
    actions: &[Action],
) -> Result<ArticleDispatchSummary, DeskError> {
    let mut summary = ArticleDispatchSummary::default();

    for action in actions {
        info!("Processing action: {}", action.kind());
        let applied = match action.known() {
            Some(KnownAction::WriteArticle(draft)) => match &draft.article {
                Some(article) => {
                    let id = write_article(store, article, bot_id)?;
                    summary.created_articles.push(id);
                    true
                }
                None => {
                    warn!("No article data in write_article action");
                    false
                }
            },
            Some(KnownAction::UpdateArticleStatus(change)) => {
                update_article_status(store, change)?
            }
            Some(KnownAction::AddArticleNote(note)) => {
                add_article_note(store, note, bot_id)?
            }
            _ => {
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

fn write_article<S: KnowledgeStore>(
    store: &mut S,
    article: &ArticlePayload,
    bot_id: Uuid,
) -> Result<Uuid, DeskError> {
    let now = Utc::now();
    let row = NewArticle {
        id: Uuid::new_v4(),
        title: article.title.clone(),
        description: article.description.clone(),
        content: article.content.clone(),
        status: article.status.clone(),
        created_at: article.created_at.unwrap_or(now),
        updated_at: article.updated_at.unwrap_or(now),
        published_at: article.published_at,
        view_count: article.view_count,
        is_faq: article.is_faq,
        category: article.category.clone(),
        slug: article.slug.clone(),
        bot_id: Some(bot_id),
    };
    store.create_article(&row)?;
    info!("Created article {} ({:?})", row.id, row.title);
    Ok(row.id)
}

fn update_article_status<S: KnowledgeStore>(
    store: &mut S,
    change: &ArticleStatusChange,
) -> Result<bool, DeskError> {
    let (Some(raw_id), Some(status)) = (change.article_id.as_deref(), change.status.as_deref())
    else {
        warn!("Skipping update_article_status without article_id or status");
        return Ok(false);
    };
    let meta = change.metadata.clone().unwrap_or_default();
    let changes = ArticleStatusChangeset {
        status: status.to_string(),
        updated_at: meta.updated_at.unwrap_or_else(Utc::now),
        published_at: meta.published_at,
    };
    info!("Updating article {raw_id} status to {status}");

    // An id that is not a UUID cannot match any article.
    let article_id = parse_article_id(raw_id)?;
    if store.update_article_status(article_id, &changes)? == 0 {
        warn!("No article found with ID: {raw_id}");
        return Err(DeskError::not_found("Article", raw_id));
    }
    Ok(true)
}

fn add_article_note<S: KnowledgeStore>(
    store: &mut S,
    note: &ArticleNote,
    bot_id: Uuid,
) -> Result<bool, DeskError> {
    let (Some(raw_id), Some(content)) = (note.article_id.as_deref(), note.note.as_deref()) else {
        warn!("Skipping add_article_note without article_id or note");
        return Ok(false);
    };
    let article_id = parse_article_id(raw_id)?;
    let meta = note.metadata.clone().unwrap_or_default();
    let author = meta
        .created_by
        .as_deref()
        .and_then(|id| Uuid::parse_str(id).ok())
        .map_or(Author::Bot(bot_id), Author::User);
    store.add_article_note(&NewArticleNote::new(
        article_id,
        content,
        author,
        meta.created_at.unwrap_or_else(Utc::now),
    ))?;
    Ok(true)
}

fn parse_article_id(raw: &str) -> Result<Uuid, DeskError> {
    Uuid::parse_str(raw).map_err(|_| DeskError::not_found("Article", raw))
}
