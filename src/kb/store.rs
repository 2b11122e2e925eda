use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::context::{Dated, PromptTurn};
use crate::core::shared::models::{
    ArticleStatusChangeset, NewArticle, NewArticleNote, NewManagerResponse,
};
use crate::core::shared::schema::{
    article_notes, articles, manager_prompts, manager_responses,
};
use crate::core::shared::{DeskError, Transactional};

/// Storage used by the manager-prompt flow.
pub trait KnowledgeStore: Transactional {
    /// Prompts and responses of a manager conversation, leaving out the
    /// inbound prompt itself.
    fn conversation_history(
        &mut self,
        conversation_id: Uuid,
        inbound_prompt_id: Uuid,
    ) -> Result<Vec<Dated<PromptTurn>>, DeskError>;

    fn insert_manager_response(&mut self, response: &NewManagerResponse)
        -> Result<(), DeskError>;

    fn create_article(&mut self, article: &NewArticle) -> Result<(), DeskError>;

    /// Returns the number of articles updated.
    fn update_article_status(
        &mut self,
        article_id: Uuid,
        changes: &ArticleStatusChangeset,
    ) -> Result<usize, DeskError>;

    fn add_article_note(&mut self, note: &NewArticleNote) -> Result<(), DeskError>;
}

impl KnowledgeStore for PgConnection {
    fn conversation_history(
        &mut self,
        conversation_id: Uuid,
        inbound_prompt_id: Uuid,
    ) -> Result<Vec<Dated<PromptTurn>>, DeskError> {
        let prompts: Vec<(String, DateTime<Utc>)> = manager_prompts::table
            .filter(manager_prompts::conversation_id.eq(conversation_id))
            .filter(manager_prompts::id.ne(inbound_prompt_id))
            .select((manager_prompts::prompt, manager_prompts::created_at))
            .load(self)?;

        let responses: Vec<(String, DateTime<Utc>)> = manager_responses::table
            .inner_join(manager_prompts::table)
            .filter(manager_prompts::conversation_id.eq(conversation_id))
            .select((manager_responses::response, manager_responses::created_at))
            .load(self)?;

        let history = prompts
            .into_iter()
            .map(|(text, at)| Dated::new(at, PromptTurn::prompt(&text)))
            .chain(
                responses
                    .into_iter()
                    .map(|(text, at)| Dated::new(at, PromptTurn::response(&text))),
            )
            .collect();
        Ok(history)
    }

    fn insert_manager_response(
        &mut self,
        response: &NewManagerResponse,
    ) -> Result<(), DeskError> {
        diesel::insert_into(manager_responses::table)
            .values(response)
            .execute(self)?;
        Ok(())
    }

    fn create_article(&mut self, article: &NewArticle) -> Result<(), DeskError> {
        diesel::insert_into(articles::table)
            .values(article)
            .execute(self)?;
        Ok(())
    }

    fn update_article_status(
        &mut self,
        article_id: Uuid,
        changes: &ArticleStatusChangeset,
    ) -> Result<usize, DeskError> {
        let updated = diesel::update(articles::table.find(article_id))
            .set(changes)
            .execute(self)?;
        Ok(updated)
    }

    fn add_article_note(&mut self, note: &NewArticleNote) -> Result<(), DeskError> {
        diesel::insert_into(article_notes::table)
            .values(note)
            .execute(self)?;
        Ok(())
    }
}
