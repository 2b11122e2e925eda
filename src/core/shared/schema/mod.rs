pub mod kb;
pub use self::kb::*;

pub mod desk;
pub use self::desk::*;

diesel::allow_tables_to_appear_in_same_query!(
    tickets,
    messages,
    ticket_notes,
    articles,
    article_notes,
    manager_prompts,
    manager_responses,
);
