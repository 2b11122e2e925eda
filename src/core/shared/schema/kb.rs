diesel::table! {
    articles (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        content -> Text,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        published_at -> Nullable<Timestamptz>,
        view_count -> Int4,
        is_faq -> Bool,
        category -> Nullable<Varchar>,
        slug -> Nullable<Varchar>,
        bot_id -> Nullable<Uuid>,
    }
}

diesel::table! {
    article_notes (id) {
        id -> Uuid,
        article_id -> Uuid,
        content -> Text,
        created_by -> Nullable<Uuid>,
        bot_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    manager_prompts (id) {
        id -> Uuid,
        conversation_id -> Uuid,
        prompt -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    manager_responses (id) {
        id -> Uuid,
        prompt_id -> Uuid,
        response -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(article_notes -> articles (article_id));
diesel::joinable!(manager_responses -> manager_prompts (prompt_id));
