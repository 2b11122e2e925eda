diesel::table! {
    tickets (id) {
        id -> Uuid,
        name -> Varchar,
        status -> Varchar,
        category -> Varchar,
        priority -> Varchar,
        assigned_to -> Nullable<Uuid>,
        resolved -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    messages (id) {
        id -> Uuid,
        ticket_id -> Uuid,
        message -> Text,
        created_by -> Nullable<Uuid>,
        bot_id -> Nullable<Uuid>,
        sender_type -> Varchar,
        is_system_message -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ticket_notes (id) {
        id -> Uuid,
        ticket_id -> Uuid,
        content -> Text,
        created_by -> Nullable<Uuid>,
        bot_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(messages -> tickets (ticket_id));
diesel::joinable!(ticket_notes -> tickets (ticket_id));
