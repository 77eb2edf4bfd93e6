// Kastle schema - versioned tree tables for Diesel ORM

diesel::table! {
    schema_versions (id) {
        id -> Integer,
        version -> Text,
        name -> Text,
        features -> Text,
        introduced_at -> Text,
    }
}

diesel::table! {
    trees (id) {
        id -> Integer,
        name -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    tree_versions (id) {
        id -> Integer,
        tree_id -> Integer,
        parent_version_id -> Nullable<Integer>,
        tag -> Nullable<Text>,
        description -> Nullable<Text>,
        created_at -> Text,
        tag_created_at -> Nullable<Text>,
    }
}

diesel::table! {
    tree_nodes (id) {
        id -> Integer,
        version_id -> Integer,
        data_json -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    tree_edges (id) {
        id -> Integer,
        version_id -> Integer,
        incoming_node_id -> Integer,   // edge source
        outgoing_node_id -> Integer,   // edge target
        data_json -> Text,
        created_at -> Text,
    }
}
