mod support;

use sql2scaffold::executor::QueryExecutor;
use sql2scaffold::mapping::context::{base_context, ContextValue, BASE_KEYS};
use sql2scaffold::mapping::{AttributeModel, MappedQuery, PluginIdentity, TargetType};

use support::{connected_executor, users_fixture};

#[test]
fn attribute_model_follows_engine_column_order_and_types() {
    let fixture = users_fixture();
    let executor = connected_executor(&fixture.database);
    let result = executor.execute_detailed("SELECT id, name, score, avatar FROM users ORDER BY id");
    let model = AttributeModel::build(&result);

    assert_eq!(model.identifiers(), vec!["id", "name", "score", "avatar"]);
    assert_eq!(
        model.target_types(),
        vec![
            TargetType::Integer,
            TargetType::String,
            TargetType::FloatingPoint,
            TargetType::ByteSequence,
        ]
    );
    let placeholders: Vec<&str> = model.iter().map(|a| a.doc_placeholder.as_str()).collect();
    assert_eq!(
        placeholders,
        vec![
            "TODO, sample value: 1",
            "TODO, sample value: alice",
            "TODO, sample value: 1.5",
            "TODO, sample value: <2 bytes>",
        ]
    );
}

#[test]
fn blank_and_duplicate_engine_names_become_unique_identifiers() {
    let fixture = users_fixture();
    let executor = connected_executor(&fixture.database);
    let result = executor.execute_detailed(
        "SELECT u.id, v.id, 1 + 1 AS \"\", v.url AS \"Visit URL\", 'x' AS \"!!\" \
         FROM users u JOIN visits v ON v.user_id = u.id",
    );
    assert!(result.succeeded, "{:?}", result.error_message());

    let model = AttributeModel::build(&result);
    assert_eq!(model.len(), result.columns.len());
    assert_eq!(
        model.identifiers(),
        vec!["id", "id_2", "col1", "visit_url", "col2"]
    );
}

#[test]
fn zero_row_queries_map_to_unknown_types_as_strings() {
    let fixture = users_fixture();
    let executor = connected_executor(&fixture.database);
    let result = executor.execute_detailed("SELECT id, name FROM users WHERE 0");
    let model = AttributeModel::build(&result);

    assert_eq!(model.target_types(), vec![TargetType::String, TargetType::String]);
    assert!(model.iter().all(|a| a.doc_placeholder == "TODO"));
}

#[test]
fn identity_and_context_share_the_derived_names() {
    let fixture = users_fixture();
    let executor = connected_executor(&fixture.database);
    let queries = vec![
        MappedQuery::new("Users", executor.execute_detailed("SELECT id, name FROM users")),
        MappedQuery::new(
            "Recent Visits",
            executor.execute_detailed("SELECT url FROM visits"),
        ),
    ];
    let identity = PluginIdentity::derive("Test Users", "sqlite");
    let context = base_context(&identity, "test_users.db", &queries);

    assert_eq!(context.keys().collect::<Vec<_>>(), BASE_KEYS.to_vec());
    assert_eq!(
        context.get("class_name"),
        Some(&ContextValue::Text("TestUsers".to_string()))
    );
    assert_eq!(
        context.get("data_type"),
        Some(&ContextValue::Text("sqlite:test_users".to_string()))
    );
    assert_eq!(
        context.get("attributes").map(ContextValue::render).as_deref(),
        Some("users.id: integer\nusers.name: string\nrecent_visits.url: string")
    );
    assert_eq!(queries[1].class_name_stem, "RecentVisits");
}
