use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::DateTime;
use memo_core::{open_pool, open_pool_in_memory, SqliteMemoRepository};
use memo_server::AppState;
use serde_json::{json, Value};
use std::time::Duration;

fn state() -> web::Data<AppState> {
    let pool = open_pool_in_memory().unwrap();
    web::Data::new(AppState::new(SqliteMemoRepository::try_new(pool).unwrap()))
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data($state).configure(memo_server::configure)).await
    };
}

macro_rules! send {
    ($app:expr, $req:expr $(,)?) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

macro_rules! create {
    ($app:expr, $body:expr $(,)?) => {{
        let (status, body) = send!($app, test::TestRequest::post().uri("/memos").set_json($body));
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }};
}

fn millis(value: &Value) -> i64 {
    DateTime::parse_from_rfc3339(value.as_str().unwrap())
        .unwrap()
        .timestamp_millis()
}

#[actix_web::test]
async fn create_applies_defaults_and_returns_created() {
    let app = app!(state());

    let memo = create!(app, json!({ "title": "T", "content": "C" }));

    assert!(memo["id"].as_i64().unwrap() > 0);
    assert_eq!(memo["priority"], "medium");
    assert_eq!(memo["tags"], json!([]));
    assert_eq!(memo["createdAt"], memo["updatedAt"]);
    assert!(memo["createdAt"].as_str().unwrap().ends_with('Z'));
}

#[actix_web::test]
async fn create_without_content_is_invalid_input() {
    let app = app!(state());

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/memos").set_json(json!({ "title": "only title" })),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/memos")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json"),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[actix_web::test]
async fn get_returns_memo_or_not_found_or_invalid_id() {
    let app = app!(state());
    let memo = create!(app, json!({ "title": "T", "content": "C", "tags": ["a"] }));
    let id = memo["id"].as_i64().unwrap();

    let (status, body) = send!(app, test::TestRequest::get().uri(&format!("/memos/{id}")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], memo);

    let (status, body) = send!(app, test::TestRequest::get().uri("/memos/424242"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "MEMO_NOT_FOUND");

    let (status, body) = send!(app, test::TestRequest::get().uri("/memos/abc"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ID");
}

#[actix_web::test]
async fn update_changes_only_given_fields_and_advances_updated_at() {
    let app = app!(state());
    let memo = create!(app, json!({ "title": "T", "content": "C", "tags": ["a", "b"] }));
    let id = memo["id"].as_i64().unwrap();

    actix_web::rt::time::sleep(Duration::from_millis(5)).await;
    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/memos/{id}"))
            .set_json(json!({ "priority": "high" })),
    );
    assert_eq!(status, StatusCode::OK, "{body}");

    let updated = &body["data"];
    assert_eq!(updated["priority"], "high");
    assert_eq!(updated["title"], memo["title"]);
    assert_eq!(updated["content"], memo["content"]);
    assert_eq!(updated["tags"], memo["tags"]);
    assert_eq!(updated["createdAt"], memo["createdAt"]);
    assert!(millis(&updated["updatedAt"]) > millis(&memo["updatedAt"]));
}

#[actix_web::test]
async fn update_rejects_empty_body_and_unknown_id() {
    let app = app!(state());
    let memo = create!(app, json!({ "title": "T", "content": "C" }));
    let id = memo["id"].as_i64().unwrap();

    let (status, body) = send!(
        app,
        test::TestRequest::put().uri(&format!("/memos/{id}")).set_json(json!({})),
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, body) = send!(
        app,
        test::TestRequest::put()
            .uri("/memos/999")
            .set_json(json!({ "title": "x" })),
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "MEMO_NOT_FOUND");
}

#[actix_web::test]
async fn delete_twice_reports_not_found_the_second_time() {
    let app = app!(state());
    let memo = create!(app, json!({ "title": "T", "content": "C" }));
    let uri = format!("/memos/{}", memo["id"]);

    let (status, body) = send!(app, test::TestRequest::delete().uri(&uri));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "Memo deleted successfully" }));

    let (status, body) = send!(app, test::TestRequest::delete().uri(&uri));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "MEMO_NOT_FOUND");

    let (status, _) = send!(app, test::TestRequest::get().uri(&uri));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn list_filters_by_search_priority_and_exact_tag() {
    let app = app!(state());
    let work = create!(app, json!({ "title": "Standup", "content": "notes", "priority": "high", "tags": ["work"] }));
    create!(app, json!({ "title": "Workshop", "content": "Milk", "tags": ["workshop"] }));
    create!(app, json!({ "title": "Groceries", "content": "milk", "priority": "low", "tags": ["home"] }));

    let (_, body) = send!(app, test::TestRequest::get().uri("/memos?tag=work"));
    let hits = body["data"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], work["id"]);

    let (_, body) = send!(app, test::TestRequest::get().uri("/memos?search=MILK"));
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send!(app, test::TestRequest::get().uri("/memos?search=milk&priority=low"));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send!(app, test::TestRequest::get().uri("/memos?priority=all&search=&tag="));
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, body) = send!(app, test::TestRequest::get().uri("/memos?priority=urgent"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": [] }));
}

#[actix_web::test]
async fn list_orders_by_most_recent_update() {
    let app = app!(state());
    let first = create!(app, json!({ "title": "first", "content": "x" }));
    actix_web::rt::time::sleep(Duration::from_millis(5)).await;
    let second = create!(app, json!({ "title": "second", "content": "x" }));
    actix_web::rt::time::sleep(Duration::from_millis(5)).await;
    send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/memos/{}", first["id"]))
            .set_json(json!({ "content": "touched" })),
    );

    let (_, body) = send!(app, test::TestRequest::get().uri("/memos"));
    let ids: Vec<&Value> = body["data"].as_array().unwrap().iter().map(|m| &m["id"]).collect();
    assert_eq!(ids, vec![&first["id"], &second["id"]]);
}

#[actix_web::test]
async fn tags_endpoint_is_distinct_and_sorted() {
    let app = app!(state());
    create!(app, json!({ "title": "a", "content": "a", "tags": ["work", "home"] }));
    create!(app, json!({ "title": "b", "content": "b", "tags": ["alpha", "work"] }));

    let (status, body) = send!(app, test::TestRequest::get().uri("/memos/tags"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": ["alpha", "home", "work"] }));
}

#[actix_web::test]
async fn health_reports_ok_with_version() {
    let app = app!(state());

    let (status, body) = send!(app, test::TestRequest::get().uri("/health"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[actix_web::test]
async fn file_backed_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memos.sqlite3");

    let id = {
        let repo = SqliteMemoRepository::try_new(open_pool(&path, 2).unwrap()).unwrap();
        let app = app!(web::Data::new(AppState::new(repo)));
        let memo = create!(app, json!({ "title": "kept", "content": "on disk" }));
        memo["id"].clone()
    };

    let repo = SqliteMemoRepository::try_new(open_pool(&path, 2).unwrap()).unwrap();
    let app = app!(web::Data::new(AppState::new(repo)));
    let (status, body) = send!(app, test::TestRequest::get().uri(&format!("/memos/{id}")));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "kept");
}

#[actix_web::test]
async fn storage_fault_answers_database_error_without_detail() {
    let state = state();
    state
        .memos
        .repo()
        .pool()
        .get()
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER reject_tag BEFORE INSERT ON memo_tags
             WHEN NEW.tag = 'boom'
             BEGIN SELECT RAISE(ABORT, 'rejected tag'); END;",
        )
        .unwrap();
    let app = app!(state.clone());

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/memos")
            .set_json(json!({ "title": "T", "content": "C", "tags": ["boom"] })),
    );
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": { "code": "DATABASE_ERROR", "message": "Failed to create memo" }
        })
    );

    let (_, body) = send!(app, test::TestRequest::get().uri("/memos"));
    assert_eq!(body["data"], json!([]));
}
