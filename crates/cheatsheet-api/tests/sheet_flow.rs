use std::sync::Arc;

use axum::{
    Router,
    body::{self, Body},
    http::{Request, Response, StatusCode, header},
};
use tower::ServiceExt;
use uuid::Uuid;

use cheatsheet_api::auth::{SESSION_COOKIE, create_token};
use cheatsheet_api::routes::router;
use cheatsheet_api::state::{AppState, AppStateInner};
use cheatsheet_db::Database;

const SECRET: &str = "test-session-secret";

fn test_app() -> (Router, AppState) {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        session_secret: SECRET.to_string(),
        secure_cookies: false,
        default_from: "polish".to_string(),
        default_to: "english".to_string(),
    });
    (router(state.clone()), state)
}

/// Creates a user directly and returns a `Cookie` header value for it.
fn sign_in(state: &AppState, username: &str) -> String {
    let user_id = Uuid::new_v4();
    state
        .db
        .create_user(&user_id.to_string(), username, "not-a-real-hash")
        .unwrap();
    let token = create_token(SECRET, user_id, username).unwrap();
    format!("{SESSION_COOKIE}={token}")
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn text(response: Response<Body>) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn json(response: Response<Body>) -> serde_json::Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, cookie: &str, form: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

fn post_json(uri: &str, cookie: &str, form: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::COOKIE, cookie)
        .header(header::ACCEPT, "application/json")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn new_sheet(app: &Router, cookie: &str) -> Uuid {
    let response = send(app, post_form("/sheets/new", cookie, "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    location(&response)
        .strip_prefix("/sheets/")
        .unwrap()
        .parse()
        .unwrap()
}

async fn add_word(app: &Router, cookie: &str, sheet: Uuid, from: &str, to: &str) {
    let response = send(
        app,
        post_json(
            &format!("/sheets/{sheet}"),
            cookie,
            &format!("type=word.add&from={from}&to={to}"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Sessions --

#[tokio::test]
async fn protected_pages_redirect_to_login() {
    let (app, _) = test_app();
    let response = send(&app, Request::get("/sheets/all").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn forged_session_is_rejected() {
    let (app, _) = test_app();
    let token = create_token("some-other-secret", Uuid::new_v4(), "mallory").unwrap();
    let response = send(&app, get("/sheets/all", &format!("{SESSION_COOKIE}={token}"))).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn register_starts_a_session_and_blocks_duplicates() {
    let (app, _) = test_app();
    let form = "username=aleks&password=Chicken123";

    let response = send(&app, post_form("/register", "", form)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with(SESSION_COOKIE));
    assert!(cookie.contains("HttpOnly"));

    let response = send(&app, post_form("/register", "", form)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(text(response).await.contains("Username aleks already taken"));
}

#[tokio::test]
async fn register_lists_unmet_password_rules() {
    let (app, _) = test_app();
    let response = send(&app, post_form("/register", "", "username=aleks&password=chicken")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = text(response).await;
    assert!(body.contains("Should have at least 8 characters, one number, one uppercase letter"));
    assert!(body.contains("value=\"aleks\""));
}

#[tokio::test]
async fn registered_user_can_log_in() {
    let (app, _) = test_app();
    send(&app, post_form("/register", "", "username=aleks&password=Chicken123")).await;

    let response = send(&app, post_form("/login", "", "username=aleks&password=Chicken123")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(response.headers().get(header::SET_COOKIE).is_some());

    let response = send(&app, post_form("/login", "", "username=aleks&password=Chicken124")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(text(response).await.contains("Username or password is incorrect"));
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let response = send(&app, post_form("/logout", &cookie, "")).await;
    assert_eq!(location(&response), "/login");
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.starts_with(&format!("{SESSION_COOKIE}=;")));
}

// -- Pages --

#[tokio::test]
async fn new_sheet_appears_on_listings() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;

    let response = send(&app, get(&format!("/sheets/{sheet}"), &cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = text(response).await;
    assert!(body.contains("Untitled cheat sheet"));
    assert!(body.contains("polish"));

    let body = text(send(&app, get("/sheets/all", &cookie)).await).await;
    assert!(body.contains(&sheet.to_string()));

    let body = text(send(&app, get("/", &cookie)).await).await;
    assert!(body.contains("Your recent cheat sheets"));
}

#[tokio::test]
async fn missing_sheet_is_a_404_page() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let response = send(&app, get(&format!("/sheets/{}", Uuid::new_v4()), &cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/sheets/nonsense", &cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Actions --

#[tokio::test]
async fn title_update_drops_only_its_edit_flag() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;

    let response = send(
        &app,
        post_form(
            &format!("/sheets/{sheet}?sort=asc&edit_title=true&edit_separators=true"),
            &cookie,
            "type=title.update&title=My+Sheet",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/sheets/{sheet}?sort=asc&edit_separators=true")
    );

    let body = text(send(&app, get(&format!("/sheets/{sheet}"), &cookie)).await).await;
    assert!(body.contains("My Sheet"));
}

#[tokio::test]
async fn empty_title_keeps_the_field_editing() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;

    let response = send(
        &app,
        post_form(
            &format!("/sheets/{sheet}?edit_title=true"),
            &cookie,
            "type=title.update&title=+++",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = text(response).await;
    assert!(body.contains("name=\"title\""));
    assert!(body.contains("field `title` must not be empty"));
}

#[tokio::test]
async fn rejected_languages_stay_selected() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;

    let response = send(
        &app,
        post_form(
            &format!("/sheets/{sheet}?edit_languages=true"),
            &cookie,
            "type=languages.update&from=english&to=english",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = text(response).await;
    assert!(body.contains("<option value=\"english\" selected>"));
    assert!(!body.contains("<option value=\"polish\" selected>"));

    let row = state.db.get_sheet(&sheet.to_string()).unwrap().unwrap();
    assert_eq!(row.from_language, "polish");
}

#[tokio::test]
async fn unknown_language_is_rejected_as_json() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;

    let response = send(
        &app,
        post_json(
            &format!("/sheets/{sheet}"),
            &cookie,
            "type=languages.update&from=polish&to=klingon",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = json(response).await;
    assert_eq!(payload["field"], "to");
    assert!(payload["error"].as_str().unwrap().contains("klingon"));

    let row = state.db.get_sheet(&sheet.to_string()).unwrap().unwrap();
    assert_eq!(row.to_language, "english");
}

#[tokio::test]
async fn unknown_action_type_names_the_type_field() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;

    let response = send(
        &app,
        post_json(&format!("/sheets/{sheet}"), &cookie, "type=sheet.explode"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["field"], "type");
}

#[tokio::test]
async fn separators_are_stored_verbatim() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;

    let response = send(
        &app,
        post_json(
            &format!("/sheets/{sheet}"),
            &cookie,
            "type=separators.update&translationSeparator=+%3D+&groupSeparator=%2C+",
        ),
    )
    .await;
    assert_eq!(json(response).await, serde_json::json!({ "ok": true }));

    let row = state.db.get_sheet(&sheet.to_string()).unwrap().unwrap();
    assert_eq!(row.translation_separator, " = ");
    assert_eq!(row.group_separator, ", ");
}

#[tokio::test]
async fn word_add_and_find_suggestions() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;

    for (from, to) in [("dom", "house"), ("domek", "cottage"), ("domy", "houses"), ("domofon", "intercom")] {
        add_word(&app, &cookie, sheet, from, to).await;
    }
    assert_eq!(state.db.get_sheet_group_ids(&sheet.to_string()).unwrap().len(), 4);

    let response = send(
        &app,
        post_json(
            &format!("/sheets/{sheet}"),
            &cookie,
            "type=translation.find&word=dom&from=polish&to=english",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = json(response).await;
    let words = payload["words"].as_array().unwrap();
    assert_eq!(words.len(), 3);
}

#[tokio::test]
async fn find_without_json_renders_suggestions() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;
    add_word(&app, &cookie, sheet, "kot", "cat").await;

    let response = send(
        &app,
        post_form(
            &format!("/sheets/{sheet}"),
            &cookie,
            "type=translation.find&word=ko&from=polish&to=english",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = text(response).await;
    assert!(body.contains("<li>cat</li>"));
}

#[tokio::test]
async fn word_update_rewrites_both_words() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;
    add_word(&app, &cookie, sheet, "kot", "dog").await;

    let words = state.db.get_sheet_words(&sheet.to_string()).unwrap();
    let from = words.iter().find(|w| w.language == "polish").unwrap();
    let to = words.iter().find(|w| w.language == "english").unwrap();
    let group = &from.translation_group_id;

    let response = send(
        &app,
        post_form(
            &format!("/sheets/{sheet}?edit_row={group}"),
            &cookie,
            &format!("type=word.update&from=kot&to=cat&fromId={}&toId={}", from.id, to.id),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/sheets/{sheet}"));

    let words = state.db.get_sheet_words(&sheet.to_string()).unwrap();
    assert!(words.iter().any(|w| w.content == "cat"));
    assert!(!words.iter().any(|w| w.content == "dog"));
}

#[tokio::test]
async fn word_update_cannot_cross_pairs() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;
    add_word(&app, &cookie, sheet, "pies", "dog").await;
    add_word(&app, &cookie, sheet, "kot", "cat").await;

    let words = state.db.get_sheet_words(&sheet.to_string()).unwrap();
    let id_of = |content: &str| words.iter().find(|w| w.content == content).unwrap().id.clone();

    let response = send(
        &app,
        post_json(
            &format!("/sheets/{sheet}"),
            &cookie,
            &format!(
                "type=word.update&from=zzz&to=www&fromId={}&toId={}",
                id_of("cat"),
                id_of("pies")
            ),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let pies = id_of("pies");
    let response = send(
        &app,
        post_json(
            &format!("/sheets/{sheet}"),
            &cookie,
            &format!("type=word.update&from=x&to=y&fromId={pies}&toId={pies}"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["field"], "toId");

    let after: Vec<String> = state
        .db
        .get_sheet_words(&sheet.to_string())
        .unwrap()
        .into_iter()
        .map(|w| w.content)
        .collect();
    for word in ["pies", "dog", "kot", "cat"] {
        assert!(after.iter().any(|w| w == word), "{word} was overwritten");
    }
}

#[tokio::test]
async fn delete_removes_the_pair_from_one_sheet_only() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let first = new_sheet(&app, &cookie).await;
    let second = new_sheet(&app, &cookie).await;
    add_word(&app, &cookie, first, "pies", "dog").await;

    let group = state.db.get_sheet_group_ids(&first.to_string()).unwrap()[0].clone();
    state
        .db
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO sheet_translation_groups (sheet_id, translation_group_id, position)
                 VALUES (?1, ?2, 1)",
                (second.to_string(), &group),
            )?;
            Ok(())
        })
        .unwrap();

    let response = send(
        &app,
        post_json(
            &format!("/sheets/{first}"),
            &cookie,
            &format!("type=translationGroup.delete&translationGroupId={group}"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(state.db.get_sheet_group_ids(&first.to_string()).unwrap().is_empty());
    assert_eq!(state.db.get_sheet_group_ids(&second.to_string()).unwrap(), vec![group]);
    assert_eq!(state.db.get_sheet_words(&second.to_string()).unwrap().len(), 2);
}

#[tokio::test]
async fn only_the_owner_can_change_a_sheet() {
    let (app, state) = test_app();
    let owner = sign_in(&state, "aleks");
    let visitor = sign_in(&state, "mallory");
    let sheet = new_sheet(&app, &owner).await;
    add_word(&app, &owner, sheet, "kot", "cat").await;

    let response = send(
        &app,
        post_json(&format!("/sheets/{sheet}"), &visitor, "type=title.update&title=Mine"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        post_json(
            &format!("/sheets/{sheet}"),
            &visitor,
            "type=translation.find&word=kot&from=polish&to=english",
        ),
    )
    .await;
    assert_eq!(json(response).await["words"], serde_json::json!(["cat"]));

    let body = text(send(&app, get(&format!("/sheets/{sheet}"), &visitor)).await).await;
    assert!(!body.contains("translationGroup.delete"));
}

#[tokio::test]
async fn sort_query_orders_the_word_list() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;
    for (from, to) in [("zebra", "zebra"), ("kot", "cat"), ("pies", "dog")] {
        add_word(&app, &cookie, sheet, from, to).await;
    }

    let positions = |body: &str| -> Vec<usize> {
        ["<td>kot</td>", "<td>pies</td>", "<td>zebra</td>"]
            .iter()
            .map(|cell| body.find(cell).unwrap())
            .collect()
    };

    let asc = text(send(&app, get(&format!("/sheets/{sheet}?sort=asc"), &cookie)).await).await;
    let p = positions(&asc);
    assert!(p[0] < p[1] && p[1] < p[2]);

    let desc = text(send(&app, get(&format!("/sheets/{sheet}?sort=desc"), &cookie)).await).await;
    let p = positions(&desc);
    assert!(p[0] > p[1] && p[1] > p[2]);
}

#[tokio::test]
async fn export_downloads_a_docx() {
    let (app, state) = test_app();
    let cookie = sign_in(&state, "aleks");
    let sheet = new_sheet(&app, &cookie).await;
    add_word(&app, &cookie, sheet, "pies", "dog").await;

    let response = send(&app, get(&format!("/sheets/{sheet}/export?sort=asc"), &cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"sheet.docx\"");

    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"PK"));
}
