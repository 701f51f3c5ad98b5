//! HttpTaskApi against an in-process backend
//!
//! The backend binds `127.0.0.1:0` and serves canned bodies in the shapes the
//! real backend uses (stringified `taskDetail`, upper-case user rows,
//! `{data: ...}` wrappers) while recording every write it receives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use ps_client::{HttpTaskApi, TaskApi};
use ps_core::config::ApiConfig;
use ps_core::{PageParams, PsError};
use ps_models::{NewRecord, ProcessStatus, PushSettings, TaskProgress, UpdateTask};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Default)]
struct Recorded {
    patches: Vec<(String, Value)>,
    logs: Vec<Value>,
    queries: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<Recorded>>;

async fn list_tasks(State(state): State<Shared>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    state.lock().unwrap().queries.push(query.clone());
    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(json!({
        "data": [
            {"taskKey": page * 10, "taskTitle": "명함", "taskProgressing": "진행중"},
            {"taskKey": page * 10 + 1, "taskTitle": "전단", "taskProgressing": "없는상태"}
        ],
        "pagination": {"page": page, "limit": 2, "total": 4, "totalPages": 2, "hasNextPage": page < 2}
    }))
}

async fn get_task(Path(key): Path<String>) -> impl IntoResponse {
    match key.as_str() {
        "count" => (
            StatusCode::OK,
            Json(json!({"data": {"total": 4, "waiting": 1, "inProgress": 2, "done": 1}})),
        ),
        "missing" => (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))),
        _ => (
            StatusCode::OK,
            Json(json!({
                "taskKey": key,
                "taskTitle": "명함",
                "taskDetail": "{\"paper\":\"스노우 250g\",\"processes\":[{\"category\":\"인쇄\",\"type\":\"인쇄(디지털인쇄)\",\"company\":\"내부인쇄\",\"process_stauts\":\"완료\",\"order\":0}]}",
                "taskDel": 0,
                "comments": [{"commentKey": 1, "content": "교정 확인"}]
            })),
        ),
    }
}

async fn patch_task(
    State(state): State<Shared>,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.lock().unwrap().patches.push((key, body));
    Json(json!({"ok": true}))
}

async fn create_log(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    state.lock().unwrap().logs.push(body);
    StatusCode::CREATED
}

async fn get_user(Path(id): Path<String>) -> Json<Value> {
    if id == "kim" {
        Json(json!([{"ADMIN_ID": "kim", "ADMIN_PW": "1234", "ADMIN_KEY": 7, "ADMIN_NAME": "김실장"}]))
    } else {
        Json(json!([]))
    }
}

async fn patch_user(
    State(state): State<Shared>,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.lock().unwrap().patches.push((format!("user:{}", key), body));
    Json(json!({}))
}

async fn list_users(State(state): State<Shared>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    state.lock().unwrap().queries.push(query);
    Json(json!({"data": [
        {"ADMIN_KEY": 1, "PUSH_TOKEN": "ExponentPushToken[a]"},
        {"adminKey": "2", "pushToken": null},
        {"adminKey": "3", "pushToken": "ExponentPushToken[c]"}
    ]}))
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn start_backend() -> (HttpTaskApi, Shared) {
    let state: Shared = Arc::new(Mutex::new(Recorded::default()));
    let app = Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/:key", get(get_task).patch(patch_task))
        .route("/logs", post(create_log))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).patch(patch_user))
        .route("/options", get(broken))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let api = HttpTaskApi::new(&ApiConfig {
        base_url: format!("http://{}/", addr),
        timeout_seconds: 5,
    })
    .unwrap();
    (api, state)
}

#[tokio::test]
async fn list_tasks_sends_page_and_limit() {
    let (api, state) = start_backend().await;

    let page = api.list_tasks(PageParams::new(2, 2)).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.data[0].task_key.as_deref(), Some("20"));
    assert_eq!(page.data[1].task_progressing, TaskProgress::Waiting);
    assert!(!page.pagination.has_next_page);

    let recorded = state.lock().unwrap();
    assert_eq!(recorded.queries[0].get("page").map(String::as_str), Some("2"));
    assert_eq!(recorded.queries[0].get("limit").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn task_counts_unwraps_data() {
    let (api, _) = start_backend().await;
    let counts = api.task_counts().await.unwrap();
    assert_eq!(counts.total, 4);
    assert_eq!(counts.in_progress, 2);
}

#[tokio::test]
async fn get_task_parses_stringified_detail() {
    let (api, _) = start_backend().await;

    let task = api.get_task("T1").await.unwrap();
    assert_eq!(task.task_detail.paper, "스노우 250g");
    assert_eq!(task.task_detail.processes[0].status, ProcessStatus::Done);
    assert_eq!(task.comments.len(), 1);

    match api.get_task("missing").await {
        Err(PsError::NotFound { value, .. }) => assert_eq!(value, "missing"),
        other => panic!("expected not found, got {:?}", other),
    }
}

#[tokio::test]
async fn update_task_sends_only_present_fields() {
    let (api, state) = start_backend().await;

    api.update_task("T1", &UpdateTask::progress(TaskProgress::Done))
        .await
        .unwrap();

    let recorded = state.lock().unwrap();
    assert_eq!(recorded.patches[0].0, "T1");
    assert_eq!(recorded.patches[0].1, json!({"taskProgressing": "완료"}));
}

#[tokio::test]
async fn create_log_posts_record() {
    let (api, state) = start_backend().await;

    api.create_log(&NewRecord::new("T1", Some("7".into()), "[인쇄] 완료"))
        .await
        .unwrap();

    let recorded = state.lock().unwrap();
    assert_eq!(recorded.logs[0], json!({"taskKey": "T1", "adminKey": "7", "content": "[인쇄] 완료"}));
}

#[tokio::test]
async fn get_user_reads_array_body() {
    let (api, _) = start_backend().await;

    let row = api.get_user("kim").await.unwrap().unwrap();
    assert_eq!(row.admin_key.as_deref(), Some("7"));
    assert!(api.get_user("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn push_settings_and_recipients() {
    let (api, state) = start_backend().await;

    api.update_push_settings(
        "7",
        &PushSettings {
            push_token: None,
            push_enabled: false,
        },
    )
    .await
    .unwrap();

    let recipients = api.list_push_recipients().await.unwrap();
    assert_eq!(recipients.len(), 2);

    let recorded = state.lock().unwrap();
    assert_eq!(
        recorded.patches[0],
        ("user:7".to_string(), json!({"pushToken": null, "pushEnabled": false}))
    );
    assert_eq!(recorded.queries[0].get("pushEnabled").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn server_errors_map_to_http() {
    let (api, _) = start_backend().await;

    let err = api.get_options().await.unwrap_err();
    assert!(err.is_network());
    assert!(matches!(err, PsError::Http { status: 500, .. }));
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpTaskApi::new(&ApiConfig {
        base_url: format!("http://{}", addr),
        timeout_seconds: 2,
    })
    .unwrap();

    let err = api.task_counts().await.unwrap_err();
    assert!(err.is_network());
}
