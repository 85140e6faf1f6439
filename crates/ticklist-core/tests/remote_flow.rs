use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::{Value, json};
use ticklist_core::app::TodoApp;
use ticklist_core::error::TodoError;
use ticklist_core::persistence::{MemoryKvStore, RemoteAdapter};
use ticklist_core::{Icon, TaskDraft, TaskId, TaskPatch};

#[derive(Default)]
struct Server {
    tasks: Vec<Value>,
    next_id: u64,
    fail_writes: bool,
}

type Shared = Arc<Mutex<Server>>;

fn id_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn list(State(state): State<Shared>) -> Json<Value> {
    let server = state.lock().expect("lock");
    Json(Value::Array(server.tasks.clone()))
}

async fn create(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut server = state.lock().expect("lock");
    if server.fail_writes {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "db down" })));
    }
    server.next_id += 1;
    let id = server.next_id;
    let mut record = body;
    record["id"] = json!(id);
    server.tasks.push(record);
    (StatusCode::OK, Json(json!({ "success": true, "id": id })))
}

async fn update(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut server = state.lock().expect("lock");
    if server.fail_writes {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "db down" })));
    }
    let key = id_key(&body["id"]);
    match server.tasks.iter_mut().find(|t| id_key(&t["id"]) == key) {
        Some(slot) => {
            *slot = body;
            (StatusCode::OK, Json(json!({ "success": true })))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "no such task" }))),
    }
}

async fn remove(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut server = state.lock().expect("lock");
    if server.fail_writes {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "db down" })));
    }
    let key = id_key(&body["id"]);
    server.tasks.retain(|t| id_key(&t["id"]) != key);
    (StatusCode::OK, Json(json!({ "success": true })))
}

async fn serve(server: Server) -> (SocketAddr, Shared) {
    let state: Shared = Arc::new(Mutex::new(server));
    let app = Router::new()
        .route("/api.php", get(list).post(create).put(update).delete(remove))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock endpoint");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock endpoint");
    });
    (addr, state)
}

fn seeded() -> Server {
    Server {
        tasks: vec![json!({ "id": 1, "name": "Existing", "done": 0, "icon": "📝" })],
        next_id: 1,
        fail_writes: false,
    }
}

async fn open(addr: SocketAddr) -> TodoApp<RemoteAdapter> {
    let adapter = RemoteAdapter::new(&format!("http://{addr}/api.php"), Duration::from_secs(5))
        .expect("adapter");
    TodoApp::start(adapter, Box::new(MemoryKvStore::new())).await
}

#[tokio::test]
async fn create_adopts_the_server_assigned_id() {
    let (addr, state) = serve(seeded()).await;
    let mut app = open(addr).await;
    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.tasks()[0].id.as_str(), "1");
    assert!(!app.tasks()[0].done);

    let task = app
        .create(TaskDraft::new("Buy milk", Some(Icon::Cart)))
        .await
        .expect("create");
    assert_eq!(task.id.as_str(), "2");
    assert_eq!(task.name, "Buy milk");
    assert_eq!(app.tasks().len(), 2);
    assert_eq!(app.tasks()[1].id.as_str(), "2");

    let server = state.lock().expect("lock");
    assert_eq!(server.tasks.len(), 2);
    assert_eq!(server.tasks[1]["name"], "Buy milk");
    assert_eq!(server.tasks[1]["icon"], "🛒");
}

#[tokio::test]
async fn toggle_rename_and_delete_reach_the_endpoint() {
    let (addr, state) = serve(seeded()).await;
    let mut app = open(addr).await;
    let id = TaskId::new("1");

    let task = app.toggle(&id).await.expect("toggle");
    assert!(task.done);
    assert_eq!(state.lock().expect("lock").tasks[0]["done"], true);

    app.toggle(&id).await.expect("toggle back");
    app.update(&id, TaskPatch::rename("Renamed")).await.expect("rename");
    assert_eq!(app.tasks()[0].name, "Renamed");
    assert_eq!(state.lock().expect("lock").tasks[0]["name"], "Renamed");

    app.delete(&id).await.expect("delete");
    assert!(app.tasks().is_empty());
    assert!(state.lock().expect("lock").tasks.is_empty());
}

#[tokio::test]
async fn failed_writes_leave_the_list_unchanged() {
    let (addr, state) = serve(seeded()).await;
    let mut app = open(addr).await;
    state.lock().expect("lock").fail_writes = true;
    let before = app.tasks().to_vec();
    let id = TaskId::new("1");

    let err = app
        .create(TaskDraft::new("Buy milk", None))
        .await
        .expect_err("create fails");
    assert!(err.is_persistence());
    assert!(err.to_string().contains("500"));

    assert!(app.toggle(&id).await.expect_err("toggle fails").is_persistence());
    assert!(app.delete(&id).await.expect_err("delete fails").is_persistence());

    app.start_edit(&id).expect("start edit");
    assert!(app.submit(TaskDraft::new("Renamed", None)).await.is_err());
    assert!(!app.session().is_idle());

    assert_eq!(app.tasks(), before.as_slice());
}

#[tokio::test]
async fn validation_happens_before_any_request() {
    let (addr, state) = serve(seeded()).await;
    let mut app = open(addr).await;

    let err = app.create(TaskDraft::new(" ", None)).await.expect_err("blank");
    assert!(matches!(err, TodoError::Validation));
    assert_eq!(state.lock().expect("lock").tasks.len(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_starts_empty() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let app = open(addr).await;
    assert!(app.tasks().is_empty());
}
