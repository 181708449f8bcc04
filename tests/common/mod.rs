//! In-process stand-in for the care API, served from its own thread so it
//! outlives any single test runtime.

#![allow(dead_code)]

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{mpsc, Arc, Mutex};

#[derive(Default)]
pub struct MockState {
    pub collections: HashMap<String, Vec<Value>>,
    pub next_id: i64,
    /// GET counts per path.
    pub hits: HashMap<String, usize>,
    pub authorizations: Vec<String>,
    pub valid_tokens: HashSet<String>,
    /// Paths answering 500 until removed.
    pub failing: HashSet<String>,
    pub uploads: Vec<(String, usize, Option<String>)>,
}

#[derive(Clone)]
pub struct MockUpstream {
    pub base_url: String,
    pub state: Arc<Mutex<MockState>>,
}

impl MockUpstream {
    pub fn start() -> Self {
        let state = Arc::new(Mutex::new(seed()));
        let (tx, rx) = mpsc::channel();
        let shared = Arc::clone(&state);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("mock runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind mock upstream");
                tx.send(listener.local_addr().expect("mock addr"))
                    .expect("report mock addr");
                axum::serve(listener, routes(shared))
                    .await
                    .expect("serve mock upstream");
            });
        });

        let addr = rx.recv().expect("mock upstream started");
        Self {
            base_url: format!("http://{addr}/api/v1"),
            state,
        }
    }

    pub fn hits(&self, path: &str) -> usize {
        self.lock().hits.get(path).copied().unwrap_or(0)
    }

    pub fn fail(&self, path: &str, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing.insert(path.to_string());
        } else {
            state.failing.remove(path);
        }
    }

    pub fn revoke(&self, token: &str) {
        self.lock().valid_tokens.remove(token);
    }

    pub fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

fn seed() -> MockState {
    let mut collections = HashMap::new();
    collections.insert(
        "clients".to_string(),
        vec![
            json!({"id": 1, "first_name": "Ada", "last_name": "Byron", "status": "active", "care_level": "high"}),
            json!({"id": 2, "first_name": "Grace", "last_name": "Hopper", "status": "inactive"}),
        ],
    );
    collections.insert(
        "behaviors".to_string(),
        vec![
            json!({"id": 1, "client": 1, "client_name": "Ada Byron", "behavior_type": "Shouting", "category": "verbal", "severity": "critical", "date": "2024-03-10", "intervention_effective": true}),
            json!({"id": 2, "client": 2, "client_name": "Grace Hopper", "behavior_type": "Pacing", "category": "physical", "severity": "low", "date": "2024-03-11", "intervention_effective": false}),
        ],
    );
    collections.insert(
        "goals".to_string(),
        vec![
            json!({"id": 1, "client": 1, "title": "Walk to the shop", "status": "completed", "priority": "high", "progress": 100}),
            json!({"id": 2, "client": 2, "title": "Cook a meal", "status": "in_progress", "priority": "medium", "progress": 50, "target_date": "2000-01-01"}),
        ],
    );
    collections.insert(
        "activities".to_string(),
        vec![
            json!({"id": 1, "title": "Swimming", "date": "2024-03-10", "start_time": "10:00", "status": "scheduled"}),
            json!({"id": 2, "title": "Art class", "date": "2024-03-11", "start_time": "14:00", "status": "scheduled"}),
        ],
    );
    collections.insert("logs".to_string(), Vec::new());
    collections.insert("schedules".to_string(), Vec::new());
    collections.insert(
        "shifts".to_string(),
        vec![json!({"id": 1, "carer": 7, "client": 1, "client_name": "Ada Byron", "date": "2024-03-10", "start_time": "09:00", "end_time": "17:00", "status": "scheduled"})],
    );
    collections.insert(
        "users".to_string(),
        vec![json!({"id": 7, "username": "carer", "first_name": "Casey", "last_name": "Jones"})],
    );

    MockState {
        collections,
        next_id: 100,
        valid_tokens: HashSet::from(["token-1".to_string(), "token-2".to_string()]),
        ..MockState::default()
    }
}

type Shared = Arc<Mutex<MockState>>;

fn routes(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/profile", get(profile))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/reports/:name", get(report))
        .route("/media/upload", post(upload))
        .route("/activities/logs", get(list_logs).post(create_log))
        .route("/scheduler/schedules", get(list_schedules))
        .route("/:collection", get(list).post(create))
        .route("/:collection/:id", get(fetch).put(update).delete(remove));
    Router::new().nest("/api/v1", api).with_state(state)
}

fn error(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

/// Records the request and checks its bearer token.
fn guard(state: &Shared, headers: &HeaderMap, path: &str, counted: bool) -> Result<(), Response> {
    let mut state = state.lock().unwrap();
    if counted {
        *state.hits.entry(path.to_string()).or_default() += 1;
    }
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.authorizations.push(authorization.clone());

    let token = authorization.strip_prefix("Bearer ").unwrap_or_default();
    if !state.valid_tokens.contains(token) {
        return Err(error(StatusCode::UNAUTHORIZED, "Token is invalid or expired"));
    }
    if state.failing.contains(path) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "database unavailable" })),
        )
            .into_response());
    }
    Ok(())
}

fn matches(item: &Value, query: &HashMap<String, String>) -> bool {
    query
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "start_date" | "end_date" | "search"))
        .all(|(key, expected)| match item.get(key) {
            Some(Value::String(text)) => text == expected,
            Some(other) => other.to_string() == *expected,
            None => false,
        })
}

fn page(items: Vec<Value>) -> Json<Value> {
    Json(json!({ "count": items.len(), "results": items }))
}

fn list_of(state: &Shared, name: &str, query: &HashMap<String, String>) -> Json<Value> {
    let state = state.lock().unwrap();
    let items = state
        .collections
        .get(name)
        .map(|items| items.iter().filter(|item| matches(item, query)).cloned().collect())
        .unwrap_or_default();
    page(items)
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "carer" && body["password"] == "secret" {
        Json(json!({ "access": "token-1", "refresh": "refresh-1" })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn refresh(Json(body): Json<Value>) -> Response {
    if body["refresh"] == "refresh-1" {
        Json(json!({ "access": "token-2" })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Refresh token expired")
    }
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = guard(&state, &headers, "/auth/profile", true) {
        return response;
    }
    Json(json!({ "id": 7, "username": "carer", "first_name": "Casey", "last_name": "Jones", "role": "carer" }))
        .into_response()
}

async fn dashboard_stats(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = guard(&state, &headers, "/dashboard/stats", true) {
        return response;
    }
    Json(json!({ "total_clients": 2, "active_clients": 1, "active_goals": 1, "todays_activities": 0 }))
        .into_response()
}

async fn report(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = guard(&state, &headers, &format!("/reports/{name}"), true) {
        return response;
    }
    Json(json!({ "report": name, "filters": query })).into_response()
}

async fn upload(State(state): State<Shared>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    if let Err(response) = guard(&state, &headers, "/media/upload", false) {
        return response;
    }
    let mut file = None;
    let mut metadata = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap_or_default();
            file = Some((file_name, bytes.len()));
        } else if name == "metadata" {
            metadata = field.text().await.ok();
        }
    }
    let Some((file_name, size)) = file else {
        return error(StatusCode::BAD_REQUEST, "file is required");
    };
    state
        .lock()
        .unwrap()
        .uploads
        .push((file_name.clone(), size, metadata));
    (
        StatusCode::CREATED,
        Json(json!({ "id": 1, "url": format!("/media/{file_name}"), "size": size })),
    )
        .into_response()
}

async fn list_logs(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = guard(&state, &headers, "/activities/logs", true) {
        return response;
    }
    list_of(&state, "logs", &query).into_response()
}

async fn create_log(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(response) = guard(&state, &headers, "/activities/logs", false) {
        return response;
    }
    insert(&state, "logs", body)
}

async fn list_schedules(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = guard(&state, &headers, "/scheduler/schedules", true) {
        return response;
    }
    list_of(&state, "schedules", &query).into_response()
}

async fn list(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(collection): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = guard(&state, &headers, &format!("/{collection}"), true) {
        return response;
    }
    list_of(&state, &collection, &query).into_response()
}

fn insert(state: &Shared, collection: &str, mut body: Value) -> Response {
    let mut state = state.lock().unwrap();
    state.next_id += 1;
    let id = state.next_id;
    body["id"] = json!(id);
    state
        .collections
        .entry(collection.to_string())
        .or_default()
        .push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn create(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = guard(&state, &headers, &format!("/{collection}"), false) {
        return response;
    }
    insert(&state, &collection, body)
}

async fn fetch(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, i64)>,
) -> Response {
    if let Err(response) = guard(&state, &headers, &format!("/{collection}/{id}"), true) {
        return response;
    }
    let state = state.lock().unwrap();
    state
        .collections
        .get(&collection)
        .and_then(|items| items.iter().find(|item| item["id"] == id))
        .map(|item| Json(item.clone()).into_response())
        .unwrap_or_else(|| error(StatusCode::NOT_FOUND, "Not found."))
}

async fn update(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, i64)>,
    Json(mut body): Json<Value>,
) -> Response {
    if let Err(response) = guard(&state, &headers, &format!("/{collection}/{id}"), false) {
        return response;
    }
    let mut state = state.lock().unwrap();
    let Some(item) = state
        .collections
        .get_mut(&collection)
        .and_then(|items| items.iter_mut().find(|item| item["id"] == id))
    else {
        return error(StatusCode::NOT_FOUND, "Not found.");
    };
    body["id"] = json!(id);
    *item = body.clone();
    Json(body).into_response()
}

async fn remove(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, i64)>,
) -> Response {
    if let Err(response) = guard(&state, &headers, &format!("/{collection}/{id}"), false) {
        return response;
    }
    let mut state = state.lock().unwrap();
    if let Some(items) = state.collections.get_mut(&collection) {
        items.retain(|item| item["id"] != id);
    }
    StatusCode::NO_CONTENT.into_response()
}
