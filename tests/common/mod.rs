#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use forum_admin::{app, config::Config, state::AppState};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Number of page visits served, the first one on the home page
pub const VISITS: u64 = 45;

/// Number of video watches served
pub const WATCHES: u64 = 12;

/// Requests received by the fake backend, as `METHOD /path`
#[derive(Clone, Default)]
pub struct Hits(Arc<Mutex<Vec<String>>>);

impl Hits {
    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.all().iter().any(|hit| hit == entry)
    }
}

pub struct FakeBackend {
    pub url: String,
    pub hits: Hits,
}

async fn record(State(hits): State<Hits>, request: Request, next: Next) -> Response {
    let entry = format!("{} {}", request.method(), request.uri().path());
    hits.0.lock().unwrap().push(entry);
    next.run(request).await
}

fn paging(query: &HashMap<String, String>) -> (Option<usize>, Option<usize>) {
    let read = |key: &str| query.get(key).and_then(|value| value.parse().ok());
    (read("skip"), read("take"))
}

fn slice<T: Clone>(items: &[T], skip: Option<usize>, take: Option<usize>) -> Vec<T> {
    let start = skip.unwrap_or(0).min(items.len());
    let end = take.map_or(items.len(), |take| (start + take).min(items.len()));
    items[start..end].to_vec()
}

fn visits() -> Vec<Value> {
    (1..=VISITS)
        .map(|id| {
            let url = if id == 1 { "/".to_string() } else { format!("/programme/{}", id % 4) };
            json!({
                "id": id,
                "userId": 10 + id % 3,
                "pageUrl": url,
                "timeSpent": id * 7,
                "createdAt": format!("2025-03-{:02}T09:00:00Z", 1 + id % 28),
                "user": {"id": 10 + id % 3, "firstName": "Awa", "lastName": "Diop", "email": "awa@forum.sn"}
            })
        })
        .collect()
}

fn watches() -> Vec<Value> {
    (1..=WATCHES)
        .map(|id| {
            json!({
                "id": id,
                "userId": 11,
                "videoId": format!("video-{}", id % 3),
                "startTime": "2025-03-02T10:00:00Z",
                "duration": 300,
                "progress": if id % 2 == 0 { 100 } else { 40 },
                "completed": id % 2 == 0,
                "auteur": "Pr Ndiaye",
                "dateVisualisation": "2025-03-02T10:00:00Z",
                "user": {"id": 11, "firstName": "Awa", "lastName": "Diop", "email": "awa@forum.sn"}
            })
        })
        .collect()
}

pub fn participant(id: u64, first: &str, last: &str, mode: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{}@forum.sn", first.to_lowercase()),
        "title": "Dr",
        "firstName": first,
        "lastName": last,
        "phoneNumber": "+221 77 000 00 00",
        "country": "Sénégal",
        "specialty": "Oncologie",
        "workplace": "Hôpital Principal",
        "participationMode": mode,
        "createdAt": "2025-03-01T10:00:00Z",
        "role": "USER",
        "videoWatches": [],
        "pageVisits": []
    })
}

fn users() -> Vec<Value> {
    vec![
        participant(11, "Awa", "Diop", "online"),
        participant(12, "Moussa", "Fall", "in_person"),
        participant(13, "Fatou", "Sarr", "online"),
        json!({"id": 1, "email": "admin@forum.sn", "firstName": "Aminata", "lastName": "Ba", "role": "ADMIN"}),
        json!({"id": 14, "email": "sans.role@forum.sn", "firstName": "Ibou", "lastName": "Sans"}),
    ]
}

async fn page_visits(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let (skip, take) = paging(&query);
    let all = visits();
    Json(json!({
        "data": slice(&all, skip, take),
        "pagination": {"total": all.len(), "skip": skip.unwrap_or(0), "take": take.unwrap_or(all.len())}
    }))
}

async fn video_watches(Query(query): Query<HashMap<String, String>>) -> Response {
    let (skip, take) = paging(&query);
    let mut headers = HeaderMap::new();
    headers.insert("x-total-count", HeaderValue::from(WATCHES));
    (headers, Json(Value::Array(slice(&watches(), skip, take)))).into_response()
}

async fn user(Path(id): Path<u64>) -> Response {
    match users().into_iter().find(|user| user["id"] == id) {
        Some(user) => Json(user).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Utilisateur introuvable"}))).into_response(),
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    let role = match body["email"].as_str() {
        Some("admin@forum.sn") => "ADMIN",
        Some("awa@forum.sn") => "USER",
        _ => return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Identifiants invalides"}))).into_response(),
    };
    let user = json!({"id": 1, "email": body["email"], "role": role});
    Json(json!({"access_token": token(role), "user": user})).into_response()
}

/// Echoes the stored record with a fresh id
async fn created(Json(mut body): Json<Value>) -> (StatusCode, Json<Value>) {
    body["id"] = json!(99);
    (StatusCode::CREATED, Json(body))
}

/// Emails reserved to drive registration failures
pub const TAKEN_EMAIL: &str = "deja@forum.sn";
pub const HTML_EMAIL: &str = "proxy@forum.sn";

async fn register(body: Json<Value>) -> Response {
    match body["email"].as_str() {
        Some(TAKEN_EMAIL) => {
            (StatusCode::CONFLICT, Json(json!({"message": "Cet email est déjà utilisé"}))).into_response()
        }
        Some(HTML_EMAIL) => (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>").into_response(),
        _ => created(body).await.into_response(),
    }
}

async fn dashboard() -> Json<Value> {
    Json(json!({
        "metrics": {"totalUsers": 4, "totalParticipants": 3, "totalPageViews": VISITS},
        "recentActivities": [],
        "temporalData": {"pageViews": [{"date": "2025-03-01", "count": 4}]},
        "geoData": [{"country": "Sénégal", "users": 3}]
    }))
}

impl FakeBackend {
    /// Serves canned backend answers on an ephemeral local port
    pub async fn start() -> FakeBackend {
        let hits = Hits::default();
        let router = Router::new()
            .route("/page-visits/all-with-users", routing::get(page_visits))
            .route("/video-watches/all-with-users", routing::get(video_watches))
            .route("/users", routing::get(|| async { Json(Value::Array(users())) }).post(created))
            .route("/users/admins", routing::get(|| async { Json(Value::Array(users())) }))
            .route("/users/:id", routing::get(user))
            .route("/auth/login", routing::post(login))
            .route("/auth/register", routing::post(register))
            .route("/dashboard", routing::get(dashboard))
            .layer(middleware::from_fn_with_state(hits.clone(), record));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        FakeBackend { url: format!("http://{address}"), hits }
    }

    /// The dashboard application pointed at this backend
    pub fn app(&self) -> Router {
        let config = Config { api_url: self.url.clone(), ..Config::default() };
        app::router(Arc::new(AppState::new(config).unwrap()))
    }
}

/// Unsigned token carrying `role`, valid for an hour
pub fn token(role: &str) -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({"sub": "1", "email": "admin@forum.sn", "role": role, "exp": exp, "firstName": "Aminata"}).to_string(),
    );
    format!("{header}.{payload}.signature")
}

pub fn get(uri: &str) -> axum::http::Request<Body> {
    axum::http::Request::get(uri).body(Body::empty()).unwrap()
}

pub fn get_as(uri: &str, role: &str) -> axum::http::Request<Body> {
    axum::http::Request::get(uri)
        .header("cookie", format!("auth_token={}", token(role)))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, role: Option<&str>, body: &Value) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::post(uri).header("content-type", "application/json");
    if let Some(role) = role {
        builder = builder.header("authorization", format!("Bearer {}", token(role)));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn post_form(uri: &str, role: &str, body: &str) -> axum::http::Request<Body> {
    axum::http::Request::post(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .header("cookie", format!("auth_token={}", token(role)))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
