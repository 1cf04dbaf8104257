#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use url::Url;

use binaryhub::app::countdown::Clock;
use binaryhub::config::AppConfig;
use binaryhub::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_PASSWORD: &str = "secret123";
const SESSION_COOKIE: &str = "sid";

// ---------------------------------------------------------------------------
// Stub backend: the REST surface the client talks to, held in memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredUser {
    id: String,
    full_name: String,
    email: String,
    password: String,
}

impl StoredUser {
    fn public(&self) -> Value {
        json!({ "_id": self.id, "fullName": self.full_name, "email": self.email })
    }
}

/// One recorded `POST /api/enrollments` multipart body.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub fields: HashMap<String, String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub file_len: usize,
}

#[derive(Default)]
struct BackendState {
    users: Vec<StoredUser>,
    sessions: HashMap<String, String>,
    enrollments: Vec<Value>,
    notifications: Vec<Value>,
    mentors: Vec<Value>,
    freelancers: Vec<Value>,
    team_members: Vec<Value>,
    hits: HashMap<String, usize>,
    submissions: Vec<Submission>,
    catalog_down: bool,
    session_check_unsuccessful: bool,
    next_id: u64,
}

impl BackendState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<&StoredUser> {
        let cookies = headers.get(COOKIE)?.to_str().ok()?;
        let token = cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then_some(value)
        })?;
        let user_id = self.sessions.get(token)?;
        self.users.iter().find(|user| &user.id == user_id)
    }

    fn unread_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| !n["read"].as_bool().unwrap_or(false))
            .count()
    }
}

type Shared = Arc<Mutex<BackendState>>;

pub struct TestBackend {
    pub url: Url,
    state: Shared,
}

impl TestBackend {
    /// Binds an ephemeral port and serves the stub until the runtime stops.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::default()));
        let router = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub backend");
        let addr = listener.local_addr().expect("stub backend address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub backend");
        });

        let url = Url::parse(&format!("http://{}", addr)).expect("stub backend url");
        Self { url, state }
    }

    pub fn config(&self) -> AppConfig {
        AppConfig::with_api_url(self.url.clone())
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(&self.config()).expect("app state")
    }

    pub fn app_state_with_clock(&self, clock: Arc<dyn Clock>) -> AppState {
        AppState::with_clock(&self.config(), clock).expect("app state")
    }

    /// A fresh client already signed in as a newly registered user.
    pub async fn signed_in_state(&self) -> AppState {
        let email = self.add_user("Jane Doe", "jane@x.com");
        let state = self.app_state();
        state
            .session
            .sign_in(&email, DEFAULT_PASSWORD)
            .await
            .expect("sign in");
        state
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    pub fn add_user(&self, full_name: &str, email: &str) -> String {
        let mut backend = self.state.lock().unwrap();
        let id = backend.next_id("u");
        backend.users.push(StoredUser {
            id,
            full_name: full_name.to_string(),
            email: email.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        });
        email.to_string()
    }

    pub fn add_enrollment(&self, enrollment: Value) {
        self.state.lock().unwrap().enrollments.push(enrollment);
    }

    pub fn add_notification(&self, id: &str, read: bool, age: Duration) {
        let created_at = rfc3339(OffsetDateTime::now_utc() - age);
        self.state.lock().unwrap().notifications.push(json!({
            "_id": id,
            "type": "admission_accepted",
            "title": "Admission Accepted",
            "message": format!("Notification {}", id),
            "read": read,
            "createdAt": created_at,
        }));
    }

    pub fn set_mentors(&self, mentors: Vec<Value>) {
        self.state.lock().unwrap().mentors = mentors;
    }

    pub fn set_freelancers(&self, freelancers: Vec<Value>) {
        self.state.lock().unwrap().freelancers = freelancers;
    }

    pub fn set_team_members(&self, members: Vec<Value>) {
        self.state.lock().unwrap().team_members = members;
    }

    pub fn take_catalog_down(&self) {
        self.state.lock().unwrap().catalog_down = true;
    }

    /// `/api/auth/me` answers 200 with `success: false` from now on.
    pub fn answer_session_check_unsuccessfully(&self) {
        self.state.lock().unwrap().session_check_unsuccessful = true;
    }

    /// Forgets every server-side session, as a backend restart would.
    pub fn expire_sessions(&self) {
        self.state.lock().unwrap().sessions.clear();
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Requests seen for `"METHOD /path"`.
    pub fn hits(&self, route: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(route)
            .copied()
            .unwrap_or(0)
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn notification_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter_map(|n| n["_id"].as_str().map(str::to_string))
            .collect()
    }

    pub fn server_unread_count(&self) -> usize {
        self.state.lock().unwrap().unread_count()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).expect("rfc3339")
}

pub fn enrollment_json(
    id: &str,
    slug: &str,
    status: &str,
    expiration: Option<OffsetDateTime>,
    expired: bool,
) -> Value {
    json!({
        "_id": id,
        "course": { "slug": slug, "title": title_for(slug) },
        "status": status,
        "purchaseDate": expiration.map(|at| rfc3339(at - Duration::days(90))),
        "expirationDate": expiration.map(rfc3339),
        "expired": expired,
        "createdAt": rfc3339(OffsetDateTime::now_utc() - Duration::days(1)),
    })
}

fn title_for(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Smallest buffer `image::guess_format` recognises as PNG.
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len.max(8)];
    data[..8].copy_from_slice(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    data
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/enrollments", post(submit_enrollment))
        .route("/api/enrollments/my-courses", get(my_courses))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/read-all", patch(read_all))
        .route("/api/notifications/:id/read", patch(read_one))
        .route("/api/notifications/:id", delete(delete_notification))
        .route("/api/mentors", get(mentors))
        .route("/api/freelancers", get(freelancers))
        .route("/api/team-members", get(team_members))
        .layer(middleware::from_fn_with_state(state.clone(), count_hits))
        .with_state(state)
}

async fn count_hits(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let route = format!("{} {}", request.method(), request.uri().path());
    *state.lock().unwrap().hits.entry(route).or_insert(0) += 1;
    next.run(request).await
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    reply(status, json!({ "success": false, "message": message }))
}

fn unauthorized() -> Response {
    failure(StatusCode::UNAUTHORIZED, "Not authorized, no token")
}

fn with_session(mut response: Response, cookie: String) -> Response {
    if let Ok(value) = cookie.parse() {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

fn start_session(state: &mut BackendState, user_id: String) -> String {
    let token = state.next_id("token");
    state.sessions.insert(token.clone(), user_id);
    format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, token)
}

async fn sign_up(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if backend.users.iter().any(|user| user.email == email) {
        return failure(StatusCode::BAD_REQUEST, "User already exists");
    }
    let user = StoredUser {
        id: backend.next_id("u"),
        full_name: body["fullName"].as_str().unwrap_or_default().to_string(),
        email,
        password: body["password"].as_str().unwrap_or_default().to_string(),
    };
    let cookie = start_session(&mut backend, user.id.clone());
    let public = user.public();
    backend.users.push(user);
    with_session(
        reply(
            StatusCode::CREATED,
            json!({ "success": true, "message": "User registered successfully", "user": public }),
        ),
        cookie,
    )
}

async fn sign_in(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = state.lock().unwrap();
    let found = backend
        .users
        .iter()
        .find(|user| {
            Some(user.email.as_str()) == body["email"].as_str()
                && Some(user.password.as_str()) == body["password"].as_str()
        })
        .cloned();
    let Some(user) = found else {
        return failure(StatusCode::UNAUTHORIZED, "Invalid email or password");
    };
    let cookie = start_session(&mut backend, user.id.clone());
    with_session(
        reply(
            StatusCode::OK,
            json!({ "success": true, "message": "Signed in successfully", "user": user.public() }),
        ),
        cookie,
    )
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    if backend.session_check_unsuccessful {
        return failure(StatusCode::OK, "Session could not be verified");
    }
    match backend.user_for(&headers) {
        Some(user) => reply(StatusCode::OK, json!({ "success": true, "user": user.public() })),
        None => unauthorized(),
    }
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = state.lock().unwrap();
    let user_id = backend.user_for(&headers).map(|user| user.id.clone());
    backend
        .sessions
        .retain(|_, owner| user_id.as_deref() != Some(owner.as_str()));
    with_session(
        reply(StatusCode::OK, json!({ "success": true, "message": "Logged out successfully" })),
        format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE),
    )
}

async fn my_courses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    if backend.user_for(&headers).is_none() {
        return unauthorized();
    }
    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "count": backend.enrollments.len(),
            "data": backend.enrollments,
        }),
    )
}

async fn submit_enrollment(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let signed_in = state.lock().unwrap().user_for(&headers).is_some();
    if !signed_in {
        return unauthorized();
    }

    let mut submission = Submission::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "screenshot" {
            submission.file_name = field.file_name().map(str::to_string);
            submission.content_type = field.content_type().map(str::to_string);
            submission.file_len = field.bytes().await.map(|data| data.len()).unwrap_or(0);
        } else {
            let value = field.text().await.unwrap_or_default();
            submission.fields.insert(name, value);
        }
    }

    if submission.file_len == 0 {
        return failure(StatusCode::BAD_REQUEST, "Payment screenshot is required");
    }

    let mut backend = state.lock().unwrap();
    let id = backend.next_id("e");
    let slug = submission.fields.get("courseSlug").cloned().unwrap_or_default();
    let enrollment = enrollment_json(&id, &slug, "pending", None, false);
    backend.enrollments.push(enrollment.clone());
    backend.submissions.push(submission);
    reply(
        StatusCode::CREATED,
        json!({
            "success": true,
            "message": "Enrollment submitted successfully. Please wait for admin approval.",
            "data": enrollment,
        }),
    )
}

async fn list_notifications(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    if backend.user_for(&headers).is_none() {
        return unauthorized();
    }
    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "count": backend.notifications.len(),
            "data": backend.notifications,
        }),
    )
}

async fn unread_count(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let backend = state.lock().unwrap();
    if backend.user_for(&headers).is_none() {
        return unauthorized();
    }
    reply(
        StatusCode::OK,
        json!({ "success": true, "count": backend.unread_count() }),
    )
}

async fn read_all(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = state.lock().unwrap();
    if backend.user_for(&headers).is_none() {
        return unauthorized();
    }
    for notification in &mut backend.notifications {
        notification["read"] = json!(true);
    }
    reply(
        StatusCode::OK,
        json!({ "success": true, "message": "All notifications marked as read" }),
    )
}

async fn read_one(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut backend = state.lock().unwrap();
    if backend.user_for(&headers).is_none() {
        return unauthorized();
    }
    let Some(notification) = backend
        .notifications
        .iter_mut()
        .find(|n| n["_id"].as_str() == Some(id.as_str()))
    else {
        return failure(StatusCode::NOT_FOUND, "Notification not found");
    };
    notification["read"] = json!(true);
    let data = notification.clone();
    reply(StatusCode::OK, json!({ "success": true, "data": data }))
}

async fn delete_notification(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut backend = state.lock().unwrap();
    if backend.user_for(&headers).is_none() {
        return unauthorized();
    }
    let before = backend.notifications.len();
    backend
        .notifications
        .retain(|n| n["_id"].as_str() != Some(id.as_str()));
    if backend.notifications.len() == before {
        return failure(StatusCode::NOT_FOUND, "Notification not found");
    }
    reply(
        StatusCode::OK,
        json!({ "success": true, "message": "Notification deleted" }),
    )
}

fn catalog_list(backend: &BackendState, items: Vec<Value>) -> Response {
    if backend.catalog_down {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
    }
    reply(
        StatusCode::OK,
        json!({ "success": true, "count": items.len(), "data": items }),
    )
}

async fn mentors(State(state): State<Shared>) -> Response {
    let backend = state.lock().unwrap();
    catalog_list(&backend, backend.mentors.clone())
}

async fn freelancers(State(state): State<Shared>) -> Response {
    let backend = state.lock().unwrap();
    catalog_list(&backend, backend.freelancers.clone())
}

async fn team_members(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let backend = state.lock().unwrap();
    let members = backend
        .team_members
        .iter()
        .filter(|member| match query.get("team") {
            Some(team) => member["team"].as_str() == Some(team.as_str()),
            None => true,
        })
        .cloned()
        .collect();
    catalog_list(&backend, members)
}
