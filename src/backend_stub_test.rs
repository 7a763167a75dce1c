//! In-process marketplace backend used by adapter, session and page tests.
//!
//! Mirrors the REST surface under `/api`: session cookie auth, an
//! anti-forgery check on authenticated mutations (logout exempt), field-level
//! validation errors as lists, and `{error}` bodies for permission failures.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{Value, json};

use crate::app::App;
use crate::config::ClientConfig;
use crate::net::credentials::CookieCredentials;

// =============================================================================
// STATE
// =============================================================================

#[derive(Clone, Debug)]
pub(crate) struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub cookie: Option<String>,
    pub csrf_header: Option<String>,
}

#[derive(Clone, Debug)]
pub(crate) struct StubUser {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub role: &'static str,
}

#[derive(Clone, Debug)]
pub(crate) struct StubJob {
    pub id: u64,
    pub owner: String,
    pub title: String,
    pub category: &'static str,
    pub budget: Option<&'static str>,
}

#[derive(Clone, Debug)]
pub(crate) struct StubApplication {
    pub id: u64,
    pub job_id: u64,
    pub freelancer: String,
    pub cover_letter: String,
    pub status: String,
}

#[derive(Debug)]
pub(crate) struct StubState {
    pub users: Vec<StubUser>,
    pub jobs: Vec<StubJob>,
    pub applications: Vec<StubApplication>,
    pub requests: Vec<Recorded>,
    pub csrf_counter: u64,
    /// Delay before answering `GET /auth/current/`.
    pub current_delay: Option<Duration>,
    /// Forced status for `GET /auth/current/`.
    pub current_status: Option<u16>,
    /// Forced raw body for `GET /auth/current/` (status 200).
    pub current_raw_body: Option<String>,
    /// Forced status for `POST /auth/logout/`.
    pub logout_status: Option<u16>,
    pub logout_delay: Option<Duration>,
    /// Per-category delay for `GET /jobs/` (`""` means unfiltered).
    pub list_delays: HashMap<String, Duration>,
    /// Forced status for `PUT /jobs/applications/{id}/status/`.
    pub status_update_status: Option<u16>,
    pub status_update_delay: Option<Duration>,
}

impl Default for StubState {
    fn default() -> Self {
        let user = |id, username: &str, first_name: &str, role| StubUser {
            id,
            username: username.to_owned(),
            password: "secret".to_owned(),
            first_name: first_name.to_owned(),
            role,
        };
        Self {
            users: vec![
                user(1, "alice", "Alice", "client"),
                user(2, "bob", "", "freelancer"),
                user(3, "carol", "Carol", "client"),
            ],
            jobs: vec![
                StubJob {
                    id: 1,
                    owner: "alice".to_owned(),
                    title: "Build a landing page".to_owned(),
                    category: "web-development",
                    budget: Some("1500.00"),
                },
                StubJob {
                    id: 2,
                    owner: "carol".to_owned(),
                    title: "Design a logo".to_owned(),
                    category: "design",
                    budget: None,
                },
                StubJob {
                    id: 3,
                    owner: "alice".to_owned(),
                    title: "Mobile banking app".to_owned(),
                    category: "mobile-development",
                    budget: Some("5000.00"),
                },
            ],
            applications: vec![StubApplication {
                id: 1,
                job_id: 1,
                freelancer: "bob".to_owned(),
                cover_letter: "I have built many landing pages.".to_owned(),
                status: "pending".to_owned(),
            }],
            requests: Vec::new(),
            csrf_counter: 0,
            current_delay: None,
            current_status: None,
            current_raw_body: None,
            logout_status: None,
            logout_delay: None,
            list_delays: HashMap::new(),
            status_update_status: None,
            status_update_delay: None,
        }
    }
}

type Shared = Arc<Mutex<StubState>>;

pub(crate) struct Stub {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl Stub {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(StubState::default()));
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("stub bind should succeed");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server failed");
        });
        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.base_url());
        config.timeouts.resolve_secs = 2;
        config.timeouts.request_secs = 5;
        config
    }

    /// Anonymous app context, not yet started.
    pub fn app(&self) -> App {
        App::from_config(self.config()).expect("app should build")
    }

    /// App context carrying `username`'s session and a matching
    /// anti-forgery cookie, already resolved.
    pub async fn app_as(&self, username: &str) -> App {
        let creds = CookieCredentials::default()
            .with_session(format!("session-{username}"))
            .with_anti_forgery("csrf-seeded");
        let app = App::new(self.config(), Arc::new(creds)).expect("app should build");
        app.start().await;
        app
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut StubState) -> R) -> R {
        let mut state = self.state.lock().expect("stub lock");
        f(&mut state)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.with(|state| state.requests.clone())
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

/// A base URL on which nothing listens.
pub(crate) async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}/api")
}

// =============================================================================
// ROUTING
// =============================================================================

async fn handle(State(state): State<Shared>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path().strip_prefix("/api").unwrap_or(uri.path()).to_owned();
    let jar = CookieJar::from_headers(&headers);
    let csrf_header = headers
        .get("x-csrftoken")
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    let cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    let query = uri.query().map(ToOwned::to_owned);
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let (session_user, delay) = {
        let mut st = state.lock().expect("stub lock");
        st.requests.push(Recorded {
            method: method.to_string(),
            path: path.clone(),
            query: query.clone(),
            cookie,
            csrf_header: csrf_header.clone(),
        });
        let user = jar
            .get("sessionid")
            .map(Cookie::value)
            .and_then(|token| token.strip_prefix("session-"))
            .and_then(|name| st.users.iter().find(|u| u.username == name).cloned());
        let delay = match (method.as_str(), path.as_str()) {
            ("GET", "/auth/current/") => st.current_delay,
            ("POST", "/auth/logout/") => st.logout_delay,
            ("PUT", p) if p.starts_with("/jobs/applications/") => st.status_update_delay,
            ("GET", "/jobs/") => {
                let category = category_param(query.as_deref());
                st.list_delays.get(&category).copied()
            }
            _ => None,
        };
        (user, delay)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let is_mutating = method != Method::GET;
    if is_mutating && session_user.is_some() && path != "/auth/logout/" {
        let cookie_token = jar.get("csrftoken").map(Cookie::value);
        if csrf_header.is_none() || csrf_header.as_deref() != cookie_token {
            return reply(StatusCode::FORBIDDEN, json!({ "detail": "CSRF Failed: CSRF token missing." }));
        }
    }

    let mut st = state.lock().expect("stub lock");
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("POST", ["auth", "register"]) => register(&mut st, &body),
        ("POST", ["auth", "login"]) => login(&mut st, &body),
        ("POST", ["auth", "logout"]) => logout(&st),
        ("GET", ["auth", "current"]) => current(&st, session_user.as_ref()),
        ("GET", ["auth", "csrf"]) => {
            st.csrf_counter += 1;
            let mut resp = reply(StatusCode::OK, json!({ "detail": "CSRF cookie set" }));
            append_cookie(&mut resp, &format!("csrftoken=csrf-{}; Path=/; SameSite=Lax", st.csrf_counter));
            resp
        }
        ("PUT", ["auth", "profile"]) => profile(&mut st, session_user.as_ref(), &body),
        ("GET", ["jobs"]) => {
            let category = category_param(query.as_deref());
            let jobs: Vec<Value> = st
                .jobs
                .iter()
                .rev()
                .filter(|j| category.is_empty() || j.category == category)
                .map(|j| job_json(&st, j))
                .collect();
            reply(StatusCode::OK, Value::Array(jobs))
        }
        ("POST", ["jobs", "create"]) => create_job(&mut st, session_user.as_ref(), &body),
        ("GET", ["jobs", "my-jobs"]) => match session_user {
            None => unauthenticated(),
            Some(u) if u.role != "client" => forbidden("Only clients can view their jobs"),
            Some(u) => {
                let jobs: Vec<Value> = st
                    .jobs
                    .iter()
                    .rev()
                    .filter(|j| j.owner == u.username)
                    .map(|j| job_json(&st, j))
                    .collect();
                reply(StatusCode::OK, Value::Array(jobs))
            }
        },
        ("GET", ["jobs", "my-applications"]) => match session_user {
            None => unauthenticated(),
            Some(u) if u.role != "freelancer" => forbidden("Only freelancers can view their applications"),
            Some(u) => {
                let apps: Vec<Value> = st
                    .applications
                    .iter()
                    .filter(|a| a.freelancer == u.username)
                    .map(|a| application_json(&st, a))
                    .collect();
                reply(StatusCode::OK, Value::Array(apps))
            }
        },
        ("PUT", ["jobs", "applications", id, "status"]) => {
            update_status(&mut st, session_user.as_ref(), id, &body)
        }
        ("GET", ["jobs", id]) => match find_job(&st, id) {
            Some(job) => reply(StatusCode::OK, job_json(&st, &job)),
            None => not_found(),
        },
        ("POST", ["jobs", id, "apply"]) => apply(&mut st, session_user.as_ref(), id, &body),
        ("GET", ["jobs", id, "applications"]) => match (session_user, find_job(&st, id)) {
            (None, _) => unauthenticated(),
            (Some(u), Some(job)) if job.owner == u.username => {
                let apps: Vec<Value> = st
                    .applications
                    .iter()
                    .filter(|a| a.job_id == job.id)
                    .map(|a| application_json(&st, a))
                    .collect();
                reply(StatusCode::OK, Value::Array(apps))
            }
            _ => not_found(),
        },
        _ => not_found(),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn register(st: &mut StubState, body: &Value) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_owned();
    let mut errors = serde_json::Map::new();
    if username.is_empty() {
        errors.insert("username".into(), json!(["This field is required."]));
    } else if st.users.iter().any(|u| u.username == username) {
        errors.insert("username".into(), json!(["A user with that username already exists."]));
    }
    if body["password"].as_str().unwrap_or_default().is_empty() {
        errors.insert("password".into(), json!(["This field may not be blank."]));
    }
    let role = match body["user_type"].as_str() {
        Some("client") => "client",
        Some("freelancer") => "freelancer",
        _ => {
            errors.insert("user_type".into(), json!(["\"\" is not a valid choice."]));
            "freelancer"
        }
    };
    if !errors.is_empty() {
        return reply(StatusCode::BAD_REQUEST, Value::Object(errors));
    }
    let user = StubUser {
        id: st.users.len() as u64 + 1,
        username,
        password: body["password"].as_str().unwrap_or_default().to_owned(),
        first_name: body["first_name"].as_str().unwrap_or_default().to_owned(),
        role,
    };
    st.users.push(user.clone());
    reply(StatusCode::CREATED, json!({ "user": user_json(&user), "message": "User created successfully" }))
}

fn login(st: &mut StubState, body: &Value) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    if username.is_empty() {
        return reply(StatusCode::BAD_REQUEST, json!({ "username": ["This field is required."] }));
    }
    let Some(user) = st
        .users
        .iter()
        .find(|u| u.username == username && u.password == password)
        .cloned()
    else {
        return reply(StatusCode::UNAUTHORIZED, json!({ "error": "Invalid credentials" }));
    };
    let mut resp = reply(StatusCode::OK, json!({ "user": user_json(&user), "message": "Login successful" }));
    start_session(st, &mut resp, &user);
    resp
}

fn start_session(st: &mut StubState, resp: &mut Response, user: &StubUser) {
    st.csrf_counter += 1;
    append_cookie(resp, &format!("sessionid=session-{}; HttpOnly; Path=/; SameSite=Lax", user.username));
    append_cookie(resp, &format!("csrftoken=csrf-{}; Path=/; SameSite=Lax", st.csrf_counter));
}

fn logout(st: &StubState) -> Response {
    if let Some(status) = st.logout_status {
        return reply(status_code(status), json!({ "error": "logout failed" }));
    }
    let mut resp = reply(StatusCode::OK, json!({ "message": "Logout successful" }));
    append_cookie(&mut resp, "sessionid=\"\"; expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; Path=/");
    resp
}

fn current(st: &StubState, user: Option<&StubUser>) -> Response {
    if let Some(status) = st.current_status {
        return reply(status_code(status), json!({ "error": "forced" }));
    }
    if let Some(raw) = &st.current_raw_body {
        return (StatusCode::OK, raw.clone()).into_response();
    }
    match user {
        Some(u) => reply(StatusCode::OK, user_json(u)),
        None => reply(StatusCode::UNAUTHORIZED, json!({ "error": "Not authenticated" })),
    }
}

fn profile(st: &mut StubState, user: Option<&StubUser>, body: &Value) -> Response {
    let Some(user) = user else {
        return reply(StatusCode::UNAUTHORIZED, json!({ "error": "Not authenticated" }));
    };
    let Some(stored) = st.users.iter_mut().find(|u| u.username == user.username) else {
        return not_found();
    };
    if let Some(first_name) = body["first_name"].as_str() {
        stored.first_name = first_name.to_owned();
    }
    let mut value = user_json(stored);
    if let Some(bio) = body["bio"].as_str() {
        value["bio"] = json!(bio);
    }
    reply(StatusCode::OK, value)
}

fn create_job(st: &mut StubState, user: Option<&StubUser>, body: &Value) -> Response {
    let Some(user) = user else {
        return unauthenticated();
    };
    if user.role != "client" {
        return forbidden("Only clients can post jobs");
    }
    let title = body["title"].as_str().unwrap_or_default().trim().to_owned();
    if title.len() < 3 {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "title": ["Title must be at least 3 characters long."] }),
        );
    }
    let category = match body["category"].as_str() {
        Some("web-development") => "web-development",
        Some("mobile-development") => "mobile-development",
        Some("design") => "design",
        Some("writing") => "writing",
        Some("marketing") => "marketing",
        Some("other") => "other",
        _ => return reply(StatusCode::BAD_REQUEST, json!({ "category": ["Invalid category selected."] })),
    };
    let job = StubJob { id: st.jobs.len() as u64 + 1, owner: user.username.clone(), title, category, budget: None };
    st.jobs.push(job.clone());
    reply(StatusCode::CREATED, job_json(st, &job))
}

fn apply(st: &mut StubState, user: Option<&StubUser>, id: &str, body: &Value) -> Response {
    let Some(user) = user else {
        return unauthenticated();
    };
    if user.role != "freelancer" {
        return forbidden("Only freelancers can apply to jobs");
    }
    let Some(job) = find_job(st, id) else {
        return not_found();
    };
    if st.applications.iter().any(|a| a.job_id == job.id && a.freelancer == user.username) {
        return reply(StatusCode::BAD_REQUEST, json!({ "error": "You have already applied to this job" }));
    }
    let cover_letter = body["cover_letter"].as_str().unwrap_or_default().trim().to_owned();
    if cover_letter.is_empty() {
        return reply(StatusCode::BAD_REQUEST, json!({ "cover_letter": "This field is required." }));
    }
    if cover_letter.len() < 10 {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "cover_letter": ["Cover letter must be at least 10 characters long."] }),
        );
    }
    let application = StubApplication {
        id: st.applications.len() as u64 + 1,
        job_id: job.id,
        freelancer: user.username.clone(),
        cover_letter: cover_letter.clone(),
        status: "pending".to_owned(),
    };
    st.applications.push(application);
    reply(StatusCode::CREATED, json!({ "cover_letter": cover_letter, "bid_amount": body["bid_amount"] }))
}

fn update_status(st: &mut StubState, user: Option<&StubUser>, id: &str, body: &Value) -> Response {
    let Some(user) = user else {
        return unauthenticated();
    };
    if let Some(status) = st.status_update_status {
        return reply(status_code(status), json!({ "error": "Server exploded" }));
    }
    let Ok(id) = id.parse::<u64>() else {
        return not_found();
    };
    let Some(index) = st.applications.iter().position(|a| a.id == id) else {
        return not_found();
    };
    let job_id = st.applications[index].job_id;
    let owner = st.jobs.iter().find(|j| j.id == job_id).map(|j| j.owner.clone());
    if owner.as_deref() != Some(user.username.as_str()) {
        return forbidden("You do not have permission to update this application");
    }
    match body["status"].as_str() {
        Some(status @ ("accepted" | "rejected")) => {
            st.applications[index].status = status.to_owned();
            let app = st.applications[index].clone();
            reply(StatusCode::OK, application_json(st, &app))
        }
        _ => reply(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid status. Must be \"accepted\" or \"rejected\"" }),
        ),
    }
}

// =============================================================================
// JSON HELPERS
// =============================================================================

fn user_json(user: &StubUser) -> Value {
    json!({
        "id": user.id,
        "username": user.username,
        "email": format!("{}@example.com", user.username),
        "first_name": user.first_name,
        "last_name": "",
        "user_type": user.role,
        "bio": "",
    })
}

fn job_json(st: &StubState, job: &StubJob) -> Value {
    let owner = st
        .users
        .iter()
        .find(|u| u.username == job.owner)
        .map(user_json)
        .unwrap_or(Value::Null);
    json!({
        "id": job.id,
        "title": job.title,
        "description": "A detailed description of the work.",
        "category": job.category,
        "budget": job.budget,
        "is_fixed_price": true,
        "experience_level": "entry",
        "deadline": null,
        "created_at": "2026-10-01T12:00:00Z",
        "updated_at": "2026-10-01T12:00:00Z",
        "is_active": true,
        "client": owner,
    })
}

fn application_json(st: &StubState, app: &StubApplication) -> Value {
    let job = st
        .jobs
        .iter()
        .find(|j| j.id == app.job_id)
        .map(|j| job_json(st, j))
        .unwrap_or(Value::Null);
    let freelancer = st
        .users
        .iter()
        .find(|u| u.username == app.freelancer)
        .map(user_json)
        .unwrap_or(Value::Null);
    json!({
        "id": app.id,
        "job": job,
        "freelancer": freelancer,
        "cover_letter": app.cover_letter,
        "bid_amount": null,
        "status": app.status,
        "created_at": "2026-10-02T09:30:00Z",
        "updated_at": "2026-10-02T09:30:00Z",
    })
}

fn find_job(st: &StubState, id: &str) -> Option<StubJob> {
    let id = id.parse::<u64>().ok()?;
    st.jobs.iter().find(|j| j.id == id).cloned()
}

fn category_param(query: Option<&str>) -> String {
    query
        .unwrap_or_default()
        .split('&')
        .find_map(|pair| pair.strip_prefix("category="))
        .unwrap_or_default()
        .to_owned()
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn append_cookie(resp: &mut Response, raw: &str) {
    resp.headers_mut()
        .append(SET_COOKIE, HeaderValue::from_str(raw).expect("valid cookie header"));
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).expect("valid status")
}

fn unauthenticated() -> Response {
    reply(
        StatusCode::FORBIDDEN,
        json!({ "detail": "Authentication credentials were not provided." }),
    )
}

fn forbidden(message: &str) -> Response {
    reply(StatusCode::FORBIDDEN, json!({ "error": message }))
}

fn not_found() -> Response {
    reply(StatusCode::NOT_FOUND, json!({ "detail": "Not found." }))
}
