#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! In-memory job board server for integration tests.
//!
//! Enforces roles, job ownership and one application per (job, user) the
//! way the real API does, records every request it receives, and can hold
//! individual responses back to exercise concurrency or fail them after
//! the state change has been applied.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jobboard_client::{ApiRequest, Body, JobBoardClient, Method, Transport, TransportError};
use jobboard_core::models::{Application, ApplicationId, Job, JobId, UserId};
use jobboard_core::session::now_secs;
use jobboard_core::{ApplicationStatus, Config, MemoryCredentialStore, Role};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};

const SECRET: &[u8] = b"fake-board-secret";
pub const PASSWORD: &str = "correct horse";

#[derive(Debug, Clone)]
struct User {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    bio: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    users: Vec<User>,
    jobs: BTreeMap<JobId, Job>,
    applications: BTreeMap<ApplicationId, Application>,
    saved: BTreeSet<(UserId, JobId)>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

type Reply = Result<Value, TransportError>;

fn fail(status: u16, detail: &str) -> Reply {
    Err(TransportError::Status {
        status,
        detail: detail.to_string(),
    })
}

/// Sign an access credential the way the server does.
pub fn mint(email: &str, role: Role, exp: i64) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &json!({"email": email, "role": role.as_str(), "exp": exp, "type": "access"}),
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

#[derive(Debug, Default)]
pub struct FakeBoard {
    state: Mutex<State>,
    requests: Mutex<Vec<ApiRequest>>,
    delays: Mutex<HashMap<String, VecDeque<Duration>>>,
    faults: Mutex<HashMap<String, VecDeque<u16>>>,
    in_flight: Mutex<HashMap<String, usize>>,
    max_in_flight: Mutex<HashMap<String, usize>>,
}

impl FakeBoard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, email: &str, role: Role) -> UserId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.users.push(User {
            id,
            name: email.split('@').next().unwrap_or_default().to_string(),
            email: email.to_string(),
            role,
            bio: None,
            avatar_url: None,
        });
        id
    }

    /// A valid credential for a registered user.
    pub fn token_for(&self, email: &str) -> String {
        let state = self.state.lock().unwrap();
        let user = state.user_by_email(email).expect("unknown user");
        mint(&user.email, user.role, now_secs() + 3600)
    }

    pub fn add_job(&self, owner_email: &str, title: &str) -> JobId {
        let mut state = self.state.lock().unwrap();
        let owner_id = state.user_by_email(owner_email).expect("unknown owner").id;
        let id = state.next_id();
        state.jobs.insert(
            id,
            Job {
                id,
                title: title.to_string(),
                description: format!("{title} description"),
                location: Some("Remote".into()),
                salary_min: None,
                salary_max: None,
                employment_type: Some("full-time".into()),
                company: None,
                owner_id,
                is_active: Some(true),
                created_at: Some("2025-01-01T00:00:00".into()),
                updated_at: None,
            },
        );
        id
    }

    pub fn application_status(&self, id: ApplicationId) -> Option<ApplicationStatus> {
        self.state
            .lock()
            .unwrap()
            .applications
            .get(&id)
            .map(|a| a.status)
    }

    pub fn applications_for(&self, job_id: JobId) -> usize {
        self.state
            .lock()
            .unwrap()
            .applications
            .values()
            .filter(|a| a.job_id == job_id)
            .count()
    }

    pub fn is_saved(&self, email: &str, job_id: JobId) -> bool {
        let state = self.state.lock().unwrap();
        let user = state.user_by_email(email).expect("unknown user").id;
        state.saved.contains(&(user, job_id))
    }

    /// Hold the next response for `path` back by `delay`.
    pub fn delay_next(&self, path: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(delay);
    }

    /// Apply the next request to `path`, then answer it with `status`.
    pub fn fail_after_next(&self, path: &str, status: u16) {
        self.faults
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(status);
    }

    pub fn avatar_of(&self, email: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.user_by_email(email).expect("unknown user").avatar_url.clone()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests received for an exact method and path.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Highest number of requests for `path` the board was serving at once.
    pub fn max_concurrent(&self, path: &str) -> usize {
        self.max_in_flight
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or_default()
    }

    fn enter(&self, path: &str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        let n = in_flight.entry(path.to_string()).or_default();
        *n += 1;
        let mut max = self.max_in_flight.lock().unwrap();
        let m = max.entry(path.to_string()).or_default();
        *m = (*m).max(*n);
    }

    fn leave(&self, path: &str) {
        if let Some(n) = self.in_flight.lock().unwrap().get_mut(path) {
            *n -= 1;
        }
    }

    fn caller(state: &State, request: &ApiRequest) -> Result<User, TransportError> {
        let unauthorized = TransportError::Status {
            status: 401,
            detail: "Could not validate credentials".into(),
        };
        let credential = request.credential.as_ref().ok_or(unauthorized.clone())?;
        let claims =
            jobboard_core::token::decode(credential.as_str()).map_err(|_| unauthorized.clone())?;
        if claims.is_expired_at(now_secs()) {
            return Err(unauthorized);
        }
        state
            .user_by_email(&claims.email)
            .cloned()
            .ok_or(unauthorized)
    }

    fn handle(&self, request: &ApiRequest) -> Reply {
        let mut state = self.state.lock().unwrap();
        let segments: Vec<&str> = request
            .path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let id = |i: usize| segments.get(i).and_then(|s| s.parse::<u64>().ok());

        match (request.method, segments.as_slice()) {
            (Method::Post, ["auth", "login"]) => Self::login(&state, request),
            (Method::Post, ["users", "register"]) => Self::register(&mut state, request),
            (Method::Get, ["users", "profile", "me"]) => {
                let user = Self::caller(&state, request)?;
                Ok(Self::user_json(&user))
            }
            (Method::Put, ["users", "me", "update"]) => {
                let user = Self::caller(&state, request)?;
                let Body::Json(body) = &request.body else {
                    return fail(422, "expected JSON");
                };
                let stored = state.users.iter_mut().find(|u| u.id == user.id).unwrap();
                if let Some(name) = body["name"].as_str() {
                    stored.name = name.to_string();
                }
                if let Some(bio) = body["bio"].as_str() {
                    stored.bio = Some(bio.to_string());
                }
                Ok(Self::user_json(stored))
            }
            (Method::Post, ["users", "me", "avatar"]) => {
                let user = Self::caller(&state, request)?;
                let Body::File { field: "avatar", file } = &request.body else {
                    return fail(422, "expected avatar file");
                };
                let Some((_, ext)) = file.filename.rsplit_once('.') else {
                    return fail(400, "Invalid image type");
                };
                let path = format!("/media/avatars/{}.{}", user.id, ext.to_ascii_lowercase());
                let stored = state.users.iter_mut().find(|u| u.id == user.id).unwrap();
                stored.avatar_url = Some(path);
                Ok(Self::user_json(stored))
            }
            (Method::Get, ["jobs"]) => Ok(Self::list_jobs(&state, request)),
            (Method::Get, ["jobs", "me"]) => {
                let user = Self::caller(&state, request)?;
                if user.role != Role::Employer {
                    return fail(403, "Only employers can view their jobs");
                }
                let jobs: Vec<&Job> = state.jobs.values().filter(|j| j.owner_id == user.id).collect();
                Ok(json!(jobs))
            }
            (Method::Get, ["jobs", _]) => match id(1).and_then(|id| state.jobs.get(&id)) {
                Some(job) => Ok(json!(job)),
                None => fail(404, "Job not found"),
            },
            (Method::Post, ["jobs", "create"]) => {
                let user = Self::caller(&state, request)?;
                if user.role != Role::Employer {
                    return fail(403, "Only employers can create jobs");
                }
                let Body::Json(body) = &request.body else {
                    return fail(422, "expected JSON");
                };
                let id = state.next_id();
                let mut job_json = body.clone();
                job_json["id"] = json!(id);
                job_json["owner_id"] = json!(user.id);
                let job: Job = serde_json::from_value(job_json).unwrap();
                state.jobs.insert(id, job.clone());
                Ok(json!(job))
            }
            (Method::Put, ["jobs", "update", _]) => {
                let user = Self::caller(&state, request)?;
                let Some(job) = id(2).and_then(|id| state.jobs.get_mut(&id)) else {
                    return fail(404, "Job not found");
                };
                if job.owner_id != user.id {
                    return fail(403, "Not the owner of this job");
                }
                let Body::Json(body) = &request.body else {
                    return fail(422, "expected JSON");
                };
                if let Some(title) = body["title"].as_str() {
                    job.title = title.to_string();
                }
                if let Some(active) = body["is_active"].as_bool() {
                    job.is_active = Some(active);
                }
                Ok(json!(job))
            }
            (Method::Delete, ["jobs", _]) => {
                let Some(job_id) = id(1) else {
                    return fail(404, "Job not found");
                };
                if state.jobs.remove(&job_id).is_none() {
                    return fail(400, "Job with that id not found");
                }
                state.applications.retain(|_, a| a.job_id != job_id);
                state.saved.retain(|(_, j)| *j != job_id);
                Ok(json!("Job deleted successfully"))
            }
            (Method::Post, ["applications", "jobs", _, "apply"]) => {
                Self::apply(&mut state, request, id(2))
            }
            (Method::Get, ["applications", "me"]) => {
                let user = Self::caller(&state, request)?;
                let apps: Vec<&Application> = state
                    .applications
                    .values()
                    .filter(|a| a.user_id == user.id)
                    .collect();
                Ok(json!(apps))
            }
            (Method::Get, ["applications", "jobs", _]) => {
                let user = Self::caller(&state, request)?;
                let Some(job) = id(2).and_then(|id| state.jobs.get(&id)) else {
                    return fail(404, "Job not found");
                };
                if job.owner_id != user.id && user.role != Role::Admin {
                    return fail(403, "You are unauthorized to view applications for this job!");
                }
                let applicants: Vec<Value> = state
                    .applications
                    .values()
                    .filter(|a| a.job_id == job.id)
                    .map(|a| {
                        let mut v = json!(a);
                        if let Some(u) = state.user(a.user_id) {
                            v["user_email"] = json!(u.email);
                            v["user_name"] = json!(u.name);
                        }
                        v
                    })
                    .collect();
                Ok(json!(applicants))
            }
            (Method::Put, ["applications", _, "status"]) => {
                Self::set_status(&mut state, request, id(1))
            }
            (Method::Post, ["saved-jobs", _]) => {
                let user = Self::caller(&state, request)?;
                if user.role != Role::Seeker {
                    return fail(403, "Only seekers can save jobs");
                }
                let Some(job_id) = id(1).filter(|id| state.jobs.contains_key(id)) else {
                    return fail(404, "Job not found");
                };
                let key = (user.id, job_id);
                if state.saved.remove(&key) {
                    Ok(json!({"status": "unsaved"}))
                } else {
                    state.saved.insert(key);
                    Ok(json!({"status": "saved"}))
                }
            }
            (Method::Get, ["saved-jobs"]) => {
                let user = Self::caller(&state, request)?;
                let saved: Vec<Value> = state
                    .saved
                    .iter()
                    .filter(|(u, _)| *u == user.id)
                    .filter_map(|(u, j)| {
                        state.jobs.get(j).map(|job| {
                            json!({"id": j * 1000 + u, "user_id": u, "job_id": j, "job": job})
                        })
                    })
                    .collect();
                Ok(json!(saved))
            }
            _ => fail(404, "Not Found"),
        }
    }

    fn login(state: &State, request: &ApiRequest) -> Reply {
        let Body::Form(pairs) = &request.body else {
            return fail(422, "expected form body");
        };
        let field = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        match (field("username").and_then(|e| state.user_by_email(e)), field("password")) {
            (Some(user), Some(PASSWORD)) => Ok(json!({
                "access_token": mint(&user.email, user.role, now_secs() + 3600),
                "refresh_token": "refresh-token",
            })),
            _ => fail(400, "Invalid Credentials"),
        }
    }

    fn register(state: &mut State, request: &ApiRequest) -> Reply {
        let Body::Json(body) = &request.body else {
            return fail(422, "expected JSON");
        };
        let email = body["email"].as_str().unwrap_or_default().to_string();
        if state.user_by_email(&email).is_some() {
            return fail(400, "Email already registered");
        }
        let role: Role = serde_json::from_value(body["role"].clone()).unwrap();
        let id = state.next_id();
        let user = User {
            id,
            name: body["name"].as_str().unwrap_or_default().to_string(),
            email,
            role,
            bio: None,
            avatar_url: None,
        };
        let out = Self::user_json(&user);
        state.users.push(user);
        Ok(out)
    }

    fn list_jobs(state: &State, request: &ApiRequest) -> Value {
        let q = request.query_value("q").map(str::to_lowercase);
        let skip: usize = request
            .query_value("skip")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let limit: usize = request
            .query_value("limit")
            .and_then(|s| s.parse().ok())
            .unwrap_or(usize::MAX);
        let jobs: Vec<&Job> = state
            .jobs
            .values()
            .filter(|j| {
                q.as_ref().is_none_or(|q| {
                    j.title.to_lowercase().contains(q) || j.description.to_lowercase().contains(q)
                })
            })
            .skip(skip)
            .take(limit)
            .collect();
        json!(jobs)
    }

    fn apply(state: &mut State, request: &ApiRequest, job_id: Option<JobId>) -> Reply {
        let user = Self::caller(state, request)?;
        if user.role != Role::Seeker {
            return fail(400, "only job seekers can apply for this job");
        }
        let Some(job_id) = job_id.filter(|id| state.jobs.contains_key(id)) else {
            return fail(404, "Job not found");
        };
        if state
            .applications
            .values()
            .any(|a| a.job_id == job_id && a.user_id == user.id)
        {
            return fail(409, "You have already applied to this job");
        }
        let Body::Multipart(form) = &request.body else {
            return fail(422, "expected multipart body");
        };
        let id = state.next_id();
        let application = Application {
            id,
            job_id,
            user_id: user.id,
            status: ApplicationStatus::Applied,
            created_at: Some("2025-01-02T00:00:00".into()),
            cover_letter: form.cover_letter.clone(),
            resume_path: Some(format!("uploads/resumes/{id}_{}", form.resume.filename)),
            resume_filename: Some(form.resume.filename.clone()),
        };
        state.applications.insert(id, application.clone());
        Ok(json!(application))
    }

    fn set_status(state: &mut State, request: &ApiRequest, id: Option<ApplicationId>) -> Reply {
        let user = Self::caller(state, request)?;
        let Some(app) = id.and_then(|id| state.applications.get(&id)).cloned() else {
            return fail(404, "Application Not Found");
        };
        let owner = state.jobs.get(&app.job_id).map(|j| j.owner_id);
        if owner != Some(user.id) && user.role != Role::Admin {
            return fail(403, "You are unauthorized to update this application");
        }
        let Body::Json(body) = &request.body else {
            return fail(422, "expected JSON");
        };
        let Ok(status) = serde_json::from_value::<ApplicationStatus>(body["status"].clone()) else {
            return fail(400, "invalid status");
        };
        let stored = state.applications.get_mut(&app.id).unwrap();
        stored.status = status;
        Ok(json!(stored))
    }

    fn user_json(user: &User) -> Value {
        json!({
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role,
            "email_verified": true,
            "bio": user.bio,
            "avatar_url": user.avatar_url,
        })
    }
}

#[async_trait]
impl Transport for FakeBoard {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front);

        self.enter(&request.path);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self.handle(&request);
        self.leave(&request.path);
        let fault = self
            .faults
            .lock()
            .unwrap()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front);
        match fault {
            Some(status) => fail(status, "Internal Server Error"),
            None => reply,
        }
    }
}

/// Client on `board` holding `token`, with the given cache lifetime.
pub fn client_with_ttl(
    board: &Arc<FakeBoard>,
    token: Option<String>,
    stale_after_secs: u64,
) -> (JobBoardClient, Arc<MemoryCredentialStore>) {
    let store = Arc::new(token.map_or_else(MemoryCredentialStore::new, MemoryCredentialStore::with_credential));
    let mut config = Config::default();
    config.cache.stale_after_secs = stale_after_secs;
    config.api.asset_base_url = Some("http://assets.test".into());
    let client = JobBoardClient::new(config, board.clone(), store.clone());
    (client, store)
}

/// Client on `board` holding `token`, caching for the default lifetime.
pub fn client(board: &Arc<FakeBoard>, token: Option<String>) -> JobBoardClient {
    client_with_ttl(board, token, 300).0
}

/// Client signed in as `email`.
pub fn signed_in(board: &Arc<FakeBoard>, email: &str) -> JobBoardClient {
    client(board, Some(board.token_for(email)))
}

pub fn resume(name: &str) -> jobboard_core::models::ApplicationForm {
    jobboard_core::models::ApplicationForm {
        cover_letter: Some("I would love to join.".into()),
        resume: jobboard_core::models::FileUpload {
            filename: name.to_string(),
            content_type: "application/pdf".into(),
            bytes: b"%PDF-1.4 resume".to_vec(),
        },
    }
}

pub fn avatar(name: &str) -> jobboard_core::models::FileUpload {
    jobboard_core::models::FileUpload {
        filename: name.to_string(),
        content_type: "image/png".into(),
        bytes: b"\x89PNG avatar".to_vec(),
    }
}
