//! Test doubles: an in-memory [`Backend`] for controller and orchestrator tests, and
//! helpers for running a real HTTP server on a local port.

use crate::api::{ApiError, Backend};
use crate::model::{AskAiRequest, Mode, ModeCatalog, SaveRequest, SubmissionResult};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Ok(SubmissionResult),
    Status(u16, Option<String>),
    Transport(String),
}

impl Reply {
    fn into_result(self) -> Result<SubmissionResult, ApiError> {
        match self {
            Reply::Ok(r) => Ok(r),
            Reply::Status(status, detail) => Err(ApiError::Application { status, detail }),
            Reply::Transport(msg) => Err(ApiError::Transport(msg)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Modes,
    Save(SaveRequest),
    AskAi(AskAiRequest),
}

pub(crate) struct FakeBackend {
    /// `None` simulates an unreachable server.
    pub catalog: Option<ModeCatalog>,
    pub save_reply: Reply,
    pub ask_reply: Reply,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    pub fn new(catalog: Option<ModeCatalog>) -> Self {
        Self {
            catalog,
            save_reply: Reply::Ok(SubmissionResult {
                message: "Saved".into(),
                success: true,
                git_pushed: Some(true),
                ..Default::default()
            }),
            ask_reply: Reply::Ok(SubmissionResult {
                message: "OK".into(),
                success: true,
                ai_response: Some("42".into()),
                ..Default::default()
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_save_reply(mut self, reply: Reply) -> Self {
        self.save_reply = reply;
        self
    }

    pub fn with_ask_reply(mut self, reply: Reply) -> Self {
        self.ask_reply = reply;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn fetch_modes(&self) -> Result<ModeCatalog, ApiError> {
        self.calls.lock().unwrap().push(Call::Modes);
        self.catalog
            .clone()
            .ok_or_else(|| ApiError::Transport("connection refused".into()))
    }

    async fn save(&self, req: &SaveRequest) -> Result<SubmissionResult, ApiError> {
        self.calls.lock().unwrap().push(Call::Save(req.clone()));
        self.save_reply.clone().into_result()
    }

    async fn ask_ai(&self, req: &AskAiRequest) -> Result<SubmissionResult, ApiError> {
        self.calls.lock().unwrap().push(Call::AskAi(req.clone()));
        self.ask_reply.clone().into_result()
    }
}

pub(crate) fn catalog(ids: &[&str], default: &str) -> ModeCatalog {
    ModeCatalog {
        modes: ids
            .iter()
            .map(|id| Mode {
                id: id.to_string(),
                name: format!("{id} name"),
                description: format!("{id} description"),
            })
            .collect(),
        default_mode_id: default.to_string(),
    }
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub(crate) async fn spawn_server(app: axum::Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// Base URL of a local port with nothing listening.
pub(crate) async fn closed_server_url() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}
