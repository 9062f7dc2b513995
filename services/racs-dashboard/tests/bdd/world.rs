//! BDD test world for the RACS dashboard client

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cucumber::World;
use racs_dashboard::api::LogSource;
use racs_dashboard::app::{Dashboard, TokioPlatform};
use racs_dashboard::dom::{MemoryDom, NodeId};
use racs_dashboard::io::{FormField, HttpClient, HttpResponse};
use racs_dashboard::log_tail::{FetchRequest, LogChunk, LogTail, TailHandle};
use racs_dashboard::session::PollingSession;

/// Log source that replays a fixed list of responses, then empty ones
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pub responses: Mutex<VecDeque<LogChunk>>,
    pub requests: Mutex<Vec<(String, u64)>>,
}

impl ScriptedSource {
    pub fn new(bodies: &[&str]) -> Self {
        Self {
            responses: Mutex::new(bodies.iter().map(|b| LogChunk::new(*b)).collect()),
            requests: Mutex::default(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LogSource for ScriptedSource {
    async fn fetch(&self, subject: &str, offset: u64) -> racs_dashboard::Result<LogChunk> {
        self.requests
            .lock()
            .unwrap()
            .push((subject.to_string(), offset));
        Ok(self.responses.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// HTTP client standing in for a RACS server
#[derive(Debug, Default)]
pub struct ScriptedServer {
    pub projects: String,
    pub log: String,
    pub task_state: String,
    pub posts: Mutex<Vec<String>>,
    pub log_offsets: Mutex<Vec<usize>>,
}

#[async_trait]
impl HttpClient for ScriptedServer {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> racs_dashboard::Result<HttpResponse> {
        if url.ends_with("/project/list") {
            return Ok(HttpResponse::new(200, self.projects.as_str()));
        }
        if url.ends_with("/task/logs") {
            let offset: usize = query
                .iter()
                .find(|(name, _)| *name == "offset")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(0);
            self.log_offsets.lock().unwrap().push(offset);
            let body = self.log.as_bytes().get(offset..).unwrap_or_default().to_vec();
            return Ok(HttpResponse::new(200, body).with_header("X-Task-State", &self.task_state));
        }
        Ok(HttpResponse::new(404, "not found"))
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> racs_dashboard::Result<HttpResponse> {
        self.posts
            .lock()
            .unwrap()
            .push(format!("{} {}", url, body));
        Ok(HttpResponse::new(200, "OK"))
    }

    async fn post_multipart(
        &self,
        url: &str,
        fields: Vec<FormField>,
    ) -> racs_dashboard::Result<HttpResponse> {
        self.posts
            .lock()
            .unwrap()
            .push(format!("{} {} field(s)", url, fields.len()));
        Ok(HttpResponse::new(201, "1"))
    }
}

#[derive(Debug, Default, World)]
pub struct DashboardWorld {
    // Builder testing
    pub dom: MemoryDom,
    pub element: Option<NodeId>,
    pub parent: Option<NodeId>,
    pub build_error: Option<String>,
    pub producer_value: Rc<RefCell<String>>,

    // Log tail testing
    pub tail: LogTail,
    pub requests: Vec<FetchRequest>,
    pub held: Option<FetchRequest>,

    // Session testing
    pub tail_handle: Option<TailHandle>,
    pub source: Option<Arc<ScriptedSource>>,
    pub session: Option<PollingSession>,

    // Dashboard testing
    pub server: Option<Arc<ScriptedServer>>,
    pub dashboard: Option<Dashboard<MemoryDom, TokioPlatform>>,
    pub root: Option<NodeId>,
    pub select: Option<NodeId>,
}
