//! Tokio platform: log sessions on the runtime, actions sent through the API

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::{Dashboard, Platform};
use crate::api::{ApiClient, LogSource};
use crate::components::{self, Action};
use crate::dom::Dom;
use crate::log_tail::TailHandle;
use crate::routes::Route;
use crate::session::PollingSession;

/// Runs log sessions as tokio tasks against an [`ApiClient`]
#[derive(Debug, Clone)]
pub struct TokioPlatform {
    api: Arc<ApiClient>,
}

impl TokioPlatform {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }
}

impl Platform for TokioPlatform {
    type Session = PollingSession;

    /// Must be called within a tokio runtime
    fn start_session(&self, tail: TailHandle, subject: &str, interval: Duration) -> PollingSession {
        let source: Arc<dyn LogSource> = Arc::clone(&self.api) as Arc<dyn LogSource>;
        PollingSession::start(tail, subject, source, interval)
    }
}

impl<D: Dom> Dashboard<D, TokioPlatform> {
    /// Reload the project list; re-renders when the project table is shown
    pub async fn refresh_projects(&mut self) -> crate::Result<()> {
        let projects = self.platform.api.list_projects().await?;
        self.set_projects(projects)
    }

    /// Handle every queued action in order. Failures are logged and do not
    /// stop later actions. Returns the number of actions taken off the queue.
    pub async fn process_actions(&mut self) -> usize {
        let pending = self.take_actions();
        let count = pending.len();
        for action in pending {
            let Some(request) = self.handle(action) else {
                continue;
            };
            if let Err(e) = self.send(request).await {
                tracing::warn!("Action failed: {}", e);
            }
        }
        count
    }

    async fn send(&mut self, action: Action) -> crate::Result<()> {
        let api = Arc::clone(&self.platform.api);
        match action {
            Action::Navigate(route) => self.navigate(route),
            Action::Build { id, stage } => api.trigger_build(id, stage).await,
            Action::CreateProject(form) => {
                let id = api.create_project(&form).await?;
                tracing::info!("Created project '{}' ({:?})", form.name, id);
                self.navigate(Route::Projects)
            }
            Action::Upload { id, name, path } => {
                let bytes = read_upload(Path::new(&path)).await?;
                let file_name = components::project_upload::file_name(&path).to_string();
                api.upload(id, &name, &file_name, bytes).await?;
                self.navigate(Route::Projects)
            }
        }
    }
}

/// Read a whole file for upload; used by the CLI
pub async fn read_upload(path: &Path) -> crate::Result<Vec<u8>> {
    Ok(tokio::fs::read(path).await?)
}
