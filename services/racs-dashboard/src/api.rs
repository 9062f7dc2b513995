//! Typed client for the RACS backend endpoints

use std::sync::Arc;

use async_trait::async_trait;

use crate::io::{FormField, HttpClient, HttpResponse};
use crate::log_tail::LogChunk;
use crate::model::{BuildRequest, Project, ProjectForm, Stage, TaskRecord, TASK_STATE_HEADER};

/// Source of log bytes for a subject, starting at an offset
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait LogSource: Send + Sync {
    async fn fetch(&self, subject: &str, offset: u64) -> crate::Result<LogChunk>;
}

/// Client for the RACS JSON/form endpoints
pub struct ApiClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::debug!("Created ApiClient for {}", base_url);
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check(url: &str, response: HttpResponse) -> crate::Result<HttpResponse> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(crate::DashboardError::Status {
                url: url.to_string(),
                status: response.status,
            })
        }
    }

    /// `GET /project/list`
    pub async fn list_projects(&self) -> crate::Result<Vec<Project>> {
        let url = self.url("/project/list");
        let response = Self::check(&url, self.http.get(&url, &[]).await?)?;
        let projects: Vec<Project> = serde_json::from_slice(&response.body)?;
        tracing::debug!("Fetched {} project(s)", projects.len());
        Ok(projects)
    }

    /// `GET /task/list`, newest first, skipping `from` tasks
    pub async fn list_tasks(&self, from: u64) -> crate::Result<Vec<TaskRecord>> {
        let url = self.url("/task/list");
        let from = from.to_string();
        let response = Self::check(&url, self.http.get(&url, &[("from", from.as_str())]).await?)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// `POST /project/build`
    pub async fn trigger_build(&self, id: u64, stage: Stage) -> crate::Result<()> {
        let url = self.url("/project/build");
        let body = serde_json::to_value(BuildRequest { id, stage })?;
        tracing::info!("Triggering {} for project {}", stage, id);
        Self::check(&url, self.http.post_json(&url, &body).await?)?;
        Ok(())
    }

    /// `POST /project/create`; returns the new project id when the server
    /// reports one
    pub async fn create_project(&self, form: &ProjectForm) -> crate::Result<Option<u64>> {
        let url = self.url("/project/create");
        let fields = vec![
            FormField::text("name", &form.name),
            FormField::text("url", &form.url),
            FormField::text("branch", &form.branch),
            FormField::text("labels", &form.labels),
        ];
        tracing::info!("Creating project '{}'", form.name);
        let response = Self::check(&url, self.http.post_multipart(&url, fields).await?)?;
        Ok(response.text().trim().parse().ok())
    }

    /// `POST /project/upload`: store `bytes` as `name` in the project's
    /// workspace
    pub async fn upload(
        &self,
        id: u64,
        name: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> crate::Result<()> {
        let url = self.url("/project/upload");
        let fields = vec![
            FormField::text("id", &id.to_string()),
            FormField::text("name", name),
            FormField::File {
                name: "file".to_string(),
                file_name: file_name.to_string(),
                bytes,
            },
        ];
        tracing::info!("Uploading '{}' to project {}", name, id);
        Self::check(&url, self.http.post_multipart(&url, fields).await?)?;
        Ok(())
    }

    /// `GET /task/logs`: log bytes of task `id` from `offset` onward
    pub async fn task_logs(&self, id: &str, offset: u64) -> crate::Result<LogChunk> {
        let url = self.url("/task/logs");
        let offset = offset.to_string();
        let response = Self::check(
            &url,
            self.http
                .get(&url, &[("id", id), ("offset", offset.as_str())])
                .await?,
        )?;
        let task_state = response.header(TASK_STATE_HEADER).map(str::to_string);
        Ok(LogChunk {
            bytes: response.body,
            task_state,
        })
    }
}

#[async_trait]
impl LogSource for ApiClient {
    async fn fetch(&self, subject: &str, offset: u64) -> crate::Result<LogChunk> {
        self.task_logs(subject, offset).await
    }
}
