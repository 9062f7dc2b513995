//! Response and request types of the RACS backend
//!
//! These mirror the JSON the server produces and are shared by the native
//! client and the browser build.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Header the backend uses to report a task's state next to its log
pub const TASK_STATE_HEADER: &str = "X-Task-State";

/// A project as returned by `/project/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub labels: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub tag_repo: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// A recent task of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: String,
    #[serde(default)]
    pub time: String,
}

/// A task as returned by `/task/list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub project: u64,
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: String,
    #[serde(default)]
    pub time: String,
}

/// Build pipeline stage a build can be started from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Clean,
    Clone,
    Prepare,
    Pull,
    Build,
    Prepackage,
    Package,
    Push,
    Tag,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Clean,
        Stage::Clone,
        Stage::Prepare,
        Stage::Pull,
        Stage::Build,
        Stage::Prepackage,
        Stage::Package,
        Stage::Push,
        Stage::Tag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Clean => "clean",
            Stage::Clone => "clone",
            Stage::Prepare => "prepare",
            Stage::Pull => "pull",
            Stage::Build => "build",
            Stage::Prepackage => "prepackage",
            Stage::Package => "package",
            Stage::Push => "push",
            Stage::Tag => "tag",
        }
    }

    /// Human-readable label used in the stage picker
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Clean => "Clean",
            Stage::Clone => "Clone",
            Stage::Prepare => "Prepare",
            Stage::Pull => "Pull",
            Stage::Build => "Build",
            Stage::Prepackage => "Prepackage",
            Stage::Package => "Package",
            Stage::Push => "Push",
            Stage::Tag => "Tag",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = crate::DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| crate::DashboardError::Config(format!("unknown build stage {:?}", s)))
    }
}

/// Body of a `/project/build` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub id: u64,
    pub stage: Stage,
}

/// Fields of the project creation form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectForm {
    pub name: String,
    pub url: String,
    pub branch: String,
    #[serde(default)]
    pub labels: String,
}

impl ProjectForm {
    /// Collect the form from submitted field pairs
    pub fn from_fields(fields: &[(String, String)]) -> Self {
        let get = |key: &str| {
            fields
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
                .unwrap_or_default()
        };
        Self {
            name: get("name"),
            url: get("url"),
            branch: get("branch"),
            labels: get("labels"),
        }
    }
}

/// States after which no more log output is produced. Tasks end in `SUCCESS`
/// or `ERROR`; project states carry their stage, as in `BUILD_SUCCESS`.
pub fn is_terminal_state(state: &str) -> bool {
    is_success_state(state) || is_error_state(state)
}

pub fn is_success_state(state: &str) -> bool {
    state == "SUCCESS" || state.ends_with("_SUCCESS")
}

pub fn is_error_state(state: &str) -> bool {
    state == "ERROR" || state.ends_with("_ERROR")
}
