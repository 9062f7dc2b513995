//! Client-side routes of the dashboard

use std::fmt;
use std::str::FromStr;

use crate::DashboardError;

/// A dashboard screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Route {
    /// Project table, the default screen
    #[default]
    Projects,
    ProjectCreate,
    ProjectUpload { id: u64 },
    /// Live log of one task
    Task { id: String },
}

impl Route {
    /// Subject to tail while this route is shown
    pub fn log_subject(&self) -> Option<&str> {
        match self {
            Route::Task { id } => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Projects => write!(f, "/projects"),
            Route::ProjectCreate => write!(f, "/project/create"),
            Route::ProjectUpload { id } => write!(f, "/project/upload/{}", id),
            Route::Task { id } => write!(f, "/task/{}", id),
        }
    }
}

impl FromStr for Route {
    type Err = DashboardError;

    /// Accepts a path with or without a leading `#!` or `#`. An empty path
    /// maps to the default route.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim_start_matches("#!").trim_start_matches('#');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] | ["projects"] => Ok(Route::Projects),
            ["project", "create"] => Ok(Route::ProjectCreate),
            ["project", "upload", id] => id
                .parse()
                .map(|id| Route::ProjectUpload { id })
                .map_err(|_| DashboardError::Route(format!("invalid project id {:?}", id))),
            ["task", id] => Ok(Route::Task { id: id.to_string() }),
            _ => Err(DashboardError::Route(format!("no route for {:?}", s))),
        }
    }
}
