//! RACS Dashboard - client for the RACS build service
//!
//! A hyperscript DOM builder, the dashboard views built with it, and an
//! offset-tracked log tail that streams build output without fetching the
//! same bytes twice.

pub mod app;
pub mod cell;
pub mod components;
pub mod config;
pub mod dom;
pub mod error;
pub mod hyperscript;
pub mod log_tail;
pub mod model;
pub mod routes;

#[cfg(not(target_arch = "wasm32"))]
pub mod api;
#[cfg(not(target_arch = "wasm32"))]
pub mod io;
#[cfg(not(target_arch = "wasm32"))]
pub mod session;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{load_config, Config};
pub use error::{DashboardError, Result};

#[cfg(not(target_arch = "wasm32"))]
use std::sync::Arc;

/// Build an [`api::ApiClient`] for the configured server over reqwest
#[cfg(not(target_arch = "wasm32"))]
pub fn connect(config: &Config) -> Result<api::ApiClient> {
    let http: Arc<dyn io::HttpClient> = Arc::new(io::ReqwestHttpClient::with_timeout(
        config.server.request_timeout(),
    )?);
    Ok(api::ApiClient::new(&config.server.base_url, http))
}
