//! Local file server library.
//!
//! Serves a directory tree for browsing and download and accepts uploads into
//! a separate directory. The binary in `main.rs` wires the configuration file
//! to [`routes::app`]; tests drive the same router directly.

pub mod config;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod render;
pub mod resolve;
pub mod routes;

use std::sync::Arc;

pub use config::{ConfigError, ServerConfig};
pub use error::FileServerError;
pub use render::{HtmlRenderer, Page, PageRenderer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration, fixed at startup
    pub config: Arc<ServerConfig>,
    /// Page renderer for listings and the upload form
    pub renderer: Arc<dyn PageRenderer>,
}

impl AppState {
    /// Create a new AppState with the built-in HTML renderer.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_renderer(config, Arc::new(HtmlRenderer))
    }

    /// Create a new AppState with the given renderer.
    pub fn with_renderer(config: ServerConfig, renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            config: Arc::new(config),
            renderer,
        }
    }
}
