//! Real-time chat server with object-store file sharing.
//!
//! Clients connect over a WebSocket and exchange messages through a central
//! broadcast hub; file attachments are streamed into an object store and
//! referenced from chat by download URL.

pub mod config;
pub mod error;
pub mod files;
pub mod routes;
pub mod storage;
pub mod ws;

use std::sync::Arc;

pub use config::Config;
pub use error::ApiError;

use storage::ObjectStore;
use ws::ChatHub;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast hub all chat messages pass through.
    pub hub: Arc<ChatHub>,
    /// Object store for file attachments.
    pub store: Arc<dyn ObjectStore>,
    /// Configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state from its parts.
    pub fn new(hub: Arc<ChatHub>, store: Arc<dyn ObjectStore>, config: Config) -> Self {
        Self {
            hub,
            store,
            config: Arc::new(config),
        }
    }
}
