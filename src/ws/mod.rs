//! WebSocket chat: connection registry, broadcast hub and per-client
//! sessions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Session A   │   │  Session B   │   │  Session N   │
//! │  read loop   │   │  read loop   │   │  read loop   │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        │ publish          │ publish          │ publish
//!        ▼                  ▼                  ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                      ChatHub                        │
//! │  - registry of live connections (DashMap)           │
//! │  - intake queue drained FIFO by one fan-out task    │
//! └──────┬───────────────────┬──────────────────┬───────┘
//!        ▼                   ▼                  ▼
//!   writer task A       writer task B      writer task N
//! ```
//!
//! Each connected client gets one read loop and one writer task; every
//! message a client sends passes through the hub before fan-out. The upload
//! endpoint publishes into the same hub as a side effect of storing a file.

mod handler;
mod hub;
pub mod types;

pub use handler::ws_handler;
pub use hub::{ChatHub, ConnId};
pub use types::{FileRef, Message};
