//! Audio node integration: wire models, lifecycle events, the REST client
//! and the websocket event listener.

pub mod client;
pub mod events;
pub mod models;
pub mod websocket;

pub use client::{AudioNodeApi, NodeClient, NodeError, SearchSource, TrackSearchGateway};
pub use events::{EndReason, NodeEvent};
pub use models::*;
pub use websocket::run_event_listener;
