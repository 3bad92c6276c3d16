//! Shared SSE event construction. Each dialect picks its own keepalive
//! framing (MCP uses an `event: ping` frame; A2A falls back to axum's plain
//! comment keepalive) but both build `message`/`endpoint` events the same way.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::response::sse::Event;
use serde_json::Value;

/// Hands out a monotonically increasing `id:` field for one SSE stream.
#[derive(Default)]
pub struct EventIdCounter(AtomicU64);

impl EventIdCounter {
	pub fn next(&self) -> String {
		self.0.fetch_add(1, Ordering::Relaxed).to_string()
	}
}

pub fn message_event(id: &EventIdCounter, payload: &Value) -> Event {
	Event::default().id(id.next()).event("message").data(payload.to_string())
}

pub fn endpoint_event(url: &str) -> Event {
	Event::default().event("endpoint").data(url.to_string())
}

pub fn ping_event() -> Event {
	Event::default().event("ping").data("{}")
}
