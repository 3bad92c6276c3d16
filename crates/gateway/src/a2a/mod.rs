//! A2A task orchestration: the agent handler contract and the capability
//! that runs it (components C8, C9).

pub mod capability;
pub mod handler;

pub use capability::{A2aCapability, TaskUpdateEvent};
pub use handler::{AgentHandler, EchoHandler, Yield};
