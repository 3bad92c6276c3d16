//! Small foundation crate shared by every member of the workspace.
//!
//! Kept deliberately tiny: build/version metadata reported by the gateway's
//! handshake and startup logs.

pub mod version;

pub use version::BuildInfo;
