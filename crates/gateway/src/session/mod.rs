//! Session lifecycle: per-connection state, method dispatch, and the
//! manager that owns the session table (components C3, C4, C5).

pub mod input;
pub mod manager;
pub mod session;

pub use input::{InputProcessor, MethodHandler};
pub use manager::SessionManager;
pub use session::{OutputGuard, Session, SessionError, SessionStatus};
