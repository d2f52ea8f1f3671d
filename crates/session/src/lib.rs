//! Project session layer: persistence, the active editing session,
//! and orchestration of the remote generation services.
//!
//! [`store::SessionStore`] round-trips the full project to a local
//! key-value file on every mutation. [`session::ProjectSession`] owns
//! the in-memory aggregate and applies every edit as "compute next
//! value, replace, persist". [`orchestrator::Orchestrator`] drives the
//! remote services and writes their results back into the session; a
//! failed remote call never mutates the project.

pub mod orchestrator;
pub mod session;
pub mod store;

pub use orchestrator::{Orchestrator, OrchestratorError};
pub use session::{ProjectSession, SessionError};
pub use store::SessionStore;
