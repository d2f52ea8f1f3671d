//! HTTP clients for the locally-hosted generation services.
//!
//! Provides typed request/response wrappers for the Ollama bridge
//! (vision tagging and story rewriting), the Stable Diffusion backend
//! (txt2img and connectivity probing), and data-URI helpers for
//! moving images between them.
//!
//! Nothing here retries: every failure is surfaced once to the caller,
//! which decides whether to re-invoke.

pub mod data_uri;
pub mod diffusion;
pub mod error;
pub mod ollama_bridge;

pub use diffusion::{ConnectionStatus, DiffusionApi, Txt2ImgRequest};
pub use error::BridgeError;
pub use ollama_bridge::{OllamaBridge, StoryRequest};
