//! Pure domain logic for the Forge storyboard tool.
//!
//! This crate has zero I/O: no async, no network, no filesystem. It
//! covers:
//!
//! - The project data model (scenes, cast, settings) and its pure
//!   mutation functions ([`project`]).
//! - Chat-log ingestion: shape detection and normalization of exported
//!   transcripts into an ordered message stream ([`chatlog`]).
//! - Time-gap scene segmentation ([`segment`]).
//! - Deterministic image-prompt synthesis ([`prompt`]).
//! - The `.forge` project document contract ([`document`]).
//! - Character-card import mapping ([`card`]) and plain-text script
//!   rendering ([`script`]).

pub mod card;
pub mod chatlog;
pub mod document;
pub mod error;
pub mod project;
pub mod prompt;
pub mod script;
pub mod segment;
pub mod types;

pub use error::CoreError;
pub use project::{CastMember, ProjectData, ProjectSettings, Scene};
