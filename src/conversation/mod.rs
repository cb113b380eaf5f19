//! Roadside conversation data
//!
//! A conversation is a fixed officer/driver exchange identified by its
//! question id. The catalog holds the practice set; segments are the
//! individual lines handed to the playback orchestrator.

mod catalog;
mod segment;

pub use catalog::Catalog;
pub use segment::{Conversation, Role, Segment};
