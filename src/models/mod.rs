//! Domain models for pagenotes.
//!
//! # Core Concepts
//!
//! - [`Note`]: Free text attached to one `(scope, key)` pair. A note whose
//!   content is empty or whitespace-only is treated as absent and never persisted.
//! - [`Scope`]: How coarsely a URL collapses onto a note (`exact`, `path`, `origin`).
//! - [`NoteSummary`]: Display row for the recent/search list, derived from a note.

mod note;
mod summary;

pub use note::*;
pub use summary::*;
