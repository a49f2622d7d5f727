//! Notes attached to web pages.
//!
//! A note is addressed by a key derived from a page URL under a [`Scope`]:
//! the exact URL, its path, or its origin. The crate covers key derivation,
//! persistence over an async key-value backend, a session-local list cache,
//! debounced autosave with delete-on-empty, and JSON backup bundles.
//!
//! [`Scope`]: models::Scope

pub mod autosave;
pub mod bundle;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod keys;
pub mod models;
pub mod session;
pub mod store;
