//! Dashboard builder core: grid layouts, the editor state machine with
//! undo/redo, debounced layout persistence and a cached data access layer,
//! plus the REST backend those pieces talk to.
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
