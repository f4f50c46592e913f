// Application layer - Editor state, persistence and data access use cases
pub mod dashboard_service;
pub mod data_client;
pub mod debounce;
pub mod edit_session;
pub mod editor;
pub mod error;
pub mod history;
pub mod layout_store;
pub mod persistence;
pub mod query_cache;
pub mod repository;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;
