// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_data_client;
pub mod http_repository;
pub mod memory_repository;
