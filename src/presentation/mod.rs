// Presentation layer - HTTP surface of the dashboard backend
pub mod app_state;
pub mod handlers;
pub mod router;
