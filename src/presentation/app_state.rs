// Application state for HTTP handlers
use crate::application::repository::DashboardRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn DashboardRepository>,
}
