// Test doubles shared by application-layer tests
use crate::application::error::{DashboardError, Result};
use crate::application::repository::DashboardRepository;
use crate::domain::dashboard::{CreateDashboard, Dashboard, UpdateDashboard};
use crate::domain::ids::{DashboardId, WidgetId};
use crate::domain::layout::{DashboardLayout, GridLayout};
use crate::domain::widget::{CreateWidget, WidgetInstance};
use crate::infrastructure::memory_repository::InMemoryRepository;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

/// Wraps the in-memory backend, recording layout writes and counting reads
/// so tests can see which calls reached the backend. Layout writes and
/// layout reads can be slowed down to force overlaps.
#[derive(Debug, Default)]
pub struct RecordingRepository {
    inner: InMemoryRepository,
    layout_writes: Mutex<Vec<GridLayout>>,
    reads: AtomicUsize,
    fail_writes: AtomicBool,
    write_delays: Mutex<VecDeque<Duration>>,
    read_delay: Mutex<Option<Duration>>,
    writes_in_flight: AtomicUsize,
    max_writes_in_flight: AtomicUsize,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demo_data() -> Self {
        Self {
            inner: InMemoryRepository::with_demo_data(),
            ..Default::default()
        }
    }

    pub fn layout_writes(&self) -> Vec<GridLayout> {
        self.layout_writes.lock().unwrap().clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Each upcoming layout write takes the next delay before completing.
    pub fn delay_next_writes(&self, delays: impl IntoIterator<Item = Duration>) {
        self.write_delays.lock().unwrap().extend(delays);
    }

    /// Layout reads sample the backend, then wait `delay` before returning.
    pub fn delay_reads(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    pub fn max_writes_in_flight(&self) -> usize {
        self.max_writes_in_flight.load(Ordering::SeqCst)
    }

    fn count_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DashboardRepository for RecordingRepository {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>> {
        self.count_read();
        self.inner.list_dashboards().await
    }

    async fn get_dashboard(&self, id: &DashboardId) -> Result<Option<Dashboard>> {
        self.count_read();
        self.inner.get_dashboard(id).await
    }

    async fn get_layout(&self, id: &DashboardId) -> Result<Option<DashboardLayout>> {
        self.count_read();
        let layout = self.inner.get_layout(id).await;
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        layout
    }

    async fn create_dashboard(&self, input: CreateDashboard) -> Result<Dashboard> {
        self.inner.create_dashboard(input).await
    }

    async fn update_dashboard(&self, id: &DashboardId, input: UpdateDashboard) -> Result<Dashboard> {
        self.inner.update_dashboard(id, input).await
    }

    async fn update_layout(&self, id: &DashboardId, layouts: &GridLayout) -> Result<()> {
        let in_flight = self.writes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_writes_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        self.layout_writes.lock().unwrap().push(layouts.clone());

        let delay = self.write_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        let result = if self.fail_writes.load(Ordering::SeqCst) {
            Err(DashboardError::Rejected {
                status: 503,
                message: "backend unavailable".to_string(),
            })
        } else {
            self.inner.update_layout(id, layouts).await
        };
        self.writes_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn delete_dashboard(&self, id: &DashboardId) -> Result<()> {
        self.inner.delete_dashboard(id).await
    }

    async fn list_widgets(&self, dashboard_id: Option<&DashboardId>) -> Result<Vec<WidgetInstance>> {
        self.count_read();
        self.inner.list_widgets(dashboard_id).await
    }

    async fn get_widget(&self, id: &WidgetId) -> Result<Option<WidgetInstance>> {
        self.count_read();
        self.inner.get_widget(id).await
    }

    async fn create_widget(&self, input: CreateWidget) -> Result<WidgetInstance> {
        self.inner.create_widget(input).await
    }

    async fn update_widget(&self, id: &WidgetId, config: Map<String, Value>) -> Result<WidgetInstance> {
        self.inner.update_widget(id, config).await
    }

    async fn delete_widget(&self, id: &WidgetId) -> Result<()> {
        self.inner.delete_widget(id).await
    }
}
