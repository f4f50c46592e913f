// Debounced layout persistence - Optimistic writes reconciled with the backend
use crate::application::debounce::{DebouncePolicy, Debouncer};
use crate::application::editor::EditorStore;
use crate::application::layout_store::LayoutStore;
use crate::application::repository::DashboardRepository;
use crate::domain::ids::DashboardId;
use crate::domain::layout::GridLayout;
use futures::FutureExt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, Mutex as AsyncMutex};

/// Outcome of the most recent write attempt, published for save indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Pending,
    Saved,
    /// The layout matched the last written one; nothing was sent.
    Skipped,
    Failed(String),
}

struct Shared {
    dashboard_id: DashboardId,
    store: Arc<LayoutStore>,
    editor: Arc<EditorStore>,
    repository: Arc<dyn DashboardRepository>,
    last_written: Mutex<Option<GridLayout>>,
    /// Held for the whole of a write so at most one is in flight.
    write_lock: AsyncMutex<()>,
    status: watch::Sender<SaveStatus>,
}

impl Shared {
    /// Write whatever the working layout is right now. A write that fires
    /// while another is in flight waits for it, then sends the working
    /// layout as it is at that point.
    async fn write_current(&self) -> SaveStatus {
        let _writing = self.write_lock.lock().await;
        let Some(layouts) = self.store.get_optimistic_layout(&self.dashboard_id) else {
            return SaveStatus::Idle;
        };

        let unchanged = self
            .last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            == Some(&layouts);
        if unchanged {
            tracing::debug!("Layout for {} unchanged, skipping write", self.dashboard_id);
            self.status.send_replace(SaveStatus::Skipped);
            return SaveStatus::Skipped;
        }

        self.store.mark_as_pending(&self.dashboard_id);
        self.status.send_replace(SaveStatus::Pending);

        let outcome = match self.repository.update_layout(&self.dashboard_id, &layouts).await {
            Ok(()) => {
                *self
                    .last_written
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(layouts.clone());
                self.store.set_last_saved_layout(&self.dashboard_id, layouts);
                self.editor.mark_as_saved();
                tracing::info!("Saved layout for dashboard {}", self.dashboard_id);
                SaveStatus::Saved
            }
            Err(e) => {
                // Optimistic layout and dirty flag stay as they are.
                tracing::error!("Failed to save layout for dashboard {}: {}", self.dashboard_id, e);
                SaveStatus::Failed(e.to_string())
            }
        };

        self.store.clear_pending(&self.dashboard_id);
        self.status.send_replace(outcome.clone());
        outcome
    }
}

/// Turns a stream of layout changes into throttled backend writes for one
/// dashboard. Write failures are logged and reported through
/// [`LayoutPersistence::subscribe`], never returned to the caller of `save`.
pub struct LayoutPersistence {
    shared: Arc<Shared>,
    debouncer: Debouncer,
}

impl LayoutPersistence {
    pub fn new(
        dashboard_id: DashboardId,
        store: Arc<LayoutStore>,
        editor: Arc<EditorStore>,
        repository: Arc<dyn DashboardRepository>,
        policy: DebouncePolicy,
    ) -> Self {
        let (status, _) = watch::channel(SaveStatus::Idle);
        Self {
            shared: Arc::new(Shared {
                dashboard_id,
                store,
                editor,
                repository,
                last_written: Mutex::new(None),
                write_lock: AsyncMutex::new(()),
                status,
            }),
            debouncer: Debouncer::new(policy),
        }
    }

    pub fn dashboard_id(&self) -> &DashboardId {
        &self.shared.dashboard_id
    }

    /// Apply `layouts` to the working copy immediately and queue a write.
    /// The write sends the working copy as it is when the timer fires.
    ///
    /// Outside a Tokio runtime only the working copy is updated; the write
    /// is dropped with a warning and can be sent later with
    /// [`LayoutPersistence::persist_now`].
    pub fn save(&self, layouts: GridLayout) {
        self.shared
            .store
            .set_optimistic_layout(&self.shared.dashboard_id, layouts);
        let shared = Arc::clone(&self.shared);
        self.debouncer.schedule(
            async move {
                shared.write_current().await;
            }
            .boxed(),
        );
    }

    /// Stop a queued write from firing. Nothing is sent; callers that need a
    /// final write use [`LayoutPersistence::persist_now`] first.
    pub fn flush(&self) {
        if self.debouncer.is_scheduled() {
            tracing::debug!("Dropping queued layout write for {}", self.shared.dashboard_id);
        }
        self.debouncer.cancel();
    }

    pub fn cancel(&self) {
        self.debouncer.cancel();
    }

    /// Cancel the timer and write the working layout right away.
    pub async fn persist_now(&self) -> SaveStatus {
        self.debouncer.cancel();
        self.shared.write_current().await
    }

    pub fn is_scheduled(&self) -> bool {
        self.debouncer.is_scheduled()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.shared.status.subscribe()
    }
}
