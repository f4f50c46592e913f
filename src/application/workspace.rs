// Workspace - Shared stores and data access for a client session
use crate::application::dashboard_service::DashboardService;
use crate::application::debounce::DebouncePolicy;
use crate::application::edit_session::{resolve_items, EditSession, ResolvedItem};
use crate::application::editor::EditorStore;
use crate::application::error::{DashboardError, Result};
use crate::application::layout_store::LayoutStore;
use crate::application::query_cache::QueryCache;
use crate::application::repository::DashboardRepository;
use crate::domain::ids::DashboardId;
use crate::domain::layout::{Breakpoint, GridItem, GridLayout};
use crate::domain::widget::WidgetInstance;
use std::sync::Arc;

/// A grid cell ready to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Tile {
    Widget { item: GridItem, widget: WidgetInstance },
    /// The layout names a widget the dashboard does not have.
    NotFound { item: GridItem },
}

/// One per client. The layout store and editor outlive individual edit
/// sessions; the editor only ever serves the dashboard opened last.
pub struct Workspace {
    service: DashboardService,
    store: Arc<LayoutStore>,
    editor: Arc<EditorStore>,
    policy: DebouncePolicy,
}

impl Workspace {
    pub fn new(
        repository: Arc<dyn DashboardRepository>,
        cache: QueryCache,
        editor: EditorStore,
        policy: DebouncePolicy,
    ) -> Self {
        Self {
            service: DashboardService::new(repository, Arc::new(cache)),
            store: Arc::new(LayoutStore::new()),
            editor: Arc::new(editor),
            policy,
        }
    }

    pub fn service(&self) -> &DashboardService {
        &self.service
    }

    pub fn layout_store(&self) -> &LayoutStore {
        &self.store
    }

    pub fn editor(&self) -> &EditorStore {
        &self.editor
    }

    /// Fetch the dashboard's layout and start editing it. History, selection
    /// and the dirty flag from a previously edited dashboard are discarded.
    pub async fn open_editor(&self, dashboard_id: &DashboardId) -> Result<EditSession> {
        if self.service.get_dashboard(dashboard_id).await?.is_none() {
            return Err(DashboardError::not_found("dashboard", dashboard_id));
        }
        let server_layout = self.service.get_layout(dashboard_id).await?;
        self.editor.clear_history();
        self.editor.clear_selection();
        self.editor.mark_as_saved();

        // Layout writes go through the service so the cached layout is
        // invalidated after each save.
        let repository: Arc<dyn DashboardRepository> = Arc::new(self.service.clone());
        Ok(EditSession::begin(
            dashboard_id.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.editor),
            repository,
            self.policy,
            server_layout,
        ))
    }

    /// The layout to render for `dashboard_id`: the working copy if one
    /// exists, else the server layout.
    pub async fn view_layout(&self, dashboard_id: &DashboardId) -> Result<Option<GridLayout>> {
        if let Some(layout) = self.store.get_optimistic_layout(dashboard_id) {
            return Ok(Some(layout));
        }
        Ok(self
            .service
            .get_layout(dashboard_id)
            .await?
            .map(|layout| layout.layouts))
    }

    /// Tiles for the tier matching a container `width`.
    pub async fn render_tier(
        &self,
        dashboard_id: &DashboardId,
        width: u32,
    ) -> Result<Vec<Tile>> {
        let layout = self.view_layout(dashboard_id).await?.unwrap_or_default();
        let widgets = self.service.list_widgets(Some(dashboard_id)).await?;
        let tiles = resolve_items(&layout, Breakpoint::for_width(width), &widgets)
            .into_iter()
            .map(|resolved| match resolved {
                ResolvedItem::Widget { item, widget } => Tile::Widget {
                    item: item.clone(),
                    widget: widget.clone(),
                },
                ResolvedItem::Missing { item } => Tile::NotFound { item: item.clone() },
            })
            .collect();
        Ok(tiles)
    }
}
