// Edit session - Wires editor history, the layout store and persistence for one dashboard
use crate::application::debounce::DebouncePolicy;
use crate::application::editor::{EditorCommand, EditorStore, KeyPress};
use crate::application::layout_store::LayoutStore;
use crate::application::persistence::LayoutPersistence;
use crate::application::repository::DashboardRepository;
use crate::domain::ids::{generate_id, DashboardId, WidgetId};
use crate::domain::layout::{Breakpoint, DashboardLayout, GridItem, GridLayout, GridPlacement};
use crate::domain::widget::WidgetInstance;
use std::sync::Arc;

/// A layout item paired with the widget it refers to, or a placeholder when
/// the widget list has no such id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedItem<'a> {
    Widget {
        item: &'a GridItem,
        widget: &'a WidgetInstance,
    },
    Missing {
        item: &'a GridItem,
    },
}

impl<'a> ResolvedItem<'a> {
    pub fn item(&self) -> &'a GridItem {
        match self {
            ResolvedItem::Widget { item, .. } | ResolvedItem::Missing { item } => item,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ResolvedItem::Missing { .. })
    }
}

/// Pair each item of `breakpoint` with its widget. Unknown ids degrade to
/// `ResolvedItem::Missing` instead of failing the whole layout.
pub fn resolve_items<'a>(
    layout: &'a GridLayout,
    breakpoint: Breakpoint,
    widgets: &'a [WidgetInstance],
) -> Vec<ResolvedItem<'a>> {
    layout
        .items(breakpoint)
        .unwrap_or_default()
        .iter()
        .map(|item| match widgets.iter().find(|w| w.id == item.i) {
            Some(widget) => ResolvedItem::Widget { item, widget },
            None => ResolvedItem::Missing { item },
        })
        .collect()
}

pub struct EditSession {
    dashboard_id: DashboardId,
    store: Arc<LayoutStore>,
    editor: Arc<EditorStore>,
    persistence: LayoutPersistence,
    server_layout: Option<GridLayout>,
}

impl EditSession {
    /// Enter edit mode for `dashboard_id`. The fetched server layout, when
    /// there is one, becomes the rollback target.
    pub fn begin(
        dashboard_id: DashboardId,
        store: Arc<LayoutStore>,
        editor: Arc<EditorStore>,
        repository: Arc<dyn DashboardRepository>,
        policy: DebouncePolicy,
        server_layout: Option<DashboardLayout>,
    ) -> Self {
        let server_layout = server_layout.map(|l| l.layouts);
        editor.set_edit_mode(true);
        if let Some(layouts) = &server_layout {
            store.set_last_saved_layout(&dashboard_id, layouts.clone());
        }
        let persistence = LayoutPersistence::new(
            dashboard_id.clone(),
            Arc::clone(&store),
            Arc::clone(&editor),
            repository,
            policy,
        );
        tracing::debug!("Editing dashboard {}", dashboard_id);
        Self {
            dashboard_id,
            store,
            editor,
            persistence,
            server_layout,
        }
    }

    pub fn dashboard_id(&self) -> &DashboardId {
        &self.dashboard_id
    }

    pub fn editor(&self) -> &EditorStore {
        &self.editor
    }

    pub fn persistence(&self) -> &LayoutPersistence {
        &self.persistence
    }

    /// Working copy, else the server layout, else an empty layout.
    pub fn current_layout(&self) -> GridLayout {
        self.store
            .get_optimistic_layout(&self.dashboard_id)
            .or_else(|| self.server_layout.clone())
            .unwrap_or_default()
    }

    fn record_undo_point(&self) {
        let current = self.current_layout();
        if current.breakpoints().next().is_some() {
            self.editor.push_undo_state(current);
        }
    }

    /// Handle a layout change coming from a drag or resize.
    pub fn apply_layout_change(&self, layouts: GridLayout) {
        self.record_undo_point();
        self.editor.set_unsaved_changes(true);
        self.persistence.save(layouts);
    }

    pub fn add_widget(&self, widget_id: &WidgetId, placement: GridPlacement) {
        self.record_undo_point();
        let next = self.current_layout().with_widget_added(widget_id, placement);
        self.editor.set_unsaved_changes(true);
        self.persistence.save(next);
    }

    pub fn remove_widget(&self, widget_id: &WidgetId) {
        self.record_undo_point();
        let next = self.current_layout().without_widget(widget_id);
        if self.editor.selected_widget_id().as_ref() == Some(widget_id) {
            self.editor.clear_selection();
        }
        self.editor.set_unsaved_changes(true);
        self.persistence.save(next);
    }

    pub fn undo(&self) -> Option<GridLayout> {
        let restored = self.editor.undo()?;
        self.persistence.save(restored.clone());
        Some(restored)
    }

    pub fn redo(&self) -> Option<GridLayout> {
        let restored = self.editor.redo()?;
        self.persistence.save(restored.clone());
        Some(restored)
    }

    /// Run the command bound to `key`, if any, and report which one ran.
    pub fn handle_key(&self, key: &KeyPress) -> Option<EditorCommand> {
        let command = self.editor.command_for(key)?;
        match command {
            EditorCommand::Undo => {
                self.undo();
            }
            EditorCommand::Redo => {
                self.redo();
            }
            EditorCommand::ClearSelection => self.editor.clear_selection(),
        }
        Some(command)
    }

    /// The clipboard widget re-homed to this dashboard under a fresh id.
    pub fn paste_widget(&self) -> Option<WidgetInstance> {
        let mut widget = self.editor.paste_widget()?;
        widget.id = WidgetId::new(generate_id("widget"));
        widget.dashboard_id = self.dashboard_id.clone();
        Some(widget)
    }

    pub fn rollback(&self) -> Option<GridLayout> {
        self.persistence.cancel();
        self.store.rollback_to_last_saved(&self.dashboard_id)
    }

    /// Leave edit mode and drop any queued write.
    pub fn end(&self) {
        self.editor.set_edit_mode(false);
        self.persistence.flush();
    }
}
