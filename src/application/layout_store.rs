// Layout store - Client-side working copy of each dashboard's grid layout
use crate::domain::ids::{DashboardId, WidgetId};
use crate::domain::layout::{GridItemUpdate, GridLayout, GridPlacement};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct LayoutState {
    optimistic: HashMap<DashboardId, GridLayout>,
    confirmed: HashMap<DashboardId, GridLayout>,
    pending: HashSet<DashboardId>,
}

/// Optimistic layouts, last-saved layouts and in-flight saves, keyed by
/// dashboard.
///
/// Values go in and come out by clone, so nothing handed to a caller aliases
/// what the store holds. Construct one per session and share it behind an
/// `Arc`.
#[derive(Debug, Default)]
pub struct LayoutStore {
    state: Mutex<LayoutState>,
}

impl LayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LayoutState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_optimistic_layout(&self, dashboard_id: &DashboardId, layouts: GridLayout) {
        self.lock().optimistic.insert(dashboard_id.clone(), layouts);
    }

    /// `None` means no edit has been made yet; callers fall back to the
    /// layout last fetched from the server.
    pub fn get_optimistic_layout(&self, dashboard_id: &DashboardId) -> Option<GridLayout> {
        self.lock().optimistic.get(dashboard_id).cloned()
    }

    pub fn mark_as_pending(&self, dashboard_id: &DashboardId) {
        self.lock().pending.insert(dashboard_id.clone());
    }

    pub fn clear_pending(&self, dashboard_id: &DashboardId) {
        self.lock().pending.remove(dashboard_id);
    }

    pub fn is_pending(&self, dashboard_id: &DashboardId) -> bool {
        self.lock().pending.contains(dashboard_id)
    }

    pub fn set_last_saved_layout(&self, dashboard_id: &DashboardId, layouts: GridLayout) {
        self.lock().confirmed.insert(dashboard_id.clone(), layouts);
    }

    pub fn get_last_saved_layout(&self, dashboard_id: &DashboardId) -> Option<GridLayout> {
        self.lock().confirmed.get(dashboard_id).cloned()
    }

    /// Make the last-saved layout the working copy again and return it.
    /// No-op returning `None` when nothing has been saved.
    pub fn rollback_to_last_saved(&self, dashboard_id: &DashboardId) -> Option<GridLayout> {
        let mut state = self.lock();
        let last_saved = state.confirmed.get(dashboard_id).cloned()?;
        state
            .optimistic
            .insert(dashboard_id.clone(), last_saved.clone());
        Some(last_saved)
    }

    /// Place `widget_id` in every breakpoint of the working layout, starting
    /// from an empty layout when none exists yet.
    pub fn add_widget_to_layout(
        &self,
        dashboard_id: &DashboardId,
        widget_id: &WidgetId,
        placement: GridPlacement,
    ) {
        let mut state = self.lock();
        let current = state
            .optimistic
            .get(dashboard_id)
            .cloned()
            .unwrap_or_default();
        let next = current.with_widget_added(widget_id, placement);
        state.optimistic.insert(dashboard_id.clone(), next);
    }

    /// Drop `widget_id` from every breakpoint. Without a working layout this
    /// is a no-op, so the server layout keeps showing through.
    pub fn remove_widget_from_layout(&self, dashboard_id: &DashboardId, widget_id: &WidgetId) {
        let mut state = self.lock();
        if let Some(current) = state.optimistic.get(dashboard_id) {
            let next = current.without_widget(widget_id);
            state.optimistic.insert(dashboard_id.clone(), next);
        }
    }

    pub fn update_widget_layout(
        &self,
        dashboard_id: &DashboardId,
        widget_id: &WidgetId,
        update: GridItemUpdate,
    ) {
        let mut state = self.lock();
        if let Some(current) = state.optimistic.get(dashboard_id) {
            let next = current.with_widget_updated(widget_id, &update);
            state.optimistic.insert(dashboard_id.clone(), next);
        }
    }

    pub fn clear_dashboard_state(&self, dashboard_id: &DashboardId) {
        let mut state = self.lock();
        state.optimistic.remove(dashboard_id);
        state.confirmed.remove(dashboard_id);
        state.pending.remove(dashboard_id);
    }

    pub fn clear_all_state(&self) {
        *self.lock() = LayoutState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::Breakpoint;

    fn dashboard() -> DashboardId {
        DashboardId::new("d1")
    }

    fn layout_with(ids: &[&str]) -> GridLayout {
        let items: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(n, id)| GridPlacement::new(n as u32 * 3, 0, 3, 4).at((*id).into()))
            .collect();
        GridLayout::new()
            .with_breakpoint(Breakpoint::Lg, items.clone())
            .with_breakpoint(Breakpoint::Md, items)
    }

    #[test]
    fn test_optimistic_absent_until_set() {
        let store = LayoutStore::new();
        assert_eq!(store.get_optimistic_layout(&dashboard()), None);

        store.set_optimistic_layout(&dashboard(), layout_with(&["w1"]));
        assert_eq!(store.get_optimistic_layout(&dashboard()), Some(layout_with(&["w1"])));
    }

    #[test]
    fn test_pending_flag() {
        let store = LayoutStore::new();
        assert!(!store.is_pending(&dashboard()));
        store.mark_as_pending(&dashboard());
        assert!(store.is_pending(&dashboard()));
        assert!(!store.is_pending(&DashboardId::new("d2")));
        store.clear_pending(&dashboard());
        assert!(!store.is_pending(&dashboard()));
    }

    #[test]
    fn test_rollback_restores_last_saved() {
        let store = LayoutStore::new();
        let l0 = layout_with(&["w1"]);
        let l1 = layout_with(&["w1", "w2"]);
        store.set_last_saved_layout(&dashboard(), l0.clone());
        store.set_optimistic_layout(&dashboard(), l1);

        assert_eq!(store.rollback_to_last_saved(&dashboard()), Some(l0.clone()));
        assert_eq!(store.get_optimistic_layout(&dashboard()), Some(l0));
    }

    #[test]
    fn test_rollback_without_saved_is_noop() {
        let store = LayoutStore::new();
        store.set_optimistic_layout(&dashboard(), layout_with(&["w1"]));
        assert_eq!(store.rollback_to_last_saved(&dashboard()), None);
        assert_eq!(store.get_optimistic_layout(&dashboard()), Some(layout_with(&["w1"])));
    }

    #[test]
    fn test_structural_helpers_touch_all_breakpoints() {
        let store = LayoutStore::new();
        store.set_optimistic_layout(&dashboard(), layout_with(&["w1"]));

        store.add_widget_to_layout(&dashboard(), &"w2".into(), GridPlacement::new(0, 4, 2, 2));
        let added = store.get_optimistic_layout(&dashboard()).unwrap();
        assert_eq!(added.widget_ids(Breakpoint::Lg), added.widget_ids(Breakpoint::Md));
        assert!(added.widget_ids(Breakpoint::Md).contains(&WidgetId::new("w2")));

        store.remove_widget_from_layout(&dashboard(), &"w1".into());
        let removed = store.get_optimistic_layout(&dashboard()).unwrap();
        assert_eq!(removed.widget_ids(Breakpoint::Lg), vec![WidgetId::new("w2")]);
        assert_eq!(removed.widget_ids(Breakpoint::Md), vec![WidgetId::new("w2")]);
    }

    #[test]
    fn test_add_starts_from_empty_layout() {
        let store = LayoutStore::new();
        store.add_widget_to_layout(&dashboard(), &"w1".into(), GridPlacement::new(0, 0, 2, 2));
        let layout = store.get_optimistic_layout(&dashboard()).unwrap();
        assert_eq!(layout.breakpoints().count(), Breakpoint::ALL.len());
    }

    #[test]
    fn test_remove_without_layout_is_noop() {
        let store = LayoutStore::new();
        store.remove_widget_from_layout(&dashboard(), &"w1".into());
        store.update_widget_layout(&dashboard(), &"w1".into(), GridItemUpdate::moved_to(1, 1));
        assert_eq!(store.get_optimistic_layout(&dashboard()), None);
    }

    #[test]
    fn test_update_merges_geometry_in_every_breakpoint() {
        let store = LayoutStore::new();
        store.set_optimistic_layout(&dashboard(), layout_with(&["w1", "w2"]));
        store.update_widget_layout(&dashboard(), &"w2".into(), GridItemUpdate::resized_to(6, 2));

        let layout = store.get_optimistic_layout(&dashboard()).unwrap();
        for bp in [Breakpoint::Lg, Breakpoint::Md] {
            let item = &layout.items(bp).unwrap()[1];
            assert_eq!((item.placement.w, item.placement.h), (6, 2));
        }
    }

    #[test]
    fn test_snapshots_survive_later_edits() {
        let store = LayoutStore::new();
        store.set_optimistic_layout(&dashboard(), layout_with(&["w1"]));
        let snapshot = store.get_optimistic_layout(&dashboard()).unwrap();

        store.add_widget_to_layout(&dashboard(), &"w2".into(), GridPlacement::new(0, 0, 1, 1));
        assert_eq!(snapshot, layout_with(&["w1"]));
    }

    #[test]
    fn test_clear_state() {
        let store = LayoutStore::new();
        let other = DashboardId::new("d2");
        store.set_optimistic_layout(&dashboard(), layout_with(&["w1"]));
        store.set_last_saved_layout(&dashboard(), layout_with(&["w1"]));
        store.mark_as_pending(&dashboard());
        store.set_optimistic_layout(&other, layout_with(&["w9"]));

        store.clear_dashboard_state(&dashboard());
        store.clear_dashboard_state(&dashboard());
        assert_eq!(store.get_optimistic_layout(&dashboard()), None);
        assert_eq!(store.get_last_saved_layout(&dashboard()), None);
        assert!(!store.is_pending(&dashboard()));
        assert!(store.get_optimistic_layout(&other).is_some());

        store.clear_all_state();
        assert_eq!(store.get_optimistic_layout(&other), None);
    }
}
