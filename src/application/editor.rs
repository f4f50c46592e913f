// Editor store - Interactive editing session state and layout history
use crate::application::history::{UndoHistory, DEFAULT_MAX_DEPTH};
use crate::domain::ids::WidgetId;
use crate::domain::layout::GridLayout;
use crate::domain::widget::WidgetInstance;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct EditorState {
    is_edit_mode: bool,
    selected_widget_id: Option<WidgetId>,
    clipboard: Option<WidgetInstance>,
    is_dragging: bool,
    is_resizing: bool,
    history: UndoHistory<GridLayout>,
    has_unsaved_changes: bool,
}

impl EditorState {
    fn new(undo_depth: usize) -> Self {
        Self {
            is_edit_mode: false,
            selected_widget_id: None,
            clipboard: None,
            is_dragging: false,
            is_resizing: false,
            history: UndoHistory::new(undo_depth),
            has_unsaved_changes: false,
        }
    }
}

/// Read-only view of the editor flags.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSnapshot {
    pub is_edit_mode: bool,
    pub selected_widget_id: Option<WidgetId>,
    pub has_clipboard: bool,
    pub is_dragging: bool,
    pub is_resizing: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub has_unsaved_changes: bool,
}

/// State for whichever dashboard is being edited.
///
/// History entries are whole layouts (every breakpoint), so undo restores
/// geometry in all tiers, not only the one being dragged in. Widget
/// configuration is never part of the history.
#[derive(Debug)]
pub struct EditorStore {
    state: Mutex<EditorState>,
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorStore {
    pub fn new() -> Self {
        Self::with_undo_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_undo_depth(undo_depth: usize) -> Self {
        Self {
            state: Mutex::new(EditorState::new(undo_depth)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        let state = self.lock();
        EditorSnapshot {
            is_edit_mode: state.is_edit_mode,
            selected_widget_id: state.selected_widget_id.clone(),
            has_clipboard: state.clipboard.is_some(),
            is_dragging: state.is_dragging,
            is_resizing: state.is_resizing,
            can_undo: state.history.can_undo(),
            can_redo: state.history.can_redo(),
            has_unsaved_changes: state.has_unsaved_changes,
        }
    }

    pub fn set_edit_mode(&self, enabled: bool) {
        let mut state = self.lock();
        state.is_edit_mode = enabled;
        if !enabled {
            state.selected_widget_id = None;
        }
    }

    pub fn toggle_edit_mode(&self) {
        let enabled = !self.is_edit_mode();
        self.set_edit_mode(enabled);
    }

    pub fn is_edit_mode(&self) -> bool {
        self.lock().is_edit_mode
    }

    pub fn select_widget(&self, id: Option<WidgetId>) {
        self.lock().selected_widget_id = id;
    }

    pub fn clear_selection(&self) {
        self.lock().selected_widget_id = None;
    }

    pub fn selected_widget_id(&self) -> Option<WidgetId> {
        self.lock().selected_widget_id.clone()
    }

    /// Keep an independent copy of `widget`; later edits to the live widget
    /// do not reach the clipboard.
    pub fn copy_widget(&self, widget: &WidgetInstance) {
        self.lock().clipboard = Some(widget.clone());
    }

    /// A fresh copy of the clipboard contents. The caller assigns a new id
    /// before inserting it anywhere.
    pub fn paste_widget(&self) -> Option<WidgetInstance> {
        self.lock().clipboard.clone()
    }

    pub fn clear_clipboard(&self) {
        self.lock().clipboard = None;
    }

    pub fn set_dragging(&self, dragging: bool) {
        self.lock().is_dragging = dragging;
    }

    pub fn set_resizing(&self, resizing: bool) {
        self.lock().is_resizing = resizing;
    }

    /// Record the geometry as it was before a mutation.
    pub fn push_undo_state(&self, layout: GridLayout) {
        let mut state = self.lock();
        state.history.push(layout);
        state.has_unsaved_changes = true;
    }

    pub fn undo(&self) -> Option<GridLayout> {
        let mut state = self.lock();
        if !state.history.can_undo() {
            return None;
        }
        state.has_unsaved_changes = true;
        state.history.undo()
    }

    pub fn redo(&self) -> Option<GridLayout> {
        let mut state = self.lock();
        let restored = state.history.redo()?;
        state.has_unsaved_changes = true;
        Some(restored)
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.lock().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.lock().history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.lock().history.undo_depth()
    }

    pub fn set_unsaved_changes(&self, has_changes: bool) {
        self.lock().has_unsaved_changes = has_changes;
    }

    pub fn mark_as_saved(&self) {
        self.set_unsaved_changes(false);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.lock().has_unsaved_changes
    }

    /// Map a key press to an editor command. Only active in edit mode.
    pub fn command_for(&self, key: &KeyPress) -> Option<EditorCommand> {
        let state = self.lock();
        if !state.is_edit_mode {
            return None;
        }
        let modifier = key.ctrl || key.meta;
        let pressed = key.key.to_ascii_lowercase();
        if modifier && pressed == "z" && !key.shift {
            return state.history.can_undo().then_some(EditorCommand::Undo);
        }
        if modifier && (pressed == "y" || (pressed == "z" && key.shift)) {
            return state.history.can_redo().then_some(EditorCommand::Redo);
        }
        if key.key == "Escape" && state.selected_widget_id.is_some() {
            return Some(EditorCommand::ClearSelection);
        }
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn ctrl(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: true,
            ..Default::default()
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Undo,
    Redo,
    ClearSelection,
}
