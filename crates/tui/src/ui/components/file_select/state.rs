//! Highlight state for the resource overlay.

use fileselect_engine::{ChoiceToken, SelectionStateMachine};
use ratatui::widgets::ListState;

/// Tracks which overlay row is highlighted.
///
/// The list itself lives in the selection machine; this only holds a cursor
/// that is clamped to the current list length before every use.
#[derive(Debug, Clone, Default)]
pub struct ResourcePickerState {
    list_state: ListState,
}

impl ResourcePickerState {
    /// Highlight the first row of a list with `len` entries.
    pub fn reset(&mut self, len: usize) {
        self.list_state = ListState::default();
        self.list_state.select((len > 0).then_some(0));
    }

    /// Keep the highlight inside `0..len` after the list was replaced.
    pub fn clamp(&mut self, len: usize) {
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(index) if index >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            Some(_) => {}
        }
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let next = match self.list_state.selected() {
            Some(index) if index + 1 < len => index + 1,
            _ => 0,
        };
        self.list_state.select(Some(next));
    }

    pub fn select_prev(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let prev = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(index) => (index - 1).min(len - 1),
        };
        self.list_state.select(Some(prev));
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Token for the highlighted row in the machine's current list.
    pub fn selected_token(&self, machine: &SelectionStateMachine) -> Option<ChoiceToken> {
        self.selected().and_then(|index| machine.choice_at(index))
    }

    pub fn list_state_mut(&mut self) -> &mut ListState {
        &mut self.list_state
    }
}
