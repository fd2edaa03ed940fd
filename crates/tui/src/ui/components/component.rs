//! Component system for the fileselect TUI.
//!
//! Components handle key events and render themselves into a provided `Rect`.
//! They never call the session directly; side effects are reported back to
//! the runtime as [`Effect`]s.

use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect, text::Span};

use crate::app::{App, Effect};

pub trait Component {
    /// Handle a key press while this component has focus.
    fn handle_key_events(&mut self, _app: &mut App, _key: KeyEvent) -> Vec<Effect> {
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App);

    /// Key hints shown in the footer while this component has focus.
    fn get_hint_spans(&self, _app: &App) -> Vec<Span<'_>> {
        Vec::new()
    }
}
