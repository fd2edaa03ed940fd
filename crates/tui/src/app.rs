//! Application state shared by the runtime and the components.

use fileselect_engine::{ChoiceToken, SelectionSession};

use crate::ui::{
    components::file_select::ResourcePickerState,
    theme::{NordTheme, Theme},
};

/// High-level actions requested by components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    OpenOverlay,
    CloseOverlay,
    RefreshList,
    Choose(ChoiceToken),
    DismissError,
    Quit,
}

pub struct App {
    pub session: SelectionSession,
    pub theme: Box<dyn Theme>,
    pub picker: ResourcePickerState,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: SelectionSession) -> Self {
        Self {
            session,
            theme: Box::new(NordTheme::new()),
            picker: ResourcePickerState::default(),
            should_quit: false,
        }
    }
}
