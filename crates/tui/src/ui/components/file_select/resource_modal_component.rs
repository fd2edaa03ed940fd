//! Overlay listing the backend's files for the user to confirm one.

use crossterm::event::{KeyCode, KeyEvent};
use fileselect_engine::{ListState, SelectionError};
use fileselect_types::ServiceOperation;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, Paragraph, Wrap},
};

use crate::{
    app::{App, Effect},
    ui::{
        components::Component,
        theme::theme_helpers::{block, build_hint_spans},
    },
};

#[derive(Debug, Default)]
pub struct ResourceModalComponent;

impl Component for ResourceModalComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        let len = app.session.machine().list().items().len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                app.picker.select_next(len);
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.picker.select_prev(len);
                Vec::new()
            }
            KeyCode::Enter => app
                .picker
                .selected_token(app.session.machine())
                .map(Effect::Choose)
                .into_iter()
                .collect(),
            KeyCode::Char('r') => vec![Effect::RefreshList],
            KeyCode::Esc => vec![Effect::CloseOverlay],
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let theme = &*app.theme;
        let machine = app.session.machine();
        frame.render_widget(Clear, rect);

        let modal = block(theme, Some("Select a file"), true);
        let inner = modal.inner(rect);
        frame.render_widget(modal, rect);

        let [list_area, status_area] = Layout::vertical([Constraint::Min(1), Constraint::Length(2)]).areas(inner);

        let items = machine.list().items();
        app.picker.clamp(items.len());
        if matches!(machine.list(), ListState::LoadedEmpty) {
            frame.render_widget(Paragraph::new(Span::styled("No files found.", theme.text_muted_style())), list_area);
        } else {
            let current = machine.selection().descriptor();
            let list_items: Vec<ListItem> = items
                .iter()
                .map(|descriptor| {
                    let marker = if current == Some(descriptor) { "* " } else { "  " };
                    ListItem::new(Line::from(vec![
                        Span::styled(marker, theme.accent_emphasis_style()),
                        Span::styled(descriptor.name().to_string(), theme.text_primary_style()),
                    ]))
                })
                .collect();
            let list = List::new(list_items).highlight_style(theme.selection_style());
            frame.render_stateful_widget(list, list_area, app.picker.list_state_mut());
        }

        let status = if machine.is_choice_pending() {
            Line::from(Span::styled("Confirming selection...", theme.status_warning()))
        } else if let Some(error) = machine.last_error().filter(|error| is_confirm_failure(error)) {
            Line::from(Span::styled(format!("{error}. Press Enter to retry."), theme.status_error()))
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(status).wrap(Wrap { trim: true }), status_area);
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'_>> {
        build_hint_spans(
            &*app.theme,
            &[("↑/↓", " Move  "), ("Enter", " Choose  "), ("r", " Refresh  "), ("Esc", " Close")],
        )
    }
}

fn is_confirm_failure(error: &SelectionError) -> bool {
    error.operation() == Some(ServiceOperation::MaterializeResource)
}
