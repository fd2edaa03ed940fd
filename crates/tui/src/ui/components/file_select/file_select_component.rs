//! Summary panel: the current selection, the list size, and the last error.

use crossterm::event::{KeyCode, KeyEvent};
use fileselect_engine::{SelectionError, SelectionSummary};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::{
    app::{App, Effect},
    ui::{
        components::Component,
        theme::theme_helpers::{block, build_hint_spans},
    },
};

#[derive(Debug, Default)]
pub struct FileSelectComponent;

impl Component for FileSelectComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('o') => vec![Effect::OpenOverlay],
            KeyCode::Char('r') => vec![Effect::RefreshList],
            KeyCode::Esc if app.session.machine().last_error().is_some() => vec![Effect::DismissError],
            KeyCode::Char('q') | KeyCode::Esc => vec![Effect::Quit],
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let theme = &*app.theme;
        let machine = app.session.machine();
        let title = format!("Parameter {}", machine.parameter_id());
        let panel = block(theme, Some(&title), true);
        let inner = panel.inner(rect);
        frame.render_widget(panel, rect);

        let [summary_area, action_area, status_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(2), Constraint::Min(1)]).areas(inner);

        let summary = machine.summary();
        let summary_style = match summary {
            SelectionSummary::Selected(_) => theme.text_primary_style().add_modifier(Modifier::BOLD),
            SelectionSummary::FilesFound(_) => theme.text_secondary_style(),
            SelectionSummary::Loading => theme.text_muted_style(),
        };
        frame.render_widget(Paragraph::new(Span::styled(summary.to_string(), summary_style)), summary_area);

        let action = Line::from(vec![
            Span::styled("[Enter] ", theme.accent_emphasis_style()),
            Span::styled(machine.action_label(), theme.text_primary_style()),
        ]);
        frame.render_widget(Paragraph::new(action), action_area);

        let status = if let Some(error) = machine.last_error() {
            Line::from(vec![
                Span::styled(error.to_string(), theme.status_error()),
                Span::styled(retry_hint(error), theme.text_muted_style()),
            ])
        } else if machine.is_choice_pending() {
            Line::from(Span::styled("Confirming selection...", theme.status_warning()))
        } else if machine.is_list_pending() {
            Line::from(Span::styled("Refreshing files...", theme.status_info()))
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(status).wrap(Wrap { trim: true }), status_area);
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'_>> {
        let theme = &*app.theme;
        if app.session.machine().last_error().is_some() {
            build_hint_spans(theme, &[("Enter", " Open  "), ("r", " Refresh  "), ("Esc", " Dismiss  "), ("q", " Quit")])
        } else {
            build_hint_spans(theme, &[("Enter", " Open  "), ("r", " Refresh  "), ("q", " Quit")])
        }
    }
}

fn retry_hint(error: &SelectionError) -> &'static str {
    if error.is_retryable() { "  (press r or Enter to retry)" } else { "" }
}
