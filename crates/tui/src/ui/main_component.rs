//! Root view: lays out the summary panel and the hint footer, and stacks
//! the resource overlay on top while it is open.

use crossterm::event::KeyEvent;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Block, Paragraph},
};

use crate::{
    app::{App, Effect},
    ui::{
        components::{
            Component,
            file_select::{FileSelectComponent, ResourceModalComponent},
        },
        utils::centered_rect,
    },
};

#[derive(Debug, Default)]
pub struct MainView {
    summary: FileSelectComponent,
    modal: ResourceModalComponent,
}

impl Component for MainView {
    /// Keys go to the overlay while it is open, otherwise to the summary panel.
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if app.session.machine().is_overlay_open() {
            self.modal.handle_key_events(app, key)
        } else {
            self.summary.handle_key_events(app, key)
        }
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        frame.render_widget(Block::default().style(app.theme.modal_background_style()), rect);
        let [body_area, footer_area] = Layout::vertical([Constraint::Min(5), Constraint::Length(1)]).areas(rect);
        let [summary_area, _] = Layout::vertical([Constraint::Length(7), Constraint::Min(0)]).areas(body_area);

        self.summary.render(frame, summary_area, app);

        let overlay_open = app.session.machine().is_overlay_open();
        if overlay_open {
            self.modal.render(frame, centered_rect(60, 70, body_area), app);
        }

        let hints = if overlay_open {
            self.modal.get_hint_spans(app)
        } else {
            self.summary.get_hint_spans(app)
        };
        frame.render_widget(Paragraph::new(Line::from(hints)), footer_area);
    }
}
