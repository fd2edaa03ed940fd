//! # Effect Execution
//!
//! Components stay pure: they inspect [`App`] and return [`Effect`]s. This
//! module is the imperative shell that applies those effects to the
//! [`SelectionSession`], which in turn spawns the remote calls.

use tracing::debug;

use crate::app::{App, Effect};

pub fn run_effects(app: &mut App, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::OpenOverlay => {
                if app.session.open_overlay() {
                    app.picker.reset(app.session.machine().list().items().len());
                } else if !app.session.machine().list().is_loaded() {
                    debug!("overlay requested before the first list; refetching");
                    app.session.refresh_list();
                }
            }
            Effect::CloseOverlay => app.session.close_overlay(),
            Effect::RefreshList => app.session.refresh_list(),
            Effect::Choose(token) => app.session.choose(token),
            Effect::DismissError => app.session.machine_mut().dismiss_error(),
            Effect::Quit => app.should_quit = true,
        }
    }
}
