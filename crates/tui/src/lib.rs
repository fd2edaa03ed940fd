//! # Fileselect TUI
//!
//! Terminal front-end for one selection widget. The summary panel shows the
//! current selection (or how many files the backend offers) and the overlay
//! lists the files so the user can confirm one.
//!
//! ## Architecture
//!
//! Components translate key presses into [`app::Effect`]s; `cmd` executes
//! those against the [`SelectionSession`], and the runtime feeds completed
//! remote calls back into the session before redrawing.

mod app;
mod cmd;
mod ui;

use anyhow::Result;
use fileselect_engine::SelectionSession;

/// Runs the TUI until the user quits, then tears the session down.
///
/// The session should be freshly constructed; `run` mounts it.
pub async fn run(session: SelectionSession) -> Result<()> {
    ui::runtime::run_app(session).await
}
