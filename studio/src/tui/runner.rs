//! TUI Runner - main loop that owns the terminal and drives the studio
//!
//! The TuiRunner is responsible for:
//! - Dispatching terminal events to the App
//! - Applying the actions the App queues to the Studio
//! - Feeding runtime signals to the Studio as they arrive
//! - Rendering on every event and tick

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyEvent;
use eyre::Result;
use tracing::{debug, info, warn};

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::state::PendingAction;
use super::views;
use crate::notify::RecordingSink;
use crate::runtime::{CLOSE_GRACE, Studio};

/// Notifications shown under the phase content
const VISIBLE_NOTIFICATIONS: usize = 3;

/// TUI Runner that manages the terminal and event loop
pub struct TuiRunner {
    /// Application state
    app: App,
    /// Terminal handle
    terminal: Tui,
    /// Event handler
    event_handler: EventHandler,
    /// Workflow runtime
    studio: Studio,
    /// Sink the studio notifies into
    sink: Arc<RecordingSink>,
}

impl TuiRunner {
    pub fn new(terminal: Tui, studio: Studio, sink: Arc<RecordingSink>, tick_rate: Duration) -> Self {
        debug!(?tick_rate, "TuiRunner::new: called");
        Self {
            app: App::new(),
            terminal,
            event_handler: EventHandler::new(tick_rate),
            studio,
            sink,
        }
    }

    /// Run the main loop until the user quits
    pub async fn run(&mut self) -> Result<()> {
        debug!("TuiRunner::run: entering main loop");
        loop {
            let notifications = self.sink.latest(VISIBLE_NOTIFICATIONS);
            let state = self.app.state();
            let workflow = self.studio.workflow();
            self.terminal
                .draw(|frame| views::render(state, workflow, &notifications, frame))?;

            tokio::select! {
                event = self.event_handler.next() => {
                    match event? {
                        Event::Tick => self.app.state_mut().advance_tick(),
                        Event::Key(key) => {
                            if self.handle_key(key) {
                                break;
                            }
                        }
                        Event::Resize(width, height) => {
                            debug!(width, height, "TuiRunner::run: resize");
                        }
                    }
                }
                Some(signal) = self.studio.next_signal() => {
                    self.studio.dispatch(signal);
                }
            }

            if self.app.state().should_quit {
                debug!("TuiRunner::run: should_quit is true, breaking");
                break;
            }
        }

        // Leave nothing streaming behind
        self.studio.shutdown(CLOSE_GRACE).await;
        debug!("TuiRunner::run: exiting");
        Ok(())
    }

    /// Returns true if the application should exit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let prompt = self.studio.workflow().prompt().to_string();
        let quit = self.app.handle_key(key, &prompt);
        self.apply_pending();
        quit
    }

    /// Apply actions queued by the App
    fn apply_pending(&mut self) {
        for action in self.app.state_mut().take_pending() {
            debug!(?action, "TuiRunner::apply_pending: applying");
            match action {
                PendingAction::AddImage(path) => {
                    if let Err(e) = self.studio.add_image(path) {
                        warn!(error = %e, "image rejected");
                        self.app.state_mut().set_error(e.to_string());
                    }
                }
                PendingAction::RemoveLastImage => {
                    if !self.studio.remove_last_image() {
                        self.app.state_mut().set_error("No images to remove");
                    }
                }
                PendingAction::SetPrompt(prompt) => self.studio.set_prompt(prompt),
                PendingAction::Start => {
                    if self.studio.start() {
                        info!("agent started from the dashboard");
                    }
                }
                PendingAction::Reset => {
                    self.studio.reset();
                    self.sink.clear();
                }
                PendingAction::View(phase) => {
                    if !self.studio.request_view(phase) {
                        self.app
                            .state_mut()
                            .set_error(format!("{} has not been reached yet", phase));
                    }
                }
                PendingAction::ClearView => self.studio.clear_view(),
            }
        }
    }
}
