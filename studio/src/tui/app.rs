//! TUI application - key handling
//!
//! The App owns the AppState and turns key presses into queued actions.
//! It never touches the workflow directly; the runner applies the queue.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, trace};

use super::state::{AppState, InteractionMode, PendingAction};
use crate::workflow::Phase;

#[derive(Debug)]
pub struct App {
    state: AppState,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        debug!("App::new: called");
        Self { state: AppState::new() }
    }

    pub fn state(&self) -> &AppState {
        trace!("App::state: called");
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        trace!("App::state_mut: called");
        &mut self.state
    }

    /// Handle a key event
    ///
    /// `current_prompt` seeds the prompt editor. Returns true if the
    /// application should exit.
    pub fn handle_key(&mut self, key: KeyEvent, current_prompt: &str) -> bool {
        debug!(?key, "App::handle_key: called");
        self.state.clear_error();

        match &self.state.interaction_mode {
            InteractionMode::Normal => self.handle_normal_key(key, current_prompt),
            InteractionMode::ImageInput(_) | InteractionMode::PromptInput(_) => {
                self.handle_input_key(key);
                false
            }
            InteractionMode::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                    self.state.interaction_mode = InteractionMode::Normal;
                }
                false
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent, current_prompt: &str) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => return true,
            (KeyCode::Char('q'), _) => {
                debug!("App::handle_normal_key: quit requested");
                self.state.should_quit = true;
            }
            (KeyCode::Char('?'), _) | (KeyCode::F(1), _) => {
                self.state.interaction_mode = InteractionMode::Help;
            }
            (KeyCode::Char('a'), _) => {
                self.state.interaction_mode = InteractionMode::ImageInput(String::new());
            }
            (KeyCode::Char('x'), _) => self.state.queue(PendingAction::RemoveLastImage),
            (KeyCode::Char('p'), _) => {
                self.state.interaction_mode = InteractionMode::PromptInput(current_prompt.to_string());
            }
            (KeyCode::Char('s'), _) => {
                self.state.shuffle_spinner();
                self.state.queue(PendingAction::Start);
            }
            (KeyCode::Char('r'), _) => self.state.queue(PendingAction::Reset),
            (KeyCode::Char('1'), _) => self.state.queue(PendingAction::View(Phase::Planning)),
            (KeyCode::Char('2'), _) => self.state.queue(PendingAction::View(Phase::Editing)),
            (KeyCode::Char('3'), _) => self.state.queue(PendingAction::View(Phase::Done)),
            (KeyCode::Char('0'), _) | (KeyCode::Esc, _) => self.state.queue(PendingAction::ClearView),
            _ => trace!("App::handle_normal_key: unhandled key"),
        }
        false
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                debug!("App::handle_input_key: cancelled");
                self.state.interaction_mode = InteractionMode::Normal;
            }
            KeyCode::Enter => {
                let mode = std::mem::take(&mut self.state.interaction_mode);
                match mode {
                    InteractionMode::ImageInput(path) => {
                        let path = path.trim();
                        if !path.is_empty() {
                            self.state.queue(PendingAction::AddImage(expand_home(path)));
                        }
                    }
                    InteractionMode::PromptInput(prompt) => self.state.queue(PendingAction::SetPrompt(prompt)),
                    _ => {}
                }
            }
            KeyCode::Backspace => {
                if let Some(buf) = self.state.interaction_mode.input_buffer_mut() {
                    buf.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buf) = self.state.interaction_mode.input_buffer_mut() {
                    buf.push(c);
                }
            }
            _ => {}
        }
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
