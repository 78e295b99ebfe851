//! TUI-local state
//!
//! Only what the dashboard itself owns: input modes, queued user actions and
//! the spinner. Workflow state is read from the runtime at render time.

use std::path::PathBuf;

use rand::seq::IndexedRandom;
use tracing::debug;

use crate::workflow::Phase;

/// Words shown next to the spinner while the agent is working
pub const SPINNER_WORDS: &[&str] = &[
    "Directing",
    "Storyboarding",
    "Color grading",
    "Cutting",
    "Syncing beats",
    "Framing",
    "Compositing",
    "Rendering",
];

/// Spinner frames, advanced once per tick
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// How keys are interpreted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Normal,
    /// Typing an image path (a key)
    ImageInput(String),
    /// Editing the prompt (p key)
    PromptInput(String),
    /// Help overlay
    Help,
}

impl InteractionMode {
    pub fn input_buffer_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::ImageInput(buf) | Self::PromptInput(buf) => Some(buf),
            _ => None,
        }
    }
}

/// User action queued by key handling for the runner to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    AddImage(PathBuf),
    RemoveLastImage,
    SetPrompt(String),
    Start,
    Reset,
    View(Phase),
    ClearView,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub interaction_mode: InteractionMode,
    pub should_quit: bool,
    pub pending: Vec<PendingAction>,
    pub error_message: Option<String>,
    pub spinner_word: String,
    pub tick: usize,
}

impl AppState {
    pub fn new() -> Self {
        debug!("AppState::new: called");
        Self {
            spinner_word: "Working".to_string(),
            ..Self::default()
        }
    }

    pub fn queue(&mut self, action: PendingAction) {
        debug!(?action, "AppState::queue: called");
        self.pending.push(action);
    }

    /// Hand queued actions to the runner
    pub fn take_pending(&mut self) -> Vec<PendingAction> {
        std::mem::take(&mut self.pending)
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Pick a fresh spinner word for a new attempt
    pub fn shuffle_spinner(&mut self) {
        let mut rng = rand::rng();
        self.spinner_word = SPINNER_WORDS.choose(&mut rng).unwrap_or(&"Working").to_string();
    }

    pub fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn spinner_frame(&self) -> &'static str {
        SPINNER_FRAMES[self.tick % SPINNER_FRAMES.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_pending_drains() {
        let mut state = AppState::new();
        state.queue(PendingAction::Start);
        state.queue(PendingAction::View(Phase::Planning));
        assert_eq!(
            state.take_pending(),
            vec![PendingAction::Start, PendingAction::View(Phase::Planning)]
        );
        assert!(state.take_pending().is_empty());
    }

    #[test]
    fn test_shuffle_spinner_picks_known_word() {
        let mut state = AppState::new();
        state.shuffle_spinner();
        assert!(SPINNER_WORDS.contains(&state.spinner_word.as_str()));
    }

    #[test]
    fn test_spinner_frame_wraps() {
        let mut state = AppState::new();
        for _ in 0..SPINNER_FRAMES.len() {
            state.advance_tick();
        }
        assert_eq!(state.spinner_frame(), SPINNER_FRAMES[0]);
    }

    #[test]
    fn test_input_buffer() {
        let mut mode = InteractionMode::PromptInput(String::new());
        mode.input_buffer_mut().unwrap().push('x');
        assert_eq!(mode, InteractionMode::PromptInput("x".to_string()));
        assert!(InteractionMode::Normal.input_buffer_mut().is_none());
    }
}
