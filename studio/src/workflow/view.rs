//! Which phase the dashboard shows
//!
//! The displayed phase is separate from the live workflow phase: once the
//! workflow reaches editing, the user may look back at a completed phase
//! without touching workflow state.

use tracing::debug;

use super::state::Phase;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewSelector {
    requested: Option<Phase>,
}

impl ViewSelector {
    /// Navigation is enabled only from editing onward
    pub fn can_navigate(live: Phase) -> bool {
        matches!(live, Phase::Editing | Phase::Done)
    }

    /// Ask to display `phase`; accepted only for phases the workflow has reached
    pub fn request(&mut self, live: Phase, phase: Phase) -> bool {
        debug!(%live, %phase, "ViewSelector::request: called");
        if !Self::can_navigate(live) || phase == Phase::Idle || phase > live {
            debug!("ViewSelector::request: rejected");
            return false;
        }
        self.requested = Some(phase);
        true
    }

    pub fn clear(&mut self) {
        self.requested = None;
    }

    pub fn requested(&self) -> Option<Phase> {
        self.requested
    }

    pub fn display_phase(&self, live: Phase) -> Phase {
        if Self::can_navigate(live) {
            self.requested.unwrap_or(live)
        } else {
            live
        }
    }
}
