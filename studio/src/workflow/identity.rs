//! Session identity handed from the planning phase to the execution phase

use tracing::{debug, warn};

/// Values produced during planning that the execution request needs
///
/// Written only by planning-side inputs, each at most once per session.
/// Read when the execution request is built. Cleared on reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    planning_session_id: Option<String>,
    trimmed_audio_path: Option<String>,
}

impl SessionIdentity {
    pub fn planning_session_id(&self) -> Option<&str> {
        self.planning_session_id.as_deref()
    }

    pub fn trimmed_audio_path(&self) -> Option<&str> {
        self.trimmed_audio_path.as_deref()
    }

    /// Record the planning session id; returns false if one is already set
    pub fn assign_planning_session(&mut self, session_id: impl Into<String>) -> bool {
        let session_id = session_id.into();
        debug!(%session_id, "SessionIdentity::assign_planning_session: called");
        if let Some(existing) = &self.planning_session_id {
            warn!(%existing, %session_id, "planning session id already assigned, keeping the first");
            return false;
        }
        self.planning_session_id = Some(session_id);
        true
    }

    /// Record the trimmed audio reference; returns false if one is already set
    pub fn record_trimmed_audio(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        debug!(%path, "SessionIdentity::record_trimmed_audio: called");
        if self.trimmed_audio_path.is_some() {
            warn!(%path, "trimmed audio already recorded, keeping the first");
            return false;
        }
        self.trimmed_audio_path = Some(path);
        true
    }

    pub fn clear(&mut self) {
        debug!("SessionIdentity::clear: called");
        self.planning_session_id = None;
        self.trimmed_audio_path = None;
    }

    pub fn is_empty(&self) -> bool {
        self.planning_session_id.is_none() && self.trimmed_audio_path.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_once() {
        let mut identity = SessionIdentity::default();
        assert!(identity.assign_planning_session("s-1"));
        assert!(!identity.assign_planning_session("s-2"));
        assert_eq!(identity.planning_session_id(), Some("s-1"));

        assert!(identity.record_trimmed_audio("http://localhost:5000/audio/s-1_trimmed.mp3"));
        assert!(!identity.record_trimmed_audio("other"));
        assert_eq!(
            identity.trimmed_audio_path(),
            Some("http://localhost:5000/audio/s-1_trimmed.mp3")
        );
    }

    #[test]
    fn test_clear() {
        let mut identity = SessionIdentity::default();
        identity.assign_planning_session("s-1");
        identity.record_trimmed_audio("a.mp3");
        identity.clear();
        assert!(identity.is_empty());
        assert!(identity.assign_planning_session("s-2"));
    }
}
