//! Music candidates and the final track selection

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A track suggested by the music planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicTrack {
    pub track_name: String,
    pub artist_name: String,
    #[serde(default)]
    pub vibe: String,
    #[serde(default)]
    pub reasoning: String,
}

/// Candidate tracks with the planner's reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicCandidates {
    #[serde(default)]
    pub thought_process: String,
    pub tracks: Vec<MusicTrack>,
}

/// Final music decision, including the trimmed segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalMusicSelection {
    #[serde(default)]
    pub thought_process: String,
    pub selected_track_filename: String,
    pub start_time_seconds: f64,
    pub end_time_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trimmed_audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trimmed_duration_seconds: Option<f64>,
}

impl FinalMusicSelection {
    /// Length of the selected segment
    ///
    /// Prefers the measured duration of the trimmed file over the requested
    /// window.
    pub fn segment_seconds(&self) -> f64 {
        self.trimmed_duration_seconds
            .unwrap_or((self.end_time_seconds - self.start_time_seconds).max(0.0))
    }

    /// Track name without the file extension, as shown next to candidates
    pub fn track_stem(&self) -> &str {
        self.selected_track_filename
            .strip_suffix(".mp3")
            .unwrap_or(&self.selected_track_filename)
    }
}

/// Duration of each downloaded track keyed by filename
///
/// A `None` value means the backend could not measure that file.
pub type TrackDurations = BTreeMap<String, Option<f64>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_without_trim() {
        let sel: FinalMusicSelection = serde_json::from_value(serde_json::json!({
            "thought_process": "drop hits at 10s",
            "selected_track_filename": "beat.mp3",
            "start_time_seconds": 10,
            "end_time_seconds": 25
        }))
        .unwrap();
        assert_eq!(sel.trimmed_audio_url, None);
        assert_eq!(sel.segment_seconds(), 15.0);
        assert_eq!(sel.track_stem(), "beat");
    }

    #[test]
    fn test_selection_prefers_trimmed_duration() {
        let sel: FinalMusicSelection = serde_json::from_value(serde_json::json!({
            "selected_track_filename": "audio_2.mp3",
            "start_time_seconds": 0,
            "end_time_seconds": 30,
            "trimmed_audio_url": "http://localhost:5000/audio/abc_trimmed.mp3",
            "trimmed_duration_seconds": 29.4
        }))
        .unwrap();
        assert_eq!(sel.segment_seconds(), 29.4);
    }

    #[test]
    fn test_track_durations_allow_unknown() {
        let durations: TrackDurations =
            serde_json::from_value(serde_json::json!({"audio_1.mp3": 182.5, "audio_2.mp3": null})).unwrap();
        assert_eq!(durations.get("audio_1.mp3"), Some(&Some(182.5)));
        assert_eq!(durations.get("audio_2.mp3"), Some(&None));
    }
}
