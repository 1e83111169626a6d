//! Types for the timeline and composition plan.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::provider::Transition;

/// Kind of a timeline element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A scene clip on the video track.
    VideoClip,
    /// A narration utterance overlaid on the audio track.
    Narration,
}

/// One time-resolved element of the composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Element kind.
    pub kind: EntryKind,
    /// Scene this element belongs to.
    pub scene_index: usize,
    /// Source media file.
    pub source: PathBuf,
    /// Absolute start offset in seconds.
    pub start_secs: f64,
    /// Absolute end offset in seconds.
    pub end_secs: f64,
    /// Requested boundary transition (video entries only).
    #[serde(default)]
    pub transition: Transition,
    /// Spoken text (narration entries only), used for subtitles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl TimelineEntry {
    /// Element length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// Mismatch between summed clip durations and the expected total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DurationDiscrepancy {
    /// Sum of video clip durations.
    pub clip_total_secs: f64,
    /// Expected total duration.
    pub expected_secs: f64,
}

impl DurationDiscrepancy {
    /// Signed difference (positive = clips run long).
    pub fn delta_secs(&self) -> f64 {
        self.clip_total_secs - self.expected_secs
    }
}

/// The fully time-resolved plan mapping every clip and narration utterance
/// to absolute offsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// All entries: video clips first in scene order, then narration in
    /// scene order.
    pub entries: Vec<TimelineEntry>,
    /// Expected total duration (derived from the soundtrack upstream).
    pub total_duration_secs: f64,
    /// Set when the summed clip durations disagree with the expected total;
    /// the compositor corrects it by trimming or padding only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrepancy: Option<DurationDiscrepancy>,
}

impl Timeline {
    /// Video entries in order.
    pub fn video_entries(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::VideoClip)
    }

    /// Narration entries in order.
    pub fn narration_entries(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Narration)
    }

    /// Sum of video clip durations.
    pub fn clip_total_secs(&self) -> f64 {
        self.video_entries().map(TimelineEntry::duration_secs).sum()
    }
}

/// A narration clip handed off from the TTS stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationClip {
    /// Scene this narration was generated for.
    pub scene_index: usize,
    /// Audio file.
    pub path: PathBuf,
    /// Spoken text, carried into subtitles.
    pub text: String,
    /// Utterance duration in seconds.
    pub duration_secs: f64,
}

/// One subtitle cue, derived from a narration entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// 1-based cue index.
    pub index: usize,
    /// Cue start in seconds.
    pub start_secs: f64,
    /// Cue end in seconds (exclusive).
    pub end_secs: f64,
    /// Cue text.
    pub text: String,
}

/// Everything the compositor needs to produce the final file. Built once
/// from a completed timeline; consumed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionPlan {
    /// The time-resolved element plan.
    pub timeline: Timeline,
    /// Background track, looped/trimmed under the narration.
    pub background_track: Option<PathBuf>,
    /// Where the final file goes.
    pub output_path: PathBuf,
    /// Subtitle cues, one per narration entry.
    pub subtitles: Vec<SubtitleEntry>,
    /// Whether to burn the subtitles into the video stream.
    pub burn_subtitles: bool,
}

impl CompositionPlan {
    /// Builds a plan, deriving subtitle cues from the timeline's narration
    /// entries.
    pub fn new(
        timeline: Timeline,
        background_track: Option<PathBuf>,
        output_path: PathBuf,
    ) -> Self {
        let subtitles = timeline
            .narration_entries()
            .enumerate()
            .map(|(i, entry)| SubtitleEntry {
                index: i + 1,
                start_secs: entry.start_secs,
                end_secs: entry.end_secs,
                text: entry.text.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            timeline,
            background_track,
            output_path,
            subtitles,
            burn_subtitles: false,
        }
    }

    /// Requests subtitle burn-in during the mux step.
    pub fn with_burned_subtitles(mut self) -> Self {
        self.burn_subtitles = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(scene: usize, start: f64, end: f64) -> TimelineEntry {
        TimelineEntry {
            kind: EntryKind::VideoClip,
            scene_index: scene,
            source: PathBuf::from(format!("/clips/scene_{:03}.mp4", scene)),
            start_secs: start,
            end_secs: end,
            transition: Transition::Cut,
            text: None,
        }
    }

    fn narration(scene: usize, start: f64, end: f64, text: &str) -> TimelineEntry {
        TimelineEntry {
            kind: EntryKind::Narration,
            scene_index: scene,
            source: PathBuf::from(format!("/tts/n{}.mp3", scene)),
            start_secs: start,
            end_secs: end,
            transition: Transition::Cut,
            text: Some(text.to_string()),
        }
    }

    #[test]
    fn test_timeline_accessors() {
        let timeline = Timeline {
            entries: vec![
                video(0, 0.0, 8.0),
                video(1, 8.0, 16.0),
                narration(0, 0.0, 5.0, "hello"),
            ],
            total_duration_secs: 16.0,
            discrepancy: None,
        };

        assert_eq!(timeline.video_entries().count(), 2);
        assert_eq!(timeline.narration_entries().count(), 1);
        assert!((timeline.clip_total_secs() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_plan_derives_subtitles_from_narration() {
        let timeline = Timeline {
            entries: vec![
                video(0, 0.0, 8.0),
                narration(0, 0.0, 5.0, "first line"),
                narration(1, 8.0, 14.0, "second line"),
            ],
            total_duration_secs: 16.0,
            discrepancy: None,
        };

        let plan = CompositionPlan::new(
            timeline,
            Some(PathBuf::from("/music/bgm.mp3")),
            PathBuf::from("/out/final.mp4"),
        );

        assert_eq!(plan.subtitles.len(), 2);
        assert_eq!(plan.subtitles[0].index, 1);
        assert_eq!(plan.subtitles[0].text, "first line");
        assert_eq!(plan.subtitles[1].start_secs, 8.0);
        assert!(!plan.burn_subtitles);
        assert!(plan.with_burned_subtitles().burn_subtitles);
    }

    #[test]
    fn test_discrepancy_delta() {
        let d = DurationDiscrepancy {
            clip_total_secs: 42.0,
            expected_secs: 40.0,
        };
        assert!((d.delta_secs() - 2.0).abs() < 1e-9);
    }
}
