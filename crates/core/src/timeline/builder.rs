//! Timeline construction.
//!
//! A pure function from ordered scene results plus narration clips to an
//! absolute-offset timeline. Deterministic: the same inputs always produce
//! the same offsets.

use std::collections::HashSet;
use tracing::debug;

use crate::fallback::SceneResult;

use super::types::{
    DurationDiscrepancy, EntryKind, NarrationClip, Timeline, TimelineEntry,
};

/// Differences under this threshold are treated as equal.
const DURATION_EPSILON: f64 = 0.05;

/// Builds the timeline for a completed set of scene results.
///
/// Video entries are laid out at running cumulative offsets of the measured
/// clip durations; clips are never re-ordered or re-timed. Narration is
/// placed at its scene's start offset and clipped to the scene's end. When
/// the summed clip durations disagree with `total_duration_secs` the
/// timeline carries a discrepancy flag; the compositor corrects the final
/// track by trimming or padding only.
pub fn build(
    scene_results: &[SceneResult],
    narration_clips: &[NarrationClip],
    total_duration_secs: f64,
) -> Timeline {
    let mut results: Vec<&SceneResult> = scene_results.iter().collect();
    results.sort_by_key(|r| r.scene_index);

    let mut entries = Vec::with_capacity(results.len() + narration_clips.len());
    let mut cursor = 0.0f64;
    for result in &results {
        let start = cursor;
        let end = start + result.duration_secs;
        entries.push(TimelineEntry {
            kind: EntryKind::VideoClip,
            scene_index: result.scene_index,
            source: result.clip_path.clone(),
            start_secs: start,
            end_secs: end,
            transition: result.transition,
            text: None,
        });
        cursor = end;
    }
    let clip_total = cursor;

    let mut narration: Vec<&NarrationClip> = narration_clips.iter().collect();
    narration.sort_by_key(|n| n.scene_index);
    let mut placed: HashSet<usize> = HashSet::new();

    let video_entries: Vec<(usize, f64, f64)> = entries
        .iter()
        .map(|e| (e.scene_index, e.start_secs, e.end_secs))
        .collect();

    for clip in narration {
        if !placed.insert(clip.scene_index) {
            debug!(
                scene = clip.scene_index,
                "scene already has narration, ignoring extra clip"
            );
            continue;
        }
        let Some((_, scene_start, scene_end)) = video_entries
            .iter()
            .find(|(idx, _, _)| *idx == clip.scene_index)
            .copied()
        else {
            debug!(
                scene = clip.scene_index,
                "narration references unknown scene, ignoring"
            );
            continue;
        };

        // Narration is scoped to its scene: it starts with the scene and
        // never runs past the scene's end.
        let start = scene_start;
        let end = (start + clip.duration_secs).min(scene_end);
        entries.push(TimelineEntry {
            kind: EntryKind::Narration,
            scene_index: clip.scene_index,
            source: clip.path.clone(),
            start_secs: start,
            end_secs: end,
            transition: Default::default(),
            text: Some(clip.text.clone()),
        });
    }

    let discrepancy = if (clip_total - total_duration_secs).abs() > DURATION_EPSILON {
        Some(DurationDiscrepancy {
            clip_total_secs: clip_total,
            expected_secs: total_duration_secs,
        })
    } else {
        None
    };

    Timeline {
        entries,
        total_duration_secs,
        discrepancy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scene(index: usize, duration: f64) -> SceneResult {
        SceneResult {
            scene_index: index,
            provider: "test".to_string(),
            clip_path: PathBuf::from(format!("/clips/scene_{:03}.mp4", index)),
            duration_secs: duration,
            used_fallback: false,
            transition: Default::default(),
            attempts: vec![],
        }
    }

    fn narration(index: usize, duration: f64) -> NarrationClip {
        NarrationClip {
            scene_index: index,
            path: PathBuf::from(format!("/tts/narration_{:03}.mp3", index)),
            text: format!("line {}", index),
            duration_secs: duration,
        }
    }

    #[test]
    fn test_five_scenes_cumulative_offsets() {
        // 5 scenes of 8s each: entries at [0-8, 8-16, 16-24, 24-32, 32-40].
        let results: Vec<SceneResult> = (0..5).map(|i| scene(i, 8.0)).collect();
        let timeline = build(&results, &[], 40.0);

        let video: Vec<_> = timeline.video_entries().collect();
        assert_eq!(video.len(), 5);
        for (i, entry) in video.iter().enumerate() {
            assert!((entry.start_secs - 8.0 * i as f64).abs() < 1e-9);
            assert!((entry.end_secs - 8.0 * (i + 1) as f64).abs() < 1e-9);
        }
        assert!(timeline.discrepancy.is_none());
    }

    #[test]
    fn test_results_are_ordered_by_scene_index() {
        // Arrival order must not matter.
        let results = vec![scene(3, 8.0), scene(0, 8.0), scene(2, 8.0), scene(1, 8.0)];
        let timeline = build(&results, &[], 32.0);

        let indices: Vec<usize> = timeline.video_entries().map(|e| e.scene_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        let first = timeline.video_entries().next().unwrap();
        assert_eq!(first.start_secs, 0.0);
    }

    #[test]
    fn test_narration_clipped_to_scene_end() {
        // Scene 1 covers 8-16s; a 9s narration must end at 16s, not 17s.
        let results: Vec<SceneResult> = (0..3).map(|i| scene(i, 8.0)).collect();
        let timeline = build(&results, &[narration(1, 9.0)], 24.0);

        let entry = timeline.narration_entries().next().unwrap();
        assert!((entry.start_secs - 8.0).abs() < 1e-9);
        assert!((entry.end_secs - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_narration_keeps_its_own_length() {
        let results: Vec<SceneResult> = (0..2).map(|i| scene(i, 8.0)).collect();
        let timeline = build(&results, &[narration(0, 5.5)], 16.0);

        let entry = timeline.narration_entries().next().unwrap();
        assert!((entry.end_secs - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_narration_for_scene_is_ignored() {
        let results = vec![scene(0, 8.0)];
        let clips = vec![narration(0, 4.0), narration(0, 6.0)];
        let timeline = build(&results, &clips, 8.0);

        assert_eq!(timeline.narration_entries().count(), 1);
        let entry = timeline.narration_entries().next().unwrap();
        assert!((entry.end_secs - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_narration_for_unknown_scene_is_ignored() {
        let results = vec![scene(0, 8.0)];
        let timeline = build(&results, &[narration(9, 4.0)], 8.0);
        assert_eq!(timeline.narration_entries().count(), 0);
    }

    #[test]
    fn test_discrepancy_flagged_not_corrected() {
        // Clips sum to 36s against an expected 40s total: flagged, offsets
        // untouched.
        let results: Vec<SceneResult> = (0..4).map(|i| scene(i, 9.0)).collect();
        let timeline = build(&results, &[], 40.0);

        let discrepancy = timeline.discrepancy.expect("discrepancy expected");
        assert!((discrepancy.clip_total_secs - 36.0).abs() < 1e-9);
        assert!((discrepancy.expected_secs - 40.0).abs() < 1e-9);
        assert!((discrepancy.delta_secs() + 4.0).abs() < 1e-9);

        let last = timeline.video_entries().last().unwrap();
        assert!((last.end_secs - 36.0).abs() < 1e-9);
        assert_eq!(timeline.total_duration_secs, 40.0);
    }

    #[test]
    fn test_tiny_drift_is_not_flagged() {
        let results = vec![scene(0, 8.01), scene(1, 8.0)];
        let timeline = build(&results, &[], 16.0);
        assert!(timeline.discrepancy.is_none());
    }

    #[test]
    fn test_build_is_deterministic() {
        let results: Vec<SceneResult> = (0..5).map(|i| scene(i, 7.5 + i as f64 * 0.1)).collect();
        let clips = vec![narration(1, 6.0), narration(3, 9.0)];

        let a = build(&results, &clips, 40.0);
        let b = build(&results, &clips, 40.0);

        let offsets = |t: &Timeline| -> Vec<(f64, f64)> {
            t.entries.iter().map(|e| (e.start_secs, e.end_secs)).collect()
        };
        assert_eq!(offsets(&a), offsets(&b));
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
