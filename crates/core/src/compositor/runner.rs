//! Composition pipeline driver.
//!
//! Executes a [`CompositionPlan`] in three idempotent steps - video
//! concatenation, audio assembly, mux - inside a per-run temp directory
//! that is removed on every exit path. A mux failure deletes any partial
//! output; no silent partial file is ever left behind.
//!
//! [`CompositionPlan`]: crate::timeline::CompositionPlan

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::metrics;
use crate::timeline::{CompositionPlan, SubtitleEntry, TimelineEntry};

use super::config::CompositorConfig;
use super::error::CompositorError;
use super::traits::MediaEngine;
use super::types::{
    AudioMixSpec, BackgroundMix, CompositionOutput, ConcatClip, NarrationMix,
};

/// Formats seconds as an SRT timestamp (HH:MM:SS,mmm).
fn format_srt_timestamp(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Renders subtitle cues as an SRT document.
fn render_srt(entries: &[SubtitleEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            entry.index,
            format_srt_timestamp(entry.start_secs),
            format_srt_timestamp(entry.end_secs),
            entry.text
        ));
    }
    out
}

/// Derives the concat step input from the plan's video entries, pairing
/// boundary fades where both adjacent clips request a non-cut transition.
/// Half of the fade is carved from each side, never exceeding half a clip.
fn concat_clips_from(video_entries: &[&TimelineEntry], transition_secs: f64) -> Vec<ConcatClip> {
    let fade_total = transition_secs.clamp(0.0, 1.0);
    let mut clips: Vec<ConcatClip> = video_entries
        .iter()
        .map(|e| ConcatClip {
            path: e.source.clone(),
            duration_secs: e.duration_secs(),
            fade_in_secs: 0.0,
            fade_out_secs: 0.0,
        })
        .collect();

    for i in 0..clips.len().saturating_sub(1) {
        let left = video_entries[i];
        let right = video_entries[i + 1];
        if left.transition.is_cut() || right.transition.is_cut() {
            continue;
        }
        let half = (fade_total / 2.0)
            .min(clips[i].duration_secs / 2.0)
            .min(clips[i + 1].duration_secs / 2.0);
        if half <= 0.0 {
            continue;
        }
        clips[i].fade_out_secs = half;
        clips[i + 1].fade_in_secs = half;
    }

    clips
}

/// Derives the audio step input from the plan.
fn audio_mix_from(plan: &CompositionPlan, background_gain_db: f64) -> AudioMixSpec {
    AudioMixSpec {
        total_duration_secs: plan.timeline.total_duration_secs,
        background: plan.background_track.as_ref().map(|path| BackgroundMix {
            path: path.clone(),
            gain_db: background_gain_db,
        }),
        narration: plan
            .timeline
            .narration_entries()
            .map(|e| NarrationMix {
                path: e.source.clone(),
                offset_secs: e.start_secs,
                max_duration_secs: e.duration_secs(),
            })
            .collect(),
    }
}

/// Executes composition plans against a media engine.
pub struct Compositor<E: MediaEngine> {
    config: CompositorConfig,
    engine: Arc<E>,
}

impl<E: MediaEngine + 'static> Compositor<E> {
    /// Creates a new compositor.
    pub fn new(config: CompositorConfig, engine: Arc<E>) -> Self {
        Self { config, engine }
    }

    /// Runs the full composition. Temp files are cleaned up on success,
    /// failure and cancellation alike; on failure any partial output file
    /// is removed.
    pub async fn compose(
        &self,
        plan: &CompositionPlan,
    ) -> Result<CompositionOutput, CompositorError> {
        if plan.timeline.video_entries().next().is_none() {
            return Err(CompositorError::EmptyTimeline);
        }

        let temp_dir = self
            .config
            .temp_dir
            .join(format!("compose-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&temp_dir).await?;

        let result = self.execute(plan, &temp_dir).await;

        let _ = tokio::fs::remove_dir_all(&temp_dir).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&plan.output_path).await;
        }

        result
    }

    async fn execute(
        &self,
        plan: &CompositionPlan,
        temp_dir: &Path,
    ) -> Result<CompositionOutput, CompositorError> {
        let total = plan.timeline.total_duration_secs;
        if let Some(discrepancy) = &plan.timeline.discrepancy {
            warn!(
                clip_total = discrepancy.clip_total_secs,
                expected = discrepancy.expected_secs,
                "clip durations disagree with expected total, output will be trimmed/padded"
            );
        }

        // Step 1: video concatenation, trimmed/padded to the expected total.
        let video_entries: Vec<&TimelineEntry> = plan.timeline.video_entries().collect();
        let clips = concat_clips_from(&video_entries, self.config.transition_secs);
        let video_path = temp_dir.join("video.mp4");
        let step_start = Instant::now();
        self.engine
            .concat_clips(&clips, total, &video_path)
            .await?;
        metrics::COMPOSE_STEP_DURATION
            .with_label_values(&["concat"])
            .observe(step_start.elapsed().as_secs_f64());

        // Step 2: one flat audio track of exactly the total duration.
        let mix = audio_mix_from(plan, self.config.background_gain_db);
        let audio_path = temp_dir.join("audio.m4a");
        let step_start = Instant::now();
        self.engine.assemble_audio(&mix, &audio_path).await?;
        metrics::COMPOSE_STEP_DURATION
            .with_label_values(&["audio"])
            .observe(step_start.elapsed().as_secs_f64());

        if let Some(parent) = plan.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Subtitles double as a deliverable sidecar and the burn-in input.
        let subtitle_path = if plan.subtitles.is_empty() {
            None
        } else {
            let path = plan.output_path.with_extension("srt");
            tokio::fs::write(&path, render_srt(&plan.subtitles)).await?;
            Some(path)
        };

        // Step 3: mux, truncating to the shorter stream.
        let burn = if plan.burn_subtitles {
            subtitle_path.as_deref()
        } else {
            None
        };
        let step_start = Instant::now();
        self.engine
            .mux(&video_path, &audio_path, burn, &plan.output_path)
            .await?;
        metrics::COMPOSE_STEP_DURATION
            .with_label_values(&["mux"])
            .observe(step_start.elapsed().as_secs_f64());

        let timeline_path = plan.output_path.with_extension("timeline.json");
        let timeline_json = serde_json::to_vec_pretty(&plan.timeline)
            .expect("timeline serialization cannot fail");
        tokio::fs::write(&timeline_path, timeline_json).await?;

        let duration_secs = self
            .engine
            .probe(&plan.output_path)
            .await
            .ok()
            .map(|info| info.duration_secs);

        info!(
            output = %plan.output_path.display(),
            duration = ?duration_secs,
            "composition complete"
        );

        Ok(CompositionOutput {
            output_path: plan.output_path.clone(),
            duration_secs,
            subtitle_path,
            timeline_path: Some(timeline_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Transition;
    use crate::timeline::{EntryKind, Timeline};
    use std::path::PathBuf;

    fn video_entry(scene: usize, start: f64, end: f64, transition: Transition) -> TimelineEntry {
        TimelineEntry {
            kind: EntryKind::VideoClip,
            scene_index: scene,
            source: PathBuf::from(format!("/clips/scene_{:03}.mp4", scene)),
            start_secs: start,
            end_secs: end,
            transition,
            text: None,
        }
    }

    #[test]
    fn test_format_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(5.5), "00:00:05,500");
        assert_eq!(format_srt_timestamp(65.025), "00:01:05,025");
        assert_eq!(format_srt_timestamp(3661.0), "01:01:01,000");
    }

    #[test]
    fn test_render_srt() {
        let entries = vec![
            SubtitleEntry {
                index: 1,
                start_secs: 0.0,
                end_secs: 5.0,
                text: "first line".to_string(),
            },
            SubtitleEntry {
                index: 2,
                start_secs: 8.0,
                end_secs: 16.0,
                text: "second line".to_string(),
            },
        ];
        let srt = render_srt(&entries);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:05,000\nfirst line\n\n"));
        assert!(srt.contains("2\n00:00:08,000 --> 00:00:16,000\nsecond line\n\n"));
    }

    #[test]
    fn test_concat_clips_no_fades_for_cuts() {
        let entries = vec![
            video_entry(0, 0.0, 8.0, Transition::Cut),
            video_entry(1, 8.0, 16.0, Transition::Cut),
        ];
        let refs: Vec<&TimelineEntry> = entries.iter().collect();
        let clips = concat_clips_from(&refs, 1.0);
        assert_eq!(clips[0].fade_out_secs, 0.0);
        assert_eq!(clips[1].fade_in_secs, 0.0);
    }

    #[test]
    fn test_concat_clips_fade_needs_both_sides() {
        let entries = vec![
            video_entry(0, 0.0, 8.0, Transition::Fade),
            video_entry(1, 8.0, 16.0, Transition::Cut),
        ];
        let refs: Vec<&TimelineEntry> = entries.iter().collect();
        let clips = concat_clips_from(&refs, 1.0);
        assert_eq!(clips[0].fade_out_secs, 0.0);
        assert_eq!(clips[1].fade_in_secs, 0.0);
    }

    #[test]
    fn test_concat_clips_pairs_boundary_fades() {
        let entries = vec![
            video_entry(0, 0.0, 8.0, Transition::Fade),
            video_entry(1, 8.0, 16.0, Transition::Crossfade),
            video_entry(2, 16.0, 24.0, Transition::Cut),
        ];
        let refs: Vec<&TimelineEntry> = entries.iter().collect();
        let clips = concat_clips_from(&refs, 1.0);

        // Half a second carved from each side of the 0/1 boundary.
        assert!((clips[0].fade_out_secs - 0.5).abs() < 1e-9);
        assert!((clips[1].fade_in_secs - 0.5).abs() < 1e-9);
        // Boundary 1/2 stays a hard cut.
        assert_eq!(clips[1].fade_out_secs, 0.0);
        assert_eq!(clips[2].fade_in_secs, 0.0);
        // Durations are untouched by fades.
        let total: f64 = clips.iter().map(|c| c.duration_secs).sum();
        assert!((total - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_concat_clips_fade_clamped_for_short_clips() {
        let entries = vec![
            video_entry(0, 0.0, 0.6, Transition::Fade),
            video_entry(1, 0.6, 8.6, Transition::Fade),
        ];
        let refs: Vec<&TimelineEntry> = entries.iter().collect();
        let clips = concat_clips_from(&refs, 1.0);
        // Limited by half of the 0.6s clip.
        assert!((clips[0].fade_out_secs - 0.3).abs() < 1e-9);
        assert!((clips[1].fade_in_secs - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_audio_mix_from_plan() {
        let timeline = Timeline {
            entries: vec![
                video_entry(0, 0.0, 8.0, Transition::Cut),
                TimelineEntry {
                    kind: EntryKind::Narration,
                    scene_index: 0,
                    source: PathBuf::from("/tts/n0.mp3"),
                    start_secs: 0.0,
                    end_secs: 5.0,
                    transition: Transition::Cut,
                    text: Some("hello".to_string()),
                },
            ],
            total_duration_secs: 8.0,
            discrepancy: None,
        };
        let plan = CompositionPlan::new(
            timeline,
            Some(PathBuf::from("/music/bgm.mp3")),
            PathBuf::from("/out/final.mp4"),
        );

        let mix = audio_mix_from(&plan, -10.0);
        assert_eq!(mix.total_duration_secs, 8.0);
        let bg = mix.background.expect("background expected");
        assert_eq!(bg.gain_db, -10.0);
        assert_eq!(mix.narration.len(), 1);
        assert_eq!(mix.narration[0].offset_secs, 0.0);
        assert!((mix.narration[0].max_duration_secs - 5.0).abs() < 1e-9);
    }
}
