//! FFmpeg-based media engine implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, trace};

use super::config::CompositorConfig;
use super::error::CompositorError;
use super::traits::MediaEngine;
use super::types::{AudioMixSpec, ConcatClip, MediaInfo, PlaceholderSpec};

/// Tolerance below which concat output is passed through unadjusted.
const DURATION_EPSILON: f64 = 0.05;

/// Stderr lines kept for error reporting.
const STDERR_TAIL_LINES: usize = 64;

/// Fallback dimensions when the first clip cannot be probed.
const FALLBACK_RESOLUTION: (u32, u32) = (1920, 1080);

/// Escapes a string for use inside a single-quoted ffmpeg filter argument.
fn escape_filter_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "'\\''")
        .replace('%', "\\%")
}

/// FFmpeg-based implementation of [`MediaEngine`].
pub struct FfmpegEngine {
    config: CompositorConfig,
}

impl FfmpegEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CompositorConfig::default())
    }

    /// Builds ffmpeg arguments for a synthesized placeholder clip.
    fn build_placeholder_args(&self, spec: &PlaceholderSpec, dest: &Path) -> Vec<String> {
        let font_size = (spec.height / 22).max(24);
        let drawtext = format!(
            "drawtext=text='{}':fontcolor=white:fontsize={}:x=(w-text_w)/2:y=(h-text_h)/2",
            escape_filter_text(&spec.label),
            font_size
        );

        vec![
            "-y".to_string(),
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!(
                "color=c={}:s={}x{}:d={:.3}:r={}",
                spec.color, spec.width, spec.height, spec.duration_secs, spec.fps
            ),
            "-vf".to_string(),
            drawtext,
            "-t".to_string(),
            format!("{:.3}", spec.duration_secs),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "ultrafast".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
            dest.to_string_lossy().to_string(),
        ]
    }

    /// Builds ffmpeg arguments for the concatenation step.
    ///
    /// Every clip is normalized to the same geometry and frame rate, boundary
    /// fades are applied inside each clip's own time, and the concatenated
    /// stream is trimmed or last-frame-padded to exactly the target duration.
    fn build_concat_args(
        &self,
        clips: &[ConcatClip],
        target_duration_secs: f64,
        width: u32,
        height: u32,
        dest: &Path,
    ) -> Vec<String> {
        let mut args = vec!["-y".to_string()];
        for clip in clips {
            args.extend(["-i".to_string(), clip.path.to_string_lossy().to_string()]);
        }

        let mut filter = String::new();
        for (i, clip) in clips.iter().enumerate() {
            filter.push_str(&format!(
                "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}",
                i = i,
                w = width,
                h = height,
                fps = self.config.fps
            ));
            if clip.fade_in_secs > 0.0 {
                filter.push_str(&format!(",fade=t=in:st=0:d={:.3}", clip.fade_in_secs));
            }
            if clip.fade_out_secs > 0.0 {
                filter.push_str(&format!(
                    ",fade=t=out:st={:.3}:d={:.3}",
                    (clip.duration_secs - clip.fade_out_secs).max(0.0),
                    clip.fade_out_secs
                ));
            }
            filter.push_str(&format!("[v{}];", i));
        }
        for i in 0..clips.len() {
            filter.push_str(&format!("[v{}]", i));
        }
        filter.push_str(&format!("concat=n={}:v=1:a=0[vcat];", clips.len()));

        let clip_total: f64 = clips.iter().map(|c| c.duration_secs).sum();
        if clip_total > target_duration_secs + DURATION_EPSILON {
            filter.push_str(&format!(
                "[vcat]trim=0:{:.3},setpts=PTS-STARTPTS[vout]",
                target_duration_secs
            ));
        } else if clip_total < target_duration_secs - DURATION_EPSILON {
            filter.push_str(&format!(
                "[vcat]tpad=stop_mode=clone:stop_duration={:.3}[vout]",
                target_duration_secs - clip_total
            ));
        } else {
            filter.push_str("[vcat]null[vout]");
        }

        args.extend([
            "-filter_complex".to_string(),
            filter,
            "-map".to_string(),
            "[vout]".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "medium".to_string(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-an".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
            dest.to_string_lossy().to_string(),
        ]);

        args
    }

    /// Builds ffmpeg arguments for the audio assembly step.
    ///
    /// Input 0 is a silence bed of exactly the total duration; the background
    /// track (if any) is looped endlessly on input and trimmed back to the
    /// total, so both the shorter-than-total and longer-than-total cases
    /// reduce to one atrim.
    fn build_audio_args(&self, spec: &AudioMixSpec, dest: &Path) -> Vec<String> {
        let total = spec.total_duration_secs;
        let mut args = vec![
            "-y".to_string(),
            "-f".to_string(),
            "lavfi".to_string(),
            "-t".to_string(),
            format!("{:.3}", total),
            "-i".to_string(),
            "anullsrc=channel_layout=stereo:sample_rate=44100".to_string(),
        ];

        if let Some(bg) = &spec.background {
            args.extend([
                "-stream_loop".to_string(),
                "-1".to_string(),
                "-i".to_string(),
                bg.path.to_string_lossy().to_string(),
            ]);
        }
        for narration in &spec.narration {
            args.extend([
                "-i".to_string(),
                narration.path.to_string_lossy().to_string(),
            ]);
        }

        let mut filter = String::new();
        let mut mix_inputs = vec!["[0:a]".to_string()];
        let narration_base = if spec.background.is_some() { 2 } else { 1 };

        if let Some(bg) = &spec.background {
            filter.push_str(&format!(
                "[1:a]atrim=0:{:.3},asetpts=PTS-STARTPTS,volume={}dB[bg];",
                total, bg.gain_db
            ));
            mix_inputs.push("[bg]".to_string());
        }
        for (j, narration) in spec.narration.iter().enumerate() {
            let delay_ms = (narration.offset_secs * 1000.0).round() as u64;
            filter.push_str(&format!(
                "[{idx}:a]atrim=0:{max:.3},asetpts=PTS-STARTPTS,adelay={ms}:all=1[n{j}];",
                idx = narration_base + j,
                max = narration.max_duration_secs,
                ms = delay_ms,
                j = j
            ));
            mix_inputs.push(format!("[n{}]", j));
        }

        filter.push_str(&mix_inputs.concat());
        filter.push_str(&format!(
            "amix=inputs={}:duration=first:normalize=0[aout]",
            mix_inputs.len()
        ));

        args.extend([
            "-filter_complex".to_string(),
            filter,
            "-map".to_string(),
            "[aout]".to_string(),
            "-t".to_string(),
            format!("{:.3}", total),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "192k".to_string(),
            "-ar".to_string(),
            "44100".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
            dest.to_string_lossy().to_string(),
        ]);

        args
    }

    /// Builds ffmpeg arguments for the mux step.
    fn build_mux_args(
        &self,
        video: &Path,
        audio: &Path,
        subtitles: Option<&Path>,
        dest: &Path,
    ) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-i".to_string(),
            audio.to_string_lossy().to_string(),
        ];

        match subtitles {
            // Burning subtitles forces a re-encode of the video stream.
            Some(srt) => args.extend([
                "-vf".to_string(),
                format!(
                    "subtitles='{}'",
                    escape_filter_text(&srt.to_string_lossy())
                ),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-preset".to_string(),
                "medium".to_string(),
                "-crf".to_string(),
                self.config.crf.to_string(),
            ]),
            None => args.extend(["-c:v".to_string(), "copy".to_string()]),
        }

        args.extend([
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "192k".to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-shortest".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
            dest.to_string_lossy().to_string(),
        ]);

        args
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, CompositorError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| CompositorError::ParseError {
                reason: format!("failed to parse ffprobe output: {}", e),
            })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");
        let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            duration_secs,
            size_bytes,
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
        })
    }

    /// Runs ffmpeg with the given arguments, enforcing the step timeout and
    /// keeping a stderr tail for error reporting.
    async fn run_ffmpeg(&self, step: &'static str, args: &[String]) -> Result<(), CompositorError> {
        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CompositorError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    CompositorError::Io(e)
                }
            })?;

        let stderr = child.stderr.take().expect("stderr should be captured");
        let mut reader = BufReader::new(stderr).lines();
        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                if let Some(ref re) = time_regex {
                    if let Some(caps) = re.captures(&line) {
                        if let Some(ms) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok())
                        {
                            trace!(step, time_secs = ms / 1_000_000.0, "ffmpeg progress");
                        }
                        continue;
                    }
                }
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }

            let status = child.wait().await?;
            let tail: Vec<String> = tail.into_iter().collect();
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, tail.join("\n")))
        })
        .await;

        match result {
            Ok(Ok((status, stderr_tail))) => {
                if status.success() {
                    Ok(())
                } else {
                    Err(CompositorError::step_failed(
                        step,
                        format!("ffmpeg exited with code {:?}", status.code()),
                        if stderr_tail.is_empty() {
                            None
                        } else {
                            Some(stderr_tail)
                        },
                    ))
                }
            }
            Ok(Err(e)) => Err(CompositorError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                Err(CompositorError::Timeout {
                    step,
                    timeout_secs: self.config.timeout_secs,
                })
            }
        }
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, CompositorError> {
        if !path.exists() {
            return Err(CompositorError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CompositorError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    CompositorError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(CompositorError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn synthesize_clip(
        &self,
        spec: &PlaceholderSpec,
        dest: &Path,
    ) -> Result<(), CompositorError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let args = self.build_placeholder_args(spec, dest);
        self.run_ffmpeg("placeholder", &args).await
    }

    async fn concat_clips(
        &self,
        clips: &[ConcatClip],
        target_duration_secs: f64,
        dest: &Path,
    ) -> Result<(), CompositorError> {
        if clips.is_empty() {
            return Err(CompositorError::EmptyTimeline);
        }
        for clip in clips {
            if !clip.path.exists() {
                return Err(CompositorError::InputNotFound {
                    path: clip.path.clone(),
                });
            }
        }

        // All clips are normalized to the geometry of the first one.
        let (width, height) = match self.probe(&clips[0].path).await {
            Ok(info) => match (info.video_width, info.video_height) {
                (Some(w), Some(h)) => (w, h),
                _ => FALLBACK_RESOLUTION,
            },
            Err(_) => FALLBACK_RESOLUTION,
        };

        debug!(
            clips = clips.len(),
            target = target_duration_secs,
            width,
            height,
            "concatenating clips"
        );

        let args = self.build_concat_args(clips, target_duration_secs, width, height, dest);
        self.run_ffmpeg("concat", &args).await
    }

    async fn assemble_audio(
        &self,
        spec: &AudioMixSpec,
        dest: &Path,
    ) -> Result<(), CompositorError> {
        if let Some(bg) = &spec.background {
            if !bg.path.exists() {
                return Err(CompositorError::InputNotFound {
                    path: bg.path.clone(),
                });
            }
        }
        for narration in &spec.narration {
            if !narration.path.exists() {
                return Err(CompositorError::InputNotFound {
                    path: narration.path.clone(),
                });
            }
        }

        let args = self.build_audio_args(spec, dest);
        self.run_ffmpeg("audio", &args).await
    }

    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        subtitles: Option<&Path>,
        dest: &Path,
    ) -> Result<(), CompositorError> {
        let args = self.build_mux_args(video, audio, subtitles, dest);
        self.run_ffmpeg("mux", &args).await
    }

    async fn validate(&self) -> Result<(), CompositorError> {
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(CompositorError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(CompositorError::Io(e));
        }

        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(CompositorError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(CompositorError::Io(e));
        }

        tokio::fs::create_dir_all(&self.config.temp_dir).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::types::{BackgroundMix, NarrationMix};
    use std::path::PathBuf;

    fn engine() -> FfmpegEngine {
        FfmpegEngine::with_defaults()
    }

    fn clip(path: &str, duration: f64) -> ConcatClip {
        ConcatClip {
            path: PathBuf::from(path),
            duration_secs: duration,
            fade_in_secs: 0.0,
            fade_out_secs: 0.0,
        }
    }

    #[test]
    fn test_escape_filter_text() {
        assert_eq!(escape_filter_text("Scene 3"), "Scene 3");
        assert_eq!(escape_filter_text("it's"), "it'\\''s");
        assert_eq!(escape_filter_text("100%"), "100\\%");
        assert_eq!(escape_filter_text("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_build_placeholder_args() {
        let spec = PlaceholderSpec {
            label: "Scene 1".to_string(),
            duration_secs: 8.0,
            width: 1920,
            height: 1080,
            fps: 30,
            color: "0x1e2430".to_string(),
        };
        let args = engine().build_placeholder_args(&spec, Path::new("/tmp/out.mp4"));

        assert!(args.contains(&"lavfi".to_string()));
        assert!(args
            .iter()
            .any(|a| a.contains("color=c=0x1e2430:s=1920x1080:d=8.000:r=30")));
        assert!(args.iter().any(|a| a.contains("drawtext=text='Scene 1'")));
        assert!(args.contains(&"ultrafast".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
    }

    #[test]
    fn test_build_concat_args_plain_cut() {
        let clips = vec![clip("/c/a.mp4", 8.0), clip("/c/b.mp4", 8.0)];
        let args = engine().build_concat_args(&clips, 16.0, 1920, 1080, Path::new("/tmp/v.mp4"));

        let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(filter.contains("concat=n=2:v=1:a=0"));
        // Totals match: no trim, no pad.
        assert!(filter.contains("[vcat]null[vout]"));
        assert!(!filter.contains("fade="));
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_build_concat_args_trims_excess() {
        let clips = vec![clip("/c/a.mp4", 8.0), clip("/c/b.mp4", 8.0)];
        let args = engine().build_concat_args(&clips, 14.0, 1920, 1080, Path::new("/tmp/v.mp4"));
        let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(filter.contains("trim=0:14.000"));
        assert!(!filter.contains("tpad"));
    }

    #[test]
    fn test_build_concat_args_pads_shortfall_with_held_frame() {
        let clips = vec![clip("/c/a.mp4", 8.0), clip("/c/b.mp4", 8.0)];
        let args = engine().build_concat_args(&clips, 20.0, 1920, 1080, Path::new("/tmp/v.mp4"));
        let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(filter.contains("tpad=stop_mode=clone:stop_duration=4.000"));
        assert!(!filter.contains("trim=0:"));
    }

    #[test]
    fn test_build_concat_args_boundary_fades_stay_inside_clip_time() {
        let mut clips = vec![clip("/c/a.mp4", 8.0), clip("/c/b.mp4", 8.0)];
        clips[0].fade_out_secs = 0.5;
        clips[1].fade_in_secs = 0.5;
        let args = engine().build_concat_args(&clips, 16.0, 1920, 1080, Path::new("/tmp/v.mp4"));
        let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        // Fade out starts inside the first clip, fade in at the head of the second.
        assert!(filter.contains("fade=t=out:st=7.500:d=0.500"));
        assert!(filter.contains("fade=t=in:st=0:d=0.500"));
        // Fades never change the summed duration.
        assert!(filter.contains("[vcat]null[vout]"));
    }

    #[test]
    fn test_build_audio_args_silence_only() {
        let spec = AudioMixSpec {
            total_duration_secs: 40.0,
            background: None,
            narration: vec![],
        };
        let args = engine().build_audio_args(&spec, Path::new("/tmp/a.m4a"));
        let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(args.iter().any(|a| a.contains("anullsrc")));
        assert!(filter.contains("amix=inputs=1:duration=first:normalize=0"));
        assert!(args.contains(&"192k".to_string()));
    }

    #[test]
    fn test_build_audio_args_background_loop_and_trim() {
        // 25 s background under a 40 s video: looped on input, trimmed to 40 s.
        let spec = AudioMixSpec {
            total_duration_secs: 40.0,
            background: Some(BackgroundMix {
                path: PathBuf::from("/music/track.mp3"),
                gain_db: -10.0,
            }),
            narration: vec![],
        };
        let args = engine().build_audio_args(&spec, Path::new("/tmp/a.m4a"));

        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        assert_eq!(args[loop_pos + 1], "-1");

        let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(filter.contains("[1:a]atrim=0:40.000"));
        assert!(filter.contains("volume=-10dB"));
        assert!(filter.contains("amix=inputs=2:duration=first:normalize=0"));
    }

    #[test]
    fn test_build_audio_args_narration_offsets() {
        let spec = AudioMixSpec {
            total_duration_secs: 40.0,
            background: Some(BackgroundMix {
                path: PathBuf::from("/music/track.mp3"),
                gain_db: -10.0,
            }),
            narration: vec![
                NarrationMix {
                    path: PathBuf::from("/tts/n0.mp3"),
                    offset_secs: 0.0,
                    max_duration_secs: 8.0,
                },
                NarrationMix {
                    path: PathBuf::from("/tts/n1.mp3"),
                    offset_secs: 8.0,
                    max_duration_secs: 8.0,
                },
            ],
        };
        let args = engine().build_audio_args(&spec, Path::new("/tmp/a.m4a"));
        let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];

        // Narration inputs sit after silence (0) and background (1).
        assert!(filter.contains("[2:a]atrim=0:8.000,asetpts=PTS-STARTPTS,adelay=0:all=1[n0]"));
        assert!(filter.contains("[3:a]atrim=0:8.000,asetpts=PTS-STARTPTS,adelay=8000:all=1[n1]"));
        assert!(filter.contains("amix=inputs=4:duration=first:normalize=0"));
    }

    #[test]
    fn test_build_mux_args_copies_video_without_subtitles() {
        let args = engine().build_mux_args(
            Path::new("/tmp/v.mp4"),
            Path::new("/tmp/a.m4a"),
            None,
            Path::new("/out/final.mp4"),
        );
        let copy_pos = args.iter().position(|a| a == "-c:v").unwrap();
        assert_eq!(args[copy_pos + 1], "copy");
        assert!(args.contains(&"-shortest".to_string()));
        assert!(args.contains(&"0:v:0".to_string()));
        assert!(args.contains(&"1:a:0".to_string()));
    }

    #[test]
    fn test_build_mux_args_burning_subtitles_reencodes() {
        let args = engine().build_mux_args(
            Path::new("/tmp/v.mp4"),
            Path::new("/tmp/a.m4a"),
            Some(Path::new("/out/final.srt")),
            Path::new("/out/final.mp4"),
        );
        assert!(args.iter().any(|a| a.contains("subtitles='/out/final.srt'")));
        let codec_pos = args.iter().position(|a| a == "-c:v").unwrap();
        assert_eq!(args[codec_pos + 1], "libx264");
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "format": {
                "filename": "clip.mp4",
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                "duration": "8.04",
                "size": "1500000"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac"
                }
            ]
        }"#;

        let info = FfmpegEngine::parse_probe_output(Path::new("clip.mp4"), json).unwrap();
        assert_eq!(info.format, "mov");
        assert!((info.duration_secs - 8.04).abs() < 0.001);
        assert_eq!(info.video_codec, Some("h264".to_string()));
        assert_eq!(info.video_width, Some(1920));
        assert_eq!(info.audio_codec, Some("aac".to_string()));
    }

    #[test]
    fn test_parse_probe_output_invalid_json() {
        let result = FfmpegEngine::parse_probe_output(Path::new("x.mp4"), "not json");
        assert!(matches!(result, Err(CompositorError::ParseError { .. })));
    }
}
