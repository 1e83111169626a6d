//! reelforge - render a music video from a scene script.
//!
//! Usage: `reelforge <request.json>`
//!
//! The request file carries the hand-off records from the upstream script
//! and TTS stages: ordered scene descriptors, narration clips, a background
//! track and the output path. Configuration comes from `config.toml` (or
//! `$REELFORGE_CONFIG`) with `REELFORGE_`-prefixed environment overrides.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelforge_core::{
    load_config, timeline, validate_config, AspectRatio, CompositionPlan, Compositor, Config,
    FallbackCoordinator, FfmpegEngine, GenerationRequest, MediaEngine, NarrationClip,
    PiapiProvider, PlaceholderProvider, ProviderAdapter, RunContext, SceneOrchestrator,
    Transition, VeoProvider,
};

/// One scene descriptor from the script stage.
#[derive(Debug, Clone, Deserialize)]
struct SceneSpec {
    index: usize,
    prompt: String,
    duration_secs: f64,
    #[serde(default)]
    mood: Option<String>,
    #[serde(default)]
    transition: Transition,
    #[serde(default)]
    character_reference: Option<String>,
}

/// One narration record from the TTS stage.
#[derive(Debug, Clone, Deserialize)]
struct NarrationSpec {
    scene_index: usize,
    path: PathBuf,
    #[serde(default)]
    text: String,
    duration_secs: f64,
}

/// The full render request.
#[derive(Debug, Clone, Deserialize)]
struct RenderRequest {
    #[serde(default)]
    title: Option<String>,
    scenes: Vec<SceneSpec>,
    #[serde(default)]
    narration: Vec<NarrationSpec>,
    #[serde(default)]
    background_track: Option<PathBuf>,
    #[serde(default)]
    total_duration_secs: Option<f64>,
    output: PathBuf,
    #[serde(default)]
    aspect_ratio: AspectRatio,
    #[serde(default)]
    burn_subtitles: bool,
}

impl RenderRequest {
    fn to_generation_requests(&self) -> Vec<GenerationRequest> {
        let mut scenes = self.scenes.clone();
        scenes.sort_by_key(|s| s.index);
        scenes
            .into_iter()
            .map(|scene| GenerationRequest {
                scene_index: scene.index,
                prompt: scene.prompt,
                duration_secs: scene.duration_secs,
                aspect_ratio: self.aspect_ratio,
                character_reference: scene.character_reference,
                mood: scene.mood,
                transition: scene.transition,
            })
            .collect()
    }

    fn narration_clips(&self) -> Vec<NarrationClip> {
        self.narration
            .iter()
            .map(|n| NarrationClip {
                scene_index: n.scene_index,
                path: n.path.clone(),
                text: n.text.clone(),
                duration_secs: n.duration_secs,
            })
            .collect()
    }

    fn requested_duration_sum(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration_secs).sum()
    }
}

/// Builds the ordered provider chain from the configured preference list.
fn build_provider_chain(config: &Config) -> Result<Vec<Arc<dyn ProviderAdapter>>> {
    let mut chain: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
    for name in &config.providers.preference {
        if name == "veo" {
            let veo_config = config
                .providers
                .veo
                .clone()
                .context("preference lists 'veo' but no [providers.veo] section exists")?;
            chain.push(Arc::new(VeoProvider::new(veo_config)?));
        } else if let Some(model) = name.strip_prefix("piapi/") {
            let piapi_config = config
                .providers
                .piapi
                .iter()
                .find(|p| p.model == model)
                .cloned()
                .with_context(|| format!("preference lists '{}' but no matching [[providers.piapi]] entry exists", name))?;
            chain.push(Arc::new(PiapiProvider::new(piapi_config)?));
        } else {
            bail!("unknown provider '{}' in preference list", name);
        }
    }
    Ok(chain)
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("REELFORGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let request_path = std::env::args()
        .nth(1)
        .context("usage: reelforge <request.json>")?;
    let raw = tokio::fs::read_to_string(&request_path)
        .await
        .with_context(|| format!("Failed to read request file {}", request_path))?;
    let request: RenderRequest =
        serde_json::from_str(&raw).context("Failed to parse render request")?;

    if request.scenes.is_empty() {
        bail!("render request has no scenes");
    }
    if let Some(title) = &request.title {
        info!("Rendering '{}': {} scenes", title, request.scenes.len());
    }

    // Media engine is shared by the placeholder generator, the fallback
    // coordinator (clip probing) and the compositor.
    let engine = Arc::new(FfmpegEngine::new(config.compositor.clone()));
    engine
        .validate()
        .await
        .context("Media engine validation failed (is ffmpeg installed?)")?;
    let engine_dyn: Arc<dyn MediaEngine> = engine.clone();

    let chain = build_provider_chain(&config)?;
    if chain.is_empty() {
        warn!("No providers configured; every scene will use placeholder clips");
    }
    let placeholder: Arc<dyn ProviderAdapter> = Arc::new(PlaceholderProvider::new(
        config.providers.placeholder.clone(),
        engine.clone(),
    ));

    let coordinator = FallbackCoordinator::new(
        config.fallback.clone(),
        chain,
        placeholder,
        engine_dyn,
    );
    let orchestrator = Arc::new(SceneOrchestrator::new(
        config.orchestrator.clone(),
        Arc::new(coordinator),
    ));

    // Ctrl-C cancels the run; completed scenes are preserved on disk so a
    // retried run with the same request skips them.
    {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling generation");
                orchestrator.cancel();
            }
        });
    }

    let ctx = RunContext::new(config.pipeline.work_dir.clone());
    info!(run_id = %ctx.run_id, work_dir = %ctx.work_dir.display(), "starting run");

    let requests = request.to_generation_requests();
    let report = orchestrator.run(&ctx, &requests, &[]).await?;

    if report.cancelled {
        bail!(
            "run cancelled; {} of {} scenes completed (clips preserved under {})",
            report.results.len(),
            requests.len(),
            ctx.clips_dir().display()
        );
    }
    if !report.placeholder_scenes.is_empty() {
        warn!(
            scenes = ?report.placeholder_scenes,
            "scenes used placeholder clips instead of a real generation"
        );
    }

    // Expected total: explicit, else soundtrack length, else scene sum.
    let total_duration = match request.total_duration_secs {
        Some(total) => total,
        None => match &request.background_track {
            Some(track) => match engine.probe(track).await {
                Ok(info) if info.duration_secs > 0.0 => info.duration_secs,
                _ => request.requested_duration_sum(),
            },
            None => request.requested_duration_sum(),
        },
    };

    let built = timeline::build(&report.results, &request.narration_clips(), total_duration);
    let mut plan = CompositionPlan::new(
        built,
        request.background_track.clone(),
        request.output.clone(),
    );
    if request.burn_subtitles {
        plan = plan.with_burned_subtitles();
    }

    let compositor = Compositor::new(config.compositor.clone(), engine);
    let output = compositor.compose(&plan).await?;

    info!(
        output = %output.output_path.display(),
        duration = ?output.duration_secs,
        "render complete"
    );
    if !report.placeholder_scenes.is_empty() {
        println!(
            "Done with degraded quality: scenes {:?} used placeholder clips.",
            report.placeholder_scenes
        );
    }
    println!("Output: {}", output.output_path.display());
    if let Some(srt) = &output.subtitle_path {
        println!("Subtitles: {}", srt.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST_JSON: &str = r#"{
        "title": "Night Drive",
        "scenes": [
            {"index": 1, "prompt": "highway at night", "duration_secs": 8.0, "transition": "fade"},
            {"index": 0, "prompt": "city skyline at dusk", "duration_secs": 8.0, "mood": "anticipation"}
        ],
        "narration": [
            {"scene_index": 0, "path": "/tts/n0.mp3", "text": "we begin", "duration_secs": 5.0}
        ],
        "background_track": "/music/track.mp3",
        "output": "/out/final.mp4",
        "aspect_ratio": "9:16",
        "burn_subtitles": true
    }"#;

    #[test]
    fn test_parse_render_request() {
        let request: RenderRequest = serde_json::from_str(REQUEST_JSON).unwrap();
        assert_eq!(request.scenes.len(), 2);
        assert_eq!(request.narration.len(), 1);
        assert_eq!(request.aspect_ratio, AspectRatio::Tall);
        assert!(request.burn_subtitles);
        assert_eq!(request.total_duration_secs, None);
    }

    #[test]
    fn test_generation_requests_sorted_by_index() {
        let request: RenderRequest = serde_json::from_str(REQUEST_JSON).unwrap();
        let requests = request.to_generation_requests();
        assert_eq!(requests[0].scene_index, 0);
        assert_eq!(requests[0].mood.as_deref(), Some("anticipation"));
        assert_eq!(requests[1].scene_index, 1);
        assert_eq!(requests[1].transition, Transition::Fade);
        // The run-level aspect ratio applies to every scene.
        assert!(requests.iter().all(|r| r.aspect_ratio == AspectRatio::Tall));
    }

    #[test]
    fn test_requested_duration_sum() {
        let request: RenderRequest = serde_json::from_str(REQUEST_JSON).unwrap();
        assert!((request.requested_duration_sum() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_build_provider_chain_rejects_unknown_name() {
        let mut config = Config::default();
        config.providers.preference = vec!["sora".to_string()];
        assert!(build_provider_chain(&config).is_err());
    }

    #[test]
    fn test_build_provider_chain_empty_preference() {
        let config = Config::default();
        let chain = build_provider_chain(&config).unwrap();
        assert!(chain.is_empty());
    }
}
