// Elascope Frame Pipeline
// Copyright (c) 2026 The Elascope Authors
//
// Applies the analysis chain to every frame of a video while preserving
// playback order, then re-encodes with the original audio muxed back in.
// Frames are embarrassingly parallel: no frame reads another's result, and
// ordering is enforced by ordinal-indexed result slots, never by
// completion order.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{info, warn};

use crate::analysis;
use crate::config::{AnalysisConfig, BitrateMode, DEFAULT_FRAME_RATE};
use crate::error::ElaError;
use crate::video::probe::{self, SourceProfile, FALLBACK_AUDIO_KBPS, FALLBACK_VIDEO_KBPS};
use crate::video::toolchain::{EncodeTarget, VideoToolchain};

/// Run `op` over every item on a bounded pool of `workers` threads and
/// return the results in input order.
///
/// Each worker owns exactly one result slot, indexed by the item's
/// ordinal, and writes it at most once. The first error aborts the run:
/// remaining queued items are never started and the partial slots are
/// discarded as a unit.
pub fn run_ordered<I, O, F>(items: &[I], workers: usize, op: F) -> Result<Vec<O>, ElaError>
where
    I: Sync,
    O: Send,
    F: Fn(usize, &I) -> Result<O, ElaError> + Send + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| ElaError::Pipeline(e.to_string()))?;

    let mut slots: Vec<Option<O>> = (0..items.len()).map(|_| None).collect();
    pool.install(|| {
        items
            .par_iter()
            .zip(slots.par_iter_mut())
            .enumerate()
            .try_for_each(|(ordinal, (item, slot))| {
                *slot = Some(op(ordinal, item)?);
                Ok::<(), ElaError>(())
            })
    })?;

    let ordered: Vec<O> = slots.into_iter().flatten().collect();
    if ordered.len() != items.len() {
        return Err(ElaError::Pipeline("a result slot was left unfilled".into()));
    }
    Ok(ordered)
}

/// Run the analysis chain over an ordered list of frame files, writing one
/// output per input into `out_dir` under the frame's own ordinal. Returns
/// the number of frames written, which always equals the input count.
pub fn process_frame_files(
    frames: &[PathBuf],
    out_dir: &Path,
    config: &AnalysisConfig,
) -> Result<usize, ElaError> {
    info!(
        "[PIPELINE] Processing {} frames across {} workers",
        frames.len(),
        config.workers
    );

    let outputs = run_ordered(frames, config.workers, |ordinal, path| {
        let frame = image::open(path)
            .map_err(|e| ElaError::for_frame(ordinal, "decode", e.into()))?
            .to_rgb8();
        let rendered = analysis::analyze_frame(&frame, config)
            .map_err(|e| ElaError::for_frame(ordinal, "analysis", e))?;
        let out_path = out_dir.join(format!("frame_{:05}.png", ordinal + 1));
        rendered
            .save(&out_path)
            .map_err(|e| ElaError::for_frame(ordinal, "write", e.into()))?;
        Ok(out_path)
    })?;

    Ok(outputs.len())
}

/// Decide the re-encode parameters: probed from the source container when
/// configured to match it, fixed fallbacks otherwise. Audio is stream
/// copied during the mux, so its rate is preserved implicitly; the
/// negotiated value is carried for logging.
async fn negotiate_target(input: &Path, config: &AnalysisConfig) -> EncodeTarget {
    let needs_probe = config.bitrate == BitrateMode::Match || config.frame_rate.is_none();
    let profile = if needs_probe {
        probe::probe_source(input).await
    } else {
        SourceProfile::fallback()
    };

    let (video_kbps, audio_kbps) = match config.bitrate {
        BitrateMode::Match => (profile.video_kbps, profile.audio_kbps),
        BitrateMode::Fixed => (FALLBACK_VIDEO_KBPS, FALLBACK_AUDIO_KBPS),
    };

    EncodeTarget {
        frame_rate: config
            .frame_rate
            .or(profile.frame_rate)
            .unwrap_or(DEFAULT_FRAME_RATE),
        video_kbps,
        audio_kbps,
    }
}

/// Visualize recompression error on every frame of `input` and write a
/// playable video to `output`, audio remuxed unchanged.
///
/// All intermediates live in a scratch directory private to this job and
/// are removed on success, failure, and cancellation alike.
pub async fn process_video(
    input: &Path,
    output: &Path,
    config: &AnalysisConfig,
    toolchain: &dyn VideoToolchain,
) -> Result<(), ElaError> {
    toolchain.verify().await?;

    let scratch = tempfile::Builder::new().prefix("elascope-").tempdir()?;
    let frames_dir = scratch.path().join("frames");
    let processed_dir = scratch.path().join("processed");
    std::fs::create_dir_all(&frames_dir)?;
    std::fs::create_dir_all(&processed_dir)?;

    let frames = toolchain.extract_frames(input, &frames_dir).await?;
    let target = negotiate_target(input, config).await;
    info!(
        "[PIPELINE] Target: {}fps, video {}k, audio {}k (copied)",
        target.frame_rate, target.video_kbps, target.audio_kbps
    );

    let frame_count = frames.len();
    let worker_config = config.clone();
    let worker_out = processed_dir.clone();
    let processed = task::spawn_blocking(move || {
        process_frame_files(&frames, &worker_out, &worker_config)
    })
    .await
    .map_err(|e| ElaError::Pipeline(e.to_string()))??;

    // One output frame per input frame, or the audio drifts.
    if processed != frame_count {
        return Err(ElaError::Pipeline(format!(
            "processed {} of {} frames",
            processed, frame_count
        )));
    }

    toolchain
        .encode_frames(&processed_dir, input, &target, output)
        .await?;

    if let Err(e) = scratch.close() {
        warn!("[PIPELINE] Scratch cleanup failed (ignored): {}", e);
    }

    info!("[PIPELINE] ✅ {} frames -> {:?}", frame_count, output);
    Ok(())
}
