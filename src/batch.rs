// Elascope Batch Surface
// Copyright (c) 2026 The Elascope Authors
//
// Dispatches a single file or a directory of images, with per-file
// isolation: in a directory run one file's failure never aborts its
// siblings.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::analysis;
use crate::config::AnalysisConfig;
use crate::error::ElaError;
use crate::video::pipeline;
use crate::video::toolchain::FfmpegToolchain;

pub const ACCEPTED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];
pub const ACCEPTED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "avi", "flv", "f4v", "mkv"];

const IMAGE_LIST: &str = "png jpg jpeg webp";
const VIDEO_LIST: &str = "mp4 mov webm avi flv f4v mkv";

/// Subdirectory that collects the outputs of a directory run.
pub const BATCH_OUTPUT_DIR: &str = "processed";
/// Prefix for processed image files: `photo.jpg` -> `ela_photo.jpg`.
pub const IMAGE_OUTPUT_PREFIX: &str = "ela_";
/// Suffix for processed videos: `clip.mp4` -> `clip_ela.mp4`.
pub const VIDEO_OUTPUT_SUFFIX: &str = "_ela";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Video,
}

/// What one invocation produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: Vec<PathBuf>,
    pub failed: usize,
}

/// Classify a file by extension, rejecting anything outside the accepted
/// image and video sets before any work is scheduled.
pub fn classify(path: &Path) -> Result<InputKind, ElaError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if ACCEPTED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(InputKind::Image)
    } else if ACCEPTED_VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        Ok(InputKind::Video)
    } else {
        Err(ElaError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
            images: IMAGE_LIST,
            videos: VIDEO_LIST,
        })
    }
}

/// Output path for a processed image. The container mirrors the input's
/// extension unless overridden; webp sources fall back to png because the
/// bundled encoders write png and jpg.
pub fn image_output_path(input: &Path, out_dir: &Path, config: &AnalysisConfig) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".into());

    let extension = match config.format {
        Some(format) => format.extension().to_string(),
        None => {
            let source = input
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "png".into());
            if source == "webp" {
                "png".into()
            } else {
                source
            }
        }
    };

    out_dir.join(format!("{IMAGE_OUTPUT_PREFIX}{stem}.{extension}"))
}

/// Output path for a processed video, next to its input.
pub fn video_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".into());
    input.with_file_name(format!("{stem}{VIDEO_OUTPUT_SUFFIX}.mp4"))
}

/// Run the analysis chain on one image file and write the result to
/// `out_path`. Alpha is flattened to an opaque three-channel frame on
/// decode.
pub fn process_image_into(
    input: &Path,
    out_path: &Path,
    config: &AnalysisConfig,
) -> Result<PathBuf, ElaError> {
    let frame = image::open(input)?.to_rgb8();
    let rendered = analysis::analyze_frame(&frame, config)?;
    rendered.save(out_path)?;
    info!("[BATCH] {:?} -> {:?}", input, out_path);
    Ok(out_path.to_path_buf())
}

/// Entry point behind the CLI: dispatch one path to the image, video, or
/// directory flow.
pub async fn run(
    input: &Path,
    output: Option<PathBuf>,
    config: &AnalysisConfig,
) -> Result<RunSummary, ElaError> {
    if input.is_file() {
        let out = match classify(input)? {
            InputKind::Image => {
                let parent = input.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
                let out_path =
                    output.unwrap_or_else(|| image_output_path(input, &parent, config));
                let input = input.to_path_buf();
                let config = config.clone();
                tokio::task::spawn_blocking(move || {
                    process_image_into(&input, &out_path, &config)
                })
                .await
                .map_err(|e| ElaError::Pipeline(e.to_string()))??
            }
            InputKind::Video => {
                let out_path = output.unwrap_or_else(|| video_output_path(input));
                pipeline::process_video(input, &out_path, config, &FfmpegToolchain).await?;
                out_path
            }
        };
        Ok(RunSummary {
            succeeded: vec![out],
            failed: 0,
        })
    } else if input.is_dir() {
        if output.is_some() {
            warn!("[BATCH] --output is ignored for directory inputs");
        }
        let dir = input.to_path_buf();
        let config = config.clone();
        tokio::task::spawn_blocking(move || process_directory(&dir, &config))
            .await
            .map_err(|e| ElaError::Pipeline(e.to_string()))?
    } else {
        Err(ElaError::InvalidInputPath(input.to_path_buf()))
    }
}

/// Process every accepted image directly inside `dir`, writing results to
/// the batch output subdirectory on a worker pool. Failures are logged per
/// file; the run only errors if nothing succeeded.
fn process_directory(dir: &Path, config: &AnalysisConfig) -> Result<RunSummary, ElaError> {
    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && classify(p).map_or(false, |k| k == InputKind::Image))
        .collect();
    images.sort();

    if images.is_empty() {
        warn!("[BATCH] No accepted images in {:?}", dir);
        return Ok(RunSummary::default());
    }

    let out_dir = dir.join(BATCH_OUTPUT_DIR);
    std::fs::create_dir_all(&out_dir)?;
    info!(
        "[BATCH] {} images across {} workers -> {:?}",
        images.len(),
        config.workers,
        out_dir
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()
        .map_err(|e| ElaError::Pipeline(e.to_string()))?;

    let results: Vec<Result<PathBuf, ElaError>> = pool.install(|| {
        images
            .par_iter()
            .map(|path| {
                let out_path = image_output_path(path, &out_dir, config);
                process_image_into(path, &out_path, config)
            })
            .collect()
    });

    let mut summary = RunSummary::default();
    let mut first_error = None;
    for (path, result) in images.iter().zip(results) {
        match result {
            Ok(out) => summary.succeeded.push(out),
            Err(e) => {
                error!("[BATCH] {:?} failed: {}", path, e);
                summary.failed += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    if summary.succeeded.is_empty() {
        if let Some(e) = first_error {
            return Err(e);
        }
    }
    Ok(summary)
}
