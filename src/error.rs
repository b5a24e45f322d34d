// Elascope Error Taxonomy
// Copyright (c) 2026 The Elascope Authors

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the analysis surface can report. Invalid paths and
/// unsupported formats are rejected before any work is scheduled; toolchain
/// and frame failures abort the enclosing job only, never the whole process.
#[derive(Debug, Error)]
pub enum ElaError {
    #[error("input path does not exist or is not a file or directory: {0:?}")]
    InvalidInputPath(PathBuf),

    #[error("unsupported extension {extension:?} for {path:?} (images: {images}; videos: {videos})")]
    UnsupportedFormat {
        path: PathBuf,
        extension: String,
        images: &'static str,
        videos: &'static str,
    },

    #[error("{tool} failed: {detail}")]
    ExternalToolFailure { tool: &'static str, detail: String },

    /// A single frame's Differ/Normalizer/Compositor chain failed mid-job.
    /// The whole job aborts; skipping the frame would desynchronize the
    /// output frame count against the audio duration.
    #[error("frame {ordinal} failed during {stage}: {source}")]
    FrameFailure {
        ordinal: usize,
        stage: &'static str,
        source: Box<ElaError>,
    },

    #[error("pipeline failure: {0}")]
    Pipeline(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ElaError {
    /// Wrap an error as a per-frame failure tagged with the frame's ordinal.
    pub fn for_frame(ordinal: usize, stage: &'static str, source: ElaError) -> Self {
        ElaError::FrameFailure {
            ordinal,
            stage,
            source: Box::new(source),
        }
    }
}
