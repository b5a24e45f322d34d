// Elascope Toolchain Interface
// Copyright (c) 2026 The Elascope Authors
//
// The external decode/encode toolchain lives behind this narrow seam:
// "decode a video to ordered frames" and "encode ordered frames + audio to
// a video". Argument vectors are built by pure functions so the command
// shape is testable without spawning anything.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

use crate::error::ElaError;

/// printf-style name given to extracted and processed frame files. The
/// ordinal embedded in the name is what keeps the sequence ordered on disk.
pub const FRAME_PATTERN: &str = "frame_%05d.png";

/// Encode parameters negotiated from the source container (or fallbacks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeTarget {
    pub frame_rate: u32,
    pub video_kbps: u32,
    pub audio_kbps: u32,
}

/// Capability interface over the external video toolchain.
#[async_trait]
pub trait VideoToolchain: Send + Sync {
    /// Confirm the toolchain is usable before any job work is scheduled.
    async fn verify(&self) -> Result<(), ElaError>;

    /// Decode `video` into an ordered frame sequence under `frame_dir`.
    /// Returns the frame files sorted by ordinal.
    async fn extract_frames(&self, video: &Path, frame_dir: &Path)
        -> Result<Vec<PathBuf>, ElaError>;

    /// Encode the ordered frames under `frame_dir` into `output`, muxing
    /// the audio track of `audio_source` unmodified.
    async fn encode_frames(
        &self,
        frame_dir: &Path,
        audio_source: &Path,
        target: &EncodeTarget,
        output: &Path,
    ) -> Result<(), ElaError>;
}

/// Production implementation backed by the `ffmpeg` binary.
pub struct FfmpegToolchain;

impl FfmpegToolchain {
    /// Arguments for decoding a video into ordered frame files.
    pub fn extraction_args(video: &Path, frame_dir: &Path) -> Vec<String> {
        vec![
            "-y".into(),
            "-v".into(),
            "error".into(),
            "-nostdin".into(),
            "-i".into(),
            video.to_string_lossy().into_owned(),
            frame_dir.join(FRAME_PATTERN).to_string_lossy().into_owned(),
        ]
    }

    /// Arguments for stitching processed frames back into a container.
    ///
    /// The video stream comes from the frame files; the audio stream is
    /// copied from the original container without re-encoding. The trailing
    /// `?` on the audio map keeps silent sources valid. `+faststart` moves
    /// the index to the front for progressive-download playback, and
    /// `-shortest` stops the mux when the shorter stream ends.
    pub fn encode_args(
        frame_dir: &Path,
        audio_source: &Path,
        target: &EncodeTarget,
        output: &Path,
    ) -> Vec<String> {
        vec![
            "-y".into(),
            "-v".into(),
            "error".into(),
            "-nostdin".into(),
            "-framerate".into(),
            target.frame_rate.to_string(),
            "-i".into(),
            frame_dir.join(FRAME_PATTERN).to_string_lossy().into_owned(),
            "-i".into(),
            audio_source.to_string_lossy().into_owned(),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0?".into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "medium".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-b:v".into(),
            format!("{}k", target.video_kbps),
            "-maxrate".into(),
            format!("{}k", target.video_kbps * 3 / 2),
            "-bufsize".into(),
            format!("{}k", target.video_kbps * 2),
            "-c:a".into(),
            "copy".into(),
            "-movflags".into(),
            "+faststart".into(),
            "-shortest".into(),
            output.to_string_lossy().into_owned(),
        ]
    }

    async fn run_ffmpeg(args: &[String]) -> Result<(), ElaError> {
        let output = Command::new("ffmpeg")
            .args(args)
            .output()
            .await
            .map_err(|e| ElaError::ExternalToolFailure {
                tool: "ffmpeg",
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ElaError::ExternalToolFailure {
                tool: "ffmpeg",
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VideoToolchain for FfmpegToolchain {
    async fn verify(&self) -> Result<(), ElaError> {
        for tool in ["ffmpeg", "ffprobe"] {
            let probe = Command::new(tool).arg("-version").output().await;
            match probe {
                Ok(out) if out.status.success() => {}
                _ => {
                    return Err(ElaError::ExternalToolFailure {
                        tool,
                        detail: "not available on PATH".into(),
                    })
                }
            }
        }
        Ok(())
    }

    async fn extract_frames(
        &self,
        video: &Path,
        frame_dir: &Path,
    ) -> Result<Vec<PathBuf>, ElaError> {
        info!("[TOOLCHAIN] Extracting frames from {:?}", video);
        Self::run_ffmpeg(&Self::extraction_args(video, frame_dir)).await?;

        let mut frames: Vec<PathBuf> = std::fs::read_dir(frame_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "png"))
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(ElaError::ExternalToolFailure {
                tool: "ffmpeg",
                detail: format!("no frames decoded from {:?}", video),
            });
        }

        info!("[TOOLCHAIN] Decoded {} frames", frames.len());
        Ok(frames)
    }

    async fn encode_frames(
        &self,
        frame_dir: &Path,
        audio_source: &Path,
        target: &EncodeTarget,
        output: &Path,
    ) -> Result<(), ElaError> {
        info!(
            "[TOOLCHAIN] Encoding {:?} ({}fps, {}k video)",
            output, target.frame_rate, target.video_kbps
        );
        Self::run_ffmpeg(&Self::encode_args(frame_dir, audio_source, target, output)).await
    }
}
