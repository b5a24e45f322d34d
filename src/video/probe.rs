// Elascope Bitrate/Profile Negotiator
// Copyright (c) 2026 The Elascope Authors
//
// Reads source container metadata so the re-encode roughly tracks the
// input's size and quality. Probe failures are never fatal: the documented
// fallback constants are used and the failure is logged.

use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::{info, warn};

/// Video bitrate used when the source cannot be probed.
pub const FALLBACK_VIDEO_KBPS: u32 = 4000;
/// Audio bitrate used when the source cannot be probed.
pub const FALLBACK_AUDIO_KBPS: u32 = 128;

/// What the negotiator learned about the source container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProfile {
    pub video_kbps: u32,
    pub audio_kbps: u32,
    /// Rounded source frame rate, when the container reports one.
    pub frame_rate: Option<u32>,
}

impl SourceProfile {
    pub fn fallback() -> Self {
        Self {
            video_kbps: FALLBACK_VIDEO_KBPS,
            audio_kbps: FALLBACK_AUDIO_KBPS,
            frame_rate: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    streams: Option<Vec<ProbeStream>>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    bit_rate: Option<String>,
    r_frame_rate: Option<String>,
}

/// Query `ffprobe` for the source's stream parameters. Falls back to the
/// documented constants on any failure.
pub async fn probe_source(video: &Path) -> SourceProfile {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
        .arg(video)
        .output()
        .await;

    let raw = match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).into_owned(),
        Ok(out) => {
            warn!(
                "[PROBE] ffprobe failed for {:?}: {}; using fallback bitrates",
                video,
                String::from_utf8_lossy(&out.stderr).trim()
            );
            return SourceProfile::fallback();
        }
        Err(e) => {
            warn!(
                "[PROBE] could not run ffprobe for {:?}: {}; using fallback bitrates",
                video, e
            );
            return SourceProfile::fallback();
        }
    };

    match parse_profile(&raw) {
        Some(profile) => {
            info!(
                "[PROBE] {:?}: video {}k, audio {}k, fps {:?}",
                video, profile.video_kbps, profile.audio_kbps, profile.frame_rate
            );
            profile
        }
        None => {
            warn!(
                "[PROBE] unparseable ffprobe output for {:?}; using fallback bitrates",
                video
            );
            SourceProfile::fallback()
        }
    }
}

/// Pure parse step over ffprobe's JSON, separated so it is testable
/// without an ffprobe binary. Missing individual values fall back field by
/// field; a missing or malformed document yields `None`.
pub fn parse_profile(raw: &str) -> Option<SourceProfile> {
    let probe: ProbeOutput = serde_json::from_str(raw).ok()?;
    let streams = probe.streams?;

    let mut profile = SourceProfile::fallback();
    for stream in &streams {
        match stream.codec_type.as_deref() {
            Some("video") => {
                if let Some(kbps) = parse_kbps(stream.bit_rate.as_deref()) {
                    profile.video_kbps = kbps;
                }
                profile.frame_rate = parse_frame_rate(stream.r_frame_rate.as_deref());
            }
            Some("audio") => {
                if let Some(kbps) = parse_kbps(stream.bit_rate.as_deref()) {
                    profile.audio_kbps = kbps;
                }
            }
            _ => {}
        }
    }
    Some(profile)
}

fn parse_kbps(bit_rate: Option<&str>) -> Option<u32> {
    let bps: u64 = bit_rate?.parse().ok()?;
    if bps == 0 {
        return None;
    }
    Some((bps / 1000).max(1) as u32)
}

/// ffprobe reports rates as a ratio, e.g. "30000/1001" or "30/1".
fn parse_frame_rate(rate: Option<&str>) -> Option<u32> {
    let rate = rate?;
    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 || num <= 0.0 {
        return None;
    }
    Some((num / den).round() as u32)
}
