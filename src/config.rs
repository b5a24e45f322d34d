// Elascope Configuration
// Copyright (c) 2026 The Elascope Authors
//
// One explicit configuration value is passed into every pipeline
// invocation. There is no process-wide mutable state.

use clap::ValueEnum;

/// JPEG quality factor used for the throwaway re-encoding (1–100).
/// Lower values discard more detail and produce a stronger difference
/// signal; 5 is the calibrated default.
pub const DEFAULT_QUALITY: u8 = 5;

/// Brightness ceiling for the contrast stretch. Deliberately larger than
/// the 8-bit pixel maximum so high-difference regions saturate while
/// low-difference regions stay near zero. Empirically tuned; not a bug.
pub const DEFAULT_CEILING: f32 = 4850.0;

/// Frame rate used for re-encoded video when the source rate cannot be
/// determined.
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// How the enhanced map and the source frame are arranged in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Arrangement {
    /// One canvas holding the enhanced map and the source side by side.
    Joined,
    /// The enhanced map alone; the source frame is left as-is on disk.
    Separate,
}

/// Where the re-encode bitrate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BitrateMode {
    /// Probe the source container and track its video/audio bit rates.
    Match,
    /// Use the fixed fallback constants without probing.
    Fixed,
}

/// Raster container for image outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Png,
    Jpg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
        }
    }
}

/// Configuration for one analysis invocation, image or video.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// JPEG quality factor for the throwaway re-encoding (1–100).
    pub quality: u8,
    /// Brightness ceiling for the contrast stretch.
    pub ceiling: f32,
    /// Joined composite or enhanced map alone.
    pub arrangement: Arrangement,
    /// Worker pool size for frame/file parallelism.
    pub workers: usize,
    /// Target output frame rate; `None` inherits the source rate.
    pub frame_rate: Option<u32>,
    /// Bitrate source for video re-encoding.
    pub bitrate: BitrateMode,
    /// Image output container; `None` mirrors the input extension.
    pub format: Option<OutputFormat>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            ceiling: DEFAULT_CEILING,
            arrangement: Arrangement::Joined,
            workers: num_cpus::get(),
            frame_rate: None,
            bitrate: BitrateMode::Match,
            format: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_calibration() {
        let config = AnalysisConfig::default();
        assert_eq!(config.quality, 5);
        assert_eq!(config.ceiling, 4850.0);
        assert_eq!(config.arrangement, Arrangement::Joined);
        assert!(config.workers >= 1);
        assert_eq!(config.bitrate, BitrateMode::Match);
    }
}
