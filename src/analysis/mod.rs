// Elascope Analysis Core
// Copyright (c) 2026 The Elascope Authors
//
// The degradation-visualization chain applied to one frame:
// recompress -> diff -> normalize -> composite.

pub mod compose;
pub mod differ;
pub mod normalize;

use image::RgbImage;

use crate::config::{AnalysisConfig, Arrangement};
use crate::error::ElaError;

/// Run the full chain on one opaque RGB frame and return the output frame
/// for the configured arrangement: the joined composite, or the enhanced
/// map alone.
pub fn analyze_frame(frame: &RgbImage, config: &AnalysisConfig) -> Result<RgbImage, ElaError> {
    let diff = differ::recompression_diff(frame, config.quality)?;
    let enhanced = normalize::enhance(&diff, config.ceiling);

    Ok(match config.arrangement {
        Arrangement::Joined => compose::compose(frame, &enhanced),
        Arrangement::Separate => enhanced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn noisy_frame(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                ((x * 37 + y * 11) % 256) as u8,
                ((x * 5 + y * 91) % 256) as u8,
                ((x * 13 + y * 57) % 256) as u8,
            ])
        })
    }

    #[test]
    fn joined_output_doubles_the_long_axis() {
        let frame = noisy_frame(64, 32);
        let config = AnalysisConfig::default();
        let out = analyze_frame(&frame, &config).unwrap();
        assert_eq!(out.dimensions(), (64, 64));
    }

    #[test]
    fn separate_output_keeps_source_dimensions() {
        let frame = noisy_frame(64, 32);
        let config = AnalysisConfig {
            arrangement: Arrangement::Separate,
            ..AnalysisConfig::default()
        };
        let out = analyze_frame(&frame, &config).unwrap();
        assert_eq!(out.dimensions(), (64, 32));
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let frame = noisy_frame(48, 48);
        let config = AnalysisConfig::default();
        let first = analyze_frame(&frame, &config).unwrap();
        let second = analyze_frame(&frame, &config).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }
}
