// Elascope Brightness Normalizer
// Copyright (c) 2026 The Elascope Authors

use image::RgbImage;
use tracing::debug;

use super::differ::DifferenceMap;

/// Scale factor for the saturating contrast stretch.
///
/// `ceiling / max_extrema` when the map has any signal; exactly `1.0` for
/// an all-zero map (identity — degenerate content, not an error).
pub fn scale_factor(max_extrema: u8, ceiling: f32) -> f32 {
    if max_extrema == 0 {
        1.0
    } else {
        ceiling / max_extrema as f32
    }
}

/// Rescale a difference map so its strongest channel value maps to the
/// ceiling, saturating at 255. The ceiling is intentionally far above the
/// pixel maximum, so bright regions clip while faint regions stay dark.
pub fn enhance(diff: &DifferenceMap, ceiling: f32) -> RgbImage {
    let scale = scale_factor(diff.extrema.overall(), ceiling);
    debug!("[NORM] max={} scale={:.2}", diff.extrema.overall(), scale);

    let (width, height) = diff.map.dimensions();
    let data = diff
        .map
        .as_raw()
        .iter()
        .map(|&v| (v as f32 * scale).min(255.0).round() as u8)
        .collect();

    // Same length as the source buffer, so this cannot fail.
    RgbImage::from_raw(width, height, data).unwrap_or_else(|| RgbImage::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::differ::{ChannelExtrema, DifferenceMap};
    use image::Rgb;

    fn map_with(pixels: RgbImage) -> DifferenceMap {
        let mut per_channel = [0u8; 3];
        for (i, &v) in pixels.as_raw().iter().enumerate() {
            if v > per_channel[i % 3] {
                per_channel[i % 3] = v;
            }
        }
        DifferenceMap {
            map: pixels,
            extrema: ChannelExtrema { per_channel },
        }
    }

    #[test]
    fn scale_times_extrema_hits_the_ceiling() {
        for ceiling in [255.0f32, 1000.0, 4850.0, 9999.0] {
            for max in [1u8, 7, 97, 255] {
                let scale = scale_factor(max, ceiling);
                assert!(
                    (scale * max as f32 - ceiling).abs() < 1e-3,
                    "ceiling={} max={}",
                    ceiling,
                    max
                );
            }
        }
    }

    #[test]
    fn zero_extrema_is_identity_not_an_error() {
        assert_eq!(scale_factor(0, 4850.0), 1.0);
        let diff = map_with(RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])));
        let enhanced = enhance(&diff, 4850.0);
        assert_eq!(enhanced.as_raw(), diff.map.as_raw());
    }

    #[test]
    fn strong_values_saturate_at_channel_max() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        img.put_pixel(0, 0, Rgb([97, 3, 0]));
        let diff = map_with(img);
        let enhanced = enhance(&diff, 4850.0);
        // 97 * (4850/97) = 4850 clips to 255; 3 * 50.0 = 150 stays linear.
        assert_eq!(enhanced.get_pixel(0, 0)[0], 255);
        assert_eq!(enhanced.get_pixel(0, 0)[1], 150);
        assert_eq!(enhanced.get_pixel(0, 0)[2], 0);
    }

    #[test]
    fn dimensions_are_preserved() {
        let diff = map_with(RgbImage::from_pixel(13, 7, Rgb([9, 0, 2])));
        let enhanced = enhance(&diff, 4850.0);
        assert_eq!(enhanced.dimensions(), (13, 7));
    }
}
