// Elascope Recompression Differ
// Copyright (c) 2026 The Elascope Authors
//
// Re-encodes a frame through JPEG at a deliberately low quality factor and
// measures what the codec threw away. Regions that were already heavily
// compressed change little; pristine regions change a lot.

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use tracing::debug;

use crate::error::ElaError;

/// Maximum channel value seen in each of the R/G/B planes of a
/// difference map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelExtrema {
    pub per_channel: [u8; 3],
}

impl ChannelExtrema {
    /// The strongest value across all channels and all pixels.
    pub fn overall(&self) -> u8 {
        self.per_channel.iter().copied().max().unwrap_or(0)
    }
}

/// Per-pixel, per-channel absolute delta between a frame and its lossy
/// re-encoding. Dimensions always equal the source frame's.
#[derive(Debug, Clone)]
pub struct DifferenceMap {
    pub map: RgbImage,
    pub extrema: ChannelExtrema,
}

/// Re-encode `frame` as JPEG at `quality`, decode the result, and return
/// the absolute per-channel difference plus its extrema.
///
/// The intermediate encoding lives only in a memory buffer and is dropped
/// before this function returns. The difference is non-negative everywhere
/// and all-zero only when the re-encoding reproduces the frame exactly
/// (flat-color content).
pub fn recompression_diff(frame: &RgbImage, quality: u8) -> Result<DifferenceMap, ElaError> {
    let mut transient = Vec::new();
    JpegEncoder::new_with_quality(&mut transient, quality).encode_image(frame)?;
    let recompressed = image::load_from_memory_with_format(&transient, ImageFormat::Jpeg)?.to_rgb8();
    drop(transient);

    // JPEG round-trips preserve dimensions; the zip below relies on it.
    debug_assert_eq!(recompressed.dimensions(), frame.dimensions());

    let mut per_channel = [0u8; 3];
    let mut data = Vec::with_capacity(frame.as_raw().len());
    for (i, (a, b)) in frame
        .as_raw()
        .iter()
        .zip(recompressed.as_raw().iter())
        .enumerate()
    {
        let delta = a.abs_diff(*b);
        let channel = i % 3;
        if delta > per_channel[channel] {
            per_channel[channel] = delta;
        }
        data.push(delta);
    }

    let (width, height) = frame.dimensions();
    let map = RgbImage::from_raw(width, height, data)
        .ok_or_else(|| ElaError::Pipeline("difference buffer size mismatch".into()))?;

    debug!(
        "[DIFF] {}x{} q={} extrema={:?}",
        width, height, quality, per_channel
    );

    Ok(DifferenceMap {
        map,
        extrema: ChannelExtrema { per_channel },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn flat_mid_gray_is_reproduced_losslessly() {
        // A constant 128 plane has all-zero DCT coefficients, so even
        // quality-5 quantization reconstructs it exactly.
        let frame = RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]));
        let diff = recompression_diff(&frame, 5).unwrap();
        assert_eq!(diff.extrema.overall(), 0);
        assert!(diff.map.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn detailed_content_produces_nonzero_extrema() {
        let frame = RgbImage::from_fn(64, 64, |x, y| {
            Rgb([
                ((x * 89 + y * 3) % 256) as u8,
                ((x * 7 + y * 151) % 256) as u8,
                ((x ^ y) % 256) as u8,
            ])
        });
        let diff = recompression_diff(&frame, 5).unwrap();
        assert!(diff.extrema.overall() > 0);
        assert_eq!(diff.map.dimensions(), frame.dimensions());
    }

    #[test]
    fn extrema_track_the_map_maximum() {
        let frame = RgbImage::from_fn(32, 32, |x, y| {
            Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8])
        });
        let diff = recompression_diff(&frame, 5).unwrap();
        let observed = diff.map.as_raw().iter().copied().max().unwrap();
        assert_eq!(diff.extrema.overall(), observed);
    }

    #[test]
    fn diff_is_deterministic() {
        let frame = RgbImage::from_fn(40, 24, |x, y| {
            Rgb([(x * 11) as u8, (y * 17) as u8, ((x * y) % 256) as u8])
        });
        let first = recompression_diff(&frame, 5).unwrap();
        let second = recompression_diff(&frame, 5).unwrap();
        assert_eq!(first.map.as_raw(), second.map.as_raw());
        assert_eq!(first.extrema, second.extrema);
    }
}
