// Elascope Compositor
// Copyright (c) 2026 The Elascope Authors

use image::{imageops, RgbImage};

/// Which way the two images are stacked on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Enhanced map on top, source below. Canvas is `w x 2h`.
    Vertical,
    /// Enhanced map left, source right. Canvas is `2w x h`.
    Horizontal,
}

/// Portrait frames stack sideways and landscape frames stack downward, so
/// the joined output is never absurdly elongated. Square frames take the
/// vertical arm.
pub fn orientation_for(width: u32, height: u32) -> Orientation {
    if height > width {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    }
}

/// Arrange the enhanced map and the source frame on one canvas exactly
/// double the source's long axis.
pub fn compose(source: &RgbImage, enhanced: &RgbImage) -> RgbImage {
    let (width, height) = source.dimensions();

    match orientation_for(width, height) {
        Orientation::Vertical => {
            let mut canvas = RgbImage::new(width, height * 2);
            imageops::replace(&mut canvas, enhanced, 0, 0);
            imageops::replace(&mut canvas, source, 0, height as i64);
            canvas
        }
        Orientation::Horizontal => {
            let mut canvas = RgbImage::new(width * 2, height);
            imageops::replace(&mut canvas, enhanced, 0, 0);
            imageops::replace(&mut canvas, source, width as i64, 0);
            canvas
        }
    }
}
