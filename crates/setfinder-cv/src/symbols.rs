//! Symbol extraction from a rectified card

use crate::detection::config::SymbolConfig;
use crate::geometry::{quad_from_rotated_rect, warp_perspective};
use crate::segment::{binarize, contours_by_area};
use crate::Result;
use anyhow::Context;
use opencv::{
    core::{self, Mat},
    imgproc,
};
use setfinder_core::{Orientation, Quad};

/// Cuts the one to three symbols out of a card image
///
/// The number of images returned is the card's count attribute.
pub struct SymbolSegmenter {
    config: SymbolConfig,
}

impl SymbolSegmenter {
    pub fn new(config: SymbolConfig) -> Self {
        Self { config }
    }

    /// Symbol boxes in card coordinates, rectified portrait and scaled out, largest first
    pub fn locate(&self, card: &Mat) -> Result<Vec<Quad>> {
        let binary = binarize(card, self.config.threshold, self.config.blur_kernel)?;

        // ink is dark; without inverting, the card itself is the outer contour
        let mut ink = Mat::default();
        core::bitwise_not(&binary, &mut ink, &core::no_array()).context("Mask inversion failed")?;

        let mut ranked = contours_by_area(&ink, imgproc::RETR_EXTERNAL)?;
        ranked.truncate(self.config.max_symbols);

        let largest = ranked.first().map(|(_, area)| *area).unwrap_or_default();
        let (xscale, yscale) = self.config.scale;

        let mut quads = Vec::with_capacity(ranked.len());
        for (contour, area) in &ranked {
            if *area <= 0.0 || *area < largest * self.config.min_relative_area {
                tracing::debug!("Ignoring speck of area {:.0}", area);
                continue;
            }
            let rect = imgproc::min_area_rect(contour).context("minAreaRect failed")?;
            let quad = quad_from_rotated_rect(rect)?
                .rectify(Orientation::Portrait)
                .scale_from_center(xscale, yscale);
            quads.push(quad);
        }
        Ok(quads)
    }

    /// Symbol images of the configured size, largest symbol first
    pub fn extract(&self, card: &Mat) -> Result<Vec<Mat>> {
        let (width, height) = self.config.size;
        self.locate(card)?
            .iter()
            .map(|quad| warp_perspective(card, quad, width, height))
            .collect()
    }
}
