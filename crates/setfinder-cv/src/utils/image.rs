//! Image loading, saving and conversion between `image` and OpenCV

use crate::error::SetFinderError;
use crate::Result;
use anyhow::Context;
use opencv::{
    core::{self, Mat},
    imgcodecs::{self, IMREAD_COLOR},
    imgproc,
    prelude::*,
};
use std::path::Path;

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Load image from path as a BGR Mat
    pub fn load_color<P: AsRef<Path>>(path: P) -> Result<Mat> {
        let path_str = path.as_ref().to_string_lossy();

        let mat = imgcodecs::imread(&path_str, IMREAD_COLOR)
            .with_context(|| format!("Failed to load color image: {}", path_str))?;
        if mat.empty() {
            anyhow::bail!("Failed to decode image: {}", path_str);
        }
        Ok(mat)
    }

    /// Save Mat as image, format picked from the extension
    pub fn save_image<P: AsRef<Path>>(mat: &Mat, path: P) -> Result<()> {
        let path_str = path.as_ref().to_string_lossy();

        imgcodecs::imwrite(&path_str, mat, &core::Vector::new())
            .with_context(|| format!("Failed to save image: {}", path_str))?;

        Ok(())
    }

    /// Convert image::RgbImage to a BGR Mat
    pub fn rgb_to_mat(rgb_image: &image::RgbImage) -> Result<Mat> {
        let (width, height) = rgb_image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Mat::default());
        }

        let flat = Mat::from_slice(rgb_image.as_raw()).context("Failed to wrap image buffer")?;
        let rgb = flat
            .reshape(3, height as i32)
            .context("Failed to reshape image buffer")?;

        let mut bgr = Mat::default();
        imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)
            .context("RGB to BGR conversion failed")?;
        Ok(bgr)
    }

    /// Convert a BGR Mat to image::RgbImage
    pub fn mat_to_rgb(mat: &Mat) -> Result<image::RgbImage> {
        Self::ensure_bgr(mat)?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(mat, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
            .context("BGR to RGB conversion failed")?;

        let data = rgb.data_bytes().context("Failed to read pixel data")?;
        image::RgbImage::from_raw(rgb.cols() as u32, rgb.rows() as u32, data.to_vec())
            .context("Pixel buffer does not match the image size")
    }

    /// Grayscale copy of a BGR image; single-channel input is cloned
    pub fn to_grayscale(mat: &Mat) -> Result<Mat> {
        if mat.channels() == 1 {
            return Ok(mat.clone());
        }
        Self::ensure_bgr(mat)?;

        let mut gray = Mat::default();
        imgproc::cvt_color(mat, &mut gray, imgproc::COLOR_BGR2GRAY, 0)
            .context("Grayscale conversion failed")?;
        Ok(gray)
    }

    /// Fail unless the Mat has three channels
    pub fn ensure_bgr(mat: &Mat) -> Result<()> {
        if mat.channels() != 3 {
            return Err(SetFinderError::UnsupportedChannels {
                channels: mat.channels(),
            }
            .into());
        }
        Ok(())
    }
}
