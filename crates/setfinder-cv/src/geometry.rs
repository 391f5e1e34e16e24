//! Perspective warping and conversions between core geometry and OpenCV

use crate::Result;
use anyhow::Context;
use opencv::{
    core::{self, Mat, Point, Point2f, Size, Vector},
    imgproc,
    prelude::*,
};
use setfinder_core::{Point as CorePoint, Quad};

/// Quad corners as OpenCV float points, in quad order
pub fn quad_to_cv(quad: &Quad) -> Vector<Point2f> {
    quad.points()
        .iter()
        .map(|p| Point2f::new(p.x as f32, p.y as f32))
        .collect()
}

/// Quad corners as integer pixel points, for drawing
pub fn quad_to_pixels(quad: &Quad) -> Vector<Point> {
    quad.points()
        .iter()
        .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
        .collect()
}

/// Build a quad from an approximated contour; anything but 4 vertices is rejected
pub fn quad_from_contour(contour: &Vector<Point>) -> Result<Quad> {
    let points: Vec<CorePoint> = contour
        .iter()
        .map(|p| CorePoint::new(f64::from(p.x), f64::from(p.y)))
        .collect();
    Ok(Quad::try_from(points.as_slice())?)
}

/// Corners of a rotated rectangle as an unordered quad
pub fn quad_from_rotated_rect(rect: core::RotatedRect) -> Result<Quad> {
    let mut corners = Mat::default();
    imgproc::box_points(rect, &mut corners).context("boxPoints failed")?;

    let mut points = Vec::with_capacity(4);
    for row in 0..corners.rows() {
        let x = *corners.at_2d::<f32>(row, 0)?;
        let y = *corners.at_2d::<f32>(row, 1)?;
        points.push(CorePoint::new(f64::from(x), f64::from(y)));
    }
    Ok(Quad::try_from(points.as_slice())?)
}

/// Projective transform taking the rectified quad onto an `out_w × out_h` rectangle
pub fn perspective_transform(quad: &Quad, out_w: i32, out_h: i32) -> Result<Mat> {
    let src = quad_to_cv(quad);
    let dst = quad_to_cv(&Quad::rectangle(out_w.max(1) as u32, out_h.max(1) as u32));

    imgproc::get_perspective_transform(&src, &dst, core::DECOMP_LU)
        .context("Perspective transform is singular")
}

/// Resample the region under a rectified quad into an `out_w × out_h` image
///
/// Pixels outside the source are filled by replicating the border, so
/// scaled-out symbol boxes near the card edge do not pick up black bands.
pub fn warp_perspective(image: &Mat, quad: &Quad, out_w: i32, out_h: i32) -> Result<Mat> {
    let transform = perspective_transform(quad, out_w, out_h)?;

    let mut warped = Mat::default();
    imgproc::warp_perspective(
        image,
        &mut warped,
        &transform,
        Size::new(out_w, out_h),
        imgproc::INTER_LINEAR,
        core::BORDER_REPLICATE,
        core::Scalar::default(),
    )
    .context("Perspective warp failed")?;

    Ok(warped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::gradient_image;
    use opencv::core::Vec3b;
    use setfinder_core::Orientation;

    #[test]
    fn test_identity_warp_is_a_copy() -> Result<()> {
        let image = gradient_image(60, 40)?;
        let warped = warp_perspective(&image, &Quad::rectangle(60, 40), 60, 40)?;

        assert_eq!((warped.cols(), warped.rows()), (60, 40));
        for y in 0..40 {
            for x in 0..60 {
                let a = image.at_2d::<Vec3b>(y, x)?;
                let b = warped.at_2d::<Vec3b>(y, x)?;
                for c in 0..3 {
                    assert!((i32::from(a[c]) - i32::from(b[c])).abs() <= 1);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_warp_crops_sub_rectangle() -> Result<()> {
        let image = gradient_image(60, 40)?;
        let quad = Quad::new([
            CorePoint::new(10.0, 5.0),
            CorePoint::new(29.0, 5.0),
            CorePoint::new(29.0, 14.0),
            CorePoint::new(10.0, 14.0),
        ]);
        let warped = warp_perspective(&image, &quad, 20, 10)?;

        assert_eq!((warped.cols(), warped.rows()), (20, 10));
        assert_eq!(*warped.at_2d::<Vec3b>(0, 0)?, *image.at_2d::<Vec3b>(5, 10)?);
        assert_eq!(*warped.at_2d::<Vec3b>(9, 19)?, *image.at_2d::<Vec3b>(14, 29)?);
        Ok(())
    }

    #[test]
    fn test_rotated_rect_round_trip() -> Result<()> {
        let rect = core::RotatedRect::new(Point2f::new(50.0, 40.0), core::Size2f::new(20.0, 60.0), 0.0)?;
        let quad = quad_from_rotated_rect(rect)?.rectify(Orientation::Portrait);
        let (w, h) = quad.bounding_size();
        assert!((w - 20.0).abs() < 1e-3);
        assert!((h - 60.0).abs() < 1e-3);
        assert!((quad.points()[0].x - 40.0).abs() < 1e-3);
        assert!((quad.points()[0].y - 10.0).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn test_contour_with_three_vertices_is_rejected() {
        let contour: Vector<Point> = vec![Point::new(0, 0), Point::new(5, 0), Point::new(0, 5)]
            .into_iter()
            .collect();
        assert!(quad_from_contour(&contour).is_err());
    }
}
