// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the View, which says what part of the complex plane we
//! are looking at, and the PlaneMapper, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0 and
//! the region of the complex plane that the View selects.
//!
//! All arithmetic is done in `f64`.  That puts a ceiling on how deep
//! you can zoom: once a single pixel step is smaller than the spacing
//! between adjacent `f64` values around the center, neighbouring pixels
//! land on the same point and the image turns into blocks.  We do not
//! clamp the zoom; `PlaneMapper::exceeds_precision` reports the
//! condition and the rasterizer logs it.
use num::Complex;

use errors::{RasterError, Result};

/// Describes the x, y of a pixel on the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The visible region of the complex plane, as a center point and a
/// scale.  `unit / zoom` is the distance from the center to the left
/// and right edges of the image.  The vertical extent follows from the
/// aspect ratio of whatever image the view is rendered into.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct View {
    /// Real part of the point at the center of the image.
    pub center_x: f64,
    /// Imaginary part of the point at the center of the image.
    pub center_y: f64,
    /// Magnification of `unit`.  Must be finite and positive.
    pub zoom: f64,
    /// Half-width of the view at zoom 1.  Must be finite and positive.
    pub unit: f64,
}

impl Default for View {
    /// The whole set, slightly off-center so the main cardioid sits in
    /// the middle of the image.
    fn default() -> Self {
        View {
            center_x: -0.75,
            center_y: 0.0,
            zoom: 1.0,
            unit: 1.0,
        }
    }
}

impl View {
    /// Build a view from its four components.
    pub fn new(center_x: f64, center_y: f64, zoom: f64, unit: f64) -> Self {
        View {
            center_x,
            center_y,
            zoom,
            unit,
        }
    }

    /// The center of the view as a point on the complex plane.
    pub fn center(&self) -> Complex<f64> {
        Complex::new(self.center_x, self.center_y)
    }

    /// Rejects views that cannot be mapped onto an image.
    pub fn validate(&self) -> Result<()> {
        if !self.center_x.is_finite() || !self.center_y.is_finite() {
            return Err(RasterError::config(format!(
                "center must be finite, got {}, {}",
                self.center_x, self.center_y
            )));
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(RasterError::config(format!(
                "zoom must be positive, got {}",
                self.zoom
            )));
        }
        if !(self.unit.is_finite() && self.unit > 0.0) {
            return Err(RasterError::config(format!(
                "unit must be positive, got {}",
                self.unit
            )));
        }
        Ok(())
    }
}

/// Rejects image sizes the mapper cannot step across.  A dimension of
/// one pixel would make the step a division by zero.
pub fn validate_size(width: usize, height: usize) -> Result<()> {
    if width < 2 || height < 2 {
        return Err(RasterError::config(format!(
            "image must be at least 2x2 pixels, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

/// The constants that map pixels of a `width` x `height` image onto
/// the region of the complex plane selected by a View.  They are
/// derived fresh for every render pass and never outlive it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneMapper {
    /// Half-width of the region along the real axis.
    pub x_unit: f64,
    /// Half-height of the region, scaled so pixels stay square.
    pub y_unit: f64,
    /// Real value at the left border.
    pub x_min: f64,
    /// Imaginary value at the top border.
    pub y_min: f64,
    /// Distance between two horizontally adjacent pixels.
    pub x_step: f64,
    /// Distance between two vertically adjacent pixels.
    pub y_step: f64,
}

impl PlaneMapper {
    /// Derives the mapping for a view rendered into an image of the
    /// given size.  Both dimensions must be at least 2.
    pub fn new(view: &View, width: usize, height: usize) -> Result<PlaneMapper> {
        validate_size(width, height)?;
        view.validate()?;
        Ok(PlaneMapper::from_valid(view, width, height))
    }

    /// The derivation behind `new`, for callers that already hold a
    /// validated view and size.
    pub(crate) fn from_valid(view: &View, width: usize, height: usize) -> PlaneMapper {
        let x_unit = view.unit / view.zoom;
        // ensure equal aspect ratio
        let y_unit = (height as f64) / (width as f64) * x_unit;

        let x_min = view.center_x - x_unit;
        let y_min = view.center_y - y_unit;

        PlaneMapper {
            x_unit,
            y_unit,
            x_min,
            y_min,
            x_step: 2.0 * x_unit / ((width - 1) as f64),
            y_step: 2.0 * y_unit / ((height - 1) as f64),
        }
    }

    /// Given a pixel on the integral plane, return the point of the
    /// complex plane sampled for it.
    ///
    /// Sampling starts one step inside the nominal border: pixel (0, 0)
    /// maps to `(x_min + x_step, y_min + y_step)`, and the last column
    /// lies one step beyond `x_min + 2 * x_unit`.  Images rendered by
    /// earlier versions depend on this offset, so it stays, though it
    /// looks like an off-by-one rather than a choice.
    ///
    /// The point is computed from the pixel index alone, so it does
    /// not depend on which worker renders the pixel.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.x_min + ((pixel.0 + 1) as f64) * self.x_step,
            self.y_min + ((pixel.1 + 1) as f64) * self.y_step,
        )
    }

    /// True when a pixel step is too small to be represented next to
    /// the coordinates of the view, i.e. we have zoomed past what
    /// `f64` can resolve.
    pub fn exceeds_precision(&self) -> bool {
        let magnitude = self
            .x_min
            .abs()
            .max((self.x_min + 2.0 * self.x_unit).abs())
            .max(self.y_min.abs())
            .max((self.y_min + 2.0 * self.y_unit).abs());
        self.x_step.min(self.y_step) <= magnitude * ::std::f64::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_config_error(result: Result<PlaneMapper>) {
        match result {
            Err(RasterError::Config { .. }) => (),
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn planemapper_fails_on_degenerate_shape() {
        let view = View::default();
        assert_config_error(PlaneMapper::new(&view, 1, 4));
        assert_config_error(PlaneMapper::new(&view, 4, 1));
        assert_config_error(PlaneMapper::new(&view, 0, 0));
    }

    #[test]
    fn planemapper_passes_on_good_shape() {
        assert!(PlaneMapper::new(&View::default(), 2, 2).is_ok());
        assert!(PlaneMapper::new(&View::default(), 800, 600).is_ok());
    }

    #[test]
    fn planemapper_fails_on_bad_view() {
        let bad_zoom = View::new(0.0, 0.0, 0.0, 1.0);
        assert_config_error(PlaneMapper::new(&bad_zoom, 4, 4));
        let bad_unit = View::new(0.0, 0.0, 1.0, -1.0);
        assert_config_error(PlaneMapper::new(&bad_unit, 4, 4));
        let bad_center = View::new(::std::f64::NAN, 0.0, 1.0, 1.0);
        assert_config_error(PlaneMapper::new(&bad_center, 4, 4));
    }

    #[test]
    fn default_view_covers_the_set() {
        let pm = PlaneMapper::new(&View::default(), 5, 5).unwrap();
        assert_eq!(pm.x_unit, 1.0);
        assert_eq!(pm.y_unit, 1.0);
        assert_eq!(pm.x_min, -1.75);
        assert_eq!(pm.y_min, -1.0);
        assert_eq!(pm.x_step, 0.5);
        assert_eq!(pm.y_step, 0.5);
    }

    #[test]
    fn aspect_ratio_is_preserved() {
        for &(width, height) in &[(800, 600), (600, 800), (3, 7), (1024, 2)] {
            for &zoom in &[1.0, 2.0, 0.25, 1024.0] {
                let pm = PlaneMapper::new(&View::new(0.3, -0.1, zoom, 1.0), width, height).unwrap();
                assert_eq!(pm.y_unit / pm.x_unit, height as f64 / width as f64);
            }
        }
    }

    #[test]
    fn zoom_shrinks_the_region() {
        let pm = PlaneMapper::new(&View::new(0.0, 0.0, 4.0, 2.0), 9, 9).unwrap();
        assert_eq!(pm.x_unit, 0.5);
        assert_eq!(pm.x_min, -0.5);
        assert_eq!(pm.x_step, 0.125);
    }

    #[test]
    fn pixel_to_point_is_biased_one_step_inward() {
        let pm = PlaneMapper::new(&View::new(0.0, 0.0, 1.0, 2.0), 5, 5).unwrap();
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-1.0, -1.0));
        assert_eq!(pm.pixel_to_point(&Pixel(1, 1)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 2)), Complex::new(3.0, 1.0));
    }

    #[test]
    fn pixel_to_point_on_mixed_planes() {
        let pm = PlaneMapper::new(&View::default(), 5, 3).unwrap();
        let p = pm.pixel_to_point(&Pixel(0, 0));
        assert_eq!(p.re, pm.x_min + pm.x_step);
        assert_eq!(p.im, pm.y_min + pm.y_step);
        let q = pm.pixel_to_point(&Pixel(4, 2));
        assert_eq!(q.re, pm.x_min + 5.0 * pm.x_step);
        assert_eq!(q.im, pm.y_min + 3.0 * pm.y_step);
    }

    #[test]
    fn shallow_views_are_within_precision() {
        let pm = PlaneMapper::new(&View::default(), 800, 600).unwrap();
        assert!(!pm.exceeds_precision());
    }

    #[test]
    fn deep_views_exceed_precision() {
        let pm = PlaneMapper::new(&View::new(-0.75, 0.1, 1.0e16, 1.0), 800, 600).unwrap();
        assert!(pm.exceeds_precision());
    }
}
