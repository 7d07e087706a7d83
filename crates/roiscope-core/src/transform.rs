//! Coordinate transforms between normalized, reference-pixel and surface space.
//!
//! * normalized: `[0,1]` on both axes, what gets persisted
//! * reference pixels: the detector input resolution
//! * surface pixels: the rendering surface the operator draws on
//!
//! The surface keeps the reference aspect ratio, so a single scale factor per
//! axis maps between reference pixels and surface pixels.

use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Serialize};

/// Largest rendering surface the editor will lay out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceBounds {
    pub max_width: f64,
    pub max_height: f64,
}

impl Default for SurfaceBounds {
    fn default() -> Self {
        Self {
            max_width: 800.0,
            max_height: 600.0,
        }
    }
}

impl SurfaceBounds {
    /// Fit `reference` into these bounds preserving its aspect ratio.
    ///
    /// Width-constrained first; falls back to height-constrained when the
    /// resulting height would overflow.
    pub fn fit(&self, reference: Size) -> Size {
        if reference.width <= 0.0 || reference.height <= 0.0 {
            return Size::new(self.max_width, self.max_height);
        }
        let aspect = reference.width / reference.height;
        let mut width = self.max_width;
        let mut height = self.max_width / aspect;
        if height > self.max_height {
            height = self.max_height;
            width = self.max_height * aspect;
        }
        Size::new(width, height)
    }
}

/// Mapping between the three coordinate spaces for one reference/surface pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTransform {
    /// Reference resolution normalized coordinates are relative to.
    pub reference: Size,
    /// Rendering surface size in pixels.
    pub surface: Size,
}

impl SurfaceTransform {
    pub fn new(reference: Size, surface: Size) -> Self {
        Self { reference, surface }
    }

    /// Lay out a surface for `reference` inside `bounds`.
    pub fn fitted(reference: Size, bounds: SurfaceBounds) -> Self {
        Self::new(reference, bounds.fit(reference))
    }

    /// Surface pixels per reference pixel, horizontally.
    pub fn scale_x(&self) -> f64 {
        self.surface.width / self.reference.width
    }

    /// Surface pixels per reference pixel, vertically.
    pub fn scale_y(&self) -> f64 {
        self.surface.height / self.reference.height
    }

    /// Normalized → surface transform.
    pub fn transform(&self) -> Affine {
        Affine::scale_non_uniform(self.surface.width, self.surface.height)
    }

    /// Convert a normalized point to surface coordinates.
    pub fn to_surface(&self, normalized: Point) -> Point {
        self.transform() * normalized
    }

    /// Convert a surface point to normalized coordinates, clamped to `[0,1]`.
    ///
    /// Drags that leave the surface never produce out-of-range coordinates.
    pub fn to_normalized(&self, surface: Point) -> Point {
        let x = if self.surface.width > 0.0 { surface.x / self.surface.width } else { 0.0 };
        let y = if self.surface.height > 0.0 { surface.y / self.surface.height } else { 0.0 };
        clamp_unit(Point::new(x, y))
    }

    /// Convert a normalized point to reference-pixel coordinates.
    pub fn to_reference(&self, normalized: Point) -> Point {
        Point::new(normalized.x * self.reference.width, normalized.y * self.reference.height)
    }

    /// Convert a reference-pixel point to normalized coordinates, clamped.
    pub fn reference_to_normalized(&self, pixel: Point) -> Point {
        normalize_pixel(pixel, self.reference)
    }

    /// Map a stored vertex onto the surface.
    ///
    /// Stored data may still be legacy pixel coordinates, so the same
    /// heuristic as [`renormalize_legacy`] decides how to read it.
    pub fn stored_to_surface(&self, stored: Point) -> Point {
        self.to_surface(renormalize_legacy(stored, self.reference))
    }

    /// Carry a surface point laid out by `from` onto this surface.
    pub fn carry_from(&self, from: &SurfaceTransform, surface: Point) -> Point {
        self.to_surface(from.to_normalized(surface))
    }

    /// Re-layout for a new surface size, keeping the reference.
    pub fn resized(&self, surface: Size) -> Self {
        Self::new(self.reference, surface)
    }
}

/// Clamp both axes into `[0,1]`.
pub fn clamp_unit(p: Point) -> Point {
    Point::new(p.x.clamp(0.0, 1.0), p.y.clamp(0.0, 1.0))
}

fn normalize_pixel(pixel: Point, reference: Size) -> Point {
    if reference.width <= 0.0 || reference.height <= 0.0 {
        return clamp_unit(pixel);
    }
    clamp_unit(Point::new(pixel.x / reference.width, pixel.y / reference.height))
}

/// Bring a stored vertex into normalized space before persisting.
///
/// Vertices with either axis above 1.0 are taken to be legacy pixel
/// coordinates against `reference` and divided through; anything else is
/// already normalized and passes unchanged. A region whose true normalized
/// extent touches 1.0 cannot be told apart from a one-pixel region at low
/// reference resolutions, so the heuristic is only as good as the data.
pub fn renormalize_legacy(p: Point, reference: Size) -> Point {
    if p.x > 1.0 || p.y > 1.0 {
        normalize_pixel(p, reference)
    } else {
        clamp_unit(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn hd() -> SurfaceTransform {
        SurfaceTransform::fitted(Size::new(1920.0, 1080.0), SurfaceBounds::default())
    }

    #[test]
    fn test_fit_width_constrained() {
        let size = SurfaceBounds::default().fit(Size::new(1920.0, 1080.0));
        assert!((size.width - 800.0).abs() < EPS);
        assert!((size.height - 450.0).abs() < EPS);
    }

    #[test]
    fn test_fit_height_constrained() {
        let size = SurfaceBounds::default().fit(Size::new(1080.0, 1920.0));
        assert!((size.height - 600.0).abs() < EPS);
        assert!((size.width - 337.5).abs() < EPS);
    }

    #[test]
    fn test_fit_square() {
        let size = SurfaceBounds::default().fit(Size::new(640.0, 640.0));
        assert!((size.width - 600.0).abs() < EPS);
        assert!((size.height - 600.0).abs() < EPS);
    }

    #[test]
    fn test_scale_factors() {
        let t = hd();
        assert!((t.scale_x() - 800.0 / 1920.0).abs() < EPS);
        assert!((t.scale_y() - 450.0 / 1080.0).abs() < EPS);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let transforms = [
            hd(),
            SurfaceTransform::new(Size::new(640.0, 480.0), Size::new(333.0, 777.0)),
            SurfaceTransform::new(Size::new(3.0, 7.0), Size::new(1.5, 0.25)),
        ];
        for t in transforms {
            for i in 0..=10 {
                for j in 0..=10 {
                    let p = Point::new(i as f64 / 10.0, j as f64 / 10.0);
                    let back = t.to_normalized(t.to_surface(p));
                    assert!((back.x - p.x).abs() < 1e-12);
                    assert!((back.y - p.y).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_stored_to_surface_reads_legacy_pixels() {
        let t = hd();
        let legacy = t.stored_to_surface(Point::new(960.0, 540.0));
        assert!((legacy.x - 400.0).abs() < EPS);
        assert!((legacy.y - 225.0).abs() < EPS);
        let normalized = t.stored_to_surface(Point::new(0.5, 0.5));
        assert!((normalized.x - 400.0).abs() < EPS);
    }

    #[test]
    fn test_carry_between_surfaces() {
        let big = hd();
        let small = big.resized(Size::new(400.0, 225.0));
        let p = small.carry_from(&big, Point::new(400.0, 225.0));
        assert!((p.x - 200.0).abs() < EPS);
        assert!((p.y - 112.5).abs() < EPS);
    }

    #[test]
    fn test_to_normalized_clamps() {
        let t = hd();
        let p = t.to_normalized(Point::new(-50.0, 900.0));
        assert_eq!(p, Point::new(0.0, 1.0));
        let p = t.to_normalized(Point::new(1200.0, -1.0));
        assert_eq!(p, Point::new(1.0, 0.0));
    }

    #[test]
    fn test_rectangle_drag_normalizes() {
        let t = hd();
        let a = t.to_normalized(Point::new(100.0, 100.0));
        let b = t.to_normalized(Point::new(300.0, 200.0));
        assert!((a.x - 0.125).abs() < 1e-3);
        assert!((a.y - 0.2222).abs() < 1e-3);
        assert!((b.x - 0.375).abs() < 1e-3);
        assert!((b.y - 0.4444).abs() < 1e-3);
    }

    #[test]
    fn test_to_reference() {
        let t = hd();
        let p = t.to_reference(Point::new(0.5, 0.25));
        assert!((p.x - 960.0).abs() < EPS);
        assert!((p.y - 270.0).abs() < EPS);
        let back = t.reference_to_normalized(p);
        assert!((back.x - 0.5).abs() < EPS);
    }

    #[test]
    fn test_renormalize_legacy_pixels() {
        let p = renormalize_legacy(Point::new(640.0, 360.0), Size::new(1920.0, 1080.0));
        assert!((p.x - 0.3333).abs() < 1e-3);
        assert!((p.y - 0.3333).abs() < 1e-3);
    }

    #[test]
    fn test_renormalize_one_axis_over() {
        // Either axis above 1.0 marks the whole vertex as pixel space
        let p = renormalize_legacy(Point::new(0.5, 540.0), Size::new(1920.0, 1080.0));
        assert!((p.x - 0.5 / 1920.0).abs() < EPS);
        assert!((p.y - 0.5).abs() < EPS);
    }

    #[test]
    fn test_renormalize_passthrough() {
        let p = Point::new(0.4, 1.0);
        assert_eq!(renormalize_legacy(p, Size::new(1920.0, 1080.0)), p);
    }

    #[test]
    fn test_resized_keeps_reference() {
        let t = hd().resized(Size::new(400.0, 225.0));
        assert_eq!(t.reference, Size::new(1920.0, 1080.0));
        let p = t.to_surface(Point::new(0.5, 0.5));
        assert!((p.x - 200.0).abs() < EPS);
        assert!((p.y - 112.5).abs() < EPS);
    }
}
