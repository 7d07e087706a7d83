//! Vello scene surface.

use kurbo::{Affine, BezPath, Circle, Rect, Size, Stroke};
use peniko::{Brush, Color, Fill};
use vello::Scene;

use crate::renderer::{FrameImage, Surface};

/// Builds a [`vello::Scene`] for the host to render with its own GPU context.
pub struct VelloSurface {
    scene: Scene,
    size: Size,
}

impl VelloSurface {
    pub fn new(size: Size) -> Self {
        Self {
            scene: Scene::new(),
            size,
        }
    }

    /// Get the built scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take the built scene, leaving an empty one.
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }
}

impl Surface for VelloSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.scene.reset();
        self.scene
            .fill(Fill::NonZero, Affine::IDENTITY, color, None, &self.size.to_rect());
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        self.scene.fill(Fill::NonZero, Affine::IDENTITY, color, None, path);
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64, dashes: Option<&[f64]>) {
        let stroke = match dashes {
            Some(pattern) => Stroke::new(width).with_dashes(0.0, pattern.iter().copied()),
            None => Stroke::new(width),
        };
        self.scene.stroke(&stroke, Affine::IDENTITY, color, None, path);
    }

    fn fill_circle(&mut self, circle: Circle, color: Color) {
        self.scene.fill(Fill::NonZero, Affine::IDENTITY, color, None, &circle);
    }

    fn stroke_circle(&mut self, circle: Circle, color: Color, width: f64) {
        self.scene
            .stroke(&Stroke::new(width), Affine::IDENTITY, color, None, &circle);
    }

    fn draw_image(&mut self, image: &FrameImage, dest: Rect) {
        if image.image.width == 0 || image.image.height == 0 {
            return;
        }
        let scale_x = dest.width() / image.image.width as f64;
        let scale_y = dest.height() / image.image.height as f64;
        let transform = Affine::translate((dest.x0, dest.y0)) * Affine::scale_non_uniform(scale_x, scale_y);

        // Cover placement overflows the surface; fill only the surface rect
        let brush = Brush::Image(image.image.clone().into());
        self.scene
            .fill(Fill::NonZero, Affine::IDENTITY, &brush, Some(transform), &self.size.to_rect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::Compositor;
    use crate::renderer::RenderContext;
    use kurbo::Point;
    use roiscope_core::drawing::{DrawMode, DrawingMachine};
    use roiscope_core::region::{Region, RegionSet};
    use roiscope_core::transform::SurfaceTransform;

    #[test]
    fn test_surface_creation() {
        let surface = VelloSurface::new(Size::new(800.0, 450.0));
        assert!(surface.scene().encoding().is_empty());
    }

    #[test]
    fn test_compose_into_scene() {
        let t = SurfaceTransform::new(Size::new(1920.0, 1080.0), Size::new(800.0, 450.0));
        let regions = RegionSet::from_regions(vec![Region::rectangle(
            1,
            "r",
            Point::new(0.1, 0.1),
            Point::new(0.4, 0.4),
        )]);
        let mut machine = DrawingMachine::new();
        machine.set_mode(DrawMode::Polygon);
        machine.pointer_down(Point::new(10.0, 10.0));
        machine.pointer_down(Point::new(60.0, 10.0));
        machine.pointer_move(Point::new(60.0, 60.0));

        let mut surface = VelloSurface::new(t.surface);
        Compositor::default().compose(&RenderContext::new(&t, &regions, &machine), &mut surface);
        assert!(!surface.scene().encoding().is_empty());

        let scene = surface.take_scene();
        assert!(!scene.encoding().is_empty());
        assert!(surface.scene().encoding().is_empty());
    }
}
