//! Z-ordered composition of the editor surface.
//!
//! Layers, bottom to top:
//! 1. the latest frame (cover-scaled, centered) or a reference grid
//! 2. committed, enabled regions except the one being re-drawn
//! 3. the draft and its guides

use kurbo::{BezPath, Circle, Point, Rect};
use roiscope_core::drawing::DrawMode;
use roiscope_core::editor::RoiEditor;
use roiscope_core::region::{Region, closed_path};
use roiscope_core::transform::SurfaceTransform;

use crate::frame::{FrameCache, cover_rect};
use crate::renderer::{RenderContext, Surface};
use crate::style::EditorStyle;

/// Draws editor state onto a [`Surface`].
#[derive(Debug, Default)]
pub struct Compositor {
    style: EditorStyle,
    frames: FrameCache,
}

impl Compositor {
    pub fn new(style: EditorStyle) -> Self {
        Self {
            style,
            frames: FrameCache::new(),
        }
    }

    pub fn style(&self) -> &EditorStyle {
        &self.style
    }

    /// Redraw `editor` if anything changed. Returns whether it drew.
    pub fn render_editor(&mut self, editor: &mut RoiEditor, surface: &mut dyn Surface) -> bool {
        if !editor.needs_redraw() {
            return false;
        }
        self.compose(&RenderContext::from_editor(editor), surface);
        editor.mark_drawn();
        true
    }

    /// Full repaint.
    pub fn compose(&mut self, ctx: &RenderContext, surface: &mut dyn Surface) {
        self.draw_background(ctx, surface);

        for region in ctx.regions.enabled() {
            if Some(region.id) == ctx.editing_id {
                continue;
            }
            self.draw_region(region, ctx.transform, surface, false);
        }

        self.draw_draft(ctx, surface);
    }

    fn draw_background(&mut self, ctx: &RenderContext, surface: &mut dyn Surface) {
        surface.clear(self.style.background);
        let size = surface.size();
        match self.frames.update(ctx.frame.as_ref()) {
            Some(frame) => surface.draw_image(frame, cover_rect(frame.size(), size)),
            None => {
                let spacing = self.style.grid_spacing;
                if spacing <= 0.0 {
                    return;
                }
                let mut grid = BezPath::new();
                let mut x = 0.0;
                while x <= size.width {
                    grid.move_to(Point::new(x, 0.0));
                    grid.line_to(Point::new(x, size.height));
                    x += spacing;
                }
                let mut y = 0.0;
                while y <= size.height {
                    grid.move_to(Point::new(0.0, y));
                    grid.line_to(Point::new(size.width, y));
                    y += spacing;
                }
                surface.stroke_path(&grid, self.style.grid_color, self.style.grid_width, None);
            }
        }
    }

    fn draw_region(&self, region: &Region, transform: &SurfaceTransform, surface: &mut dyn Surface, draft: bool) {
        let Some(path) = region.surface_path(transform) else {
            return;
        };
        let (fill, stroke) = if draft {
            (self.style.draft_fill, self.style.draft_stroke)
        } else {
            (self.style.committed_fill, self.style.committed_stroke)
        };
        surface.fill_path(&path, fill);
        surface.stroke_path(&path, stroke, self.style.region_stroke_width, None);
    }

    fn draw_draft(&self, ctx: &RenderContext, surface: &mut dyn Surface) {
        let machine = ctx.machine;
        let style = &self.style;

        match machine.mode() {
            DrawMode::Rectangle => {
                if let (Some(anchor), Some(hover)) = (machine.anchor(), machine.hover()) {
                    let rect = Rect::from_points(anchor, hover);
                    surface.fill_rect(rect, style.draft_fill);
                    surface.stroke_rect(rect, style.draft_stroke, style.region_stroke_width);
                }
            }
            DrawMode::Polygon if !machine.vertices().is_empty() => {
                self.draw_open_polygon(machine.vertices(), machine.hover(), surface);
            }
            _ => {
                if let Some(draft) = machine.draft() {
                    self.draw_region(draft, ctx.transform, surface, true);
                }
            }
        }
    }

    fn draw_open_polygon(&self, vertices: &[Point], hover: Option<Point>, surface: &mut dyn Surface) {
        let style = &self.style;
        let first = vertices[0];
        let last = vertices[vertices.len() - 1];

        if let Some(hover) = hover {
            if vertices.len() >= 2 {
                let preview = closed_path(vertices.iter().copied().chain(std::iter::once(hover)));
                surface.fill_path(&preview, style.closure_fill);
            }
        }

        if vertices.len() >= 2 {
            let mut edges = BezPath::new();
            edges.move_to(first);
            for p in &vertices[1..] {
                edges.line_to(*p);
            }
            surface.stroke_path(&edges, style.draft_stroke, style.region_stroke_width, None);
        }

        if let Some(hover) = hover {
            surface.stroke_path(
                &segment(last, hover),
                style.cursor_guide,
                style.region_stroke_width,
                Some(&style.cursor_guide_dashes[..]),
            );
            if vertices.len() >= 2 {
                surface.stroke_path(
                    &segment(hover, first),
                    style.closing_guide,
                    style.closing_guide_width,
                    Some(&style.closing_guide_dashes[..]),
                );
            }
        }

        for (i, p) in vertices.iter().enumerate() {
            let color = if i == 0 { style.first_marker } else { style.vertex_marker };
            self.draw_marker(*p, color, surface);
        }
        if let Some(hover) = hover {
            self.draw_marker(hover, style.hover_marker, surface);
        }
    }

    fn draw_marker(&self, at: Point, color: peniko::Color, surface: &mut dyn Surface) {
        let circle = Circle::new(at, self.style.marker_radius);
        surface.fill_circle(circle, color);
        surface.stroke_circle(circle, self.style.marker_outline, self.style.marker_outline_width);
    }
}

fn segment(a: Point, b: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(a);
    path.line_to(b);
    path
}
