//! Surface abstraction and per-frame render context.

use kurbo::{BezPath, Circle, Rect, Shape, Size};
use peniko::{Color, ImageData};
use roiscope_core::drawing::DrawingMachine;
use roiscope_core::editor::{LatestFrame, RoiEditor};
use roiscope_core::region::{RegionId, RegionSet};
use roiscope_core::transform::SurfaceTransform;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Frame decode failed: {0}")]
    Decode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// A decoded background frame, ready for any surface.
#[derive(Clone)]
pub struct FrameImage {
    /// Sequence number of the frame it was decoded from.
    pub seq: u64,
    /// RGBA8 pixels.
    pub image: ImageData,
}

impl FrameImage {
    pub fn size(&self) -> Size {
        Size::new(self.image.width as f64, self.image.height as f64)
    }
}

impl std::fmt::Debug for FrameImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameImage")
            .field("seq", &self.seq)
            .field("width", &self.image.width)
            .field("height", &self.image.height)
            .finish()
    }
}

/// Drawing primitives the compositor needs, in surface pixels.
pub trait Surface {
    fn size(&self) -> Size;

    fn clear(&mut self, color: Color);

    fn fill_path(&mut self, path: &BezPath, color: Color);

    /// Stroke `path`, dashed when `dashes` is given.
    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64, dashes: Option<&[f64]>);

    fn fill_circle(&mut self, circle: Circle, color: Color);

    fn stroke_circle(&mut self, circle: Circle, color: Color, width: f64);

    /// Draw `image` scaled into `dest`. Parts outside the surface are clipped.
    fn draw_image(&mut self, image: &FrameImage, dest: Rect);

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.fill_path(&rect.to_path(0.1), color);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        self.stroke_path(&rect.to_path(0.1), color, width, None);
    }
}

/// Everything one composition pass reads.
pub struct RenderContext<'a> {
    pub transform: &'a SurfaceTransform,
    pub regions: &'a RegionSet,
    pub machine: &'a DrawingMachine,
    /// Committed region hidden while it is being re-drawn.
    pub editing_id: Option<RegionId>,
    /// Latest frame payload for the channel.
    pub frame: Option<LatestFrame>,
}

impl<'a> RenderContext<'a> {
    pub fn new(transform: &'a SurfaceTransform, regions: &'a RegionSet, machine: &'a DrawingMachine) -> Self {
        Self {
            transform,
            regions,
            machine,
            editing_id: machine.editing_id(),
            frame: None,
        }
    }

    /// Snapshot an editor session.
    pub fn from_editor(editor: &'a RoiEditor) -> Self {
        Self::new(editor.transform(), editor.regions(), editor.machine()).with_frame(editor.latest_frame())
    }

    pub fn with_frame(mut self, frame: Option<LatestFrame>) -> Self {
        self.frame = frame;
        self
    }
}
