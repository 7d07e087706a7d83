//! Headless surface that records draw calls.

use kurbo::{BezPath, Circle, Rect, Size};
use peniko::Color;

use crate::renderer::{FrameImage, Surface};

/// One recorded primitive.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Clear(Color),
    FillPath {
        path: BezPath,
        color: Color,
    },
    StrokePath {
        path: BezPath,
        color: Color,
        width: f64,
        dashes: Option<Vec<f64>>,
    },
    FillCircle {
        circle: Circle,
        color: Color,
    },
    StrokeCircle {
        circle: Circle,
        color: Color,
        width: f64,
    },
    Image {
        seq: u64,
        dest: Rect,
    },
}

/// Records every primitive in call order.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            color,
        });
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64, dashes: Option<&[f64]>) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            color,
            width,
            dashes: dashes.map(<[f64]>::to_vec),
        });
    }

    fn fill_circle(&mut self, circle: Circle, color: Color) {
        self.commands.push(DrawCommand::FillCircle { circle, color });
    }

    fn stroke_circle(&mut self, circle: Circle, color: Color, width: f64) {
        self.commands.push(DrawCommand::StrokeCircle { circle, color, width });
    }

    fn draw_image(&mut self, image: &FrameImage, dest: Rect) {
        self.commands.push(DrawCommand::Image { seq: image.seq, dest });
    }
}
