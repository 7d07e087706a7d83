//! Drawing state machine for region gestures.
//!
//! In-progress geometry lives in surface coordinates; finished drafts are
//! converted to normalized space through the caller's [`SurfaceTransform`].

use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::PointerEvent;
use crate::region::{Region, RegionId, RegionKind, next_region_id};
use crate::transform::SurfaceTransform;

/// Vertices closer than this (surface pixels) to the previous one are not
/// appended; a double-click delivers its presses at a single spot.
const DUPLICATE_VERTEX_DISTANCE: f64 = 0.5;

/// Rejected gestures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("Draw a region first")]
    NoDraft,
    #[error("A polygon needs at least 3 vertices (has {count})")]
    TooFewVertices { count: usize },
}

/// Armed drawing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawMode {
    #[default]
    None,
    Rectangle,
    Polygon,
}

/// Identity carried over when re-drawing a committed region.
#[derive(Debug, Clone, PartialEq)]
struct Identity {
    id: RegionId,
    name: String,
    enabled: bool,
}

/// Tracks the armed mode, in-progress geometry and the finished draft.
#[derive(Debug, Clone, Default)]
pub struct DrawingMachine {
    mode: DrawMode,
    /// Rectangle drag in progress.
    dragging: bool,
    /// Rectangle anchor (surface).
    anchor: Option<Point>,
    /// Live pointer position for previews (surface).
    hover: Option<Point>,
    /// Polygon accumulator (surface).
    vertices: Vec<Point>,
    /// Finished region awaiting confirmation.
    draft: Option<Region>,
    /// Committed region being re-drawn, as it was when editing began.
    editing: Option<Region>,
}

impl DrawingMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn hover(&self) -> Option<Point> {
        self.hover
    }

    /// Accumulated polygon vertices in surface coordinates.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn draft(&self) -> Option<&Region> {
        self.draft.as_ref()
    }

    /// Region being re-drawn, if any.
    pub fn editing(&self) -> Option<&Region> {
        self.editing.as_ref()
    }

    pub fn editing_id(&self) -> Option<RegionId> {
        self.editing.as_ref().map(|r| r.id)
    }

    /// Arm a mode.
    ///
    /// Arming a drawing mode discards the finished draft and any in-progress
    /// geometry; `DrawMode::None` only drops the in-progress geometry.
    pub fn set_mode(&mut self, mode: DrawMode) {
        self.mode = mode;
        self.dragging = false;
        self.anchor = None;
        self.hover = None;
        self.vertices.clear();
        if mode != DrawMode::None {
            self.draft = None;
        }
    }

    /// Seed the machine from a committed region so it renders immediately.
    pub fn begin_edit(&mut self, region: &Region, transform: &SurfaceTransform) {
        self.mode = DrawMode::None;
        self.dragging = false;
        self.hover = None;
        self.anchor = None;
        self.vertices.clear();

        let surface = region.surface_vertices(transform);
        match region.kind {
            RegionKind::Rectangle if surface.len() >= 2 => {
                self.anchor = Some(surface[0]);
                self.hover = Some(surface[1]);
            }
            RegionKind::Polygon => self.vertices = surface,
            _ => {}
        }

        self.draft = Some(region.clone());
        self.editing = Some(region.clone());
    }

    /// Carry in-progress geometry onto a re-laid-out surface.
    pub fn rescale(&mut self, from: &SurfaceTransform, to: &SurfaceTransform) {
        if from == to {
            return;
        }
        self.anchor = self.anchor.map(|p| to.carry_from(from, p));
        self.hover = self.hover.map(|p| to.carry_from(from, p));
        for p in &mut self.vertices {
            *p = to.carry_from(from, *p);
        }
    }

    /// Feed one pointer event. Returns whether anything visible changed.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        transform: &SurfaceTransform,
        default_name: &str,
    ) -> Result<bool, DrawError> {
        match event {
            PointerEvent::Down(p) => Ok(self.pointer_down(p)),
            PointerEvent::Move(p) => Ok(self.pointer_move(p)),
            PointerEvent::Up(p) => Ok(self.pointer_up(p, transform, default_name)),
            PointerEvent::DoubleClick(_) => self.double_click(transform, default_name),
        }
    }

    pub fn pointer_down(&mut self, p: Point) -> bool {
        match self.mode {
            DrawMode::None => false,
            DrawMode::Rectangle => {
                self.anchor = Some(p);
                self.hover = None;
                self.dragging = true;
                true
            }
            DrawMode::Polygon => {
                if self
                    .vertices
                    .last()
                    .is_some_and(|last| last.distance(p) < DUPLICATE_VERTEX_DISTANCE)
                {
                    return false;
                }
                self.vertices.push(p);
                true
            }
        }
    }

    pub fn pointer_move(&mut self, p: Point) -> bool {
        match self.mode {
            DrawMode::Rectangle if self.dragging => {
                self.hover = Some(p);
                true
            }
            DrawMode::Polygon => {
                self.hover = Some(p);
                true
            }
            _ => false,
        }
    }

    /// Finish a rectangle drag.
    pub fn pointer_up(&mut self, p: Point, transform: &SurfaceTransform, default_name: &str) -> bool {
        if self.mode != DrawMode::Rectangle || !self.dragging {
            return false;
        }
        let Some(anchor) = self.anchor.take() else {
            return false;
        };

        let mut region = self.new_region(RegionKind::Rectangle, default_name);
        region.vertices = vec![transform.to_normalized(anchor), transform.to_normalized(p)];
        log::debug!("Rectangle draft finished: {:?}", region.vertices);

        self.draft = Some(region);
        self.dragging = false;
        self.hover = None;
        self.mode = DrawMode::None;
        true
    }

    /// Close the polygon under construction.
    pub fn double_click(&mut self, transform: &SurfaceTransform, default_name: &str) -> Result<bool, DrawError> {
        if self.mode != DrawMode::Polygon {
            return Ok(false);
        }
        if self.vertices.len() < 3 {
            return Err(DrawError::TooFewVertices {
                count: self.vertices.len(),
            });
        }

        let mut region = self.new_region(RegionKind::Polygon, default_name);
        region.vertices = self.vertices.iter().map(|p| transform.to_normalized(*p)).collect();
        log::debug!("Polygon draft finished with {} vertices", region.vertices.len());

        self.draft = Some(region);
        self.vertices.clear();
        self.hover = None;
        self.mode = DrawMode::None;
        Ok(true)
    }

    /// Hand out the region to commit and reset.
    ///
    /// A finished draft wins; otherwise the region being edited is returned
    /// unchanged. With neither, the confirm is rejected and nothing changes.
    pub fn confirm(&mut self) -> Result<Region, DrawError> {
        let region = self
            .draft
            .take()
            .or_else(|| self.editing.clone())
            .ok_or(DrawError::NoDraft)?;
        self.cancel();
        Ok(region)
    }

    /// Drop the draft and all in-progress geometry.
    pub fn cancel(&mut self) {
        self.mode = DrawMode::None;
        self.dragging = false;
        self.anchor = None;
        self.hover = None;
        self.vertices.clear();
        self.draft = None;
        self.editing = None;
    }

    fn new_region(&self, kind: RegionKind, default_name: &str) -> Region {
        let identity = match self.editing {
            Some(ref r) => Identity {
                id: r.id,
                name: r.name.clone(),
                enabled: r.enabled,
            },
            None => Identity {
                id: next_region_id(),
                name: default_name.to_string(),
                enabled: true,
            },
        };
        Region {
            id: identity.id,
            kind,
            name: identity.name,
            enabled: identity.enabled,
            vertices: Vec::new(),
        }
    }
}
