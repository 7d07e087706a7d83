//! RoiScope Render Library
//!
//! Composites the region editor: background frame or grid, committed
//! regions and the draft. The default surface builds a Vello scene.

mod compositor;
mod frame;
mod recording;
mod renderer;
mod style;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use compositor::Compositor;
pub use frame::{FrameCache, cover_rect, decode_frame};
pub use recording::{DrawCommand, RecordingSurface};
pub use renderer::{FrameImage, RenderContext, RenderResult, RendererError, Surface};
pub use style::EditorStyle;

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloSurface;
