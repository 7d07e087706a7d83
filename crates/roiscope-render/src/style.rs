//! Colors and metrics for the region editor surface.

use peniko::Color;

/// Visual style for composition.
#[derive(Debug, Clone)]
pub struct EditorStyle {
    /// Surface fill under the grid.
    pub background: Color,
    pub grid_color: Color,
    pub grid_spacing: f64,
    pub grid_width: f64,

    /// Committed regions.
    pub committed_stroke: Color,
    pub committed_fill: Color,
    pub region_stroke_width: f64,

    /// The draft being drawn or re-drawn.
    pub draft_stroke: Color,
    pub draft_fill: Color,

    /// Dashed segment from the last vertex to the cursor.
    pub cursor_guide: Color,
    pub cursor_guide_dashes: [f64; 2],

    /// Dashed segment from the cursor back to the first vertex.
    pub closing_guide: Color,
    pub closing_guide_width: f64,
    pub closing_guide_dashes: [f64; 2],
    pub closure_fill: Color,

    pub marker_radius: f64,
    pub first_marker: Color,
    pub vertex_marker: Color,
    pub hover_marker: Color,
    pub marker_outline: Color,
    pub marker_outline_width: f64,
}

impl Default for EditorStyle {
    fn default() -> Self {
        Self {
            background: Color::from_rgba8(255, 255, 255, 255),
            grid_color: Color::from_rgba8(0xe0, 0xe0, 0xe0, 255),
            grid_spacing: 20.0,
            grid_width: 1.0,

            committed_stroke: Color::from_rgba8(82, 196, 26, 255),
            committed_fill: Color::from_rgba8(82, 196, 26, 51),
            region_stroke_width: 2.0,

            draft_stroke: Color::from_rgba8(24, 144, 255, 255),
            draft_fill: Color::from_rgba8(24, 144, 255, 51),

            cursor_guide: Color::from_rgba8(82, 196, 26, 255),
            cursor_guide_dashes: [5.0, 5.0],

            closing_guide: Color::from_rgba8(255, 152, 0, 255),
            closing_guide_width: 1.5,
            closing_guide_dashes: [3.0, 3.0],
            closure_fill: Color::from_rgba8(255, 152, 0, 38),

            marker_radius: 6.0,
            first_marker: Color::from_rgba8(255, 77, 79, 255),
            vertex_marker: Color::from_rgba8(24, 144, 255, 255),
            hover_marker: Color::from_rgba8(82, 196, 26, 255),
            marker_outline: Color::from_rgba8(255, 255, 255, 255),
            marker_outline_width: 2.0,
        }
    }
}
