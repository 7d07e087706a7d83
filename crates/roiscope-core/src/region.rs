//! Region-of-interest model.

use kurbo::{BezPath, Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::transform::{SurfaceTransform, renormalize_legacy};

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Stable region identifier, unique within a channel's region set.
pub type RegionId = u64;

/// Generate a fresh region id.
///
/// Millisecond wall-clock time, bumped so ids handed out by this process are
/// strictly increasing even within the same millisecond.
pub fn next_region_id() -> RegionId {
    static LAST_ID: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Region geometry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionKind {
    /// Two opposite corners, in either order.
    Rectangle,
    /// Three or more vertices; the boundary closes implicitly.
    Polygon,
}

impl RegionKind {
    /// Minimum vertex count for a valid region of this kind.
    pub fn min_vertices(self) -> usize {
        match self {
            RegionKind::Rectangle => 2,
            RegionKind::Polygon => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RegionKind::Rectangle => "Rectangle",
            RegionKind::Polygon => "Polygon",
        }
    }
}

/// A single region of interest, vertices in normalized space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    #[serde(rename = "type")]
    pub kind: RegionKind,
    /// Display name.
    #[serde(alias = "label")]
    pub name: String,
    /// Disabled regions are neither drawn nor offered to alert rules.
    pub enabled: bool,
    #[serde(rename = "points", default)]
    pub vertices: Vec<Point>,
}

impl Region {
    /// Create an enabled rectangle from two opposite corners.
    pub fn rectangle(id: RegionId, name: impl Into<String>, a: Point, b: Point) -> Self {
        Self {
            id,
            kind: RegionKind::Rectangle,
            name: name.into(),
            enabled: true,
            vertices: vec![a, b],
        }
    }

    /// Create an enabled polygon.
    pub fn polygon(id: RegionId, name: impl Into<String>, vertices: Vec<Point>) -> Self {
        Self {
            id,
            kind: RegionKind::Polygon,
            name: name.into(),
            enabled: true,
            vertices,
        }
    }

    /// Whether the vertex count matches the kind.
    pub fn is_valid(&self) -> bool {
        match self.kind {
            RegionKind::Rectangle => self.vertices.len() == 2,
            RegionKind::Polygon => self.vertices.len() >= 3,
        }
    }

    /// Axis-aligned extents of the vertices. Order independent.
    pub fn extents(&self) -> Option<Rect> {
        let (first, rest) = self.vertices.split_first()?;
        Some(rest.iter().fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)))
    }

    /// Closed outline in surface coordinates.
    ///
    /// Legacy pixel-space vertices are read through the same heuristic used
    /// when saving, so unsaved legacy data still lands on the surface.
    pub fn surface_path(&self, transform: &SurfaceTransform) -> Option<BezPath> {
        let surface = self.surface_vertices(transform);
        match self.kind {
            RegionKind::Rectangle => {
                let (first, rest) = surface.split_first()?;
                let rect = rest.iter().fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p));
                let mut path = BezPath::new();
                path.move_to(Point::new(rect.x0, rect.y0));
                path.line_to(Point::new(rect.x1, rect.y0));
                path.line_to(Point::new(rect.x1, rect.y1));
                path.line_to(Point::new(rect.x0, rect.y1));
                path.close_path();
                Some(path)
            }
            RegionKind::Polygon => {
                if surface.len() < 3 {
                    return None;
                }
                Some(closed_path(surface))
            }
        }
    }

    /// Vertices mapped onto the surface.
    pub fn surface_vertices(&self, transform: &SurfaceTransform) -> Vec<Point> {
        self.vertices.iter().map(|p| transform.stored_to_surface(*p)).collect()
    }

    /// Copy with every vertex renormalized against `reference`.
    ///
    /// Legacy pixel-space vertices (any axis above 1.0) are divided through by
    /// the reference size; normalized ones are clamped and kept.
    pub fn renormalized(&self, reference: Size) -> Self {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|p| renormalize_legacy(*p, reference))
                .collect(),
            ..self.clone()
        }
    }
}

/// Closed path through `points`.
pub fn closed_path(points: impl IntoIterator<Item = Point>) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.into_iter();
    if let Some(first) = iter.next() {
        path.move_to(first);
        for p in iter {
            path.line_to(p);
        }
        path.close_path();
    }
    path
}

/// Ordered region collection for one channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_regions(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn as_slice(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    /// Insert, or replace the region with the same id in place.
    pub fn upsert(&mut self, region: Region) {
        match self.regions.iter_mut().find(|r| r.id == region.id) {
            Some(existing) => *existing = region,
            None => self.regions.push(region),
        }
    }

    pub fn remove(&mut self, id: RegionId) -> Option<Region> {
        let index = self.regions.iter().position(|r| r.id == id)?;
        Some(self.regions.remove(index))
    }

    /// Enabled regions only.
    pub fn enabled(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| r.enabled)
    }

    /// Regions an alert rule may be associated with: enabled ones only.
    pub fn selectable_for_rules(&self) -> Vec<RegionId> {
        self.enabled().map(|r| r.id).collect()
    }

    pub fn into_vec(self) -> Vec<Region> {
        self.regions
    }
}
