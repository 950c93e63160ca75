use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::model::{Bounds, Coordinate, ZoneShape};

pub const MIN_POLYGON_VERTICES: usize = 3;

/// Minimum rectangle area in square degrees.
pub const MIN_RECTANGLE_AREA: f64 = 1e-6;

/// Live preview geometry handed to the renderer while a tool is active.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeCandidate {
    Polygon(Vec<Coordinate>),
    Rectangle(Bounds),
}

/// Single click placement. Holds nothing between events.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointBuilder;

impl PointBuilder {
    pub fn click(self, at: Coordinate) -> Coordinate {
        at
    }
}

#[derive(Clone, Debug, Default)]
pub struct PolygonBuilder {
    vertices: Vec<Coordinate>,
}

impl PolygonBuilder {
    /// Appends a vertex and returns the partial polygon once there are two or more.
    pub fn push(&mut self, at: Coordinate) -> Option<ShapeCandidate> {
        self.vertices.push(at);
        debug!(count = self.vertices.len(), "polygon vertex added");
        (self.vertices.len() >= 2).then(|| ShapeCandidate::Polygon(self.vertices.clone()))
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    /// Consumes the accumulated vertices on success; leaves them untouched on failure.
    pub fn finish(&mut self) -> EngineResult<ZoneShape> {
        if self.vertices.len() < MIN_POLYGON_VERTICES {
            return Err(EngineError::InsufficientVertices {
                count: self.vertices.len(),
            });
        }
        Ok(ZoneShape::Polygon {
            vertices: std::mem::take(&mut self.vertices),
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RectangleBuilder {
    origin: Option<Coordinate>,
    current: Option<Coordinate>,
}

impl RectangleBuilder {
    pub fn press(&mut self, at: Coordinate) -> ShapeCandidate {
        self.origin = Some(at);
        self.current = Some(at);
        ShapeCandidate::Rectangle(Bounds::from_corners(at, at))
    }

    /// Recomputes the preview; ignored unless a drag is in progress.
    pub fn drag(&mut self, at: Coordinate) -> Option<ShapeCandidate> {
        let origin = self.origin?;
        self.current = Some(at);
        Some(ShapeCandidate::Rectangle(Bounds::from_corners(origin, at)))
    }

    pub fn is_dragging(&self) -> bool {
        self.origin.is_some()
    }

    pub fn drag_origin(&self) -> Option<Coordinate> {
        self.origin
    }

    pub fn drag_current(&self) -> Option<Coordinate> {
        self.current
    }

    /// Returns `None` when no drag was started.
    pub fn release(&mut self, at: Coordinate) -> Option<EngineResult<ZoneShape>> {
        let origin = self.origin.take()?;
        self.current = None;
        let bounds = Bounds::from_corners(origin, at);
        let area = bounds.area();
        if area < MIN_RECTANGLE_AREA {
            debug!(area, "rectangle rejected as degenerate");
            return Some(Err(EngineError::DegenerateShape { area }));
        }
        Some(Ok(ZoneShape::Rectangle(bounds)))
    }
}
